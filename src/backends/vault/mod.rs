//! Vault AWS secrets engine backend.
//!
//! This backend talks to Vault's HTTP API directly. Settings come from the
//! usual `VAULT_*` environment variables (see [`VaultSession`]).
//!
//! # Requirements
//!
//! - An AWS secrets engine mounted in Vault
//! - A role on that engine with `credential_type` `assumed_role` or
//!   `federation_token`
//! - A Vault token allowed to `update` `{mount}/sts/{role}`
//!
//! # Example
//!
//! ```no_run
//! use vault_aws_credential_protocol::backends::vault::{VaultBackend, VaultSession};
//! use vault_aws_credential_protocol::SecretsBackend;
//!
//! #[tokio::main]
//! async fn main() -> vault_aws_credential_protocol::Result<()> {
//!     let session = VaultSession::from_env().await?;
//!     let backend = VaultBackend::new(session).await?;
//!
//!     let secret = backend.issue("aws/sts/deploy", "laptop").await?;
//!     println!("lease: {}s", secret.lease_duration);
//!
//!     Ok(())
//! }
//! ```

mod backend;
mod session;

pub use backend::VaultBackend;
pub use session::{VaultSession, DEFAULT_ADDRESS, DEFAULT_TIMEOUT};
