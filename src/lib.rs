//! vault-aws-credential-protocol - AWS credentials from Vault for `credential_process`.
//!
//! This crate asks Vault's AWS secrets engine for short-lived STS credentials
//! and prints them in the JSON shape AWS SDKs expect from an external
//! credential process. Issued credentials are cached on disk, keyed by role
//! path and session name, and reused until they are within ten minutes of
//! expiring.
//!
//! # Features
//!
//! - **Credential cache**: one owner-only file per request fingerprint
//! - **Conservative expiry**: the lease is counted from before the request
//! - **Typed errors**: cache misses are distinguishable from real failures
//! - **Pluggable backend**: the [`SecretsBackend`] trait, with a mock for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use vault_aws_credential_protocol::backends::vault::{VaultBackend, VaultSession};
//! use vault_aws_credential_protocol::{Config, CredentialProvider};
//!
//! #[tokio::main]
//! async fn main() -> vault_aws_credential_protocol::Result<()> {
//!     let config = Config::new("aws", "deploy").with_session_name("laptop");
//!     config.validate()?;
//!
//!     let backend = VaultBackend::new(VaultSession::from_env().await?).await?;
//!     let mut provider = CredentialProvider::new(backend);
//!     if let Some(cache) = config.cache()? {
//!         provider = provider.with_cache(cache);
//!     }
//!
//!     let record = provider.fetch(&config).await?;
//!     print!("{}", record.to_json()?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cache layout
//!
//! Entries live in `<user cache dir>/vault-aws-credential-protocol/`. Each file
//! is named after the base32 SHA-256 digest of its [`CacheKey`] and holds the
//! credential JSON wrapped in URL-safe base64.

pub mod backend;
pub mod backends;
pub mod cache;
pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod provider;
pub mod validation;

pub use backend::{SecretsBackend, StsSecret};
pub use cache::{CacheKey, CredentialCache};
pub use config::Config;
pub use credential::{CredentialRecord, Freshness};
pub use error::{CredentialError, Result};
pub use provider::CredentialProvider;
