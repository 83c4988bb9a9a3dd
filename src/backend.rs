//! Secrets backend trait definition.
//!
//! This module defines the [`SecretsBackend`] trait that issues AWS
//! credentials, along with the typed response it returns.

use crate::{CredentialError, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Credentials issued by an AWS secrets engine.
///
/// Older Vault releases call the STS token `security_token`, newer ones
/// `session_token`; both are accepted.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StsSecret {
    /// AWS access key ID
    #[serde(default)]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// STS session token
    #[serde(default)]
    pub session_token: Option<String>,

    /// Legacy name for the STS session token
    #[serde(default)]
    pub security_token: Option<String>,

    /// Lease duration in seconds
    #[serde(skip)]
    pub lease_duration: u64,
}

impl StsSecret {
    /// Returns the access key, or [`CredentialError::InvalidResponse`] if absent.
    pub fn access_key(&self) -> Result<&str> {
        required(&self.access_key, "access_key")
    }

    /// Returns the secret key, or [`CredentialError::InvalidResponse`] if absent.
    pub fn secret_key(&self) -> Result<&str> {
        required(&self.secret_key, "secret_key")
    }

    /// Returns `session_token`, falling back to `security_token`.
    pub fn token(&self) -> Option<&str> {
        self.session_token
            .as_deref()
            .or(self.security_token.as_deref())
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| CredentialError::InvalidResponse(format!("missing {}", name)))
}

impl std::fmt::Debug for StsSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsSecret")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token().map(|_| "<redacted>"))
            .field("lease_duration", &self.lease_duration)
            .finish()
    }
}

/// A service that can mint AWS credentials for a role.
///
/// Implementations must be `Send + Sync`.
///
/// # Implementations
///
/// - [`VaultBackend`](crate::backends::vault::VaultBackend): Vault's AWS
///   secrets engine over HTTP
/// - [`MockBackend`](crate::backends::mock::MockBackend): in-memory, for tests
#[async_trait]
pub trait SecretsBackend: Send + Sync {
    /// Returns the backend name (e.g., "vault", "mock").
    fn name(&self) -> &str;

    /// Issues credentials for `role_path` under the STS session name
    /// `session_name`.
    ///
    /// Each call is one request to the service; no retries are attempted.
    ///
    /// # Errors
    ///
    /// Returns the service or transport error unchanged.
    async fn issue(&self, role_path: &str, session_name: &str) -> Result<StsSecret>;
}
