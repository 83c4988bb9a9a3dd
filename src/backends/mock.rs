//! Mock backend for testing.
//!
//! This backend issues canned credentials from memory, records every request
//! and supports error injection for testing code that uses the provider.

use crate::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Mock secrets backend for testing.
///
/// # Example
///
/// ```
/// use vault_aws_credential_protocol::backends::mock::MockBackend;
/// use vault_aws_credential_protocol::{CredentialError, SecretsBackend};
///
/// #[tokio::main]
/// async fn main() {
///     let mut backend = MockBackend::new();
///
///     let secret = backend.issue("aws/sts/deploy", "test").await.unwrap();
///     assert_eq!(secret.lease_duration, 3600);
///
///     // Test error conditions
///     backend.issue_error = Some(CredentialError::MissingToken);
///     assert!(backend.issue("aws/sts/deploy", "test").await.is_err());
///     assert_eq!(backend.call_count(), 2);
/// }
/// ```
pub struct MockBackend {
    secret: StsSecret,
    calls: AtomicUsize,
    requests: RwLock<Vec<(String, String)>>,

    /// Error to return from `issue()`
    pub issue_error: Option<CredentialError>,
}

impl MockBackend {
    /// Creates a mock that issues one-hour session credentials.
    pub fn new() -> Self {
        Self::with_secret(StsSecret {
            access_key: Some("ASIAMOCKACCESSKEY".to_string()),
            secret_key: Some("mock-secret-key".to_string()),
            session_token: Some("mock-session-token".to_string()),
            security_token: None,
            lease_duration: 3600,
        })
    }

    /// Creates a mock that issues `secret` on every call.
    pub fn with_secret(secret: StsSecret) -> Self {
        Self {
            secret,
            calls: AtomicUsize::new(0),
            requests: RwLock::new(Vec::new()),
            issue_error: None,
        }
    }

    /// Returns how many times `issue()` was called, including failed calls.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the `(role_path, session_name)` of every call, oldest first.
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().await.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretsBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn issue(&self, role_path: &str, session_name: &str) -> Result<StsSecret> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .write()
            .await
            .push((role_path.to_string(), session_name.to_string()));

        if let Some(ref err) = self.issue_error {
            return Err(CredentialError::Other(anyhow::anyhow!("{}", err)));
        }

        Ok(self.secret.clone())
    }
}
