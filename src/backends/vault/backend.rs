//! Vault AWS secrets engine backend implementation.

use crate::backends::vault::VaultSession;
use crate::{CredentialError, Result, SecretsBackend, StsSecret};
use async_trait::async_trait;
use reqwest::{Certificate, Client};
use serde::Deserialize;
use tracing::debug;

/// Vault AWS secrets engine backend.
///
/// Issues STS credentials with a single `POST /v1/{mount}/sts/{role}`.
pub struct VaultBackend {
    client: Client,
    session: VaultSession,
}

#[derive(Deserialize)]
struct SecretResponse {
    #[serde(default)]
    lease_duration: u64,
    data: Option<StsSecret>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

impl VaultBackend {
    /// Creates a backend for the given session.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA bundle cannot be read or parsed, or the
    /// HTTP client cannot be built.
    pub async fn new(session: VaultSession) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(session.timeout())
            .danger_accept_invalid_certs(session.skip_verify());

        if let Some(path) = session.ca_cert() {
            let pem = tokio::fs::read(path)
                .await
                .map_err(|e| CredentialError::op("read", path.display().to_string(), e.into()))?;
            for cert in Certificate::from_pem_bundle(&pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        Ok(Self {
            client: builder.build()?,
            session,
        })
    }

    /// Builds the API URL for a logical path.
    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.session.address().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl SecretsBackend for VaultBackend {
    fn name(&self) -> &str {
        "vault"
    }

    async fn issue(&self, role_path: &str, session_name: &str) -> Result<StsSecret> {
        let url = self.url(role_path);
        debug!(%url, "writing to vault");

        let mut request = self
            .client
            .post(&url)
            .header("X-Vault-Token", self.session.token())
            .header("X-Vault-Request", "true")
            .json(&serde_json::json!({ "role_session_name": session_name }));

        if let Some(namespace) = self.session.namespace() {
            request = request.header("X-Vault-Namespace", namespace);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .filter(|e| !e.errors.is_empty())
                .map(|e| e.errors.join("; "))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(CredentialError::Vault {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SecretResponse = serde_json::from_str(&body)
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;

        let mut secret = parsed
            .data
            .ok_or_else(|| CredentialError::InvalidResponse("response has no data".to_string()))?;
        secret.lease_duration = parsed.lease_duration;

        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url() {
        let backend = VaultBackend::new(VaultSession::new("https://vault:8200/", "t"))
            .await
            .unwrap();

        assert_eq!(
            backend.url("aws/sts/deploy"),
            "https://vault:8200/v1/aws/sts/deploy"
        );
        assert_eq!(
            backend.url("/ns1/aws/sts/deploy"),
            "https://vault:8200/v1/ns1/aws/sts/deploy"
        );
    }

    #[tokio::test]
    async fn test_missing_ca_cert() {
        let session = VaultSession::new("https://vault", "t").with_ca_cert("/nonexistent/ca.pem");

        let result = VaultBackend::new(session).await;
        assert!(matches!(result, Err(CredentialError::Operation { .. })));
    }

    #[test]
    fn test_secret_response_parsing() {
        let body = r#"{
            "request_id": "abc",
            "lease_id": "aws/sts/deploy/xyz",
            "lease_duration": 3599,
            "renewable": false,
            "data": {
                "access_key": "ASIAEXAMPLE",
                "secret_key": "secret",
                "security_token": "token",
                "arn": "arn:aws:sts::123456789012:assumed-role/deploy/vault"
            }
        }"#;

        let parsed: SecretResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.lease_duration, 3599);

        let data = parsed.data.unwrap();
        assert_eq!(data.access_key().unwrap(), "ASIAEXAMPLE");
        assert_eq!(data.token(), Some("token"));
    }
}
