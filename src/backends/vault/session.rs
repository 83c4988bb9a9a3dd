//! Vault connection settings.

use crate::{CredentialError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Address used when `VAULT_ADDR` is unset.
pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";

/// Request timeout used when `VAULT_CLIENT_TIMEOUT` is unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Token file written by `vault login`, relative to the home directory.
const TOKEN_FILE: &str = ".vault-token";

/// Everything needed to talk to one Vault server as one identity.
///
/// Usually built with [`from_env`](Self::from_env), which reads the same
/// variables as the `vault` CLI:
///
/// | Variable | Meaning |
/// |---|---|
/// | `VAULT_ADDR` | Server address (default `https://127.0.0.1:8200`) |
/// | `VAULT_TOKEN` | Client token; falls back to `~/.vault-token` |
/// | `VAULT_NAMESPACE` | Enterprise namespace |
/// | `VAULT_CLIENT_TIMEOUT` | Request timeout, seconds (`60` or `60s`) |
/// | `VAULT_CACERT` | PEM bundle to trust |
/// | `VAULT_SKIP_VERIFY` | Disable TLS verification when truthy |
#[derive(Clone)]
pub struct VaultSession {
    address: String,
    token: String,
    namespace: Option<String>,
    timeout: Duration,
    ca_cert: Option<PathBuf>,
    skip_verify: bool,
}

impl VaultSession {
    /// Creates a session for `address` authenticated with `token`.
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            namespace: None,
            timeout: DEFAULT_TIMEOUT,
            ca_cert: None,
            skip_verify: false,
        }
    }

    /// Sets the Vault Enterprise namespace sent with each request.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Trusts the PEM certificates in `path` in addition to the system roots.
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Disables TLS certificate verification.
    pub fn with_skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::MissingToken`]: neither `VAULT_TOKEN` nor the token
    ///   file is available
    /// - [`CredentialError::InvalidArgument`]: `VAULT_CLIENT_TIMEOUT` is malformed
    pub async fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), dirs::home_dir()).await
    }

    /// Reads settings through `lookup`, using `home` to locate the token file.
    pub async fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let address = var("VAULT_ADDR").unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let token = match (var("VAULT_TOKEN"), home) {
            (Some(token), _) => Some(token),
            (None, Some(home)) => read_token_file(&home.join(TOKEN_FILE)).await?,
            (None, None) => None,
        }
        .ok_or(CredentialError::MissingToken)?;

        let mut session = Self::new(address, token.trim());

        if let Some(namespace) = var("VAULT_NAMESPACE") {
            session = session.with_namespace(namespace);
        }
        if let Some(timeout) = var("VAULT_CLIENT_TIMEOUT") {
            session = session.with_timeout(parse_timeout(&timeout)?);
        }
        if let Some(ca_cert) = var("VAULT_CACERT") {
            session = session.with_ca_cert(ca_cert);
        }
        if let Some(skip) = var("VAULT_SKIP_VERIFY") {
            session = session.with_skip_verify(is_truthy(&skip));
        }

        Ok(session)
    }

    /// Returns the server address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the client token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the extra CA bundle path, if any.
    pub fn ca_cert(&self) -> Option<&Path> {
        self.ca_cert.as_deref()
    }

    /// Returns true when TLS verification is disabled.
    pub fn skip_verify(&self) -> bool {
        self.skip_verify
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .field("ca_cert", &self.ca_cert)
            .field("skip_verify", &self.skip_verify)
            .finish()
    }
}

async fn read_token_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(contents) if contents.trim().is_empty() => Ok(None),
        Ok(contents) => Ok(Some(contents.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CredentialError::op("read", path.display().to_string(), e.into())),
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let seconds = value.trim().trim_end_matches('s');
    seconds
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| {
            CredentialError::InvalidArgument(format!("invalid VAULT_CLIENT_TIMEOUT: {}", value))
        })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "yes" | "y"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_from_lookup_reads_environment() {
        let env = vars(&[
            ("VAULT_ADDR", "https://vault.example.com:8200"),
            ("VAULT_TOKEN", "s.abc123"),
            ("VAULT_NAMESPACE", "team-a"),
            ("VAULT_CLIENT_TIMEOUT", "15s"),
            ("VAULT_SKIP_VERIFY", "true"),
        ]);

        let session = VaultSession::from_lookup(|k| env.get(k).cloned(), None)
            .await
            .unwrap();

        assert_eq!(session.address(), "https://vault.example.com:8200");
        assert_eq!(session.token(), "s.abc123");
        assert_eq!(session.namespace(), Some("team-a"));
        assert_eq!(session.timeout(), Duration::from_secs(15));
        assert!(session.skip_verify());
        assert!(session.ca_cert().is_none());
    }

    #[tokio::test]
    async fn test_defaults() {
        let env = vars(&[("VAULT_TOKEN", "tok")]);

        let session = VaultSession::from_lookup(|k| env.get(k).cloned(), None)
            .await
            .unwrap();

        assert_eq!(session.address(), DEFAULT_ADDRESS);
        assert_eq!(session.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(session.namespace(), None);
        assert!(!session.skip_verify());
    }

    #[tokio::test]
    async fn test_token_file_fallback() {
        let home = tempdir().unwrap();
        std::fs::write(home.path().join(".vault-token"), "hvs.fromfile\n").unwrap();

        let session = VaultSession::from_lookup(|_| None, Some(home.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(session.token(), "hvs.fromfile");
    }

    #[tokio::test]
    async fn test_env_token_wins_over_file() {
        let home = tempdir().unwrap();
        std::fs::write(home.path().join(".vault-token"), "from-file").unwrap();
        let env = vars(&[("VAULT_TOKEN", "from-env")]);

        let session =
            VaultSession::from_lookup(|k| env.get(k).cloned(), Some(home.path().to_path_buf()))
                .await
                .unwrap();

        assert_eq!(session.token(), "from-env");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let home = tempdir().unwrap();

        let result = VaultSession::from_lookup(|_| None, Some(home.path().to_path_buf())).await;
        assert!(matches!(result, Err(CredentialError::MissingToken)));

        let result = VaultSession::from_lookup(|_| None, None).await;
        assert!(matches!(result, Err(CredentialError::MissingToken)));
    }

    #[tokio::test]
    async fn test_invalid_timeout() {
        let env = vars(&[("VAULT_TOKEN", "t"), ("VAULT_CLIENT_TIMEOUT", "soon")]);

        let result = VaultSession::from_lookup(|k| env.get(k).cloned(), None).await;
        assert!(matches!(result, Err(CredentialError::InvalidArgument(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = VaultSession::new("https://vault", "s.supersecret");
        assert!(!format!("{:?}", session).contains("supersecret"));
    }
}
