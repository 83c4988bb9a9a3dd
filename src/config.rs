//! Configuration for a credential request.

use crate::cache::{resolve_cache_dir, CacheKey, CredentialCache};
use crate::validation::{validate_path_segment, validate_session_name};
use crate::Result;
use std::path::PathBuf;

/// STS session name used when none is given.
pub const DEFAULT_SESSION_NAME: &str = "vault-aws-credential-protocol";

/// Configuration for fetching one set of credentials.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use vault_aws_credential_protocol::Config;
///
/// let config = Config::new("aws", "deploy")
///     .with_session_name("ci-runner")
///     .with_cache_dir("/tmp/creds");
///
/// assert_eq!(config.role_path(), "aws/sts/deploy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Mount path of the AWS secrets engine, namespace-prefixed if needed
    pub mount: String,

    /// Role name on the secrets engine
    pub role: String,

    /// STS session name (default: "vault-aws-credential-protocol")
    pub session_name: String,

    /// Read from and write to the credential cache (default: true)
    pub use_cache: bool,

    /// Cache directory override; the platform cache dir is used when unset
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a configuration for `role` on the engine mounted at `mount`.
    pub fn new(mount: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            role: role.into(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            use_cache: true,
            cache_dir: None,
        }
    }

    /// Sets the STS session name.
    pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = name.into();
        self
    }

    /// Enables or disables the credential cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Sets the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Checks the mount, role and session name.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidArgument`](crate::CredentialError::InvalidArgument)
    /// describing the first field that fails.
    pub fn validate(&self) -> Result<()> {
        validate_path_segment("mount", &self.mount)?;
        validate_path_segment("role", &self.role)?;
        validate_session_name(&self.session_name)
    }

    /// Returns the Vault path that issues STS credentials for the role.
    ///
    /// Leading and trailing slashes on the mount are ignored.
    pub fn role_path(&self) -> String {
        format!("{}/sts/{}", self.mount.trim_matches('/'), self.role)
    }

    /// Returns the cache fingerprint for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.role_path(), &self.session_name)
    }

    /// Resolves the cache directory, falling back to the platform default.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        resolve_cache_dir(self.cache_dir.as_deref())
    }

    /// Builds the cache for this configuration, or `None` when disabled.
    pub fn cache(&self) -> Result<Option<CredentialCache>> {
        if !self.use_cache {
            return Ok(None);
        }
        Ok(Some(CredentialCache::new(self.resolved_cache_dir()?)))
    }
}
