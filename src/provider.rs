//! Cache-or-fetch orchestration.
//!
//! [`CredentialProvider`] answers a credential request from the cache when the
//! cached entry is fresh, and otherwise asks the backend for new credentials
//! and caches them.

use crate::cache::{CacheKey, CredentialCache};
use crate::{Config, CredentialError, CredentialRecord, Result, SecretsBackend};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

/// Fetches credentials through an optional cache.
///
/// # Example
///
/// ```
/// use vault_aws_credential_protocol::backends::mock::MockBackend;
/// use vault_aws_credential_protocol::{CredentialCache, CredentialProvider};
///
/// #[tokio::main]
/// async fn main() -> vault_aws_credential_protocol::Result<()> {
///     let dir = tempfile::tempdir().unwrap();
///     let provider = CredentialProvider::new(MockBackend::new())
///         .with_cache(CredentialCache::new(dir.path()));
///
///     let first = provider.credentials("aws/sts/deploy", "ci").await?;
///     let second = provider.credentials("aws/sts/deploy", "ci").await?;
///
///     assert_eq!(first, second);
///     assert_eq!(provider.backend().call_count(), 1);
///     Ok(())
/// }
/// ```
pub struct CredentialProvider<B> {
    backend: B,
    cache: Option<CredentialCache>,
}

impl<B: SecretsBackend> CredentialProvider<B> {
    /// Creates a provider that always asks `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: None,
        }
    }

    /// Serves fresh entries from `cache` and stores new credentials in it.
    pub fn with_cache(mut self, cache: CredentialCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the cache, if enabled.
    pub fn cache(&self) -> Option<&CredentialCache> {
        self.cache.as_ref()
    }

    /// Fetches credentials for the request described by `config`.
    ///
    /// The configuration's cache settings are not consulted here; the cache
    /// is whatever was passed to [`with_cache`](Self::with_cache).
    pub async fn fetch(&self, config: &Config) -> Result<CredentialRecord> {
        self.credentials(&config.role_path(), &config.session_name)
            .await
    }

    /// Returns credentials for `role_path` and `session_name`.
    ///
    /// Any cache read failure, whether a missing, expired, near-expiry or
    /// corrupt entry, falls through to the backend. Failing to write the new
    /// entry is logged and the credentials are still returned.
    ///
    /// # Errors
    ///
    /// Backend errors are returned unchanged.
    /// [`CredentialError::InvalidResponse`] is returned when the backend's
    /// answer lacks an access key or secret key, or carries an unusable lease.
    pub async fn credentials(
        &self,
        role_path: &str,
        session_name: &str,
    ) -> Result<CredentialRecord> {
        let key = CacheKey::new(role_path, session_name);

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(record) => {
                    debug!(role_path, "serving credentials from cache");
                    return Ok(record);
                }
                Err(e) if e.is_cache_miss() => debug!(role_path, reason = %e, "cache miss"),
                Err(e) => warn!(role_path, error = %e, "could not read cache entry"),
            }
        }

        let record = self.issue(role_path, session_name).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &record).await {
                warn!(
                    path = %cache.entry_path(&key).display(),
                    error = %e,
                    "could not cache credentials"
                );
            }
        }

        Ok(record)
    }

    async fn issue(&self, role_path: &str, session_name: &str) -> Result<CredentialRecord> {
        // Taken before the request so the computed expiry can only be early.
        let issued_at = Utc::now();

        info!(role_path, backend = self.backend.name(), "requesting new credentials");
        let secret = self.backend.issue(role_path, session_name).await?;

        let lease = i64::try_from(secret.lease_duration)
            .ok()
            .and_then(Duration::try_seconds)
            .filter(|lease| issued_at.checked_add_signed(*lease).is_some())
            .ok_or_else(|| {
                CredentialError::InvalidResponse(format!(
                    "lease duration out of range: {}",
                    secret.lease_duration
                ))
            })?;

        Ok(CredentialRecord::issued(
            secret.access_key()?,
            secret.secret_key()?,
            secret.token().map(str::to_string),
            issued_at,
            lease,
        ))
    }
}
