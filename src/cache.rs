//! On-disk credential cache.
//!
//! Each entry lives in its own file under the cache directory. The filename is
//! the base32-encoded SHA-256 digest of the [`CacheKey`], so nothing supplied by
//! the caller ever reaches the path directly. File contents are the record's
//! JSON wrapped in URL-safe base64.
//!
//! # Security
//!
//! - The cache directory is created with mode 0700 on Unix
//! - Entry files are written with mode 0600 on Unix
//! - The base64 wrapping only keeps secrets out of a casual `cat`; it is not
//!   encryption
//!
//! There is no locking. Two processes refreshing the same entry both write it
//! and the last one wins.

use crate::credential::{CredentialRecord, Freshness};
use crate::{CredentialError, Result};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use data_encoding::BASE32;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Directory name under the platform cache root.
pub const CACHE_DIR_NAME: &str = "vault-aws-credential-protocol";

/// Fingerprint of a credential request.
///
/// Built from the role path and the session name as
/// `"{path.len()}:{path}-{session_name}"`. The length prefix pins down where
/// the path ends, so a `-` inside either part cannot make two different
/// requests share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates the key for a role path and STS session name.
    ///
    /// ```
    /// use vault_aws_credential_protocol::CacheKey;
    ///
    /// let key = CacheKey::new("aws/sts/deploy", "ci");
    /// assert_eq!(key.as_str(), "14:aws/sts/deploy-ci");
    /// ```
    pub fn new(role_path: &str, session_name: &str) -> Self {
        Self(format!("{}:{}-{}", role_path.len(), role_path, session_name))
    }

    /// Returns the key string that gets hashed into a filename.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the default cache directory for the current user.
///
/// This is `<user cache dir>/vault-aws-credential-protocol`, e.g.
/// `~/.cache/vault-aws-credential-protocol` on Linux.
pub fn default_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|base| base.join(CACHE_DIR_NAME))
        .ok_or_else(|| {
            CredentialError::Other(anyhow::anyhow!("could not determine user cache directory"))
        })
}

/// Returns `dir` if given, otherwise [`default_cache_dir`].
pub fn resolve_cache_dir(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => default_cache_dir(),
    }
}

/// Credential cache rooted at a single directory.
///
/// # Example
///
/// ```no_run
/// use vault_aws_credential_protocol::{CacheKey, CredentialCache};
///
/// #[tokio::main]
/// async fn main() -> vault_aws_credential_protocol::Result<()> {
///     let cache = CredentialCache::new("/tmp/vault-aws-cache");
///     let key = CacheKey::new("aws/sts/deploy", "ci");
///
///     match cache.get(&key).await {
///         Ok(record) => println!("{}", record.to_json()?),
///         Err(e) => eprintln!("cache miss: {}", e),
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CredentialCache {
    dir: PathBuf,
}

impl CredentialCache {
    /// Creates a cache rooted at `dir`.
    ///
    /// Nothing touches the filesystem until the first read or write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the cache directory if needed and restricts it to the owner.
    ///
    /// Safe to call repeatedly.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.dir).await?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(&self.dir, perms).await?;
        }

        Ok(())
    }

    /// Returns the file that holds the entry for `key`.
    ///
    /// The filename is the padded base32 encoding of `SHA-256(key)`, always
    /// 56 characters from `A-Z`, `2-7` and `=`.
    pub fn entry_path(&self, key: impl AsRef<str>) -> PathBuf {
        let digest = Sha256::digest(key.as_ref().as_bytes());
        self.dir.join(BASE32.encode(&digest))
    }

    /// Stores `record` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] if the directory cannot be created or
    /// the file cannot be written.
    pub async fn put(&self, key: impl AsRef<str>, record: &CredentialRecord) -> Result<()> {
        self.ensure_dir().await?;

        let json = serde_json::to_vec(record)?;
        let encoded = URL_SAFE.encode(json);
        let path = self.entry_path(key);

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await?;

        // mode() only applies on creation; tighten an entry left by an older write
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata().await?.permissions();
            if perms.mode() & 0o777 != 0o600 {
                perms.set_mode(0o600);
                fs::set_permissions(&path, perms).await?;
            }
        }

        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), "wrote cache entry");

        Ok(())
    }

    /// Loads the entry for `key` if it is still worth serving.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotFound`]: no entry for the key
    /// - [`CredentialError::Decode`] / [`CredentialError::Json`]: entry is corrupt
    /// - [`CredentialError::TimeParse`]: `Expiration` is unparsable
    /// - [`CredentialError::ExpiredCredentials`]: entry has expired
    /// - [`CredentialError::NearExpiration`]: entry expires within ten minutes
    pub async fn get(&self, key: impl AsRef<str>) -> Result<CredentialRecord> {
        self.get_at(key, Utc::now()).await
    }

    /// Like [`get`](Self::get), judging freshness as of `now`.
    pub async fn get_at(
        &self,
        key: impl AsRef<str>,
        now: DateTime<Utc>,
    ) -> Result<CredentialRecord> {
        let path = self.entry_path(key);

        let contents = match fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let json = URL_SAFE.decode(contents.trim_ascii())?;
        let record: CredentialRecord = serde_json::from_slice(&json)?;

        match record.freshness_at(now)? {
            Freshness::Expired => Err(CredentialError::ExpiredCredentials),
            Freshness::NearExpiration => Err(CredentialError::NearExpiration),
            Freshness::Fresh => Ok(record),
        }
    }

    /// Removes the cache directory and every entry in it.
    ///
    /// This is idempotent - clearing a cache that does not exist is not an
    /// error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
