//! Error types for credential retrieval and caching.

use thiserror::Error;

/// Result type alias using [`CredentialError`].
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Errors that can occur while fetching or caching credentials.
///
/// The cache-layer variants ([`ExpiredCredentials`](Self::ExpiredCredentials),
/// [`NearExpiration`](Self::NearExpiration), [`NotFound`](Self::NotFound),
/// [`Decode`](Self::Decode), [`Json`](Self::Json) and
/// [`TimeParse`](Self::TimeParse)) mean "do not serve this entry" and are
/// absorbed by the provider. Everything else is fatal at the process boundary.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Cached credentials have already expired.
    #[error("expired credentials; do not serve from cache")]
    ExpiredCredentials,

    /// Cached credentials are too close to expiring to hand out.
    #[error("too close to expiring; do not serve from cache")]
    NearExpiration,

    /// No cache entry exists for the key.
    #[error("cache entry not found: {0}")]
    NotFound(String),

    /// Cache entry is not valid base64.
    #[error("invalid cache encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `Expiration` could not be parsed as an RFC 3339 timestamp.
    #[error("invalid expiration timestamp: {0}")]
    TimeParse(#[from] chrono::ParseError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vault answered with a non-success status.
    #[error("vault returned {status}: {message}")]
    Vault {
        /// HTTP status code
        status: u16,
        /// Joined `errors` array from the response body
        message: String,
    },

    /// Transport-level failure talking to Vault.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The secrets engine response lacked a required field.
    #[error("invalid response from secrets engine: {0}")]
    InvalidResponse(String),

    /// No Vault token in the environment or the token file.
    #[error("no vault token found (set VAULT_TOKEN or log in with `vault login`)")]
    MissingToken,

    /// A user-supplied argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation failed with context.
    #[error("{operation} {target}: {source}")]
    Operation {
        /// Operation name (read, write, clear, issue)
        operation: String,
        /// Path or key the operation acted on
        target: String,
        /// Underlying error
        #[source]
        source: Box<CredentialError>,
    },

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CredentialError {
    /// Wraps an error with the operation and target that produced it.
    ///
    /// # Example
    ///
    /// ```
    /// use vault_aws_credential_protocol::CredentialError;
    ///
    /// let err = CredentialError::op(
    ///     "issue",
    ///     "aws/sts/deploy",
    ///     CredentialError::MissingToken,
    /// );
    ///
    /// assert!(err.to_string().starts_with("issue aws/sts/deploy: no vault token"));
    /// ```
    pub fn op(
        operation: impl Into<String>,
        target: impl Into<String>,
        err: CredentialError,
    ) -> Self {
        Self::Operation {
            operation: operation.into(),
            target: target.into(),
            source: Box::new(err),
        }
    }

    /// Returns true when the error only means the cached entry is unusable.
    ///
    /// Context wrappers are looked through.
    pub fn is_cache_miss(&self) -> bool {
        match self {
            Self::ExpiredCredentials
            | Self::NearExpiration
            | Self::NotFound(_)
            | Self::Decode(_)
            | Self::Json(_)
            | Self::TimeParse(_) => true,
            Self::Operation { source, .. } => source.is_cache_miss(),
            _ => false,
        }
    }
}
