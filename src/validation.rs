//! Input validation for values that end up in Vault request paths.

use crate::{CredentialError, Result};

/// Maximum allowed length for mount and role names.
const MAX_NAME_LENGTH: usize = 255;

/// STS `RoleSessionName` length bounds.
const MIN_SESSION_NAME_LENGTH: usize = 2;
const MAX_SESSION_NAME_LENGTH: usize = 64;

/// Punctuation STS accepts in a session name besides alphanumerics.
const SESSION_NAME_PUNCTUATION: &str = "_+=,.@-";

/// Validates a mount path or role name.
///
/// Rejects:
/// - Empty values
/// - Values longer than 255 characters
/// - Null bytes and other control characters
/// - `..` path segments
///
/// # Errors
///
/// Returns [`CredentialError::InvalidArgument`] naming `field`.
///
/// # Example
///
/// ```
/// use vault_aws_credential_protocol::validation::validate_path_segment;
///
/// assert!(validate_path_segment("mount", "aws").is_ok());
/// assert!(validate_path_segment("mount", "team-a/aws").is_ok());
///
/// assert!(validate_path_segment("mount", "").is_err());
/// assert!(validate_path_segment("mount", "../sys").is_err());
/// ```
pub fn validate_path_segment(field: &str, value: &str) -> Result<()> {
    if value.trim_matches('/').is_empty() {
        return Err(CredentialError::InvalidArgument(format!(
            "{} cannot be empty",
            field
        )));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(CredentialError::InvalidArgument(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_NAME_LENGTH
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(CredentialError::InvalidArgument(format!(
            "{} contains control characters",
            field
        )));
    }

    if value.split('/').any(|segment| segment == "..") {
        return Err(CredentialError::InvalidArgument(format!(
            "{} cannot contain '..' segments",
            field
        )));
    }

    Ok(())
}

/// Validates an STS session name.
///
/// STS allows 2 to 64 characters drawn from letters, digits and `_+=,.@-`.
///
/// ```
/// use vault_aws_credential_protocol::validation::validate_session_name;
///
/// assert!(validate_session_name("vault-aws-credential-protocol").is_ok());
/// assert!(validate_session_name("me@example.com").is_ok());
///
/// assert!(validate_session_name("x").is_err());
/// assert!(validate_session_name("two words").is_err());
/// ```
pub fn validate_session_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(MIN_SESSION_NAME_LENGTH..=MAX_SESSION_NAME_LENGTH).contains(&len) {
        return Err(CredentialError::InvalidArgument(format!(
            "session name must be {} to {} characters",
            MIN_SESSION_NAME_LENGTH, MAX_SESSION_NAME_LENGTH
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !SESSION_NAME_PUNCTUATION.contains(*c))
    {
        return Err(CredentialError::InvalidArgument(format!(
            "session name contains invalid character {:?} (allowed: letters, digits, {})",
            bad, SESSION_NAME_PUNCTUATION
        )));
    }

    Ok(())
}
