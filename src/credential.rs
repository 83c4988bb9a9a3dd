//! Credential record in the AWS credential_process wire format.

use crate::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version understood by AWS SDKs.
pub const PROTOCOL_VERSION: u8 = 1;

/// Remaining lifetime below which a cached credential is no longer served.
pub const MIN_TIME_LEFT_FOR_CACHE_HIT: Duration = Duration::minutes(10);

/// A set of AWS credentials as printed to stdout and stored in the cache.
///
/// Field names follow the `credential_process` contract:
///
/// ```json
/// {"Version":1,"AccessKeyId":"...","SecretAccessKey":"...","SessionToken":"...","Expiration":"2024-01-01T00:00:00Z"}
/// ```
///
/// `Expiration` is kept as the RFC 3339 string it was written with; use
/// [`expires_at`](Self::expires_at) to parse it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialRecord {
    /// Always [`PROTOCOL_VERSION`]
    pub version: u8,

    /// AWS access key ID
    pub access_key_id: String,

    /// AWS secret access key
    pub secret_access_key: String,

    /// STS session token, absent for IAM user credentials
    ///
    /// Always present on the wire; `None` is written as `""` and an empty
    /// string reads back as `None`.
    #[serde(default, with = "empty_as_none")]
    pub session_token: Option<String>,

    /// Absolute expiry, RFC 3339
    pub expiration: String,
}

/// How usable a credential is at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// More than [`MIN_TIME_LEFT_FOR_CACHE_HIT`] remains.
    Fresh,
    /// Still valid, but expires within the margin.
    NearExpiration,
    /// Already expired.
    Expired,
}

impl CredentialRecord {
    /// Builds a record whose expiry is `issued_at + lease`.
    ///
    /// `issued_at` should be taken before the request that produced the
    /// credentials so the recorded expiry errs on the early side.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use vault_aws_credential_protocol::CredentialRecord;
    ///
    /// let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let record = CredentialRecord::issued(
    ///     "AKIAEXAMPLE",
    ///     "secret",
    ///     Some("token".to_string()),
    ///     issued,
    ///     Duration::seconds(3600),
    /// );
    ///
    /// assert_eq!(record.version, 1);
    /// assert_eq!(record.expiration, "2024-01-01T01:00:00Z");
    /// ```
    pub fn issued(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        issued_at: DateTime<Utc>,
        lease: Duration,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            expiration: (issued_at + lease).to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Parses `Expiration` into an absolute instant.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::TimeParse`](crate::CredentialError::TimeParse)
    /// if the stored string is not RFC 3339.
    pub fn expires_at(&self) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(&self.expiration)?.with_timezone(&Utc))
    }

    /// Classifies the record against `now` using the fixed cache margin.
    pub fn freshness_at(&self, now: DateTime<Utc>) -> Result<Freshness> {
        let expiry = self.expires_at()?;

        if now >= expiry {
            Ok(Freshness::Expired)
        } else if now + MIN_TIME_LEFT_FOR_CACHE_HIT >= expiry {
            Ok(Freshness::NearExpiration)
        } else {
            Ok(Freshness::Fresh)
        }
    }

    /// Serializes the record to the compact JSON printed on stdout.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|v| !v.is_empty()))
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("version", &self.version)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_expiring_at(expiry: DateTime<Utc>) -> CredentialRecord {
        CredentialRecord {
            version: PROTOCOL_VERSION,
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            expiration: expiry.to_rfc3339(),
        }
    }

    #[test]
    fn test_issued_adds_lease_to_issue_time() {
        let issued = Utc.with_ymd_and_hms(2024, 6, 30, 23, 30, 0).unwrap();
        let record = CredentialRecord::issued("AKIA", "s", None, issued, Duration::seconds(3600));

        assert_eq!(record.expiration, "2024-07-01T00:30:00Z");
        assert_eq!(
            record.expires_at().unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 1, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_wire_format() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = CredentialRecord::issued(
            "AKIA",
            "shh",
            Some("tok".to_string()),
            issued,
            Duration::zero(),
        );

        assert_eq!(
            record.to_json().unwrap(),
            r#"{"Version":1,"AccessKeyId":"AKIA","SecretAccessKey":"shh","SessionToken":"tok","Expiration":"2024-01-01T00:00:00Z"}"#
        );
    }

    #[test]
    fn test_wire_format_without_session_token() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = CredentialRecord::issued("AKIA", "shh", None, issued, Duration::zero());

        let json = record.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"Version":1,"AccessKeyId":"AKIA","SecretAccessKey":"shh","SessionToken":"","Expiration":"2024-01-01T00:00:00Z"}"#
        );

        let parsed: CredentialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_token, None);
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_missing_or_null_session_token_reads_as_none() {
        let missing: CredentialRecord = serde_json::from_str(
            r#"{"Version":1,"AccessKeyId":"A","SecretAccessKey":"s","Expiration":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(missing.session_token, None);

        let null: CredentialRecord = serde_json::from_str(
            r#"{"Version":1,"AccessKeyId":"A","SecretAccessKey":"s","SessionToken":null,"Expiration":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(null.session_token, None);
    }

    #[test]
    fn test_freshness_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let at = |offset: Duration| record_expiring_at(now + offset).freshness_at(now).unwrap();

        assert_eq!(at(Duration::minutes(-3)), Freshness::Expired);
        assert_eq!(at(Duration::zero()), Freshness::Expired);
        assert_eq!(at(Duration::minutes(5)), Freshness::NearExpiration);
        assert_eq!(at(Duration::minutes(10)), Freshness::NearExpiration);
        assert_eq!(at(Duration::minutes(10) + Duration::seconds(1)), Freshness::Fresh);
        assert_eq!(at(Duration::days(2)), Freshness::Fresh);
    }

    #[test]
    fn test_freshness_respects_offsets() {
        let record = CredentialRecord {
            expiration: "2024-01-01T12:00:00+02:00".to_string(),
            ..record_expiring_at(Utc::now())
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        assert_eq!(record.freshness_at(now).unwrap(), Freshness::Fresh);
        assert_eq!(
            record.freshness_at(now + Duration::hours(1)).unwrap(),
            Freshness::Expired
        );
    }

    #[test]
    fn test_unparsable_expiration() {
        let record = CredentialRecord {
            expiration: "tomorrow".to_string(),
            ..record_expiring_at(Utc::now())
        };

        assert!(matches!(
            record.freshness_at(Utc::now()),
            Err(crate::CredentialError::TimeParse(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let record = CredentialRecord {
            session_token: Some("session-secret".to_string()),
            ..record_expiring_at(Utc::now())
        };

        let debug = format!("{:?}", record);
        assert!(debug.contains("AKIATEST"));
        assert!(!debug.contains("\"secret\""));
        assert!(!debug.contains("session-secret"));
    }
}
