//! WHOIS data structures.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{FALLBACK_EXPIRY_DAYS, UNKNOWN_REGISTRAR};

/// Raw JSON body of the WHOIS API.
///
/// Fields vary between registries: dates arrive as strings, as Unix timestamps
/// or as arrays of either, so they are kept as `Value` and parsed afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WhoisApiResponse {
    #[serde(default)]
    pub registrar: Option<Value>,
    #[serde(default, alias = "expiry_date", alias = "registry_expiry_date")]
    pub expiration_date: Option<Value>,
}

/// What the WHOIS service reported for a domain. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisRecord {
    /// Registrar name
    pub registrar: Option<String>,
    /// Registration expiry
    pub expires_at: Option<DateTime<Utc>>,
}

/// Registrar and expiry as persisted on a domain, with fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisData {
    /// Registrar name or `Unknown Registrar`
    pub registrar: String,
    /// Registration expiry or one year from the lookup
    pub expires_at: DateTime<Utc>,
    /// True when any field is a placeholder rather than service data
    pub fallback: bool,
}

impl WhoisData {
    /// Placeholder used when the service is unreachable: "Unknown Registrar"
    /// and an expiry one year from `now`.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        WhoisRecord::default().or_fallback(now)
    }
}

impl WhoisRecord {
    /// Fills missing fields with the fallback values.
    pub fn or_fallback(self, now: DateTime<Utc>) -> WhoisData {
        let fallback = self.registrar.is_none() || self.expires_at.is_none();
        WhoisData {
            registrar: self
                .registrar
                .unwrap_or_else(|| UNKNOWN_REGISTRAR.to_string()),
            expires_at: self
                .expires_at
                .unwrap_or_else(|| now + Duration::days(FALLBACK_EXPIRY_DAYS)),
            fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_values() {
        let now = Utc::now();
        let data = WhoisData::fallback(now);
        assert_eq!(data.registrar, "Unknown Registrar");
        assert_eq!(data.expires_at, now + Duration::days(365));
        assert!(data.fallback);
    }

    #[test]
    fn test_or_fallback_keeps_service_data() {
        let now = Utc::now();
        let expiry = now + Duration::days(100);
        let data = WhoisRecord {
            registrar: Some("Example Registrar, Inc.".to_string()),
            expires_at: Some(expiry),
        }
        .or_fallback(now);
        assert_eq!(data.registrar, "Example Registrar, Inc.");
        assert_eq!(data.expires_at, expiry);
        assert!(!data.fallback);
    }

    #[test]
    fn test_or_fallback_fills_only_missing_expiry() {
        let now = Utc::now();
        let data = WhoisRecord {
            registrar: Some("Registrar".to_string()),
            expires_at: None,
        }
        .or_fallback(now);
        assert_eq!(data.registrar, "Registrar");
        assert_eq!(data.expires_at, now + Duration::days(365));
        assert!(data.fallback);
    }
}
