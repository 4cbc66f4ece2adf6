//! Data model of the monitoring pipeline.
//!
//! Persisted entities (`Domain`, `UptimeCheck`, `PerformanceMetric`) and the
//! values the probes produce. Check rows are immutable once written and owned
//! by their domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Certificate health of a domain.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SslStatus {
    /// Never checked
    #[default]
    Unknown,
    /// 30 or more days left
    Valid,
    /// Less than 30 days left
    Warning,
    /// Less than 7 days left
    Critical,
    /// Past `valid_to`
    Expired,
    /// The last probe failed
    Error,
}

impl SslStatus {
    /// Classifies a certificate by its remaining validity.
    pub fn from_days_until_expiry(days: i64) -> Self {
        if days < 0 {
            SslStatus::Expired
        } else if days < 7 {
            SslStatus::Critical
        } else if days < 30 {
            SslStatus::Warning
        } else {
            SslStatus::Valid
        }
    }
}

/// A monitored hostname and its cached signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Store-assigned identifier
    pub id: i64,
    /// Owner the domain is registered for
    pub owner_id: String,
    /// Normalized hostname, unique per owner
    pub name: String,
    /// Registrar name, or the placeholder when WHOIS had nothing
    pub registrar: Option<String>,
    /// Registration expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the uptime job probes this domain
    pub monitoring_enabled: bool,
    /// Last uptime probe by the background job
    pub last_health_check: Option<DateTime<Utc>>,
    /// Overall health score, 0–100
    pub health_score: Option<f64>,
    /// Leaf certificate `valid_to`; kept across failed probes
    pub ssl_expires_at: Option<DateTime<Utc>>,
    /// Leaf certificate issuer
    pub ssl_issuer: Option<String>,
    /// Status derived from the last certificate check
    pub ssl_status: SslStatus,
    /// Last certificate check attempt, successful or not
    pub ssl_last_checked: Option<DateTime<Utc>>,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last registrar/expiry write; drives WHOIS staleness
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    /// Days until the stored certificate expiry, if one is known. Negative once
    /// the certificate has expired.
    pub fn ssl_days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.ssl_expires_at
            .map(|expiry| crate::utils::days_until(expiry, now))
    }

    /// True when registrar and expiry came from the WHOIS service rather than
    /// the placeholder values.
    pub fn has_whois_data(&self) -> bool {
        self.expires_at.is_some()
            && self
                .registrar
                .as_deref()
                .is_some_and(|registrar| registrar != crate::config::UNKNOWN_REGISTRAR)
    }
}

/// Input for registering a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDomain {
    /// Owner identifier
    pub owner_id: String,
    /// Normalized hostname
    pub name: String,
    /// Registrar from the initial WHOIS lookup
    pub registrar: Option<String>,
    /// Registration expiry from the initial WHOIS lookup
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the uptime job should probe the domain
    pub monitoring_enabled: bool,
}

/// Outcome of one SSL refresh, persisted onto the domain.
///
/// `checked_at` is written even when the probe failed, so the staleness clock
/// tracks the last attempt, not the last success.
#[derive(Debug, Clone, PartialEq)]
pub struct SslUpdate {
    /// When the check ran
    pub checked_at: DateTime<Utc>,
    /// Derived status, `Error` when the probe failed
    pub status: SslStatus,
    /// New `valid_to`; `None` keeps the stored value
    pub expires_at: Option<DateTime<Utc>>,
    /// New issuer; `None` keeps the stored value
    pub issuer: Option<String>,
}

/// Result of one HTTP uptime probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeCheckResult {
    /// True iff any HTTP response arrived (status codes of every class count)
    pub is_up: bool,
    /// Latency to the first response, or elapsed time until failure
    pub response_time_ms: Option<u64>,
    /// HTTP status, when a response arrived
    pub status_code: Option<u16>,
    /// Categorized failure reason, when down
    pub error_message: Option<String>,
    /// When the probe finished
    pub checked_at: DateTime<Utc>,
}

/// Result of one certificate check, as stored on the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCheckOutcome {
    /// Derived status
    pub status: SslStatus,
    /// Whole days left; `None` when the probe failed
    pub days_until_expiry: Option<i64>,
    /// Leaf certificate issuer
    pub issuer: Option<String>,
    /// Probe failure, when `status` is `Error`
    pub error: Option<String>,
    /// When the check ran
    pub checked_at: DateTime<Utc>,
}

/// Persisted uptime check row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeCheck {
    /// Row identifier
    pub id: i64,
    /// Owning domain
    pub domain_id: i64,
    /// When the probe finished
    pub checked_at: DateTime<Utc>,
    /// Any HTTP response arrived
    pub is_up: bool,
    /// Latency, or elapsed time until failure
    pub response_time_ms: Option<u64>,
    /// HTTP status, when up
    pub status_code: Option<u16>,
    /// Failure reason, when down
    pub error_message: Option<String>,
}

/// Latency breakdown of one request, all phases in milliseconds from request
/// start.
///
/// When `estimated` is true the phases were not observed: they were split
/// proportionally out of the measured total and are an approximation, not a
/// trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTiming {
    /// Request start to end of body
    pub response_time_ms: u64,
    /// Request start to first response byte
    pub ttfb_ms: u64,
    /// Name resolution
    pub dns_lookup_ms: u64,
    /// TCP connect
    pub connect_ms: u64,
    /// TLS handshake
    pub tls_handshake_ms: u64,
    /// First byte to end of body
    pub content_transfer_ms: u64,
    /// Phases were apportioned from the total rather than observed
    pub estimated: bool,
}

/// Persisted performance metric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    /// Row identifier
    pub id: i64,
    /// Owning domain
    pub domain_id: i64,
    /// When the measurement was taken
    pub measured_at: DateTime<Utc>,
    /// Measured phases
    #[serde(flatten)]
    pub timing: PerformanceTiming,
}

/// DNS record types the DNS probe queries, in presentation order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordKind {
    /// IPv4 address
    A,
    /// IPv6 address
    AAAA,
    /// Mail exchanger, value prefixed with its preference
    MX,
    /// Text record, character strings joined
    TXT,
    /// Canonical name
    CNAME,
    /// Delegated nameserver
    NS,
}

/// One resolved DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordKind,
    /// Owner name, trailing dot stripped
    pub name: String,
    /// Presentation form of the record data
    pub value: String,
    /// Time to live in seconds
    pub ttl: u32,
}

/// Leaf certificate details extracted by the TLS probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    /// Issuer distinguished name
    pub issuer: String,
    /// Subject distinguished name
    pub subject: String,
    /// Start of the validity window
    pub valid_from: DateTime<Utc>,
    /// End of the validity window
    pub valid_to: DateTime<Utc>,
    /// Whole days until `valid_to`; negative once expired
    pub days_until_expiry: i64,
    /// Current time lies inside the validity window. Chain trust is not
    /// evaluated.
    pub is_valid: bool,
    /// DNS names from the subjectAltName extension
    pub subject_alternative_names: Vec<String>,
    /// Public key algorithm, e.g. `RSA` or `ECDSA`
    pub key_algorithm: Option<String>,
}

impl CertificateInfo {
    /// Status implied by this certificate.
    pub fn status(&self) -> SslStatus {
        SslStatus::from_days_until_expiry(self.days_until_expiry)
    }
}
