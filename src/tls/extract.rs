//! Certificate extraction utilities.

use chrono::{DateTime, Utc};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};

use crate::error_handling::ProbeError;
use crate::models::CertificateInfo;
use crate::utils::days_until;

/// Extracts Subject Alternative Names (SANs) from an X.509 certificate.
///
/// Only DNS names are extracted (not IP addresses, email addresses, etc.):
/// they show which other hostnames the same certificate covers.
pub(crate) fn extract_certificate_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = general_name {
                    sans.push(dns_name.to_string());
                }
            }
        }
    }

    sans
}

/// Maps a public key algorithm OID to its common name, or returns the OID.
pub(crate) fn key_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.1" => "RSA".to_string(),
        "1.2.840.10045.2.1" => "ECDSA".to_string(),
        "1.3.101.112" => "Ed25519".to_string(),
        "1.3.101.113" => "Ed448".to_string(),
        other => other.to_string(),
    }
}

fn timestamp_to_utc(timestamp: i64, field: &str) -> Result<DateTime<Utc>, ProbeError> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        ProbeError::CertificateParse(format!("{field} out of range: {timestamp}"))
    })
}

/// Validity window and derived fields of a leaf certificate.
pub(crate) struct Validity {
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub is_valid: bool,
}

/// Evaluates a validity window against `now`. The window is inclusive at both
/// ends, as in RFC 5280.
pub(crate) fn evaluate_validity(
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Validity {
    Validity {
        valid_from,
        valid_to,
        days_until_expiry: days_until(valid_to, now),
        is_valid: valid_from <= now && now <= valid_to,
    }
}

/// Parses a DER-encoded leaf certificate into `CertificateInfo`.
///
/// # Errors
///
/// Returns `ProbeError::CertificateParse` if the DER is malformed or the
/// validity dates cannot be represented.
pub(crate) fn parse_leaf_certificate(
    der: &[u8],
    now: DateTime<Utc>,
) -> Result<CertificateInfo, ProbeError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| ProbeError::CertificateParse(e.to_string()))?;
    let tbs_cert = &cert.tbs_certificate;

    let valid_from = timestamp_to_utc(tbs_cert.validity.not_before.timestamp(), "not_before")?;
    let valid_to = timestamp_to_utc(tbs_cert.validity.not_after.timestamp(), "not_after")?;
    let validity = evaluate_validity(valid_from, valid_to, now);

    let key_algorithm = key_algorithm_name(&tbs_cert.subject_pki.algorithm.algorithm.to_string());

    Ok(CertificateInfo {
        issuer: tbs_cert.issuer.to_string(),
        subject: tbs_cert.subject.to_string(),
        valid_from: validity.valid_from,
        valid_to: validity.valid_to,
        days_until_expiry: validity.days_until_expiry,
        is_valid: validity.is_valid,
        subject_alternative_names: extract_certificate_sans(&cert),
        key_algorithm: Some(key_algorithm),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_key_algorithm_names() {
        assert_eq!(key_algorithm_name("1.2.840.113549.1.1.1"), "RSA");
        assert_eq!(key_algorithm_name("1.2.840.10045.2.1"), "ECDSA");
        assert_eq!(key_algorithm_name("1.3.101.112"), "Ed25519");
        assert_eq!(key_algorithm_name("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn test_evaluate_validity_current_certificate() {
        let now = Utc::now();
        let validity =
            evaluate_validity(now - Duration::days(60), now + Duration::days(30), now);
        assert!(validity.is_valid);
        assert_eq!(validity.days_until_expiry, 30);
    }

    #[test]
    fn test_evaluate_validity_expired_certificate() {
        let now = Utc::now();
        let validity =
            evaluate_validity(now - Duration::days(400), now - Duration::hours(2), now);
        assert!(!validity.is_valid);
        assert_eq!(validity.days_until_expiry, -1);
    }

    #[test]
    fn test_evaluate_validity_not_yet_valid() {
        let now = Utc::now();
        let validity =
            evaluate_validity(now + Duration::days(1), now + Duration::days(91), now);
        assert!(!validity.is_valid);
        assert_eq!(validity.days_until_expiry, 91);
    }

    #[test]
    fn test_parse_leaf_certificate_rejects_garbage() {
        let err = parse_leaf_certificate(b"not a certificate", Utc::now())
            .expect_err("garbage must not parse");
        assert!(matches!(err, ProbeError::CertificateParse(_)));
    }
}
