//! Error type definitions.
//!
//! This module defines all error types and failure categories used throughout the
//! monitoring pipeline.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// The referenced domain does not exist.
    #[error("Domain {0} not found")]
    DomainNotFound(i64),

    /// The owner already registered this domain name.
    #[error("Domain {name} is already registered for owner {owner}")]
    DuplicateDomain {
        /// Owner identifier
        owner: String,
        /// Normalized domain name
        name: String,
    },
}

/// Failure of a single live network probe.
///
/// Probe failures are expected operational data (a down domain is normal), so
/// they are returned as values and recorded, never propagated as panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The input cannot be used as a hostname / SNI value.
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Name resolution failed (NXDOMAIN, SERVFAIL, resolver error).
    #[error("DNS lookup failed for {domain}: {message}")]
    Dns {
        /// Domain that failed to resolve
        domain: String,
        /// Resolver error text
        message: String,
    },

    /// TCP connection refused or unreachable.
    #[error("Connection to {target} failed: {message}")]
    Connect {
        /// `host:port` that was dialed
        target: String,
        /// Socket error text
        message: String,
    },

    /// TLS handshake failed.
    #[error("TLS handshake with {domain} failed: {message}")]
    Tls {
        /// Domain used as SNI
        domain: String,
        /// rustls error text
        message: String,
    },

    /// The handshake completed but no certificate was presented.
    #[error("No peer certificate presented by {0}")]
    NoCertificate(String),

    /// The leaf certificate could not be parsed.
    #[error("Certificate parse error: {0}")]
    CertificateParse(String),

    /// HTTP-level failure after the connection was established.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The probe exceeded its hard deadline and was torn down.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Name of the probe phase that timed out
        operation: &'static str,
        /// Timeout that elapsed, in seconds
        secs: u64,
    },
}

impl ProbeError {
    /// Maps the error onto its failure category.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ProbeError::InvalidDomain(_) => ErrorType::InvalidDomainError,
            ProbeError::Dns { .. } => ErrorType::DnsLookupError,
            ProbeError::Connect { .. } => ErrorType::TcpConnectError,
            ProbeError::Tls { .. } => ErrorType::TlsHandshakeError,
            ProbeError::NoCertificate(_) => ErrorType::TlsCertificateError,
            ProbeError::CertificateParse(_) => ErrorType::TlsCertificateError,
            ProbeError::Http(_) => ErrorType::HttpRequestOtherError,
            ProbeError::Timeout { .. } => ErrorType::ProbeTimeout,
        }
    }
}

/// Failure of the third-party WHOIS API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WhoisError {
    /// The request could not be sent or no response arrived.
    #[error("WHOIS request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("WHOIS service returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("WHOIS response could not be decoded: {0}")]
    Decode(String),
}

/// Failure of a whole job kind (as opposed to a single domain inside it).
#[derive(Error, Debug)]
pub enum JobError {
    /// Selecting the domains to refresh failed.
    #[error("Job storage error: {0}")]
    Database(#[from] DatabaseError),
}

/// Failure of a service operation, as reported to API callers.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The input cannot be reduced to a monitorable hostname.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// Persistence failed or the domain does not exist.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A triggered job could not run.
    #[error(transparent)]
    Job(#[from] JobError),
}

/// Failure categories of probes.
///
/// Used to turn low-level errors into the short reason shown to operators, so a
/// transient timeout can be told apart from a refused connection or a broken
/// certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// The request could not be built (bad URL or header)
    HttpRequestBuilderError,
    /// Redirect handling failed
    HttpRequestRedirectError,
    /// The HTTP client deadline passed
    HttpRequestTimeoutError,
    /// Connection refused, reset or unreachable
    HttpRequestConnectError,
    /// Reading the response body failed
    HttpRequestBodyError,
    /// The response body could not be decoded
    HttpRequestDecodeError,
    /// Any other HTTP client failure
    HttpRequestOtherError,
    /// The name did not resolve
    DnsLookupError,
    /// Raw TCP connect failed
    TcpConnectError,
    /// The TLS handshake failed
    TlsHandshakeError,
    /// No certificate, or one that could not be parsed
    TlsCertificateError,
    /// The input is not a usable hostname
    InvalidDomainError,
    /// A probe exceeded its hard deadline
    ProbeTimeout,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Short operator-facing label, used as the prefix of stored failure
    /// messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpRequestBuilderError => "HTTP request builder error",
            ErrorType::HttpRequestRedirectError => "HTTP request redirect error",
            ErrorType::HttpRequestTimeoutError => "HTTP request timeout",
            ErrorType::HttpRequestConnectError => "Connection error",
            ErrorType::HttpRequestBodyError => "HTTP response body error",
            ErrorType::HttpRequestDecodeError => "HTTP response decode error",
            ErrorType::HttpRequestOtherError => "HTTP request error",
            ErrorType::DnsLookupError => "DNS lookup error",
            ErrorType::TcpConnectError => "Connection error",
            ErrorType::TlsHandshakeError => "TLS handshake error",
            ErrorType::TlsCertificateError => "Invalid certificate",
            ErrorType::InvalidDomainError => "Invalid domain",
            ErrorType::ProbeTimeout => "Timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(ErrorType::HttpRequestTimeoutError.as_str(), "HTTP request timeout");
        assert_eq!(ErrorType::TlsCertificateError.as_str(), "Invalid certificate");
        assert_eq!(ErrorType::ProbeTimeout.to_string(), "Timeout");
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_probe_error_categories() {
        let timeout = ProbeError::Timeout {
            operation: "TLS certificate probe",
            secs: 10,
        };
        assert_eq!(timeout.error_type(), ErrorType::ProbeTimeout);
        assert_eq!(timeout.to_string(), "TLS certificate probe timed out after 10s");

        let refused = ProbeError::Connect {
            target: "example.com:443".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(refused.error_type(), ErrorType::TcpConnectError);
        assert!(refused.to_string().contains("example.com:443"));

        assert_eq!(
            ProbeError::NoCertificate("example.com".to_string()).error_type(),
            ErrorType::TlsCertificateError
        );
    }

    #[test]
    fn test_database_error_messages() {
        let err = DatabaseError::DuplicateDomain {
            owner: "alice".to_string(),
            name: "example.com".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Domain example.com is already registered for owner alice"
        );
        assert_eq!(DatabaseError::DomainNotFound(7).to_string(), "Domain 7 not found");
    }

    #[test]
    fn test_service_error_is_transparent() {
        let err: ServiceError = DatabaseError::DomainNotFound(4).into();
        assert_eq!(err.to_string(), "Domain 4 not found");
    }

    #[test]
    fn test_job_error_from_database_error() {
        let err: JobError = DatabaseError::DomainNotFound(3).into();
        assert!(err.to_string().contains("Domain 3 not found"));
    }
}
