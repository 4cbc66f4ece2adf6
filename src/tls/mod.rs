//! TLS certificate probe.
//!
//! Connects to `domain:443` and extracts the leaf certificate:
//! - Subject and issuer
//! - Validity period and days until expiry
//! - Subject Alternative Names (SANs)
//! - Key algorithm
//!
//! The probe inspects certificates, it does not gate trust: the verifier
//! accepts any chain so that expired, self-signed and mismatched certificates
//! are still reported. Uses `tokio-rustls` for the handshake and `x509-parser`
//! for parsing.

mod extract;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::error_handling::ProbeError;
use crate::models::CertificateInfo;

use extract::parse_leaf_certificate;

/// Certificate verifier that accepts every chain.
///
/// Handshake signatures are still checked with the provider's algorithms, so
/// the peer must hold the key of the certificate it presents.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Builds the client configuration shared by the TLS and performance probes.
pub(crate) fn inspection_client_config() -> Result<Arc<ClientConfig>, ProbeError> {
    let provider = Arc::new(ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ProbeError::Tls {
            domain: String::new(),
            message: e.to_string(),
        })?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Validates `domain` as an SNI value.
pub(crate) fn server_name(domain: &str) -> Result<ServerName<'static>, ProbeError> {
    ServerName::try_from(domain.to_string())
        .map_err(|e| ProbeError::InvalidDomain(format!("{domain}: {e}")))
}

/// Resolves `domain` and opens a TCP connection to the first reachable
/// address on `port`.
pub(crate) async fn connect_tcp(domain: &str, port: u16) -> Result<TcpStream, ProbeError> {
    let addrs: Vec<_> = lookup_host((domain, port))
        .await
        .map_err(|e| ProbeError::Dns {
            domain: domain.to_string(),
            message: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ProbeError::Dns {
            domain: domain.to_string(),
            message: "no addresses returned".to_string(),
        });
    }

    TcpStream::connect(&addrs[..])
        .await
        .map_err(|e| ProbeError::Connect {
            target: format!("{domain}:{port}"),
            message: e.to_string(),
        })
}

/// Runs the TLS handshake over an established socket.
pub(crate) async fn handshake(
    config: Arc<ClientConfig>,
    domain: &str,
    sock: TcpStream,
) -> Result<TlsStream<TcpStream>, ProbeError> {
    let name = server_name(domain)?;
    TlsConnector::from(config)
        .connect(name, sock)
        .await
        .map_err(|e| ProbeError::Tls {
            domain: domain.to_string(),
            message: e.to_string(),
        })
}

async fn probe_certificate(domain: &str) -> Result<CertificateInfo, ProbeError> {
    // Reject bad names before touching the network
    server_name(domain)?;
    let config = inspection_client_config()?;

    debug!("Connecting to {domain}:443 for certificate inspection");
    let sock = connect_tcp(domain, 443).await?;
    let tls_stream = handshake(config, domain, sock).await?;

    let leaf = tls_stream
        .get_ref()
        .1
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| ProbeError::NoCertificate(domain.to_string()))?;

    let info = parse_leaf_certificate(leaf.as_ref(), Utc::now())?;
    info!(
        "SSL certificate for {domain}: issuer={}, expires in {} days",
        info.issuer, info.days_until_expiry
    );
    Ok(info)
}

/// Retrieves the leaf TLS certificate of a domain.
///
/// The whole probe (resolution, connect, handshake, extraction) runs under
/// `timeout`; when it elapses the in-flight socket is dropped.
///
/// # Arguments
///
/// * `domain` - Hostname to connect to; also sent as SNI
/// * `timeout` - Hard deadline for the whole probe
///
/// # Errors
///
/// Returns a `ProbeError` if the name is invalid, resolution or connection
/// fails, the handshake fails, no certificate is presented, the certificate
/// cannot be parsed, or the deadline passes.
pub async fn check_tls_certificate(
    domain: &str,
    timeout: Duration,
) -> Result<CertificateInfo, ProbeError> {
    match tokio::time::timeout(timeout, probe_certificate(domain)).await {
        Ok(result) => {
            if let Err(e) = &result {
                debug!("TLS probe failed for {domain}: {e}");
            }
            result
        }
        Err(_) => Err(ProbeError::Timeout {
            operation: "TLS certificate probe",
            secs: timeout.as_secs(),
        }),
    }
}
