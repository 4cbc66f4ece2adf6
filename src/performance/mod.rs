//! Phase-timed request probe.
//!
//! Times one HTTPS request with explicit checkpoints instead of wrapping a
//! high-level client:
//!
//! 1. DNS lookup (hickory resolver)
//! 2. TCP connect
//! 3. TLS handshake
//! 4. Request write, then first response byte (TTFB)
//! 5. Body drained to end of stream (content transfer)
//!
//! `dns_lookup_ms`, `connect_ms`, `tls_handshake_ms` and `content_transfer_ms`
//! are the durations of their phases. `ttfb_ms` and `response_time_ms` are
//! measured from request start.
//!
//! When the phased probe fails but a plain timed GET still succeeds, the phases
//! are estimated proportionally from the total and flagged `estimated`.

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::TokioResolver;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::config::{DEFAULT_USER_AGENT, DNS_TIMEOUT_SECS, MAX_PERFORMANCE_BODY_SIZE};
use crate::error_handling::{describe_reqwest_error, ProbeError};
use crate::models::PerformanceTiming;
use crate::tls::{handshake, inspection_client_config};
use crate::utils::duration_to_ms;

const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Timing of the response read, relative to request start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResponseTiming {
    pub ttfb_ms: u64,
    pub total_ms: u64,
    pub bytes_read: usize,
}

/// Splits a measured total into estimated phases.
///
/// DNS 10%, connect 15%, TLS 20%; the first byte arrives at 70% of the
/// total and the rest is content transfer.
pub fn estimate_phases(total_ms: u64) -> PerformanceTiming {
    let share = |percent: u64| total_ms.saturating_mul(percent) / 100;
    let ttfb_ms = share(70);
    PerformanceTiming {
        response_time_ms: total_ms,
        ttfb_ms,
        dns_lookup_ms: share(10),
        connect_ms: share(15),
        tls_handshake_ms: share(20),
        content_transfer_ms: total_ms - ttfb_ms,
        estimated: true,
    }
}

fn timeout_error(operation: &'static str, timeout: Duration) -> ProbeError {
    ProbeError::Timeout {
        operation,
        secs: timeout.as_secs(),
    }
}

async fn resolve_first_ip(resolver: &TokioResolver, domain: &str) -> Result<IpAddr, ProbeError> {
    let lookup = tokio::time::timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        resolver.lookup_ip(domain),
    )
    .await
    .map_err(|_| timeout_error("DNS lookup", Duration::from_secs(DNS_TIMEOUT_SECS)))?
    .map_err(|e| ProbeError::Dns {
        domain: domain.to_string(),
        message: e.to_string(),
    })?;

    lookup.iter().next().ok_or_else(|| ProbeError::Dns {
        domain: domain.to_string(),
        message: "no addresses returned".to_string(),
    })
}

fn build_request(domain: &str) -> String {
    format!(
        "GET / HTTP/1.1\r\n\
         Host: {domain}\r\n\
         User-Agent: {DEFAULT_USER_AGENT}\r\n\
         Accept: */*\r\n\
         Accept-Encoding: identity\r\n\
         Connection: close\r\n\
         \r\n",
    )
}

/// Reads a response until end of stream, the body cap, or `deadline`.
///
/// Failing before the first byte is an error. After the first byte, a
/// deadline, a read error (servers that skip TLS close_notify) or the cap
/// ends the transfer at that point.
pub(crate) async fn read_response<S>(
    stream: &mut S,
    start: Instant,
    deadline: Instant,
) -> Result<ResponseTiming, ProbeError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    let mut ttfb_ms = None;
    let mut bytes_read = 0usize;

    loop {
        let read = tokio::time::timeout_at(deadline, stream.read(&mut buf)).await;
        match (read, ttfb_ms) {
            (Ok(Ok(0)), None) => {
                return Err(ProbeError::Http(
                    "connection closed before any response byte".to_string(),
                ))
            }
            (Ok(Ok(n)), _) if n > 0 => {
                if ttfb_ms.is_none() {
                    ttfb_ms = Some(duration_to_ms(start.elapsed()));
                }
                bytes_read += n;
                if bytes_read >= MAX_PERFORMANCE_BODY_SIZE {
                    debug!("Body cap reached after {bytes_read} bytes");
                    break;
                }
            }
            (Ok(Err(e)), None) => return Err(ProbeError::Http(e.to_string())),
            (Err(_), None) => {
                return Err(ProbeError::Http(
                    "no response byte before the deadline".to_string(),
                ))
            }
            // End of stream, or read error / deadline after the first byte
            _ => break,
        }
    }

    let total_ms = duration_to_ms(start.elapsed());
    Ok(ResponseTiming {
        ttfb_ms: ttfb_ms.unwrap_or(total_ms),
        total_ms,
        bytes_read,
    })
}

async fn measure_phases(
    resolver: &TokioResolver,
    domain: &str,
    timeout: Duration,
) -> Result<PerformanceTiming, ProbeError> {
    let config = inspection_client_config()?;
    let start = Instant::now();
    let deadline = start + timeout;

    let ip = resolve_first_ip(resolver, domain).await?;
    let dns_done = Instant::now();

    let sock = tokio::time::timeout_at(deadline, TcpStream::connect((ip, 443)))
        .await
        .map_err(|_| timeout_error("TCP connect", timeout))?
        .map_err(|e| ProbeError::Connect {
            target: format!("{ip}:443"),
            message: e.to_string(),
        })?;
    let connect_done = Instant::now();

    let mut tls_stream = tokio::time::timeout_at(deadline, handshake(config, domain, sock))
        .await
        .map_err(|_| timeout_error("TLS handshake", timeout))??;
    let tls_done = Instant::now();

    tls_stream
        .write_all(build_request(domain).as_bytes())
        .await
        .map_err(|e| ProbeError::Http(format!("failed to write request: {e}")))?;

    let response = read_response(&mut tls_stream, start, deadline).await?;

    Ok(PerformanceTiming {
        response_time_ms: response.total_ms,
        ttfb_ms: response.ttfb_ms,
        dns_lookup_ms: duration_to_ms(dns_done - start),
        connect_ms: duration_to_ms(connect_done - dns_done),
        tls_handshake_ms: duration_to_ms(tls_done - connect_done),
        content_transfer_ms: response.total_ms.saturating_sub(response.ttfb_ms),
        estimated: false,
    })
}

/// Times a plain GET and estimates the phases from the total.
pub(crate) async fn timed_get(
    client: &reqwest::Client,
    url: &str,
) -> Result<PerformanceTiming, ProbeError> {
    let start = Instant::now();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProbeError::Http(describe_reqwest_error(&e)))?;
    response
        .bytes()
        .await
        .map_err(|e| ProbeError::Http(describe_reqwest_error(&e)))?;
    Ok(estimate_phases(duration_to_ms(start.elapsed())))
}

/// Measures the latency breakdown of `GET https://{domain}/`.
///
/// # Arguments
///
/// * `resolver` - Resolver for the DNS phase
/// * `client` - Client for the estimated fallback request
/// * `domain` - Hostname to measure
/// * `timeout` - Hard deadline for the phased probe
///
/// # Errors
///
/// Returns the phased probe's `ProbeError` when the fallback request fails
/// too.
pub async fn measure_performance(
    resolver: &TokioResolver,
    client: &reqwest::Client,
    domain: &str,
    timeout: Duration,
) -> Result<PerformanceTiming, ProbeError> {
    let phased = match tokio::time::timeout(timeout, measure_phases(resolver, domain, timeout)).await
    {
        Ok(result) => result,
        Err(_) => Err(timeout_error("Performance probe", timeout)),
    };

    match phased {
        Ok(timing) => Ok(timing),
        Err(e) => {
            warn!("Phase timing failed for {domain} ({e}), estimating from a plain request");
            timed_get(client, &format!("https://{domain}/"))
                .await
                .map_err(|fallback| {
                    debug!("Fallback request for {domain} failed too: {fallback}");
                    e
                })
        }
    }
}
