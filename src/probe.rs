//! The probe seam.
//!
//! Jobs, the realtime aggregator and the service layer reach the network only
//! through `Prober`, so they can run against scripted probes in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;

use crate::config::{Config, PERFORMANCE_TIMEOUT_SECS, TLS_PROBE_TIMEOUT_SECS};
use crate::error_handling::{InitializationError, ProbeError, WhoisError};
use crate::models::{CertificateInfo, DnsRecord, PerformanceTiming, UptimeCheckResult};
use crate::whois::{WhoisClient, WhoisRecord};

/// Who is waiting on an uptime probe; decides its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeContext {
    /// Background jobs tolerate slow hosts
    Background,
    /// A user is waiting
    Interactive,
}

/// Live network checks, one operation per call.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Registrar and expiry from the WHOIS service.
    async fn whois(&self, domain: &str) -> Result<WhoisRecord, WhoisError>;

    /// Leaf certificate of `domain:443`.
    async fn tls_certificate(&self, domain: &str) -> Result<CertificateInfo, ProbeError>;

    /// HTTP reachability of `https://{domain}`.
    async fn uptime(&self, domain: &str, context: ProbeContext) -> UptimeCheckResult;

    /// A, AAAA, MX, TXT, CNAME and NS records.
    async fn dns_records(&self, domain: &str) -> Vec<DnsRecord>;

    /// Nameserver hostnames.
    async fn nameservers(&self, domain: &str) -> Vec<String>;

    /// Latency breakdown of one HTTPS request.
    async fn performance(&self, domain: &str) -> Result<PerformanceTiming, ProbeError>;
}

/// `Prober` backed by the real network.
#[derive(Debug, Clone)]
pub struct NetworkProber {
    resolver: Arc<TokioResolver>,
    background_client: Arc<reqwest::Client>,
    interactive_client: Arc<reqwest::Client>,
    whois: WhoisClient,
}

impl NetworkProber {
    /// Builds the resolver, HTTP clients and WHOIS client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if an HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, InitializationError> {
        let resolver = crate::initialization::init_resolver();
        let background_client = crate::initialization::init_probe_client(
            config,
            Duration::from_secs(config.uptime_timeout_seconds),
        )?;
        let interactive_client = crate::initialization::init_probe_client(
            config,
            Duration::from_secs(config.realtime_timeout_seconds),
        )?;
        Ok(Self {
            resolver,
            background_client,
            interactive_client,
            whois: WhoisClient::new(config)?,
        })
    }

    fn client(&self, context: ProbeContext) -> &reqwest::Client {
        match context {
            ProbeContext::Background => &self.background_client,
            ProbeContext::Interactive => &self.interactive_client,
        }
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn whois(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        self.whois.lookup(domain).await
    }

    async fn tls_certificate(&self, domain: &str) -> Result<CertificateInfo, ProbeError> {
        crate::tls::check_tls_certificate(domain, Duration::from_secs(TLS_PROBE_TIMEOUT_SECS)).await
    }

    async fn uptime(&self, domain: &str, context: ProbeContext) -> UptimeCheckResult {
        crate::uptime::check_uptime(self.client(context), domain).await
    }

    async fn dns_records(&self, domain: &str) -> Vec<DnsRecord> {
        crate::dns::resolve_dns_records(domain, &self.resolver).await
    }

    async fn nameservers(&self, domain: &str) -> Vec<String> {
        crate::dns::lookup_nameservers(domain, &self.resolver).await
    }

    async fn performance(&self, domain: &str) -> Result<PerformanceTiming, ProbeError> {
        crate::performance::measure_performance(
            &self.resolver,
            &self.interactive_client,
            domain,
            Duration::from_secs(PERFORMANCE_TIMEOUT_SECS),
        )
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_network_prober_builds_from_default_config() {
        assert!(NetworkProber::new(&Config::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_domain_fails_as_value() {
        let prober = NetworkProber::new(&Config::default()).expect("prober");
        let result = prober.tls_certificate("not a domain!").await;
        assert!(matches!(result, Err(ProbeError::InvalidDomain(_))));
    }
}
