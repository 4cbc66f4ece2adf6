// Shared test helpers: a scripted prober and store setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use domain_monitor::models::{
    CertificateInfo, DnsRecord, PerformanceTiming, RecordKind, UptimeCheckResult,
};
use domain_monitor::{
    MonitorService, ProbeCache, ProbeContext, ProbeError, Prober, SqliteStore, WhoisError,
    WhoisRecord,
};

/// Prober with canned answers. Domains in `failing` fail every probe.
#[derive(Debug, Default)]
pub struct ScriptedProber {
    pub failing: HashSet<String>,
    pub probes: AtomicUsize,
}

#[allow(dead_code)] // Used by other test files
impl ScriptedProber {
    pub fn failing(domains: &[&str]) -> Self {
        Self {
            failing: domains.iter().map(|d| d.to_string()).collect(),
            probes: AtomicUsize::new(0),
        }
    }

    fn fails(&self, domain: &str) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.failing.contains(domain)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn whois(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        if self.fails(domain) {
            return Err(WhoisError::Status(502));
        }
        Ok(WhoisRecord {
            registrar: Some("Scripted Registrar".to_string()),
            expires_at: Some(Utc::now() + Duration::days(400)),
        })
    }

    async fn tls_certificate(&self, domain: &str) -> Result<CertificateInfo, ProbeError> {
        if self.fails(domain) {
            return Err(ProbeError::Tls {
                domain: domain.to_string(),
                message: "handshake failure".to_string(),
            });
        }
        let now = Utc::now();
        Ok(CertificateInfo {
            issuer: "CN=Scripted CA".to_string(),
            subject: format!("CN={domain}"),
            valid_from: now - Duration::days(10),
            valid_to: now + Duration::days(100) + Duration::hours(1),
            days_until_expiry: 100,
            is_valid: true,
            subject_alternative_names: vec![domain.to_string()],
            key_algorithm: Some("RSA".to_string()),
        })
    }

    async fn uptime(&self, domain: &str, _context: ProbeContext) -> UptimeCheckResult {
        let down = self.fails(domain);
        UptimeCheckResult {
            is_up: !down,
            response_time_ms: Some(if down { 10_000 } else { 250 }),
            status_code: (!down).then_some(200),
            error_message: down.then(|| "HTTP request timeout".to_string()),
            checked_at: Utc::now(),
        }
    }

    async fn dns_records(&self, domain: &str) -> Vec<DnsRecord> {
        if self.fails(domain) {
            return Vec::new();
        }
        vec![DnsRecord {
            record_type: RecordKind::A,
            name: domain.to_string(),
            value: "198.51.100.7".to_string(),
            ttl: 60,
        }]
    }

    async fn nameservers(&self, domain: &str) -> Vec<String> {
        if self.fails(domain) {
            return Vec::new();
        }
        vec!["ns1.scripted.test".to_string(), "ns2.scripted.test".to_string()]
    }

    async fn performance(&self, domain: &str) -> Result<PerformanceTiming, ProbeError> {
        if self.fails(domain) {
            return Err(ProbeError::Http("connection reset".to_string()));
        }
        Ok(PerformanceTiming {
            response_time_ms: 800,
            ttfb_ms: 600,
            dns_lookup_ms: 20,
            connect_ms: 60,
            tls_handshake_ms: 120,
            content_transfer_ms: 200,
            estimated: false,
        })
    }
}

/// Service over an on-disk SQLite store and the given prober, without job
/// delays.
#[allow(dead_code)] // Used by other test files
pub async fn sqlite_service(db_path: &Path, prober: Arc<ScriptedProber>) -> MonitorService {
    let store = SqliteStore::open(db_path)
        .await
        .expect("Failed to open test database");
    MonitorService::new(Arc::new(store), prober, Arc::new(ProbeCache::new()), false)
}
