//! Realtime health snapshot of one domain.
//!
//! DNS, nameservers and the certificate are served through the cache; uptime
//! and performance are always probed live (the uptime result refreshes its
//! cache entry). All five probes run concurrently and a failing probe leaves
//! an empty slot rather than failing the snapshot.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cache::{Lookup, ProbeCache};
use crate::error_handling::ProbeError;
use crate::health::{compute_health_score, HealthInputs, HealthScore};
use crate::models::{CertificateInfo, DnsRecord, PerformanceTiming, UptimeCheckResult};
use crate::probe::Prober;
use crate::utils::normalize_domain;

/// Everything known about a domain right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainHealthData {
    /// Normalized hostname
    pub domain: String,
    /// Resolved records, grouped by type
    pub dns_records: Vec<DnsRecord>,
    /// Leaf certificate; `None` when the TLS probe failed
    pub ssl_info: Option<CertificateInfo>,
    /// Reachability
    pub uptime: UptimeCheckResult,
    /// Latency breakdown; `None` when the request failed
    pub performance: Option<PerformanceTiming>,
    /// Nameserver hostnames
    pub nameservers: Vec<String>,
    /// Score of this snapshot
    pub health_score: HealthScore,
    /// When the probes finished
    pub checked_at: DateTime<Utc>,
}

/// Scores a single set of observations: up counts as 100% uptime, the
/// performance total is preferred over the uptime latency. A domain that
/// answered neither probe scores 0 for performance.
pub fn snapshot_score(
    uptime: &UptimeCheckResult,
    performance: Option<&PerformanceTiming>,
    ssl_info: Option<&CertificateInfo>,
) -> HealthScore {
    let avg_response_ms = match (performance, uptime.is_up) {
        (Some(timing), _) => Some(timing.response_time_ms as f64),
        (None, true) => uptime.response_time_ms.map(|ms| ms as f64),
        (None, false) => None,
    };
    compute_health_score(HealthInputs {
        uptime_pct: if uptime.is_up { 100.0 } else { 0.0 },
        avg_response_ms,
        ssl_days_remaining: ssl_info.map(|cert| cert.days_until_expiry),
        error_rate: if uptime.is_up { 0.0 } else { 1.0 },
    })
}

/// Probes a domain from every angle at once.
///
/// # Errors
///
/// Returns `ProbeError::InvalidDomain` when `domain` cannot be reduced to a
/// hostname. Probe failures are reported inside the snapshot.
pub async fn get_domain_health_data(
    prober: &dyn Prober,
    cache: &ProbeCache,
    domain: &str,
) -> Result<DomainHealthData, ProbeError> {
    let name = normalize_domain(domain).map_err(|e| ProbeError::InvalidDomain(e.to_string()))?;
    info!("Realtime check of {name}");

    let (dns_records, nameservers, ssl, uptime, performance) = tokio::join!(
        cache.dns(prober, &name, Lookup::Cached),
        cache.nameservers(prober, &name, Lookup::Cached),
        cache.ssl(prober, &name, Lookup::Cached),
        cache.uptime(prober, &name, Lookup::Refresh),
        prober.performance(&name),
    );

    let ssl_info = ssl
        .map_err(|e| debug!("No certificate for {name}: {e}"))
        .ok();
    let performance = performance
        .map_err(|e| debug!("No performance timing for {name}: {e}"))
        .ok();
    let health_score = snapshot_score(&uptime, performance.as_ref(), ssl_info.as_ref());

    Ok(DomainHealthData {
        domain: name,
        dns_records,
        ssl_info,
        uptime,
        performance,
        nameservers,
        health_score,
        checked_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::StaticProber;

    #[tokio::test]
    async fn test_healthy_snapshot() {
        let prober = StaticProber::default();
        let cache = ProbeCache::new();

        let data = get_domain_health_data(&prober, &cache, "https://Example.com/path")
            .await
            .expect("snapshot");
        assert_eq!(data.domain, "example.com");
        assert_eq!(data.dns_records.len(), 1);
        assert_eq!(data.nameservers, vec!["ns1.example.net".to_string()]);
        assert!(data.uptime.is_up);
        assert_eq!(data.performance.as_ref().map(|p| p.response_time_ms), Some(300));
        // 40 + 30 + 0.3 * 80
        assert_eq!(data.health_score.overall, 94);
    }

    #[tokio::test]
    async fn test_failed_probes_leave_empty_slots() {
        let prober = StaticProber::with_down(&["down.com"]);
        let cache = ProbeCache::new();

        let data = get_domain_health_data(&prober, &cache, "down.com")
            .await
            .expect("snapshot");
        assert!(data.dns_records.is_empty());
        assert!(data.nameservers.is_empty());
        assert!(data.ssl_info.is_none());
        assert!(data.performance.is_none());
        assert!(!data.uptime.is_up);
        assert_eq!(data.health_score.ssl, None);
        // Down with no response at all
        assert_eq!(data.health_score.performance, 0.0);
        assert_eq!(data.health_score.overall, 0);
        // Empty lookups are not cached
        assert_eq!(cache.dns.len(), 0);
    }

    #[tokio::test]
    async fn test_cached_slots_are_reused_and_uptime_is_live() {
        let prober = StaticProber::default();
        let cache = ProbeCache::new();

        for _ in 0..2 {
            get_domain_health_data(&prober, &cache, "example.com")
                .await
                .expect("snapshot");
        }
        assert_eq!(prober.calls("dns", "example.com"), 1);
        assert_eq!(prober.calls("nameservers", "example.com"), 1);
        assert_eq!(prober.calls("ssl", "example.com"), 1);
        assert_eq!(prober.calls("uptime", "example.com"), 2);
        assert_eq!(prober.calls("performance", "example.com"), 2);
    }

    #[tokio::test]
    async fn test_invalid_domain_is_rejected() {
        let prober = StaticProber::default();
        let cache = ProbeCache::new();
        let result = get_domain_health_data(&prober, &cache, "   ").await;
        assert!(matches!(result, Err(ProbeError::InvalidDomain(_))));
    }

    #[test]
    fn test_snapshot_score_uses_uptime_latency_without_timing() {
        let uptime = UptimeCheckResult {
            is_up: true,
            response_time_ms: Some(1_500),
            status_code: Some(200),
            error_message: None,
            checked_at: Utc::now(),
        };
        let score = snapshot_score(&uptime, None, None);
        assert_eq!(score.performance, 70.0);
        // 100 * 0.7 + 70 * 0.3
        assert_eq!(score.overall, 91);
    }

    #[test]
    fn test_snapshot_score_of_unreachable_domain_is_0() {
        let uptime = UptimeCheckResult {
            is_up: false,
            response_time_ms: Some(10_000),
            status_code: None,
            error_message: Some("HTTP request timeout".to_string()),
            checked_at: Utc::now(),
        };
        let expired = crate::probe::testing::certificate(-5);
        let score = snapshot_score(&uptime, None, Some(&expired));
        assert_eq!(score.performance, 0.0);
        assert_eq!(score.ssl, Some(0.0));
        assert_eq!(score.overall, 0);
    }
}
