//! Probe result caching.
//!
//! One `TtlCache` per check kind, keyed `"{kind}:{domain}"`. TTLs follow how
//! fast each signal changes and how expensive it is to fetch:
//!
//! | kind   | TTL    |
//! |--------|--------|
//! | whois  | 24 h   |
//! | ssl    | 6 h    |
//! | dns    | 1 h    |
//! | uptime | 5 min  |
//!
//! The cache is never the source of truth; persisted domain rows are.

mod ttl;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::{DNS_CACHE_TTL, SSL_CACHE_TTL, UPTIME_CACHE_TTL, WHOIS_CACHE_TTL};
use crate::error_handling::{ProbeError, WhoisError};
use crate::models::{CertificateInfo, DnsRecord, UptimeCheckResult};
use crate::probe::{ProbeContext, Prober};
use crate::whois::WhoisRecord;

pub use ttl::TtlCache;

/// Kinds of cached checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckKind {
    /// Registrar and expiry
    Whois,
    /// Leaf certificate
    Ssl,
    /// DNS records
    Dns,
    /// NS hostnames
    Nameservers,
    /// HTTP reachability
    Uptime,
}

impl CheckKind {
    /// How long a cached result of this kind stays live.
    pub fn ttl(self) -> Duration {
        match self {
            CheckKind::Whois => WHOIS_CACHE_TTL,
            CheckKind::Ssl => SSL_CACHE_TTL,
            CheckKind::Dns | CheckKind::Nameservers => DNS_CACHE_TTL,
            CheckKind::Uptime => UPTIME_CACHE_TTL,
        }
    }
}

/// Builds the cache key for a check kind and domain.
pub fn cache_key(kind: CheckKind, domain: &str) -> String {
    format!("{kind}:{domain}")
}

/// Whether a cached read may be served from a live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Serve a live entry, probe on a miss
    Cached,
    /// Always probe; fall back to the old entry if the probe fails
    Refresh,
}

/// Resolution and lookups that find nothing are not cached.
#[derive(Debug)]
struct NothingFound;

impl std::fmt::Display for NothingFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("no records found")
    }
}

async fn read<V, E, Fut>(
    cache: &TtlCache<V>,
    kind: CheckKind,
    domain: &str,
    lookup: Lookup,
    compute: impl FnOnce() -> Fut,
) -> Result<V, E>
where
    V: Clone,
    E: std::fmt::Display,
    Fut: std::future::Future<Output = Result<V, E>>,
{
    let key = cache_key(kind, domain);
    match lookup {
        Lookup::Cached => cache.get_or_compute(&key, kind.ttl(), compute).await,
        Lookup::Refresh => cache.refresh(&key, kind.ttl(), compute).await,
    }
}

/// Typed caches for every check kind, shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct ProbeCache {
    /// WHOIS records, 24 h
    pub whois: TtlCache<WhoisRecord>,
    /// Certificates, 6 h
    pub ssl: TtlCache<CertificateInfo>,
    /// DNS record sets, 1 h
    pub dns: TtlCache<Vec<DnsRecord>>,
    /// Nameserver lists, 1 h
    pub nameservers: TtlCache<Vec<String>>,
    /// Uptime results, 5 min
    pub uptime: TtlCache<UptimeCheckResult>,
}

impl ProbeCache {
    /// Creates an empty set of caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// WHOIS record through the cache.
    pub async fn whois(
        &self,
        prober: &dyn Prober,
        domain: &str,
        lookup: Lookup,
    ) -> Result<WhoisRecord, WhoisError> {
        read(&self.whois, CheckKind::Whois, domain, lookup, || prober.whois(domain)).await
    }

    /// Certificate through the cache.
    pub async fn ssl(
        &self,
        prober: &dyn Prober,
        domain: &str,
        lookup: Lookup,
    ) -> Result<CertificateInfo, ProbeError> {
        read(&self.ssl, CheckKind::Ssl, domain, lookup, || {
            prober.tls_certificate(domain)
        })
        .await
    }

    /// DNS records through the cache. Empty results are returned but not
    /// stored.
    pub async fn dns(&self, prober: &dyn Prober, domain: &str, lookup: Lookup) -> Vec<DnsRecord> {
        read(&self.dns, CheckKind::Dns, domain, lookup, || async {
            let records = prober.dns_records(domain).await;
            if records.is_empty() {
                Err(NothingFound)
            } else {
                Ok(records)
            }
        })
        .await
        .unwrap_or_default()
    }

    /// Nameservers through the cache. Empty results are returned but not
    /// stored.
    pub async fn nameservers(
        &self,
        prober: &dyn Prober,
        domain: &str,
        lookup: Lookup,
    ) -> Vec<String> {
        read(&self.nameservers, CheckKind::Nameservers, domain, lookup, || async {
            let nameservers = prober.nameservers(domain).await;
            if nameservers.is_empty() {
                Err(NothingFound)
            } else {
                Ok(nameservers)
            }
        })
        .await
        .unwrap_or_default()
    }

    /// Uptime through the cache. Probes run in the interactive context.
    pub async fn uptime(
        &self,
        prober: &dyn Prober,
        domain: &str,
        lookup: Lookup,
    ) -> UptimeCheckResult {
        let result: Result<UptimeCheckResult, std::convert::Infallible> =
            read(&self.uptime, CheckKind::Uptime, domain, lookup, || async {
                Ok(prober.uptime(domain, ProbeContext::Interactive).await)
            })
            .await;
        match result {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Drops one kind of cached result for a domain.
    pub fn invalidate(&self, kind: CheckKind, domain: &str) -> bool {
        let key = cache_key(kind, domain);
        match kind {
            CheckKind::Whois => self.whois.invalidate(&key),
            CheckKind::Ssl => self.ssl.invalidate(&key),
            CheckKind::Dns => self.dns.invalidate(&key),
            CheckKind::Nameservers => self.nameservers.invalidate(&key),
            CheckKind::Uptime => self.uptime.invalidate(&key),
        }
    }

    /// Drops every cached result for a domain.
    pub fn invalidate_domain(&self, domain: &str) {
        for kind in CheckKind::iter() {
            self.invalidate(kind, domain);
        }
    }

    /// Drops everything.
    pub fn clear(&self) {
        self.whois.clear();
        self.ssl.clear();
        self.dns.clear();
        self.nameservers.clear();
        self.uptime.clear();
    }

    /// Total number of cached entries across kinds.
    pub fn len(&self) -> usize {
        self.whois.len()
            + self.ssl.len()
            + self.dns.len()
            + self.nameservers.len()
            + self.uptime.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key(CheckKind::Ssl, "example.com"), "ssl:example.com");
        assert_eq!(cache_key(CheckKind::Whois, "example.com"), "whois:example.com");
        assert_eq!(CheckKind::from_str("uptime").ok(), Some(CheckKind::Uptime));
    }

    #[test]
    fn test_ttls_per_kind() {
        assert_eq!(CheckKind::Whois.ttl(), Duration::from_secs(86_400));
        assert_eq!(CheckKind::Ssl.ttl(), Duration::from_secs(21_600));
        assert_eq!(CheckKind::Dns.ttl(), Duration::from_secs(3_600));
        assert_eq!(CheckKind::Uptime.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_invalidate_domain_drops_all_kinds() {
        let cache = ProbeCache::new();
        cache.nameservers.insert(
            &cache_key(CheckKind::Nameservers, "a.com"),
            vec!["ns1.a.com".to_string()],
            CheckKind::Nameservers.ttl(),
        );
        cache.uptime.insert(
            &cache_key(CheckKind::Uptime, "a.com"),
            UptimeCheckResult {
                is_up: true,
                response_time_ms: Some(120),
                status_code: Some(200),
                error_message: None,
                checked_at: Utc::now(),
            },
            CheckKind::Uptime.ttl(),
        );
        cache.dns.insert(
            &cache_key(CheckKind::Dns, "b.com"),
            Vec::new(),
            CheckKind::Dns.ttl(),
        );
        assert_eq!(cache.len(), 3);

        cache.invalidate_domain("a.com");
        assert_eq!(cache.len(), 1);
        assert!(!cache.invalidate(CheckKind::Uptime, "a.com"));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cached_lookup_probes_once() {
        let prober = crate::probe::testing::StaticProber::default();
        let cache = ProbeCache::new();
        for _ in 0..3 {
            cache
                .ssl(&prober, "example.com", Lookup::Cached)
                .await
                .expect("certificate");
        }
        assert_eq!(prober.calls("ssl", "example.com"), 1);

        cache
            .ssl(&prober, "example.com", Lookup::Refresh)
            .await
            .expect("certificate");
        assert_eq!(prober.calls("ssl", "example.com"), 2);
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_stale_whois() {
        let healthy = crate::probe::testing::StaticProber::default();
        let failing = crate::probe::testing::StaticProber {
            whois_down: true,
            ..Default::default()
        };
        let cache = ProbeCache::new();

        let first = cache
            .whois(&healthy, "example.com", Lookup::Cached)
            .await
            .expect("record");
        let second = cache
            .whois(&failing, "example.com", Lookup::Refresh)
            .await
            .expect("stale record");
        assert_eq!(first, second);
        assert!(cache.whois(&failing, "other.com", Lookup::Refresh).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_dns_answers_are_not_cached() {
        let prober = crate::probe::testing::StaticProber::with_down(&["gone.com"]);
        let cache = ProbeCache::new();
        assert!(cache.dns(&prober, "gone.com", Lookup::Cached).await.is_empty());
        assert!(cache.nameservers(&prober, "gone.com", Lookup::Cached).await.is_empty());
        assert!(cache.is_empty());

        assert_eq!(cache.dns(&prober, "up.com", Lookup::Cached).await.len(), 1);
        assert_eq!(cache.dns.len(), 1);
    }
}
