//! Behavior shared by every `DomainStore` implementation, run against both.

use chrono::{Duration, Utc};

use super::*;
use crate::config::UNKNOWN_REGISTRAR;
use crate::models::SslStatus;

fn new_domain(owner: &str, name: &str) -> NewDomain {
    NewDomain {
        owner_id: owner.to_string(),
        name: name.to_string(),
        registrar: Some("Example Registrar".to_string()),
        expires_at: Some(Utc::now() + Duration::days(200)),
        monitoring_enabled: true,
    }
}

fn uptime(is_up: bool, at: chrono::DateTime<Utc>) -> UptimeCheckResult {
    UptimeCheckResult {
        is_up,
        response_time_ms: Some(if is_up { 180 } else { 10_000 }),
        status_code: is_up.then_some(200),
        error_message: (!is_up).then(|| "HTTP request timeout: operation timed out".to_string()),
        checked_at: at,
    }
}

fn timing(total: u64) -> PerformanceTiming {
    PerformanceTiming {
        response_time_ms: total,
        ttfb_ms: total / 2,
        dns_lookup_ms: 5,
        connect_ms: 10,
        tls_handshake_ms: 20,
        content_transfer_ms: total - total / 2,
        estimated: false,
    }
}

async fn stores() -> Vec<(&'static str, Box<dyn DomainStore>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        (
            "sqlite",
            Box::new(SqliteStore::in_memory().await.expect("sqlite store")),
        ),
    ]
}

#[tokio::test]
async fn test_insert_and_get_domain() {
    for (label, store) in stores().await {
        let created = store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect(label);
        assert_eq!(created.name, "example.com", "{label}");
        assert_eq!(created.ssl_status, SslStatus::Unknown, "{label}");
        assert!(created.health_score.is_none(), "{label}");

        let fetched = store.get_domain(created.id).await.expect(label);
        assert_eq!(fetched.owner_id, "alice", "{label}");
        assert_eq!(fetched.registrar.as_deref(), Some("Example Registrar"), "{label}");
        // Millisecond storage precision
        assert_eq!(
            fetched.created_at.timestamp_millis(),
            created.created_at.timestamp_millis(),
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_duplicate_domain_per_owner_is_rejected() {
    for (label, store) in stores().await {
        store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect(label);
        let err = store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect_err(label);
        assert!(
            matches!(err, DatabaseError::DuplicateDomain { .. }),
            "{label}: {err}"
        );
        // Another owner may track the same name
        store
            .insert_domain(new_domain("bob", "example.com"))
            .await
            .expect(label);
        assert_eq!(store.domains_for_owner("alice").await.expect(label).len(), 1);
        assert_eq!(store.list_domains().await.expect(label).len(), 2);
    }
}

#[tokio::test]
async fn test_missing_domain_errors() {
    for (label, store) in stores().await {
        assert!(
            matches!(store.get_domain(99).await, Err(DatabaseError::DomainNotFound(99))),
            "{label}"
        );
        assert!(
            matches!(store.delete_domain(99).await, Err(DatabaseError::DomainNotFound(99))),
            "{label}"
        );
        assert!(
            matches!(
                store.record_uptime_check(99, &uptime(true, Utc::now())).await,
                Err(DatabaseError::DomainNotFound(99))
            ),
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_staleness_selection() {
    for (label, store) in stores().await {
        let fresh = store
            .insert_domain(new_domain("alice", "fresh.com"))
            .await
            .expect(label);
        let mut no_registrar = new_domain("alice", "bare.com");
        no_registrar.registrar = None;
        let bare = store.insert_domain(no_registrar).await.expect(label);
        let placeholder = store
            .insert_domain(new_domain("alice", "placeholder.com"))
            .await
            .expect(label);
        store
            .update_whois(placeholder.id, UNKNOWN_REGISTRAR, Utc::now())
            .await
            .expect(label);

        let cutoff = Utc::now() - Duration::hours(24);
        let whois: Vec<i64> = store
            .domains_needing_whois(cutoff)
            .await
            .expect(label)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(whois, vec![bare.id, placeholder.id], "{label}");

        // Everything written before a future cutoff is stale
        let all = store
            .domains_needing_whois(Utc::now() + Duration::hours(1))
            .await
            .expect(label);
        assert_eq!(all.len(), 3, "{label}");

        // SSL: never checked, then checked
        assert_eq!(store.domains_needing_ssl(cutoff).await.expect(label).len(), 3);
        store
            .update_ssl(
                fresh.id,
                &SslUpdate {
                    checked_at: Utc::now(),
                    status: SslStatus::Valid,
                    expires_at: Some(Utc::now() + Duration::days(60)),
                    issuer: Some("CN=Test CA".to_string()),
                },
            )
            .await
            .expect(label);
        let ssl: Vec<i64> = store
            .domains_needing_ssl(cutoff)
            .await
            .expect(label)
            .iter()
            .map(|d| d.id)
            .collect();
        assert!(!ssl.contains(&fresh.id), "{label}");
        assert_eq!(ssl.len(), 2, "{label}");
    }
}

#[tokio::test]
async fn test_failed_ssl_update_keeps_previous_expiry() {
    for (label, store) in stores().await {
        let domain = store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect(label);
        let expiry = Utc::now() + Duration::days(60);
        store
            .update_ssl(
                domain.id,
                &SslUpdate {
                    checked_at: Utc::now(),
                    status: SslStatus::Valid,
                    expires_at: Some(expiry),
                    issuer: Some("CN=Test CA".to_string()),
                },
            )
            .await
            .expect(label);
        let failed_at = Utc::now();
        store
            .update_ssl(
                domain.id,
                &SslUpdate {
                    checked_at: failed_at,
                    status: SslStatus::Error,
                    expires_at: None,
                    issuer: None,
                },
            )
            .await
            .expect(label);

        let stored = store.get_domain(domain.id).await.expect(label);
        assert_eq!(stored.ssl_status, SslStatus::Error, "{label}");
        assert_eq!(
            stored.ssl_last_checked.map(|t| t.timestamp_millis()),
            Some(failed_at.timestamp_millis()),
            "{label}"
        );
        assert_eq!(
            stored.ssl_expires_at.map(|t| t.timestamp_millis()),
            Some(expiry.timestamp_millis()),
            "{label}"
        );
        assert_eq!(stored.ssl_issuer.as_deref(), Some("CN=Test CA"), "{label}");
    }
}

#[tokio::test]
async fn test_monitored_domains_and_health_score() {
    for (label, store) in stores().await {
        let watched = store
            .insert_domain(new_domain("alice", "watched.com"))
            .await
            .expect(label);
        let mut quiet = new_domain("alice", "quiet.com");
        quiet.monitoring_enabled = false;
        store.insert_domain(quiet).await.expect(label);

        let monitored = store.monitored_domains().await.expect(label);
        assert_eq!(monitored.len(), 1, "{label}");
        assert_eq!(monitored[0].id, watched.id, "{label}");

        let at = Utc::now();
        store
            .update_health_score(watched.id, 87.0, at)
            .await
            .expect(label);
        let stored = store.get_domain(watched.id).await.expect(label);
        assert_eq!(stored.health_score, Some(87.0), "{label}");
        assert_eq!(
            stored.last_health_check.map(|t| t.timestamp_millis()),
            Some(at.timestamp_millis()),
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_uptime_history_window_and_order() {
    for (label, store) in stores().await {
        let domain = store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect(label);
        let now = Utc::now();
        for (days_ago, is_up) in [(10, true), (3, false), (1, true)] {
            store
                .record_uptime_check(domain.id, &uptime(is_up, now - Duration::days(days_ago)))
                .await
                .expect(label);
        }

        let week = store
            .uptime_checks_since(domain.id, now - Duration::days(7))
            .await
            .expect(label);
        assert_eq!(week.len(), 2, "{label}");
        assert!(!week[0].is_up, "{label}");
        assert!(week[1].is_up, "{label}");
        assert_eq!(week[1].status_code, Some(200), "{label}");
        assert_eq!(week[0].response_time_ms, Some(10_000), "{label}");
    }
}

#[tokio::test]
async fn test_delete_cascades_to_checks() {
    for (label, store) in stores().await {
        let doomed = store
            .insert_domain(new_domain("alice", "doomed.com"))
            .await
            .expect(label);
        let kept = store
            .insert_domain(new_domain("alice", "kept.com"))
            .await
            .expect(label);
        let now = Utc::now();
        for id in [doomed.id, kept.id] {
            store
                .record_uptime_check(id, &uptime(true, now))
                .await
                .expect(label);
            store
                .record_performance_metric(id, now, &timing(400))
                .await
                .expect(label);
        }

        store.delete_domain(doomed.id).await.expect(label);
        let since = now - Duration::days(1);
        assert!(store
            .uptime_checks_since(doomed.id, since)
            .await
            .expect(label)
            .is_empty());
        assert!(store
            .performance_metrics_since(doomed.id, since)
            .await
            .expect(label)
            .is_empty());
        assert_eq!(
            store.uptime_checks_since(kept.id, since).await.expect(label).len(),
            1,
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_prune_history() {
    for (label, store) in stores().await {
        let domain = store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect(label);
        let now = Utc::now();
        store
            .record_uptime_check(domain.id, &uptime(true, now - Duration::days(120)))
            .await
            .expect(label);
        store
            .record_uptime_check(domain.id, &uptime(true, now - Duration::days(2)))
            .await
            .expect(label);
        store
            .record_performance_metric(domain.id, now - Duration::days(100), &timing(900))
            .await
            .expect(label);

        let removed = store
            .prune_history(now - Duration::days(90))
            .await
            .expect(label);
        assert_eq!(removed, 2, "{label}");
        let remaining = store
            .uptime_checks_since(domain.id, now - Duration::days(365))
            .await
            .expect(label);
        assert_eq!(remaining.len(), 1, "{label}");
    }
}

#[tokio::test]
async fn test_performance_metric_round_trip_keeps_estimate_flag() {
    for (label, store) in stores().await {
        let domain = store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect(label);
        let mut estimated = timing(1000);
        estimated.estimated = true;
        let stored = store
            .record_performance_metric(domain.id, Utc::now(), &estimated)
            .await
            .expect(label);
        assert_eq!(stored.timing, estimated, "{label}");
    }
}

#[tokio::test]
async fn test_sqlite_store_persists_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("monitor.db");

    let id = {
        let store = SqliteStore::open(&path).await.expect("open");
        store
            .insert_domain(new_domain("alice", "example.com"))
            .await
            .expect("insert")
            .id
    };

    let reopened = SqliteStore::open(&path).await.expect("reopen");
    let domain = reopened.get_domain(id).await.expect("persisted");
    assert_eq!(domain.name, "example.com");
}
