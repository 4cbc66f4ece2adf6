//! Health scoring through the public API.

use domain_monitor::{compute_health_score, HealthInputs};
use proptest::prelude::*;

fn inputs(uptime_pct: f64, avg_response_ms: f64, ssl_days: Option<i64>) -> HealthInputs {
    HealthInputs {
        uptime_pct,
        avg_response_ms: Some(avg_response_ms),
        ssl_days_remaining: ssl_days,
        error_rate: 100.0 - uptime_pct.clamp(0.0, 100.0),
    }
}

#[test]
fn test_perfect_domain() {
    let score = compute_health_score(inputs(100.0, 100.0, Some(365)));
    assert_eq!(score.overall, 100);
    assert_eq!(score.ssl, Some(100.0));
}

#[test]
fn test_dead_domain_with_expired_certificate() {
    let score = compute_health_score(inputs(0.0, 10_000.0, Some(-5)));
    assert_eq!(score.overall, 0);
    assert_eq!(score.ssl, Some(0.0));
}

#[test]
fn test_no_certificate_data() {
    let score = compute_health_score(inputs(100.0, 100.0, None));
    assert_eq!(score.overall, 100);
    assert_eq!(score.ssl, None);
}

#[test]
fn test_score_serializes_for_the_api() {
    let score = compute_health_score(inputs(90.0, 1_500.0, Some(20)));
    let json = serde_json::to_value(score).expect("json");
    assert!(json["overall"].is_u64());
    assert!(json.get("errorRate").is_some());
}

proptest! {
    #[test]
    fn prop_overall_never_exceeds_100(
        uptime in -50.0f64..150.0,
        avg in 0.0f64..60_000.0,
        ssl in proptest::option::of(-1_000i64..1_000),
    ) {
        let score = compute_health_score(inputs(uptime, avg, ssl));
        prop_assert!(score.overall <= 100);
    }

    #[test]
    fn prop_more_uptime_never_scores_lower(
        low in 0.0f64..100.0,
        delta in 0.0f64..100.0,
        avg in 0.0f64..10_000.0,
        ssl in proptest::option::of(-30i64..400),
    ) {
        let high = (low + delta).min(100.0);
        let a = compute_health_score(inputs(low, avg, ssl));
        let b = compute_health_score(inputs(high, avg, ssl));
        prop_assert!(b.overall >= a.overall);
    }
}

#[test]
fn test_always_down_history_scores_0() {
    use chrono::Utc;
    use domain_monitor::health::inputs_from_history;
    use domain_monitor::models::UptimeCheck;

    let history: Vec<UptimeCheck> = (0..3)
        .map(|id| UptimeCheck {
            id,
            domain_id: 1,
            checked_at: Utc::now(),
            is_up: false,
            response_time_ms: Some(10_000),
            status_code: None,
            error_message: Some("HTTP request timeout".to_string()),
        })
        .collect();

    let score = compute_health_score(inputs_from_history(&history, Some(-5)));
    assert_eq!(score.performance, 0.0);
    assert_eq!(score.overall, 0);
}
