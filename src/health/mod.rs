//! Health scoring.
//!
//! A pure weighted composite of uptime, response time and certificate
//! headroom. With certificate data the weights are 40/30/30; without it the
//! SSL weight is dropped and the rest becomes uptime 70 / performance 30.

use serde::{Deserialize, Serialize};

use crate::models::UptimeCheck;

const UPTIME_WEIGHT: f64 = 0.4;
const PERFORMANCE_WEIGHT: f64 = 0.3;
const SSL_WEIGHT: f64 = 0.3;
const UPTIME_WEIGHT_WITHOUT_SSL: f64 = 0.7;

/// Observations a score is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInputs {
    /// Percentage of successful checks, 0–100
    pub uptime_pct: f64,
    /// Mean response time in milliseconds; `None` when no request got a
    /// response, which scores performance 0
    pub avg_response_ms: Option<f64>,
    /// Days until certificate expiry; `None` when unknown
    pub ssl_days_remaining: Option<i64>,
    /// Share of failed checks, 0–1. Reported only; not weighted.
    pub error_rate: f64,
}

/// Composite score and its components, each 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    /// Weighted composite, rounded
    pub overall: u8,
    /// Uptime percentage, clamped
    pub uptime: f64,
    /// Response-time band score
    pub performance: f64,
    /// `None` when no certificate data was available
    pub ssl: Option<f64>,
    /// Share of failed checks, echoed from the inputs
    pub error_rate: f64,
}

/// Maps an average response time onto a 0–100 score.
pub fn performance_score(avg_response_ms: f64) -> f64 {
    match avg_response_ms {
        ms if ms <= 500.0 => 100.0,
        ms if ms <= 1000.0 => 85.0,
        ms if ms <= 2000.0 => 70.0,
        ms if ms <= 3000.0 => 50.0,
        ms if ms <= 5000.0 => 30.0,
        _ => 0.0,
    }
}

/// Maps days until certificate expiry onto a 0–100 score.
pub fn ssl_score(days_remaining: i64) -> f64 {
    match days_remaining {
        d if d < 0 => 0.0,
        d if d < 7 => 20.0,
        d if d < 30 => 60.0,
        d if d < 90 => 80.0,
        _ => 100.0,
    }
}

/// Computes the health score.
///
/// Out-of-range inputs are clamped: uptime to [0, 100]; a NaN uptime or
/// response time scores 0.
pub fn compute_health_score(inputs: HealthInputs) -> HealthScore {
    let uptime = if inputs.uptime_pct.is_nan() {
        0.0
    } else {
        inputs.uptime_pct.clamp(0.0, 100.0)
    };
    let performance = match inputs.avg_response_ms {
        Some(ms) if !ms.is_nan() => performance_score(ms),
        _ => 0.0,
    };
    let ssl = inputs.ssl_days_remaining.map(ssl_score);

    let weighted = match ssl {
        Some(ssl) => uptime * UPTIME_WEIGHT + performance * PERFORMANCE_WEIGHT + ssl * SSL_WEIGHT,
        None => uptime * UPTIME_WEIGHT_WITHOUT_SSL + performance * PERFORMANCE_WEIGHT,
    };

    HealthScore {
        // Clamped to [0, 100] first, so the cast cannot truncate
        overall: weighted.round().clamp(0.0, 100.0) as u8,
        uptime,
        performance,
        ssl,
        error_rate: inputs.error_rate,
    }
}

/// Percentage of checks that were up. An empty history scores 0.
pub fn uptime_percentage(checks: &[UptimeCheck]) -> f64 {
    if checks.is_empty() {
        return 0.0;
    }
    let up = checks.iter().filter(|check| check.is_up).count();
    up as f64 * 100.0 / checks.len() as f64
}

/// Mean of the populated response times, failed checks included with their
/// elapsed time to failure. `None` unless at least one check was up.
pub fn average_response_ms(checks: &[UptimeCheck]) -> Option<f64> {
    if !checks.iter().any(|check| check.is_up) {
        return None;
    }
    let times: Vec<u64> = checks
        .iter()
        .filter_map(|check| check.response_time_ms)
        .collect();
    if times.is_empty() {
        return None;
    }
    Some(times.iter().sum::<u64>() as f64 / times.len() as f64)
}

/// Share of checks that were down, 0–1.
pub fn error_rate(checks: &[UptimeCheck]) -> f64 {
    if checks.is_empty() {
        return 0.0;
    }
    1.0 - uptime_percentage(checks) / 100.0
}

/// Builds score inputs from an uptime history and the stored SSL state.
pub fn inputs_from_history(checks: &[UptimeCheck], ssl_days_remaining: Option<i64>) -> HealthInputs {
    HealthInputs {
        uptime_pct: uptime_percentage(checks),
        avg_response_ms: average_response_ms(checks),
        ssl_days_remaining,
        error_rate: error_rate(checks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn check(is_up: bool, response_time_ms: Option<u64>) -> UptimeCheck {
        UptimeCheck {
            id: 0,
            domain_id: 1,
            checked_at: Utc::now(),
            is_up,
            response_time_ms,
            status_code: is_up.then_some(200),
            error_message: (!is_up).then(|| "Connection error".to_string()),
        }
    }

    fn inputs(uptime_pct: f64, avg_response_ms: f64, ssl_days: Option<i64>) -> HealthInputs {
        HealthInputs {
            uptime_pct,
            avg_response_ms: Some(avg_response_ms),
            ssl_days_remaining: ssl_days,
            error_rate: 0.0,
        }
    }

    #[test]
    fn test_healthy_domain_scores_100() {
        let score = compute_health_score(inputs(100.0, 100.0, Some(365)));
        assert_eq!(score.uptime, 100.0);
        assert_eq!(score.performance, 100.0);
        assert_eq!(score.ssl, Some(100.0));
        assert_eq!(score.overall, 100);
    }

    #[test]
    fn test_dead_domain_scores_0() {
        let score = compute_health_score(HealthInputs {
            uptime_pct: 0.0,
            avg_response_ms: Some(10_000.0),
            ssl_days_remaining: Some(-5),
            error_rate: 1.0,
        });
        assert_eq!(score.uptime, 0.0);
        assert_eq!(score.performance, 0.0);
        assert_eq!(score.ssl, Some(0.0));
        assert_eq!(score.overall, 0);
    }

    #[test]
    fn test_degraded_domain_scores_53() {
        // 0.4 * 50 + 0.3 * 50 + 0.3 * 60
        let score = compute_health_score(inputs(50.0, 2500.0, Some(15)));
        assert_eq!(score.overall, 53);
        assert_eq!(score.performance, 50.0);
        assert_eq!(score.ssl, Some(60.0));
    }

    #[test]
    fn test_missing_ssl_uses_uptime_and_performance_only() {
        // 0.7 * 90 + 0.3 * 100
        let score = compute_health_score(inputs(90.0, 300.0, None));
        assert_eq!(score.overall, 93);
        assert_eq!(score.ssl, None);
    }

    #[test]
    fn test_performance_score_boundaries() {
        assert_eq!(performance_score(0.0), 100.0);
        assert_eq!(performance_score(500.0), 100.0);
        assert_eq!(performance_score(500.1), 85.0);
        assert_eq!(performance_score(1000.0), 85.0);
        assert_eq!(performance_score(2000.0), 70.0);
        assert_eq!(performance_score(3000.0), 50.0);
        assert_eq!(performance_score(5000.0), 30.0);
        assert_eq!(performance_score(5000.1), 0.0);
    }

    #[test]
    fn test_ssl_score_boundaries() {
        assert_eq!(ssl_score(-1), 0.0);
        assert_eq!(ssl_score(0), 20.0);
        assert_eq!(ssl_score(6), 20.0);
        assert_eq!(ssl_score(7), 60.0);
        assert_eq!(ssl_score(29), 60.0);
        assert_eq!(ssl_score(30), 80.0);
        assert_eq!(ssl_score(89), 80.0);
        assert_eq!(ssl_score(90), 100.0);
    }

    #[test]
    fn test_uptime_above_100_is_clamped() {
        let score = compute_health_score(inputs(140.0, 100.0, Some(365)));
        assert_eq!(score.uptime, 100.0);
        assert_eq!(score.overall, 100);
    }

    #[test]
    fn test_history_helpers() {
        let history = vec![
            check(true, Some(200)),
            check(true, Some(400)),
            check(false, Some(3_000)),
            check(true, None),
        ];
        assert_eq!(uptime_percentage(&history), 75.0);
        // (200 + 400 + 3000) / 3: failures count with their elapsed time
        assert_eq!(average_response_ms(&history), Some(1200.0));
        assert!((error_rate(&history) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_always_down_history_scores_0() {
        let history = vec![
            check(false, Some(10_000)),
            check(false, Some(10_000)),
            check(false, Some(10_000)),
        ];
        assert_eq!(average_response_ms(&history), None);

        let score = compute_health_score(inputs_from_history(&history, None));
        assert_eq!(score.performance, 0.0);
        assert_eq!(score.overall, 0);

        let score = compute_health_score(inputs_from_history(&history, Some(-5)));
        assert_eq!(score.overall, 0);
    }

    #[test]
    fn test_fast_failures_do_not_score_as_fast() {
        // Refused connections fail in milliseconds
        let history = vec![check(false, Some(3)), check(false, Some(4))];
        let score = compute_health_score(inputs_from_history(&history, Some(365)));
        assert_eq!(score.performance, 0.0);
        assert_eq!(score.overall, 30);
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(uptime_percentage(&[]), 0.0);
        assert_eq!(average_response_ms(&[]), None);
        assert_eq!(error_rate(&[]), 0.0);
        let score = compute_health_score(inputs_from_history(&[], None));
        assert_eq!(score.performance, 0.0);
        assert_eq!(score.overall, 0);
    }

    #[test]
    fn test_error_rate_is_echoed_without_weight() {
        let mut with_errors = inputs(80.0, 600.0, Some(45));
        with_errors.error_rate = 0.2;
        let a = compute_health_score(with_errors);
        let b = compute_health_score(inputs(80.0, 600.0, Some(45)));
        assert_eq!(a.overall, b.overall);
        assert_eq!(a.error_rate, 0.2);
    }

    proptest! {
        #[test]
        fn prop_overall_within_bounds(
            uptime in -1000.0f64..1000.0,
            avg in 0.0f64..100_000.0,
            ssl in proptest::option::of(-10_000i64..10_000),
            error_rate in 0.0f64..1.0,
        ) {
            let score = compute_health_score(HealthInputs {
                uptime_pct: uptime,
                avg_response_ms: Some(avg),
                ssl_days_remaining: ssl,
                error_rate,
            });
            prop_assert!(score.overall <= 100);
            prop_assert!((0.0..=100.0).contains(&score.uptime));
            prop_assert!((0.0..=100.0).contains(&score.performance));
        }

        #[test]
        fn prop_score_is_deterministic(
            uptime in 0.0f64..100.0,
            avg in 0.0f64..10_000.0,
            ssl in proptest::option::of(-100i64..1000),
        ) {
            let a = compute_health_score(inputs(uptime, avg, ssl));
            let b = compute_health_score(inputs(uptime, avg, ssl));
            prop_assert_eq!(a, b);
        }
    }
}
