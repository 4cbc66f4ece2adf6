//! The per-kind refresh loops.

use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, info, warn};

use super::{JobContext, JobResult};
use crate::cache::Lookup;
use crate::config::{
    HEALTH_WINDOW_DAYS, HISTORY_RETENTION_DAYS, SSL_JOB_DELAY, SSL_STALE_AFTER_HOURS,
    UPTIME_JOB_DELAY, WHOIS_JOB_DELAY, WHOIS_STALE_AFTER_HOURS,
};
use crate::error_handling::{DatabaseError, JobError};
use crate::health::{compute_health_score, inputs_from_history};
use crate::models::{Domain, SslCheckOutcome, SslStatus, SslUpdate};
use crate::probe::ProbeContext;
use crate::whois::whois_or_fallback;

/// Refreshes registrar and expiry of domains not updated in the last 24 h or
/// without a registrar.
///
/// # Errors
///
/// Returns `JobError` if the stale domains cannot be selected.
pub async fn run_whois_job(ctx: &JobContext) -> Result<Vec<JobResult>, JobError> {
    let stale_before = Utc::now() - ChronoDuration::hours(WHOIS_STALE_AFTER_HOURS);
    let domains = ctx.store.domains_needing_whois(stale_before).await?;
    info!("WHOIS job: {} domain(s) to refresh", domains.len());

    let mut results = Vec::with_capacity(domains.len());
    for (index, domain) in domains.iter().enumerate() {
        results.push(refresh_whois(ctx, domain).await);
        ctx.pace(index, domains.len(), WHOIS_JOB_DELAY).await;
    }
    Ok(results)
}

/// A failed lookup never replaces registration data the service reported
/// earlier; fallback values are only written when nothing real is stored.
pub(super) async fn refresh_whois(ctx: &JobContext, domain: &Domain) -> JobResult {
    let outcome = ctx
        .cache
        .whois(ctx.prober.as_ref(), &domain.name, Lookup::Refresh)
        .await;
    let lookup_error = outcome.as_ref().err().map(ToString::to_string);
    if let Some(e) = &lookup_error {
        if domain.has_whois_data() {
            warn!("WHOIS lookup failed for {}: {e}; keeping stored data", domain.name);
            return JobResult {
                error: Some(e.clone()),
                ..JobResult::ok(
                    Some(domain.id),
                    format!("Kept stored WHOIS data for {}", domain.name),
                )
            };
        }
    }
    let data = whois_or_fallback(outcome, &domain.name);

    match ctx
        .store
        .update_whois(domain.id, &data.registrar, data.expires_at)
        .await
    {
        Ok(()) => {
            let message = if data.fallback {
                format!("Stored fallback WHOIS data for {}", domain.name)
            } else {
                format!("Updated WHOIS data for {}", domain.name)
            };
            JobResult {
                error: lookup_error,
                ..JobResult::ok(Some(domain.id), message)
            }
        }
        Err(e) => {
            warn!("Failed to store WHOIS data for {}: {e}", domain.name);
            JobResult::failed(
                Some(domain.id),
                format!("Failed to store WHOIS data for {}", domain.name),
                e.to_string(),
            )
        }
    }
}

/// Re-probes certificates not checked in the last 6 h. The check time is
/// stored even when the probe fails.
///
/// # Errors
///
/// Returns `JobError` if the stale domains cannot be selected.
pub async fn run_ssl_job(ctx: &JobContext) -> Result<Vec<JobResult>, JobError> {
    let stale_before = Utc::now() - ChronoDuration::hours(SSL_STALE_AFTER_HOURS);
    let domains = ctx.store.domains_needing_ssl(stale_before).await?;
    info!("SSL job: {} domain(s) to check", domains.len());

    let mut results = Vec::with_capacity(domains.len());
    for (index, domain) in domains.iter().enumerate() {
        results.push(refresh_ssl(ctx, domain).await);
        ctx.pace(index, domains.len(), SSL_JOB_DELAY).await;
    }
    Ok(results)
}

/// Probes a certificate, bypassing the cache freshness, and stores the
/// outcome. A failed probe is stored as status `Error` with the check time;
/// the previous expiry and issuer are kept.
pub(crate) async fn check_ssl(
    ctx: &JobContext,
    domain: &Domain,
) -> Result<SslCheckOutcome, DatabaseError> {
    let checked_at = Utc::now();
    let (outcome, expires_at) = match ctx
        .cache
        .ssl(ctx.prober.as_ref(), &domain.name, Lookup::Refresh)
        .await
    {
        Ok(cert) => (
            SslCheckOutcome {
                status: cert.status(),
                days_until_expiry: Some(cert.days_until_expiry),
                issuer: Some(cert.issuer),
                error: None,
                checked_at,
            },
            Some(cert.valid_to),
        ),
        Err(e) => {
            warn!("SSL check failed for {} ({}): {e}", domain.name, e.error_type());
            (
                SslCheckOutcome {
                    status: SslStatus::Error,
                    days_until_expiry: None,
                    issuer: None,
                    error: Some(e.to_string()),
                    checked_at,
                },
                None,
            )
        }
    };

    ctx.store
        .update_ssl(
            domain.id,
            &SslUpdate {
                checked_at,
                status: outcome.status,
                expires_at,
                issuer: outcome.issuer.clone(),
            },
        )
        .await?;
    Ok(outcome)
}

async fn refresh_ssl(ctx: &JobContext, domain: &Domain) -> JobResult {
    match check_ssl(ctx, domain).await {
        Ok(SslCheckOutcome {
            error: Some(e), ..
        }) => JobResult::failed(
            Some(domain.id),
            format!("SSL check failed for {}", domain.name),
            e,
        ),
        Ok(outcome) => JobResult::ok(
            Some(domain.id),
            format!("SSL status of {} is {}", domain.name, outcome.status),
        ),
        Err(e) => {
            warn!("Failed to store SSL status for {}: {e}", domain.name);
            JobResult::failed(
                Some(domain.id),
                format!("Failed to store SSL status for {}", domain.name),
                e.to_string(),
            )
        }
    }
}

/// Probes every monitored domain and appends the check to its history.
///
/// # Errors
///
/// Returns `JobError` if the monitored domains cannot be selected.
pub async fn run_uptime_job(ctx: &JobContext) -> Result<Vec<JobResult>, JobError> {
    let domains = ctx.store.monitored_domains().await?;
    info!("Uptime job: {} monitored domain(s)", domains.len());

    let mut results = Vec::with_capacity(domains.len());
    for (index, domain) in domains.iter().enumerate() {
        results.push(record_uptime(ctx, domain).await);
        ctx.pace(index, domains.len(), UPTIME_JOB_DELAY).await;
    }
    Ok(results)
}

async fn record_uptime(ctx: &JobContext, domain: &Domain) -> JobResult {
    let result = ctx
        .prober
        .uptime(&domain.name, ProbeContext::Background)
        .await;
    let checked_at = result.checked_at;

    let stored = match ctx.store.record_uptime_check(domain.id, &result).await {
        Ok(_) => ctx.store.touch_health_check(domain.id, checked_at).await,
        Err(e) => Err(e),
    };
    if let Err(e) = stored {
        warn!("Failed to record uptime check for {}: {e}", domain.name);
        return JobResult::failed(
            Some(domain.id),
            format!("Failed to record uptime check for {}", domain.name),
            e.to_string(),
        );
    }

    if result.is_up {
        debug!("{} is up ({:?} ms)", domain.name, result.response_time_ms);
        JobResult::ok(Some(domain.id), format!("{} is up", domain.name))
    } else {
        JobResult {
            error: result.error_message,
            ..JobResult::ok(Some(domain.id), format!("{} is down", domain.name))
        }
    }
}

/// Scores every domain from its last 7 days of uptime history and its stored
/// certificate expiry.
///
/// # Errors
///
/// Returns `JobError` if the domains cannot be listed.
pub async fn run_health_job(ctx: &JobContext) -> Result<Vec<JobResult>, JobError> {
    let domains = ctx.store.list_domains().await?;
    info!("Health job: scoring {} domain(s)", domains.len());

    let mut results = Vec::with_capacity(domains.len());
    for domain in &domains {
        results.push(score_domain(ctx, domain).await);
    }
    Ok(results)
}

async fn score_domain(ctx: &JobContext, domain: &Domain) -> JobResult {
    let now = Utc::now();
    let since = now - ChronoDuration::days(HEALTH_WINDOW_DAYS);

    let scored = async {
        let checks = ctx.store.uptime_checks_since(domain.id, since).await?;
        let score = compute_health_score(inputs_from_history(
            &checks,
            domain.ssl_days_remaining(now),
        ));
        ctx.store
            .update_health_score(domain.id, f64::from(score.overall), now)
            .await?;
        Ok::<_, DatabaseError>(score)
    }
    .await;

    match scored {
        Ok(score) => JobResult::ok(
            Some(domain.id),
            format!("Health score of {} is {}", domain.name, score.overall),
        ),
        Err(e) => {
            warn!("Failed to score {}: {e}", domain.name);
            JobResult::failed(
                Some(domain.id),
                format!("Failed to score {}", domain.name),
                e.to_string(),
            )
        }
    }
}

/// Deletes check history older than the retention window.
///
/// # Errors
///
/// Returns `JobError` if the delete fails.
pub async fn run_retention_job(ctx: &JobContext) -> Result<Vec<JobResult>, JobError> {
    let before = Utc::now() - ChronoDuration::days(HISTORY_RETENTION_DAYS);
    let removed = ctx.store.prune_history(before).await?;
    info!("Retention job: pruned {removed} history row(s)");
    Ok(vec![JobResult::ok(
        None,
        format!("Pruned {removed} history row(s) older than {HISTORY_RETENTION_DAYS} days"),
    )])
}
