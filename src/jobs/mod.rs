//! Background refresh jobs.
//!
//! Each job kind selects its domains from the store, walks them one at a time
//! with a fixed delay in between, and returns one `JobResult` per domain. A
//! failing domain is logged and recorded; the loop moves on. Only a failure
//! to select the domains fails the whole kind.

mod refresh;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use log::{error, info};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::cache::ProbeCache;
use crate::error_handling::JobError;
use crate::probe::Prober;
use crate::storage::DomainStore;

pub use refresh::{
    run_health_job, run_retention_job, run_ssl_job, run_uptime_job, run_whois_job,
};
pub(crate) use refresh::check_ssl;
pub use scheduler::run_scheduler;

/// Job kinds, as accepted on the command line and the HTTP API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobKind {
    /// Registrar and registration expiry
    Whois,
    /// Certificate expiry and status
    Ssl,
    /// Reachability of monitored domains
    Uptime,
    /// Health score from recent history
    Health,
    /// Pruning of old check history
    Retention,
    /// Every kind above, concurrently
    All,
}

/// Outcome of one unit of work inside a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// The unit was processed and persisted
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Domain processed; `None` for work not tied to one domain
    pub domain_id: Option<i64>,
    /// Failure or degradation detail
    pub error: Option<String>,
}

impl JobResult {
    pub(crate) fn ok(domain_id: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            domain_id,
            error: None,
        }
    }

    pub(crate) fn failed(domain_id: Option<i64>, message: impl Into<String>, error: String) -> Self {
        Self {
            success: false,
            message: message.into(),
            domain_id,
            error: Some(error),
        }
    }
}

/// Counts over a job's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    /// Number of results
    pub total: usize,
    /// Results with `success`
    pub successful: usize,
    /// Results without `success`
    pub failed: usize,
}

impl JobSummary {
    /// Tallies a result list.
    pub fn from_results(results: &[JobResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}

/// What a triggered job returns to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    /// Kind that ran
    pub job_type: JobKind,
    /// Counts over `results`
    pub summary: JobSummary,
    /// One entry per unit of work
    pub results: Vec<JobResult>,
}

impl JobReport {
    /// Builds a report and its summary.
    pub fn new(job_type: JobKind, results: Vec<JobResult>) -> Self {
        Self {
            job_type,
            summary: JobSummary::from_results(&results),
            results,
        }
    }
}

/// Shared handles every job runs against.
#[derive(Clone)]
pub struct JobContext {
    /// Persistence
    pub store: Arc<dyn DomainStore>,
    /// Live network checks
    pub prober: Arc<dyn Prober>,
    /// Probe result caches
    pub cache: Arc<ProbeCache>,
    /// Sleep between domains; disabled in tests and with `--no-job-delays`
    pub delays: bool,
}

impl JobContext {
    /// Bundles the handles.
    pub fn new(
        store: Arc<dyn DomainStore>,
        prober: Arc<dyn Prober>,
        cache: Arc<ProbeCache>,
        delays: bool,
    ) -> Self {
        Self {
            store,
            prober,
            cache,
            delays,
        }
    }

    /// Waits `delay` between two domains, unless delays are disabled or
    /// `index` is the last one.
    pub(crate) async fn pace(&self, index: usize, total: usize, delay: Duration) {
        if self.delays && index + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Runs one job kind.
///
/// # Errors
///
/// Returns `JobError` when the domains for the kind cannot be selected. For
/// `JobKind::All` this never happens: a failing kind contributes no results.
pub async fn run_job(ctx: &JobContext, kind: JobKind) -> Result<Vec<JobResult>, JobError> {
    info!("Running {kind} job");
    let results = match kind {
        JobKind::Whois => run_whois_job(ctx).await?,
        JobKind::Ssl => run_ssl_job(ctx).await?,
        JobKind::Uptime => run_uptime_job(ctx).await?,
        JobKind::Health => run_health_job(ctx).await?,
        JobKind::Retention => run_retention_job(ctx).await?,
        JobKind::All => run_all(ctx).await,
    };
    let summary = JobSummary::from_results(&results);
    info!(
        "{kind} job finished: {} total, {} successful, {} failed",
        summary.total, summary.successful, summary.failed
    );
    Ok(results)
}

fn or_empty(kind: JobKind, outcome: Result<Vec<JobResult>, JobError>) -> Vec<JobResult> {
    outcome.unwrap_or_else(|e| {
        error!("{kind} job failed: {e}");
        Vec::new()
    })
}

/// Runs every kind concurrently and concatenates their results.
pub async fn run_all(ctx: &JobContext) -> Vec<JobResult> {
    let (whois, ssl, uptime, health, retention) = tokio::join!(
        run_whois_job(ctx),
        run_ssl_job(ctx),
        run_uptime_job(ctx),
        run_health_job(ctx),
        run_retention_job(ctx),
    );

    let mut results = or_empty(JobKind::Whois, whois);
    results.extend(or_empty(JobKind::Ssl, ssl));
    results.extend(or_empty(JobKind::Uptime, uptime));
    results.extend(or_empty(JobKind::Health, health));
    results.extend(or_empty(JobKind::Retention, retention));
    results
}
