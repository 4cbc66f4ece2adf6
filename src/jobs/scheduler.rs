//! Interval scheduling of the job kinds.

use std::time::Duration;

use log::{error, info};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{run_job, JobContext, JobKind};
use crate::config::{
    HEALTH_JOB_INTERVAL, RETENTION_JOB_INTERVAL, SSL_JOB_INTERVAL, UPTIME_JOB_INTERVAL,
    WHOIS_JOB_INTERVAL,
};

async fn run_every(ctx: &JobContext, kind: JobKind, period: Duration, cancel: &CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // A run in progress is finished before cancellation is observed
                if let Err(e) = run_job(ctx, kind).await {
                    error!("Scheduled {kind} job failed: {e}");
                }
            }
        }
    }
    info!("{kind} schedule stopped");
}

/// Runs every job kind on its own interval, first run immediately, until
/// `cancel` fires. Kinds run independently of each other.
pub async fn run_scheduler(ctx: JobContext, cancel: CancellationToken) {
    info!("Job scheduler started");
    tokio::join!(
        run_every(&ctx, JobKind::Whois, WHOIS_JOB_INTERVAL, &cancel),
        run_every(&ctx, JobKind::Ssl, SSL_JOB_INTERVAL, &cancel),
        run_every(&ctx, JobKind::Uptime, UPTIME_JOB_INTERVAL, &cancel),
        run_every(&ctx, JobKind::Health, HEALTH_JOB_INTERVAL, &cancel),
        run_every(&ctx, JobKind::Retention, RETENTION_JOB_INTERVAL, &cancel),
    );
    info!("Job scheduler stopped");
}
