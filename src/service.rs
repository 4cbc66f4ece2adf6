//! Operations surfaced to callers: triggering jobs, manual and bulk checks,
//! the realtime snapshot and domain registration.
//!
//! The HTTP API in `status_server` is a thin layer over `MonitorService`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::cache::{Lookup, ProbeCache};
use crate::config::{Config, HEALTH_WINDOW_DAYS};
use crate::error_handling::{ProbeError, ServiceError};
use crate::health::{compute_health_score, inputs_from_history, uptime_percentage, HealthScore};
use crate::jobs::{check_ssl, run_job, JobContext, JobKind, JobReport};
use crate::models::{
    Domain, NewDomain, PerformanceMetric, SslCheckOutcome, UptimeCheck, UptimeCheckResult,
};
use crate::probe::{NetworkProber, Prober};
use crate::realtime::{get_domain_health_data, DomainHealthData};
use crate::storage::{DomainStore, SqliteStore};
use crate::utils::normalize_domain;
use crate::whois::whois_or_fallback;

/// Result of a manual check of one registered domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualCheckReport {
    /// The stored uptime check
    pub check: UptimeCheck,
    /// The stored performance metric; `None` when the request failed
    pub performance: Option<PerformanceMetric>,
    /// Score over the last 7 days including this check
    pub score: HealthScore,
    /// Uptime over the last 7 days, 0–100
    pub uptime_percentage: f64,
}

/// Options of a domain registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterOptions {
    /// Include the domain in uptime monitoring
    pub monitoring_enabled: bool,
    /// Probe the certificate right away
    pub check_ssl: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            monitoring_enabled: true,
            check_ssl: true,
        }
    }
}

/// Entry point for every caller-triggered operation.
#[derive(Clone)]
pub struct MonitorService {
    ctx: JobContext,
}

impl MonitorService {
    /// Creates the service over shared handles.
    pub fn new(
        store: Arc<dyn DomainStore>,
        prober: Arc<dyn Prober>,
        cache: Arc<ProbeCache>,
        job_delays: bool,
    ) -> Self {
        Self {
            ctx: JobContext::new(store, prober, cache, job_delays),
        }
    }

    /// Opens the SQLite store at `config.db_path` and builds the network
    /// prober and an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or a
    /// network client cannot be built.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
        let prober = NetworkProber::new(config).context("Failed to initialize probes")?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(prober),
            Arc::new(ProbeCache::new()),
            !config.no_job_delays,
        ))
    }

    /// Handles the background jobs run against.
    pub fn job_context(&self) -> &JobContext {
        &self.ctx
    }

    /// Runs one job kind (or all) and summarizes the results.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Job` when the domains for the kind cannot be
    /// selected.
    pub async fn trigger_job(&self, kind: JobKind) -> Result<JobReport, ServiceError> {
        let results = run_job(&self.ctx, kind).await?;
        Ok(JobReport::new(kind, results))
    }

    /// Probes a registered domain now, stores the uptime check and the
    /// performance metric, and rescores it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Database` when the domain does not exist or the
    /// results cannot be stored.
    pub async fn manual_check(&self, domain_id: i64) -> Result<ManualCheckReport, ServiceError> {
        let domain = self.ctx.store.get_domain(domain_id).await?;
        info!("Manual check of {}", domain.name);

        let (uptime, performance) = tokio::join!(
            self.ctx
                .cache
                .uptime(self.ctx.prober.as_ref(), &domain.name, Lookup::Refresh),
            self.ctx.prober.performance(&domain.name),
        );

        let check = self.ctx.store.record_uptime_check(domain.id, &uptime).await?;
        let performance = match performance {
            Ok(timing) => Some(
                self.ctx
                    .store
                    .record_performance_metric(domain.id, uptime.checked_at, &timing)
                    .await?,
            ),
            Err(e) => {
                warn!("Performance probe failed for {}: {e}", domain.name);
                None
            }
        };

        let now = Utc::now();
        let history = self
            .ctx
            .store
            .uptime_checks_since(domain.id, now - ChronoDuration::days(HEALTH_WINDOW_DAYS))
            .await?;
        let score = compute_health_score(inputs_from_history(
            &history,
            domain.ssl_days_remaining(now),
        ));
        self.ctx
            .store
            .update_health_score(domain.id, f64::from(score.overall), now)
            .await?;

        Ok(ManualCheckReport {
            check,
            performance,
            score,
            uptime_percentage: uptime_percentage(&history),
        })
    }

    /// Re-probes and stores the certificate of every domain of an owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Database` when the owner's domains cannot be
    /// listed or an outcome cannot be stored.
    pub async fn bulk_ssl_check(
        &self,
        owner_id: &str,
    ) -> Result<BTreeMap<String, SslCheckOutcome>, ServiceError> {
        let domains = self.ctx.store.domains_for_owner(owner_id).await?;
        let outcomes = join_all(domains.iter().map(|d| check_ssl(&self.ctx, d))).await;

        let mut report = BTreeMap::new();
        for (domain, outcome) in domains.into_iter().zip(outcomes) {
            report.insert(domain.name, outcome?);
        }
        Ok(report)
    }

    /// Reachability of every domain of an owner, served through the uptime
    /// cache. Nothing is stored; check history belongs to the uptime job.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Database` when the owner's domains cannot be
    /// listed.
    pub async fn bulk_uptime_check(
        &self,
        owner_id: &str,
    ) -> Result<BTreeMap<String, UptimeCheckResult>, ServiceError> {
        let domains = self.ctx.store.domains_for_owner(owner_id).await?;
        let results = join_all(domains.iter().map(|d| {
            self.ctx
                .cache
                .uptime(self.ctx.prober.as_ref(), &d.name, Lookup::Cached)
        }))
        .await;
        Ok(domains
            .into_iter()
            .map(|d| d.name)
            .zip(results)
            .collect())
    }

    /// Realtime snapshot of any hostname, registered or not.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidDomain` for input that is not a hostname.
    pub async fn realtime(&self, domain: &str) -> Result<DomainHealthData, ServiceError> {
        get_domain_health_data(self.ctx.prober.as_ref(), &self.ctx.cache, domain)
            .await
            .map_err(|e| match e {
                ProbeError::InvalidDomain(message) => ServiceError::InvalidDomain(message),
                other => ServiceError::InvalidDomain(other.to_string()),
            })
    }

    /// Registers a domain for an owner: normalizes the name, looks up WHOIS
    /// (falling back to placeholder values when the service fails) and
    /// optionally probes the certificate.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidDomain` for input that is not a
    /// hostname, and `ServiceError::Database` when the owner already has the
    /// domain or it cannot be stored.
    pub async fn register_domain(
        &self,
        owner_id: &str,
        input: &str,
        options: RegisterOptions,
    ) -> Result<Domain, ServiceError> {
        let name = normalize_domain(input).map_err(|e| ServiceError::InvalidDomain(e.to_string()))?;
        self.ctx.cache.invalidate_domain(&name);

        let lookup = self
            .ctx
            .cache
            .whois(self.ctx.prober.as_ref(), &name, Lookup::Refresh)
            .await;
        let whois = whois_or_fallback(lookup, &name);

        let domain = self
            .ctx
            .store
            .insert_domain(NewDomain {
                owner_id: owner_id.to_string(),
                name,
                registrar: Some(whois.registrar),
                expires_at: Some(whois.expires_at),
                monitoring_enabled: options.monitoring_enabled,
            })
            .await?;
        info!("Registered {} for {owner_id}", domain.name);

        if options.check_ssl {
            check_ssl(&self.ctx, &domain).await?;
            return Ok(self.ctx.store.get_domain(domain.id).await?);
        }
        Ok(domain)
    }

    /// Deletes a domain and its history, and drops its cached results.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Database` when the domain does not exist.
    pub async fn delete_domain(&self, domain_id: i64) -> Result<(), ServiceError> {
        let domain = self.ctx.store.get_domain(domain_id).await?;
        self.ctx.store.delete_domain(domain_id).await?;
        self.ctx.cache.invalidate_domain(&domain.name);
        info!("Deleted {} ({domain_id})", domain.name);
        Ok(())
    }

    /// Domains of an owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Database` when the query fails.
    pub async fn list_domains(&self, owner_id: &str) -> Result<Vec<Domain>, ServiceError> {
        Ok(self.ctx.store.domains_for_owner(owner_id).await?)
    }
}
