//! In-memory `DomainStore`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DomainStore;
use crate::config::UNKNOWN_REGISTRAR;
use crate::error_handling::DatabaseError;
use crate::models::{
    Domain, NewDomain, PerformanceMetric, PerformanceTiming, SslStatus, SslUpdate, UptimeCheck,
    UptimeCheckResult,
};

#[derive(Debug, Default)]
struct State {
    next_domain_id: i64,
    next_check_id: i64,
    domains: BTreeMap<i64, Domain>,
    uptime_checks: Vec<UptimeCheck>,
    performance_metrics: Vec<PerformanceMetric>,
}

impl State {
    fn domain_mut(&mut self, id: i64) -> Result<&mut Domain, DatabaseError> {
        self.domains
            .get_mut(&id)
            .ok_or(DatabaseError::DomainNotFound(id))
    }

    fn filtered(&self, keep: impl Fn(&Domain) -> bool) -> Vec<Domain> {
        self.domains.values().filter(|d| keep(d)).cloned().collect()
    }

    fn next_check_id(&mut self) -> i64 {
        self.next_check_id += 1;
        self.next_check_id
    }
}

/// `DomainStore` kept in process memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DomainStore for MemoryStore {
    async fn list_domains(&self) -> Result<Vec<Domain>, DatabaseError> {
        Ok(self.state().filtered(|_| true))
    }

    async fn get_domain(&self, id: i64) -> Result<Domain, DatabaseError> {
        self.state()
            .domains
            .get(&id)
            .cloned()
            .ok_or(DatabaseError::DomainNotFound(id))
    }

    async fn domains_for_owner(&self, owner_id: &str) -> Result<Vec<Domain>, DatabaseError> {
        Ok(self.state().filtered(|d| d.owner_id == owner_id))
    }

    async fn domains_needing_whois(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Domain>, DatabaseError> {
        Ok(self.state().filtered(|d| {
            d.updated_at < stale_before
                || d.registrar.as_deref().map_or(true, |r| r == UNKNOWN_REGISTRAR)
        }))
    }

    async fn domains_needing_ssl(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Domain>, DatabaseError> {
        Ok(self
            .state()
            .filtered(|d| d.ssl_last_checked.map_or(true, |at| at < stale_before)))
    }

    async fn monitored_domains(&self) -> Result<Vec<Domain>, DatabaseError> {
        Ok(self.state().filtered(|d| d.monitoring_enabled))
    }

    async fn insert_domain(&self, domain: NewDomain) -> Result<Domain, DatabaseError> {
        let mut state = self.state();
        if state
            .domains
            .values()
            .any(|d| d.owner_id == domain.owner_id && d.name == domain.name)
        {
            return Err(DatabaseError::DuplicateDomain {
                owner: domain.owner_id,
                name: domain.name,
            });
        }

        state.next_domain_id += 1;
        let now = Utc::now();
        let created = Domain {
            id: state.next_domain_id,
            owner_id: domain.owner_id,
            name: domain.name,
            registrar: domain.registrar,
            expires_at: domain.expires_at,
            monitoring_enabled: domain.monitoring_enabled,
            last_health_check: None,
            health_score: None,
            ssl_expires_at: None,
            ssl_issuer: None,
            ssl_status: SslStatus::Unknown,
            ssl_last_checked: None,
            created_at: now,
            updated_at: now,
        };
        state.domains.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_whois(
        &self,
        id: i64,
        registrar: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut state = self.state();
        let domain = state.domain_mut(id)?;
        domain.registrar = Some(registrar.to_string());
        domain.expires_at = Some(expires_at);
        domain.updated_at = Utc::now();
        Ok(())
    }

    async fn update_ssl(&self, id: i64, update: &SslUpdate) -> Result<(), DatabaseError> {
        let mut state = self.state();
        let domain = state.domain_mut(id)?;
        domain.ssl_status = update.status;
        domain.ssl_last_checked = Some(update.checked_at);
        if let Some(expires_at) = update.expires_at {
            domain.ssl_expires_at = Some(expires_at);
        }
        if let Some(issuer) = &update.issuer {
            domain.ssl_issuer = Some(issuer.clone());
        }
        Ok(())
    }

    async fn record_uptime_check(
        &self,
        domain_id: i64,
        result: &UptimeCheckResult,
    ) -> Result<UptimeCheck, DatabaseError> {
        let mut state = self.state();
        state.domain_mut(domain_id)?;
        let check = UptimeCheck {
            id: state.next_check_id(),
            domain_id,
            checked_at: result.checked_at,
            is_up: result.is_up,
            response_time_ms: result.response_time_ms,
            status_code: result.status_code,
            error_message: result.error_message.clone(),
        };
        state.uptime_checks.push(check.clone());
        Ok(check)
    }

    async fn record_performance_metric(
        &self,
        domain_id: i64,
        measured_at: DateTime<Utc>,
        timing: &PerformanceTiming,
    ) -> Result<PerformanceMetric, DatabaseError> {
        let mut state = self.state();
        state.domain_mut(domain_id)?;
        let metric = PerformanceMetric {
            id: state.next_check_id(),
            domain_id,
            measured_at,
            timing: timing.clone(),
        };
        state.performance_metrics.push(metric.clone());
        Ok(metric)
    }

    async fn touch_health_check(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.state().domain_mut(id)?.last_health_check = Some(at);
        Ok(())
    }

    async fn uptime_checks_since(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<UptimeCheck>, DatabaseError> {
        let mut checks: Vec<UptimeCheck> = self
            .state()
            .uptime_checks
            .iter()
            .filter(|c| c.domain_id == domain_id && c.checked_at >= since)
            .cloned()
            .collect();
        checks.sort_by_key(|c| (c.checked_at, c.id));
        Ok(checks)
    }

    async fn performance_metrics_since(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<PerformanceMetric>, DatabaseError> {
        let mut metrics: Vec<PerformanceMetric> = self
            .state()
            .performance_metrics
            .iter()
            .filter(|m| m.domain_id == domain_id && m.measured_at >= since)
            .cloned()
            .collect();
        metrics.sort_by_key(|m| (m.measured_at, m.id));
        Ok(metrics)
    }

    async fn update_health_score(
        &self,
        id: i64,
        score: f64,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut state = self.state();
        let domain = state.domain_mut(id)?;
        domain.health_score = Some(score);
        domain.last_health_check = Some(at);
        Ok(())
    }

    async fn delete_domain(&self, id: i64) -> Result<(), DatabaseError> {
        let mut state = self.state();
        if state.domains.remove(&id).is_none() {
            return Err(DatabaseError::DomainNotFound(id));
        }
        state.uptime_checks.retain(|c| c.domain_id != id);
        state.performance_metrics.retain(|m| m.domain_id != id);
        Ok(())
    }

    async fn prune_history(&self, before: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut state = self.state();
        let count = state.uptime_checks.len() + state.performance_metrics.len();
        state.uptime_checks.retain(|c| c.checked_at >= before);
        state.performance_metrics.retain(|m| m.measured_at >= before);
        let remaining = state.uptime_checks.len() + state.performance_metrics.len();
        Ok((count - remaining) as u64)
    }
}
