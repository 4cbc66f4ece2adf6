//! Domain and check-history persistence.
//!
//! Jobs, the realtime aggregator and the service layer talk to storage through
//! the `DomainStore` trait. Two implementations:
//! - `SqliteStore`: SQLite via `sqlx`, the production store
//! - `MemoryStore`: in-process maps, for tests and embedding

mod memory;
mod migrations;
mod pool;
mod sqlite;
#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error_handling::DatabaseError;
use crate::models::{
    Domain, NewDomain, PerformanceMetric, PerformanceTiming, SslUpdate, UptimeCheck,
    UptimeCheckResult,
};

pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use pool::{init_db_pool_with_path, init_memory_pool};
pub use sqlite::SqliteStore;

/// Persistence operations of the monitoring pipeline.
///
/// Lists are ordered by domain id (or by time for check history). Lookups of
/// a missing domain fail with `DatabaseError::DomainNotFound`.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Every domain.
    async fn list_domains(&self) -> Result<Vec<Domain>, DatabaseError>;

    /// One domain by id.
    async fn get_domain(&self, id: i64) -> Result<Domain, DatabaseError>;

    /// Domains registered by one owner.
    async fn domains_for_owner(&self, owner_id: &str) -> Result<Vec<Domain>, DatabaseError>;

    /// Domains whose registrar data was last written before `stale_before`, or
    /// that have no real registrar yet (missing or the fallback placeholder).
    async fn domains_needing_whois(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Domain>, DatabaseError>;

    /// Domains whose certificate was never checked or last checked before
    /// `stale_before`.
    async fn domains_needing_ssl(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Domain>, DatabaseError>;

    /// Domains with monitoring enabled.
    async fn monitored_domains(&self) -> Result<Vec<Domain>, DatabaseError>;

    /// Registers a domain. `created_at` and `updated_at` are set to now.
    ///
    /// Fails with `DatabaseError::DuplicateDomain` when the owner already has
    /// a domain with this name.
    async fn insert_domain(&self, domain: NewDomain) -> Result<Domain, DatabaseError>;

    /// Writes registrar and expiry and resets the WHOIS staleness clock.
    async fn update_whois(
        &self,
        id: i64,
        registrar: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    /// Writes the outcome of an SSL refresh. `expires_at` and `issuer` keep
    /// their previous values when the update carries `None`.
    async fn update_ssl(&self, id: i64, update: &SslUpdate) -> Result<(), DatabaseError>;

    /// Appends an uptime check row.
    async fn record_uptime_check(
        &self,
        domain_id: i64,
        result: &UptimeCheckResult,
    ) -> Result<UptimeCheck, DatabaseError>;

    /// Appends a performance metric row.
    async fn record_performance_metric(
        &self,
        domain_id: i64,
        measured_at: DateTime<Utc>,
        timing: &PerformanceTiming,
    ) -> Result<PerformanceMetric, DatabaseError>;

    /// Sets `last_health_check`.
    async fn touch_health_check(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError>;

    /// Uptime checks of a domain at or after `since`, oldest first.
    async fn uptime_checks_since(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<UptimeCheck>, DatabaseError>;

    /// Performance metrics of a domain at or after `since`, oldest first.
    async fn performance_metrics_since(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<PerformanceMetric>, DatabaseError>;

    /// Writes the overall health score and sets `last_health_check`.
    async fn update_health_score(
        &self,
        id: i64,
        score: f64,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    /// Deletes a domain together with its check history.
    async fn delete_domain(&self, id: i64) -> Result<(), DatabaseError>;

    /// Deletes uptime and performance rows older than `before`. Returns the
    /// number of rows removed.
    async fn prune_history(&self, before: DateTime<Utc>) -> Result<u64, DatabaseError>;
}
