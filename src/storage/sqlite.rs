//! SQLite-backed `DomainStore`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::DomainStore;
use crate::config::UNKNOWN_REGISTRAR;
use crate::error_handling::DatabaseError;
use crate::models::{
    Domain, NewDomain, PerformanceMetric, PerformanceTiming, SslStatus, SslUpdate, UptimeCheck,
    UptimeCheckResult,
};

const DOMAIN_COLUMNS: &str = "id, owner_id, name, registrar, expires_at_ms, monitoring_enabled, \
     last_health_check_ms, health_score, ssl_expires_at_ms, ssl_issuer, ssl_status, \
     ssl_last_checked_ms, created_at_ms, updated_at_ms";

const UPTIME_COLUMNS: &str =
    "id, domain_id, checked_at_ms, is_up, response_time_ms, status_code, error_message";

const PERFORMANCE_COLUMNS: &str = "id, domain_id, measured_at_ms, response_time_ms, ttfb_ms, \
     dns_lookup_ms, connect_ms, tls_handshake_ms, content_transfer_ms, estimated";

fn to_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

fn from_ms(ms: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| sqlx::Error::Decode(format!("timestamp out of range: {ms}").into()))
}

fn opt_from_ms(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    ms.map(from_ms).transpose()
}

/// Milliseconds are stored as INTEGER (i64); negative values never occur.
fn to_db_ms(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_ms(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn domain_from_row(row: &SqliteRow) -> Result<Domain, sqlx::Error> {
    let status: String = row.try_get("ssl_status")?;
    Ok(Domain {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        registrar: row.try_get("registrar")?,
        expires_at: opt_from_ms(row.try_get("expires_at_ms")?)?,
        monitoring_enabled: row.try_get("monitoring_enabled")?,
        last_health_check: opt_from_ms(row.try_get("last_health_check_ms")?)?,
        health_score: row.try_get("health_score")?,
        ssl_expires_at: opt_from_ms(row.try_get("ssl_expires_at_ms")?)?,
        ssl_issuer: row.try_get("ssl_issuer")?,
        ssl_status: SslStatus::from_str(&status).unwrap_or_default(),
        ssl_last_checked: opt_from_ms(row.try_get("ssl_last_checked_ms")?)?,
        created_at: from_ms(row.try_get("created_at_ms")?)?,
        updated_at: from_ms(row.try_get("updated_at_ms")?)?,
    })
}

fn uptime_from_row(row: &SqliteRow) -> Result<UptimeCheck, sqlx::Error> {
    let response_time: Option<i64> = row.try_get("response_time_ms")?;
    let status_code: Option<i64> = row.try_get("status_code")?;
    Ok(UptimeCheck {
        id: row.try_get("id")?,
        domain_id: row.try_get("domain_id")?,
        checked_at: from_ms(row.try_get("checked_at_ms")?)?,
        is_up: row.try_get("is_up")?,
        response_time_ms: response_time.map(from_db_ms),
        status_code: status_code.and_then(|code| u16::try_from(code).ok()),
        error_message: row.try_get("error_message")?,
    })
}

fn performance_from_row(row: &SqliteRow) -> Result<PerformanceMetric, sqlx::Error> {
    let ms = |column: &str| -> Result<u64, sqlx::Error> {
        row.try_get::<i64, _>(column).map(from_db_ms)
    };
    Ok(PerformanceMetric {
        id: row.try_get("id")?,
        domain_id: row.try_get("domain_id")?,
        measured_at: from_ms(row.try_get("measured_at_ms")?)?,
        timing: PerformanceTiming {
            response_time_ms: ms("response_time_ms")?,
            ttfb_ms: ms("ttfb_ms")?,
            dns_lookup_ms: ms("dns_lookup_ms")?,
            connect_ms: ms("connect_ms")?,
            tls_handshake_ms: ms("tls_handshake_ms")?,
            content_transfer_ms: ms("content_transfer_ms")?,
            estimated: row.try_get("estimated")?,
        },
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}

/// `DomainStore` over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database file and migrates it.
    pub async fn open(path: &std::path::Path) -> Result<Self, DatabaseError> {
        let pool = super::init_db_pool_with_path(path).await?;
        super::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Opens a migrated in-memory database.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let pool = super::init_memory_pool().await?;
        super::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn select_domains(
        &self,
        filter: &str,
        bind: Option<BindValue<'_>>,
    ) -> Result<Vec<Domain>, DatabaseError> {
        let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains {filter} ORDER BY id");
        let mut query = sqlx::query(&sql);
        query = match bind {
            Some(BindValue::Int(v)) => query.bind(v),
            Some(BindValue::Text(v)) => query.bind(v),
            None => query,
        };
        let rows = query.fetch_all(self.pool.as_ref()).await?;
        Ok(rows
            .iter()
            .map(domain_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Fails with `DomainNotFound` when an UPDATE touched no row.
    fn expect_row(id: i64, rows_affected: u64) -> Result<(), DatabaseError> {
        if rows_affected == 0 {
            Err(DatabaseError::DomainNotFound(id))
        } else {
            Ok(())
        }
    }
}

enum BindValue<'a> {
    Int(i64),
    Text(&'a str),
}

#[async_trait]
impl DomainStore for SqliteStore {
    async fn list_domains(&self) -> Result<Vec<Domain>, DatabaseError> {
        self.select_domains("", None).await
    }

    async fn get_domain(&self, id: i64) -> Result<Domain, DatabaseError> {
        self.select_domains("WHERE id = ?", Some(BindValue::Int(id)))
            .await?
            .into_iter()
            .next()
            .ok_or(DatabaseError::DomainNotFound(id))
    }

    async fn domains_for_owner(&self, owner_id: &str) -> Result<Vec<Domain>, DatabaseError> {
        self.select_domains("WHERE owner_id = ?", Some(BindValue::Text(owner_id)))
            .await
    }

    async fn domains_needing_whois(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Domain>, DatabaseError> {
        let sql = format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains \
             WHERE updated_at_ms < ? OR registrar IS NULL OR registrar = ? \
             ORDER BY id"
        );
        let rows = sqlx::query(&sql)
            .bind(to_ms(stale_before))
            .bind(UNKNOWN_REGISTRAR)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows
            .iter()
            .map(domain_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn domains_needing_ssl(
        &self,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<Domain>, DatabaseError> {
        self.select_domains(
            "WHERE ssl_last_checked_ms IS NULL OR ssl_last_checked_ms < ?",
            Some(BindValue::Int(to_ms(stale_before))),
        )
        .await
    }

    async fn monitored_domains(&self) -> Result<Vec<Domain>, DatabaseError> {
        self.select_domains("WHERE monitoring_enabled = 1", None).await
    }

    async fn insert_domain(&self, domain: NewDomain) -> Result<Domain, DatabaseError> {
        let now = to_ms(Utc::now());
        let result = sqlx::query(
            "INSERT INTO domains (
                owner_id, name, registrar, expires_at_ms, monitoring_enabled,
                ssl_status, created_at_ms, updated_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&domain.owner_id)
        .bind(&domain.name)
        .bind(&domain.registrar)
        .bind(domain.expires_at.map(to_ms))
        .bind(domain.monitoring_enabled)
        .bind(SslStatus::Unknown.to_string())
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                debug!("Inserted domain {} with id {id}", domain.name);
                self.get_domain(id).await
            }
            Err(e) if is_unique_violation(&e) => Err(DatabaseError::DuplicateDomain {
                owner: domain.owner_id,
                name: domain.name,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_whois(
        &self,
        id: i64,
        registrar: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let done = sqlx::query(
            "UPDATE domains SET registrar = ?, expires_at_ms = ?, updated_at_ms = ? WHERE id = ?",
        )
        .bind(registrar)
        .bind(to_ms(expires_at))
        .bind(to_ms(Utc::now()))
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Self::expect_row(id, done.rows_affected())
    }

    async fn update_ssl(&self, id: i64, update: &SslUpdate) -> Result<(), DatabaseError> {
        let done = sqlx::query(
            "UPDATE domains SET
                ssl_status = ?,
                ssl_last_checked_ms = ?,
                ssl_expires_at_ms = COALESCE(?, ssl_expires_at_ms),
                ssl_issuer = COALESCE(?, ssl_issuer)
            WHERE id = ?",
        )
        .bind(update.status.to_string())
        .bind(to_ms(update.checked_at))
        .bind(update.expires_at.map(to_ms))
        .bind(&update.issuer)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Self::expect_row(id, done.rows_affected())
    }

    async fn record_uptime_check(
        &self,
        domain_id: i64,
        result: &UptimeCheckResult,
    ) -> Result<UptimeCheck, DatabaseError> {
        let sql = format!(
            "INSERT INTO uptime_checks (
                domain_id, checked_at_ms, is_up, response_time_ms, status_code, error_message
            ) VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {UPTIME_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(domain_id)
            .bind(to_ms(result.checked_at))
            .bind(result.is_up)
            .bind(result.response_time_ms.map(to_db_ms))
            .bind(result.status_code.map(i64::from))
            .bind(&result.error_message)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_foreign_key_violation() => {
                    DatabaseError::DomainNotFound(domain_id)
                }
                _ => DatabaseError::SqlError(e),
            })?;
        Ok(uptime_from_row(&row)?)
    }

    async fn record_performance_metric(
        &self,
        domain_id: i64,
        measured_at: DateTime<Utc>,
        timing: &PerformanceTiming,
    ) -> Result<PerformanceMetric, DatabaseError> {
        let sql = format!(
            "INSERT INTO performance_metrics (
                domain_id, measured_at_ms, response_time_ms, ttfb_ms, dns_lookup_ms,
                connect_ms, tls_handshake_ms, content_transfer_ms, estimated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {PERFORMANCE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(domain_id)
            .bind(to_ms(measured_at))
            .bind(to_db_ms(timing.response_time_ms))
            .bind(to_db_ms(timing.ttfb_ms))
            .bind(to_db_ms(timing.dns_lookup_ms))
            .bind(to_db_ms(timing.connect_ms))
            .bind(to_db_ms(timing.tls_handshake_ms))
            .bind(to_db_ms(timing.content_transfer_ms))
            .bind(timing.estimated)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_foreign_key_violation() => {
                    DatabaseError::DomainNotFound(domain_id)
                }
                _ => DatabaseError::SqlError(e),
            })?;
        Ok(performance_from_row(&row)?)
    }

    async fn touch_health_check(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let done = sqlx::query("UPDATE domains SET last_health_check_ms = ? WHERE id = ?")
            .bind(to_ms(at))
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Self::expect_row(id, done.rows_affected())
    }

    async fn uptime_checks_since(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<UptimeCheck>, DatabaseError> {
        let sql = format!(
            "SELECT {UPTIME_COLUMNS} FROM uptime_checks
             WHERE domain_id = ? AND checked_at_ms >= ?
             ORDER BY checked_at_ms, id"
        );
        let rows = sqlx::query(&sql)
            .bind(domain_id)
            .bind(to_ms(since))
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows
            .iter()
            .map(uptime_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn performance_metrics_since(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<PerformanceMetric>, DatabaseError> {
        let sql = format!(
            "SELECT {PERFORMANCE_COLUMNS} FROM performance_metrics
             WHERE domain_id = ? AND measured_at_ms >= ?
             ORDER BY measured_at_ms, id"
        );
        let rows = sqlx::query(&sql)
            .bind(domain_id)
            .bind(to_ms(since))
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows
            .iter()
            .map(performance_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn update_health_score(
        &self,
        id: i64,
        score: f64,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let done = sqlx::query(
            "UPDATE domains SET health_score = ?, last_health_check_ms = ? WHERE id = ?",
        )
        .bind(score)
        .bind(to_ms(at))
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Self::expect_row(id, done.rows_affected())
    }

    async fn delete_domain(&self, id: i64) -> Result<(), DatabaseError> {
        let done = sqlx::query("DELETE FROM domains WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Self::expect_row(id, done.rows_affected())
    }

    async fn prune_history(&self, before: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let cutoff = to_ms(before);
        let mut tx = self.pool.begin().await?;
        let uptime = sqlx::query("DELETE FROM uptime_checks WHERE checked_at_ms < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;
        let performance = sqlx::query("DELETE FROM performance_metrics WHERE measured_at_ms < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(uptime.rows_affected() + performance.rows_affected())
    }
}
