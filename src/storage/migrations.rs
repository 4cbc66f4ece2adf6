//! Database schema management.
//!
//! Timestamps are stored as Unix milliseconds. Check rows reference their
//! domain with `ON DELETE CASCADE`.

use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS domains (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        registrar TEXT,
        expires_at_ms INTEGER,
        monitoring_enabled INTEGER NOT NULL DEFAULT 1,
        last_health_check_ms INTEGER,
        health_score REAL,
        ssl_expires_at_ms INTEGER,
        ssl_issuer TEXT,
        ssl_status TEXT NOT NULL DEFAULT 'unknown',
        ssl_last_checked_ms INTEGER,
        created_at_ms INTEGER NOT NULL,
        updated_at_ms INTEGER NOT NULL,
        UNIQUE (owner_id, name)
    )",
    "CREATE INDEX IF NOT EXISTS idx_domains_owner ON domains (owner_id)",
    "CREATE TABLE IF NOT EXISTS uptime_checks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        domain_id INTEGER NOT NULL REFERENCES domains (id) ON DELETE CASCADE,
        checked_at_ms INTEGER NOT NULL,
        is_up INTEGER NOT NULL,
        response_time_ms INTEGER,
        status_code INTEGER,
        error_message TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_uptime_checks_domain_time
        ON uptime_checks (domain_id, checked_at_ms)",
    "CREATE TABLE IF NOT EXISTS performance_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        domain_id INTEGER NOT NULL REFERENCES domains (id) ON DELETE CASCADE,
        measured_at_ms INTEGER NOT NULL,
        response_time_ms INTEGER NOT NULL,
        ttfb_ms INTEGER NOT NULL,
        dns_lookup_ms INTEGER NOT NULL,
        connect_ms INTEGER NOT NULL,
        tls_handshake_ms INTEGER NOT NULL,
        content_transfer_ms INTEGER NOT NULL,
        estimated INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_performance_metrics_domain_time
        ON performance_metrics (domain_id, measured_at_ms)",
];

/// Creates the tables and indexes if they do not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
