//! Configuration constants.
//!
//! This module defines the design constants of the monitoring pipeline:
//! probe timeouts, cache TTLs per check kind, staleness thresholds used by
//! the background jobs, inter-domain delays and the history retention window.

use std::time::Duration;

/// Default SQLite database file
pub const DB_PATH: &str = "./domain_monitor.db";

// Network operation timeouts
/// DNS query timeout in seconds (per record type)
pub const DNS_TIMEOUT_SECS: u64 = 10;
/// Hard timeout for the TLS certificate probe (connect + handshake + extraction)
pub const TLS_PROBE_TIMEOUT_SECS: u64 = 10;
/// Uptime probe timeout used by background jobs
pub const UPTIME_JOB_TIMEOUT_SECS: u64 = 30;
/// Uptime probe timeout used by interactive checks
pub const UPTIME_REALTIME_TIMEOUT_SECS: u64 = 10;
/// Hard timeout for the phase-timed performance probe
pub const PERFORMANCE_TIMEOUT_SECS: u64 = 15;
/// Timeout for a single call to the WHOIS API
pub const WHOIS_TIMEOUT_SECS: u64 = 10;

/// Maximum bytes read from a response body by the performance probe.
/// The body is only drained to time the transfer, not stored.
pub const MAX_PERFORMANCE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// User-Agent sent by every probe.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; domain_monitor/0.1; +https://github.com/alexwoolford/domain_monitor)";

// Cache TTLs per check kind
/// WHOIS/registrar data changes rarely and the upstream API is rate limited
pub const WHOIS_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Certificate details
pub const SSL_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
/// DNS records and nameservers
pub const DNS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
/// Uptime results served to interactive callers
pub const UPTIME_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

// Staleness thresholds for background refresh
/// Registrar data older than this is refreshed by the WHOIS job
pub const WHOIS_STALE_AFTER_HOURS: i64 = 24;
/// Certificates checked longer ago than this are re-probed by the SSL job
pub const SSL_STALE_AFTER_HOURS: i64 = 6;
/// Window of uptime history the health job scores over
pub const HEALTH_WINDOW_DAYS: i64 = 7;

// Inter-domain delays (rate limiting against third-party services)
/// Pause between WHOIS lookups
pub const WHOIS_JOB_DELAY: Duration = Duration::from_secs(1);
/// Pause between certificate probes
pub const SSL_JOB_DELAY: Duration = Duration::from_secs(2);
/// Pause between uptime probes
pub const UPTIME_JOB_DELAY: Duration = Duration::from_secs(1);

/// Uptime and performance rows older than this are pruned by the retention job
pub const HISTORY_RETENTION_DAYS: i64 = 90;

// WHOIS fallbacks
/// Registrar stored when the WHOIS service gives no registrar
pub const UNKNOWN_REGISTRAR: &str = "Unknown Registrar";
/// Assumed remaining registration when the WHOIS service gives no usable expiry
pub const FALLBACK_EXPIRY_DAYS: i64 = 365;

// Retry strategy (WHOIS API only; probes never retry)
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
/// Maximum number of retries after the initial attempt
pub const RETRY_MAX_ATTEMPTS: usize = 2;

// Scheduler intervals
/// How often the scheduler runs the WHOIS job
pub const WHOIS_JOB_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// How often the scheduler runs the SSL job
pub const SSL_JOB_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// How often the scheduler runs the uptime job
pub const UPTIME_JOB_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// How often the scheduler runs the health job
pub const HEALTH_JOB_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// How often the scheduler prunes old history
pub const RETENTION_JOB_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

// Error message size limit
/// Maximum error message length in characters (2000 chars)
/// Error messages longer than this are truncated with a note about the original length
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;
