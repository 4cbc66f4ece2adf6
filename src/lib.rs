//! domain_monitor library: domain health monitoring
//!
//! This library probes registered domains (DNS records, TLS certificate,
//! HTTP reachability, phase-timed latency and WHOIS registration), caches the
//! results per check kind, scores domain health, and keeps the stored picture
//! fresh with scheduled background jobs.
//!
//! # Example
//!
//! ```no_run
//! use domain_monitor::{Config, JobKind, MonitorService, RegisterOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     db_path: std::path::PathBuf::from("./portfolio.db"),
//!     ..Default::default()
//! };
//!
//! let service = MonitorService::open(&config).await?;
//! service
//!     .register_domain("alice", "example.com", RegisterOptions::default())
//!     .await?;
//!
//! let report = service.trigger_job(JobKind::All).await?;
//! println!(
//!     "{} results: {} succeeded, {} failed",
//!     report.summary.total, report.summary.successful, report.summary.failed
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
mod dns;
mod error_handling;
pub mod health;
pub mod initialization;
pub mod jobs;
pub mod models;
mod performance;
pub mod probe;
pub mod realtime;
pub mod service;
pub mod status_server;
pub mod storage;
mod tls;
mod uptime;
mod utils;
mod whois;

// Re-export public API
pub use cache::{CheckKind, Lookup, ProbeCache, TtlCache};
pub use config::{Config, LogFormat, LogLevel};
pub use dns::{lookup_nameservers, resolve_dns_records};
pub use error_handling::{
    DatabaseError, ErrorType, InitializationError, JobError, ProbeError, ServiceError, WhoisError,
};
pub use health::{compute_health_score, HealthInputs, HealthScore};
pub use jobs::{run_all, run_job, run_scheduler, JobContext, JobKind, JobReport, JobResult};
pub use performance::{estimate_phases, measure_performance};
pub use probe::{NetworkProber, ProbeContext, Prober};
pub use realtime::{get_domain_health_data, DomainHealthData};
pub use service::{ManualCheckReport, MonitorService, RegisterOptions};
pub use storage::{DomainStore, MemoryStore, SqliteStore};
pub use tls::check_tls_certificate;
pub use uptime::{check_uptime, check_url_uptime};
pub use utils::normalize_domain;
pub use whois::{whois_or_fallback, WhoisClient, WhoisData, WhoisRecord};
