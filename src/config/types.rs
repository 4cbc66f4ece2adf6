//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_USER_AGENT, UPTIME_JOB_TIMEOUT_SECS, UPTIME_REALTIME_TIMEOUT_SECS,
};
use crate::jobs::JobKind;

/// Default WHOIS API endpoint. Queried as `GET {url}?domain={domain}`.
pub const DEFAULT_WHOIS_API_URL: &str = "https://api.api-ninjas.com/v1/whois";

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use domain_monitor::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("./portfolio.db"),
///     whois_api_key: Some("secret".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// WHOIS API endpoint
    pub whois_api_url: String,

    /// WHOIS API key, sent as `X-Api-Key` when present
    pub whois_api_key: Option<String>,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Uptime probe timeout for background jobs, in seconds
    pub uptime_timeout_seconds: u64,

    /// Uptime probe timeout for interactive checks, in seconds
    pub realtime_timeout_seconds: u64,

    /// Disable the inter-domain delays of the background jobs
    pub no_job_delays: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            whois_api_url: DEFAULT_WHOIS_API_URL.to_string(),
            whois_api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            uptime_timeout_seconds: UPTIME_JOB_TIMEOUT_SECS,
            realtime_timeout_seconds: UPTIME_REALTIME_TIMEOUT_SECS,
            no_job_delays: false,
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Refresh everything once
/// domain_monitor run all
///
/// # Serve the HTTP surface with the scheduler running in the background
/// domain_monitor serve --port 8080
///
/// # One-off realtime snapshot
/// domain_monitor check example.com
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "domain_monitor",
    about = "Monitors domain health: DNS, TLS certificates, uptime and performance."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, value_parser, default_value = DB_PATH, global = true)]
    pub db_path: PathBuf,

    /// WHOIS API endpoint
    #[arg(long, default_value = DEFAULT_WHOIS_API_URL, global = true)]
    pub whois_api_url: String,

    /// WHOIS API key (falls back to the WHOIS_API_KEY environment variable)
    #[arg(long, global = true)]
    pub whois_api_key: Option<String>,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    /// Uptime probe timeout for background jobs, in seconds
    #[arg(long, default_value_t = UPTIME_JOB_TIMEOUT_SECS, global = true)]
    pub uptime_timeout_seconds: u64,

    /// Skip the inter-domain delays between probes (not recommended against real hosts)
    #[arg(long, global = true)]
    pub no_job_delays: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// What the binary should do.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one job kind (or all of them) once and print the report
    Run {
        /// whois|ssl|uptime|health|retention|all
        job: JobKind,
    },
    /// Serve the HTTP API and run the refresh jobs on their schedule
    Serve {
        /// Port to listen on (127.0.0.1)
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Only serve the API, do not schedule background jobs
        #[arg(long)]
        no_scheduler: bool,
    },
    /// Print a realtime health snapshot for one domain
    Check {
        /// Domain name (a URL is accepted and reduced to its host)
        domain: String,
    },
    /// Register a domain for an owner (initial WHOIS and SSL probe)
    Add {
        /// Domain name
        domain: String,
        /// Owner identifier
        #[arg(long, default_value = "default")]
        owner: String,
        /// Register without uptime monitoring
        #[arg(long)]
        no_monitoring: bool,
    },
}

impl From<&Opt> for Config {
    fn from(opt: &Opt) -> Self {
        Self {
            log_level: opt.log_level.clone(),
            log_format: opt.log_format.clone(),
            db_path: opt.db_path.clone(),
            whois_api_url: opt.whois_api_url.clone(),
            whois_api_key: opt
                .whois_api_key
                .clone()
                .or_else(|| std::env::var("WHOIS_API_KEY").ok()),
            user_agent: opt.user_agent.clone(),
            uptime_timeout_seconds: opt.uptime_timeout_seconds,
            realtime_timeout_seconds: UPTIME_REALTIME_TIMEOUT_SECS,
            no_job_delays: opt.no_job_delays,
        }
    }
}
