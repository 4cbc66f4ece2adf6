//! Logger initialization.
//!
//! Plain output is meant for an operator watching `serve`; JSON lines are
//! meant for shipping scheduler and probe logs to a collector.

use std::io::Write;

use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

const CRATE_TARGET: &str = "domain_monitor";

/// Ceilings for dependencies that are noisy at the probe volume we run.
///
/// Down or misconfigured domains produce malformed and truncated DNS answers
/// all the time; hickory copes with them, so its protocol warnings are noise.
const DEPENDENCY_LEVELS: &[(&str, LevelFilter)] = &[
    ("sqlx", LevelFilter::Warn),
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("rustls", LevelFilter::Warn),
    ("tokio_rustls", LevelFilter::Warn),
    ("axum", LevelFilter::Info),
    ("hickory_proto", LevelFilter::Error),
    ("hickory_resolver", LevelFilter::Warn),
];

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first; `level` then overrides it for this crate and
/// sets the default for everything else. Dependencies listed in
/// `DEPENDENCY_LEVELS` are capped regardless.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already
/// installed.
///
/// # Examples
///
/// ```bash
/// # Follow one job's decisions
/// RUST_LOG=domain_monitor::jobs=debug domain_monitor run ssl
///
/// # Structured output from the long-running server
/// domain_monitor serve --log-format json --log-level info
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for (module, ceiling) in DEPENDENCY_LEVELS {
        builder.filter_module(module, (*ceiling).min(level));
    }
    builder.filter_module(CRATE_TARGET, level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = json_line(
                    Utc::now(),
                    record.level(),
                    record.target(),
                    &record.args().to_string(),
                );
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} {} {}",
                    Utc::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                    colored_level(record.level()),
                    short_target(record.target()).cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}

/// Strips the crate prefix so `domain_monitor::jobs::refresh` reads as
/// `jobs::refresh`. Dependency targets are left whole.
fn short_target(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some("") => CRATE_TARGET,
        Some(rest) => rest.strip_prefix("::").unwrap_or(target),
        None => target,
    }
}

fn colored_level(level: Level) -> ColoredString {
    let label = level.as_str();
    match level {
        Level::Error => label.red().bold(),
        Level::Warn => label.yellow(),
        Level::Info => label.green(),
        Level::Debug => label.blue(),
        Level::Trace => label.purple(),
    }
}

/// One JSON object per record: RFC 3339 timestamp, level, module and
/// message.
fn json_line(ts: DateTime<Utc>, level: Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "ts": ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "level": level.as_str(),
        "module": short_target(target),
        "msg": message,
    })
    .to_string()
}
