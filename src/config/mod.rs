//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, cache TTLs, staleness thresholds, delays)
//! - Library configuration and CLI option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Command, Config, LogFormat, LogLevel, Opt, DEFAULT_WHOIS_API_URL};
