//! Error handling.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, probes, WHOIS and jobs
//! - Failure categorization of HTTP client errors into operator-facing reasons
//! - Retry strategy configuration for the WHOIS API client
//!
//! Probe failures are data, not exceptions: `ProbeError` values are recorded
//! next to successful results and never abort sibling work.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{describe_reqwest_error, get_retry_strategy};
pub use types::{
    DatabaseError, ErrorType, InitializationError, JobError, ProbeError, ServiceError, WhoisError,
};
