//! Utility functions shared by the probes, jobs and storage.
//!
//! This module provides:
//! - Domain name normalization (user input and URLs down to a bare hostname)
//! - Error message sanitization and truncation before persistence
//! - Millisecond timing helpers

mod domain;
pub mod sanitize;
mod timing;

pub use domain::normalize_domain;
pub use timing::{days_until, duration_to_ms, elapsed_ms};
