//! Error categorization and retry strategy.
//!
//! This module provides functions to categorize errors and configure retry strategies.

use std::error::Error as StdError;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::ErrorType;

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Growth: multiplied by `RETRY_FACTOR` each retry
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
/// - Maximum retries: `RETRY_MAX_ATTEMPTS`
///
/// `ExponentialBackoff` yields `factor * base^n` starting at `n = 1`, so the
/// growth rate goes in `base` and the initial delay is divided by it.
///
/// Only the WHOIS API client retries. Probes never retry: a failed probe is a
/// data point, and retrying would hide flapping hosts.
pub fn get_retry_strategy() -> impl Iterator<Item = Duration> {
    use crate::config::{
        RETRY_FACTOR, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_SECS,
    };

    ExponentialBackoff::from_millis(RETRY_FACTOR)
        .factor(RETRY_INITIAL_DELAY_MS / RETRY_FACTOR)
        .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
        .take(RETRY_MAX_ATTEMPTS)
}

/// Categorizes a `reqwest::Error` into an `ErrorType`.
///
/// # Arguments
///
/// * `error` - The `reqwest::Error` to categorize
///
/// # Returns
///
/// The appropriate `ErrorType` for the error.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorType {
    if error.is_builder() {
        ErrorType::HttpRequestBuilderError
    } else if error.is_redirect() {
        ErrorType::HttpRequestRedirectError
    } else if error.is_timeout() {
        ErrorType::HttpRequestTimeoutError
    } else if error.is_connect() {
        // reqwest reports resolver failures as connect errors; split them out so
        // "domain does not resolve" reads differently from "port closed"
        if root_cause(error).to_lowercase().contains("dns")
            || format!("{error:?}").contains("ResolveError")
        {
            ErrorType::DnsLookupError
        } else {
            ErrorType::HttpRequestConnectError
        }
    } else if error.is_body() {
        ErrorType::HttpRequestBodyError
    } else if error.is_decode() {
        ErrorType::HttpRequestDecodeError
    } else {
        ErrorType::HttpRequestOtherError
    }
}

/// Builds the operator-facing failure reason for a `reqwest::Error`.
///
/// Combines the failure category with the innermost cause, e.g.
/// `"Connection error: Connection refused (os error 111)"`.
pub fn describe_reqwest_error(error: &reqwest::Error) -> String {
    let category = categorize_reqwest_error(error);
    format!("{}: {}", category, root_cause(error))
}

/// Returns the message of the deepest error in the `source()` chain.
fn root_cause(error: &(dyn StdError + 'static)) -> String {
    let mut current: &(dyn StdError + 'static) = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
