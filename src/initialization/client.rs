//! HTTP client initialization.
//!
//! This module provides functions to initialize HTTP clients with proper
//! configuration for uptime probes and the WHOIS API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Config;

/// Initializes the HTTP client used by uptime probes.
///
/// Redirects are not followed: the probe measures latency to the first
/// response, and a 3xx answer already proves the host is up.
///
/// # Arguments
///
/// * `config` - Configuration containing the user-agent
/// * `timeout` - Hard per-request timeout (10–30s depending on call site)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_probe_client(
    config: &Config,
    timeout: Duration,
) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the HTTP client used for the WHOIS API.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(crate::config::WHOIS_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_clients_with_default_config() {
        let config = Config::default();
        assert!(init_probe_client(&config, Duration::from_secs(10)).is_ok());
        assert!(init_client(&config).is_ok());
    }
}
