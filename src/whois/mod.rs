//! WHOIS lookups through a third-party HTTP API.
//!
//! The service is queried as `GET {url}?domain={domain}` with an optional
//! `X-Api-Key` header. Transient failures are retried with exponential
//! backoff; anything else degrades to fallback values at the call site.

mod parse;
mod types;

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use tokio_retry::RetryIf;

use crate::config::Config;
use crate::error_handling::{describe_reqwest_error, get_retry_strategy, InitializationError, WhoisError};

pub use types::{WhoisData, WhoisRecord};

use parse::convert_response;
use types::WhoisApiResponse;

impl WhoisError {
    /// Network errors, rate limiting and server errors are worth retrying.
    fn is_transient(&self) -> bool {
        match self {
            WhoisError::Request(_) => true,
            WhoisError::Status(code) => *code == 429 || *code >= 500,
            WhoisError::Decode(_) => false,
        }
    }
}

/// Client for the WHOIS HTTP API.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    client: Arc<reqwest::Client>,
    base_url: String,
    api_key: Option<String>,
}

impl WhoisClient {
    /// Builds a client from the library configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> Result<Self, InitializationError> {
        let client = crate::initialization::init_client(config)?;
        Ok(Self::with_client(
            client,
            config.whois_api_url.clone(),
            config.whois_api_key.clone(),
        ))
    }

    /// Builds a client around an existing HTTP client.
    pub fn with_client(
        client: Arc<reqwest::Client>,
        base_url: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    async fn fetch(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        let mut request = self.client.get(&self.base_url).query(&[("domain", domain)]);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WhoisError::Request(describe_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WhoisError::Status(status.as_u16()));
        }

        let body: WhoisApiResponse = response
            .json()
            .await
            .map_err(|e| WhoisError::Decode(e.to_string()))?;
        Ok(convert_response(&body))
    }

    /// Looks up registrar and expiry for a domain.
    ///
    /// # Errors
    ///
    /// Returns the last `WhoisError` once retries are exhausted, or at once
    /// for non-transient failures (4xx, undecodable body).
    pub async fn lookup(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        debug!("WHOIS lookup for {domain}");
        RetryIf::spawn(
            get_retry_strategy(),
            || self.fetch(domain),
            |e: &WhoisError| {
                let transient = e.is_transient();
                if transient {
                    debug!("Retrying WHOIS lookup for {domain}: {e}");
                }
                transient
            },
        )
        .await
    }

    /// Looks up a domain and applies the fallback values for anything the
    /// service could not provide. Never fails.
    pub async fn lookup_or_fallback(&self, domain: &str) -> WhoisData {
        whois_or_fallback(self.lookup(domain).await, domain)
    }
}

/// Turns a lookup outcome into persistable data, logging when fallbacks are
/// used.
pub fn whois_or_fallback(outcome: Result<WhoisRecord, WhoisError>, domain: &str) -> WhoisData {
    let now = Utc::now();
    match outcome {
        Ok(record) => {
            let data = record.or_fallback(now);
            if data.fallback {
                warn!("WHOIS data for {domain} is incomplete, using fallback values");
            }
            data
        }
        Err(e) => {
            warn!("WHOIS lookup failed for {domain}: {e}; using fallback values");
            WhoisData::fallback(now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> WhoisClient {
        WhoisClient::with_client(
            Arc::new(reqwest::Client::new()),
            format!("{}/v1/whois", server.uri()),
            api_key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_lookup_parses_service_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("domain", "example.com"))
            .and(header("X-Api-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain_name": "example.com",
                "registrar": "Example Registrar, Inc.",
                "expiration_date": 1_726_012_800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = client_for(&server, Some("secret"))
            .lookup("example.com")
            .await
            .expect("lookup succeeds");
        assert_eq!(record.registrar.as_deref(), Some("Example Registrar, Inc."));
        assert!(record.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .lookup("example.com")
            .await
            .expect_err("400 must fail");
        assert_eq!(err, WhoisError::Status(400));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1 + crate::config::RETRY_MAX_ATTEMPTS as u64)
            .mount(&server)
            .await;

        let data = client_for(&server, None).lookup_or_fallback("example.com").await;
        assert_eq!(data.registrar, "Unknown Registrar");
        assert!(data.fallback);
    }

    #[tokio::test]
    async fn test_undecodable_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(matches!(
            client.lookup("example.com").await,
            Err(WhoisError::Decode(_))
        ));
        let data = client.lookup_or_fallback("example.com").await;
        let days = (data.expires_at - Utc::now()).num_days();
        assert!((364..=365).contains(&days));
    }

    #[test]
    fn test_transient_classification() {
        assert!(WhoisError::Request("reset".to_string()).is_transient());
        assert!(WhoisError::Status(429).is_transient());
        assert!(WhoisError::Status(502).is_transient());
        assert!(!WhoisError::Status(404).is_transient());
        assert!(!WhoisError::Decode("bad".to_string()).is_transient());
    }
}
