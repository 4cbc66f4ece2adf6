//! HTTP uptime probe.
//!
//! A domain is up when any HTTP response arrives, whatever its status: a 503
//! still proves the host answers. Only network-level failures (DNS, refused
//! connection, TLS, timeout) count as down.

use std::time::Instant;

use chrono::Utc;
use log::debug;

use crate::error_handling::describe_reqwest_error;
use crate::models::UptimeCheckResult;
use crate::utils::elapsed_ms;
use crate::utils::sanitize::sanitize_and_truncate_error_message;

/// Probes `https://{domain}` with a GET request.
///
/// Latency is measured from request start to response headers; the body is
/// not read. The client's timeout bounds the call.
///
/// # Arguments
///
/// * `client` - Client built by `init_probe_client` (redirects disabled)
/// * `domain` - Hostname to probe
pub async fn check_uptime(client: &reqwest::Client, domain: &str) -> UptimeCheckResult {
    check_url_uptime(client, &format!("https://{domain}")).await
}

/// Probes an arbitrary URL. `check_uptime` is this with `https://{domain}`.
pub async fn check_url_uptime(client: &reqwest::Client, url: &str) -> UptimeCheckResult {
    let start = Instant::now();
    let outcome = client.get(url).send().await;
    let response_time_ms = elapsed_ms(start);

    match outcome {
        Ok(response) => {
            let status = response.status();
            debug!("{url} answered {status} in {response_time_ms}ms");
            UptimeCheckResult {
                is_up: true,
                response_time_ms: Some(response_time_ms),
                status_code: Some(status.as_u16()),
                error_message: None,
                checked_at: Utc::now(),
            }
        }
        Err(e) => {
            let message = describe_reqwest_error(&e);
            debug!("{url} is down after {response_time_ms}ms: {message}");
            UptimeCheckResult {
                is_up: false,
                // Elapsed time until failure is kept for diagnostics
                response_time_ms: Some(response_time_ms),
                status_code: None,
                error_message: Some(sanitize_and_truncate_error_message(&message)),
                checked_at: Utc::now(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .expect("client")
    }

    #[tokio::test]
    async fn test_success_status_is_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = check_url_uptime(&client(Duration::from_secs(5)), &server.uri()).await;
        assert!(result.is_up);
        assert_eq!(result.status_code, Some(200));
        assert!(result.response_time_ms.is_some());
        assert!(result.error_message.is_none());
    }

    #[tokio::test]
    async fn test_server_error_status_still_counts_as_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = check_url_uptime(&client(Duration::from_secs(5)), &server.uri()).await;
        assert!(result.is_up);
        assert_eq!(result.status_code, Some(503));
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", "https://elsewhere.invalid/"),
            )
            .mount(&server)
            .await;

        let result = check_url_uptime(&client(Duration::from_secs(5)), &server.uri()).await;
        assert!(result.is_up);
        assert_eq!(result.status_code, Some(301));
    }

    #[tokio::test]
    async fn test_closed_port_is_down_with_reason_and_elapsed_time() {
        let result =
            check_url_uptime(&client(Duration::from_secs(5)), "http://127.0.0.1:1/").await;
        assert!(!result.is_up);
        assert!(result.status_code.is_none());
        assert!(result.response_time_ms.is_some());
        let message = result.error_message.expect("failure reason");
        assert!(!message.is_empty());
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let result =
            check_url_uptime(&client(Duration::from_millis(200)), &server.uri()).await;
        assert!(!result.is_up);
        let elapsed = result.response_time_ms.expect("elapsed time");
        assert!(elapsed >= 150 && elapsed < 3_000);
        assert!(result
            .error_message
            .expect("failure reason")
            .contains("timeout"));
    }
}
