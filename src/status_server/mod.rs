//! HTTP API over the monitoring service.
//!
//! Endpoints:
//! - `GET /status` - liveness and cache occupancy
//! - `POST /jobs/{kind}` - run a job kind now and return its report
//! - `GET /health/{domain}` - realtime snapshot of any hostname
//! - `GET|POST /owners/{owner}/domains` - list or register an owner's domains
//! - `POST /owners/{owner}/ssl-check`, `POST /owners/{owner}/uptime-check` - bulk checks
//! - `POST /domains/{id}/check` - manual check of one domain
//! - `DELETE /domains/{id}` - remove a domain and its history

mod handlers;
mod types;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::service::MonitorService;
use handlers::{
    bulk_ssl_handler, bulk_uptime_handler, check_domain_handler, delete_domain_handler,
    health_handler, job_handler, list_domains_handler, register_domain_handler, status_handler,
};
pub use types::{ApiError, ApiState, ErrorBody, RegisterDomainRequest, StatusResponse};

/// Builds the API router.
pub fn router(service: MonitorService) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/jobs/{kind}", post(job_handler))
        .route("/health/{domain}", get(health_handler))
        .route(
            "/owners/{owner}/domains",
            get(list_domains_handler).post(register_domain_handler),
        )
        .route("/owners/{owner}/ssl-check", post(bulk_ssl_handler))
        .route("/owners/{owner}/uptime-check", post(bulk_uptime_handler))
        .route("/domains/{id}/check", post(check_domain_handler))
        .route("/domains/{id}", delete(delete_domain_handler))
        .with_state(ApiState { service })
}

/// Serves the API on an already bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    service: MonitorService,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))?;
    Ok(())
}

/// Binds `127.0.0.1:{port}` and serves the API until `shutdown` fires.
pub async fn start_status_server(
    port: u16,
    service: MonitorService,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind status server to port {}: {}", port, e))?;

    log::info!("API listening on http://127.0.0.1:{}/", port);
    log::info!("  - Status: http://127.0.0.1:{}/status", port);
    log::info!("  - Realtime: http://127.0.0.1:{}/health/{{domain}}", port);

    serve(listener, service, shutdown).await
}
