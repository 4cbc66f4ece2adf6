//! Job, bulk check and realtime handlers.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;

use super::super::types::{ApiError, ApiState, StatusResponse};
use crate::jobs::{JobKind, JobReport};
use crate::models::{SslCheckOutcome, UptimeCheckResult};
use crate::realtime::DomainHealthData;

/// Liveness and cache occupancy
pub async fn status_handler(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        cached_entries: state.service.job_context().cache.len(),
    })
}

/// `POST /jobs/{kind}`
pub async fn job_handler(
    State(state): State<ApiState>,
    Path(kind): Path<JobKind>,
) -> Result<Json<JobReport>, ApiError> {
    Ok(Json(state.service.trigger_job(kind).await?))
}

/// `POST /owners/{owner}/ssl-check`
pub async fn bulk_ssl_handler(
    State(state): State<ApiState>,
    Path(owner): Path<String>,
) -> Result<Json<BTreeMap<String, SslCheckOutcome>>, ApiError> {
    Ok(Json(state.service.bulk_ssl_check(&owner).await?))
}

/// `POST /owners/{owner}/uptime-check`
pub async fn bulk_uptime_handler(
    State(state): State<ApiState>,
    Path(owner): Path<String>,
) -> Result<Json<BTreeMap<String, UptimeCheckResult>>, ApiError> {
    Ok(Json(state.service.bulk_uptime_check(&owner).await?))
}

/// `GET /health/{domain}`
pub async fn health_handler(
    State(state): State<ApiState>,
    Path(domain): Path<String>,
) -> Result<Json<DomainHealthData>, ApiError> {
    Ok(Json(state.service.realtime(&domain).await?))
}
