//! Domain registration and per-domain handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::super::types::{ApiError, ApiState, RegisterDomainRequest};
use crate::models::Domain;
use crate::service::ManualCheckReport;

/// `GET /owners/{owner}/domains`
pub async fn list_domains_handler(
    State(state): State<ApiState>,
    Path(owner): Path<String>,
) -> Result<Json<Vec<Domain>>, ApiError> {
    Ok(Json(state.service.list_domains(&owner).await?))
}

/// `POST /owners/{owner}/domains`
pub async fn register_domain_handler(
    State(state): State<ApiState>,
    Path(owner): Path<String>,
    Json(request): Json<RegisterDomainRequest>,
) -> Result<(StatusCode, Json<Domain>), ApiError> {
    let domain = state
        .service
        .register_domain(&owner, &request.domain, request.options)
        .await?;
    Ok((StatusCode::CREATED, Json(domain)))
}

/// `POST /domains/{id}/check`
pub async fn check_domain_handler(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<ManualCheckReport>, ApiError> {
    Ok(Json(state.service.manual_check(id).await?))
}

/// `DELETE /domains/{id}`
pub async fn delete_domain_handler(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_domain(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
