//! Request, response and error types of the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error_handling::{DatabaseError, ServiceError};
use crate::service::{MonitorService, RegisterOptions};

/// Shared state of the API server
#[derive(Clone)]
pub struct ApiState {
    /// Service every handler delegates to
    pub service: MonitorService,
}

/// Body of `POST /owners/{owner}/domains`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDomainRequest {
    /// Domain name or URL
    pub domain: String,
    /// Monitoring and initial-probe flags
    #[serde(flatten)]
    pub options: RegisterOptions,
}

/// JSON response for `/status`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Always `"ok"` while the server answers
    pub status: String,
    /// Entries across all probe caches, live or expired
    pub cached_entries: usize,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason
    pub error: String,
}

/// A `ServiceError` rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            ServiceError::InvalidDomain(_) => StatusCode::BAD_REQUEST,
            ServiceError::Database(DatabaseError::DomainNotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Database(DatabaseError::DuplicateDomain { .. }) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("API request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
