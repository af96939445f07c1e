//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_accidents::ReportError;
use domain_claims::ClaimError;
use infra_db::DatabaseError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
            ApiError::Database(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg.clone())
            }
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            ApiError::Upstream(msg) => {
                (StatusCode::BAD_GATEWAY, "upstream_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_constraint_violation() {
            ApiError::Conflict(err.to_string())
        } else {
            ApiError::Database(err.to_string())
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match &err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation(_) => ApiError::Validation(err.to_string()),
            PortError::Conflict(_) => ApiError::Conflict(err.to_string()),
            PortError::Unauthorized(_) => ApiError::Unauthorized,
            PortError::ServiceUnavailable(_)
            | PortError::Connection(_)
            | PortError::Timeout { .. } => ApiError::Upstream(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match &err {
            ClaimError::ClaimNotFound(_) => ApiError::NotFound(err.to_string()),
            ClaimError::NotAssignedAgent(_) => ApiError::Forbidden(err.to_string()),
            ClaimError::InvalidStatusTransition { .. } | ClaimError::AlreadySettled => {
                ApiError::Conflict(err.to_string())
            }
            _ => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match &err {
            ReportError::ReportNotFound(_) => ApiError::NotFound(err.to_string()),
            ReportError::AlreadyVerified(_) => ApiError::Conflict(err.to_string()),
            ReportError::PredictionFailed(_) => ApiError::Upstream(err.to_string()),
            _ => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<domain_users::UserError> for ApiError {
    fn from(err: domain_users::UserError) -> Self {
        use domain_users::UserError;
        match &err {
            UserError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            UserError::EmailTaken(_) | UserError::VehicleNumberTaken(_) => {
                ApiError::Conflict(err.to_string())
            }
            _ => ApiError::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_port_error_maps_to_404() {
        let api_error: ApiError = PortError::not_found("Claim", "x").into();
        assert!(matches!(api_error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_invalid_transition_maps_to_conflict() {
        let api_error: ApiError = ClaimError::InvalidStatusTransition {
            from: "pending".to_string(),
            to: "settled".to_string(),
        }
        .into();
        assert!(matches!(api_error, ApiError::Conflict(_)));
    }
}
