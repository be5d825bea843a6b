//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use teamhub_shared::StoreError;

use crate::tenancy::TenantResolveError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Authentication required")]
    Unauthorized,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Tenancy errors
    #[error("Invalid subdomain: {0}")]
    InvalidSubdomain(#[from] TenantResolveError),
    #[error("Team not found: {0}")]
    TeamNotFound(String),
    #[error("No team for this request")]
    NoTeam,

    // Resource errors
    #[error("Resource not found")]
    NotFound,
    #[error("Resource already exists")]
    Conflict(String),

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Machine-readable error code included in the response body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidSubdomain(_) => "INVALID_SUBDOMAIN",
            ApiError::TeamNotFound(_) => "TEAM_NOT_FOUND",
            ApiError::NoTeam => "NO_TEAM",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_)
            | ApiError::BadRequest(_)
            | ApiError::InvalidSubdomain(_)
            | ApiError::NoTeam => StatusCode::BAD_REQUEST,
            ApiError::TeamNotFound(_) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Validation(msg) | ApiError::BadRequest(msg) | ApiError::Conflict(msg) => {
                msg.clone()
            }
            ApiError::NoTeam => {
                "This endpoint must be called on a team subdomain.".to_string()
            }
            // Never leak storage details to clients
            ApiError::Database(_) => "Database error".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(code) => ApiError::TeamNotFound(code),
            StoreError::CodeTaken(code) => {
                ApiError::Conflict(format!("Team code already in use: {}", code))
            }
            StoreError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ApiError::Database(msg)
            }
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
