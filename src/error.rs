use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Missing BuildingInfo API credentials")]
    MissingCredentials,

    #[error("Upstream returned HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Upstream request timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected API response format: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    ValidatorError(#[from] validator::ValidationErrors),
}

impl AppError {
    /// Whether retrying the same outbound request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Timeout(_) => true,
            AppError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string(), "DATABASE_ERROR")
            }
            AppError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string(), "DATABASE_ERROR")
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_ERROR")
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, msg.clone(), "NOT_FOUND")
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, msg.clone(), "CONFLICT")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), "INTERNAL_ERROR")
            }
            AppError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded".to_string(), "RATE_LIMIT_EXCEEDED")
            }
            AppError::MissingCredentials => {
                tracing::error!("BuildingInfo API credentials are not configured");
                (StatusCode::SERVICE_UNAVAILABLE, "Planning data source is not configured".to_string(), "MISSING_CREDENTIALS")
            }
            AppError::UpstreamStatus { status, message } => {
                tracing::error!("Upstream error {}: {}", status, message);
                (StatusCode::BAD_GATEWAY, "External service error".to_string(), "UPSTREAM_ERROR")
            }
            AppError::Timeout(ms) => {
                tracing::warn!("Upstream timeout after {} ms", ms);
                (StatusCode::GATEWAY_TIMEOUT, "External service timed out".to_string(), "UPSTREAM_TIMEOUT")
            }
            AppError::UnexpectedResponse(msg) => {
                tracing::error!("Unexpected API response format: {}", msg);
                (StatusCode::BAD_GATEWAY, "Unexpected API response format".to_string(), "UNEXPECTED_RESPONSE")
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string(), "SERIALIZATION_ERROR")
            }
            AppError::Request(e) => {
                tracing::error!("Request error: {}", e);
                (StatusCode::BAD_GATEWAY, "External service error".to_string(), "REQUEST_ERROR")
            }
            AppError::ValidatorError(e) => {
                let validation_errors = e
                    .field_errors()
                    .iter()
                    .map(|(field, errors)| {
                        (
                            field.to_string(),
                            errors
                                .iter()
                                .map(|e| {
                                    e.message
                                        .as_ref()
                                        .map(|m| m.to_string())
                                        .unwrap_or_else(|| e.code.to_string())
                                })
                                .collect::<Vec<_>>(),
                        )
                    })
                    .collect::<std::collections::HashMap<String, Vec<String>>>();

                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status": "error",
                        "code": "VALIDATION_ERROR",
                        "message": "Validation failed",
                        "details": validation_errors
                    })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({
            "status": "error",
            "code": error_code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn conflict(msg: &str) -> Self {
        Self::Conflict(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AppError::Timeout(1000).is_transient());
        assert!(AppError::UpstreamStatus { status: 503, message: String::new() }.is_transient());
        assert!(AppError::UpstreamStatus { status: 429, message: String::new() }.is_transient());
        assert!(!AppError::UpstreamStatus { status: 404, message: String::new() }.is_transient());
        assert!(!AppError::UnexpectedResponse("rows".into()).is_transient());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::validation("bad").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("Project").into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("dup").into_response().status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Timeout(5).into_response().status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::UnexpectedResponse("x".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
