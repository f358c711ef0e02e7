use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::metrics::ERRORS_TOTAL;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(anyhow::Error),

    #[error("Provider authentication failed: {0}")]
    Auth(anyhow::Error),

    #[error("Provider order creation failed: {0}")]
    RemoteOrder(anyhow::Error),

    #[error("Payment capture failed: {0}")]
    Capture(anyhow::Error),

    #[error("Refund failed: {0}")]
    Refund(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl AppError {
    /// Label used for the error counter.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidAmount(_) => "invalid_amount",
            AppError::Auth(_) => "provider_auth",
            AppError::RemoteOrder(_) => "provider_order",
            AppError::Capture(_) => "provider_capture",
            AppError::Refund(_) => "provider_refund",
            AppError::Internal(_) => "internal",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();

        let (status, error_message, details) = match self {
            AppError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation error".to_string(),
                Some(err.to_string()),
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::InvalidAmount(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::Auth(err) => (
                StatusCode::BAD_GATEWAY,
                "Provider authentication failed".to_string(),
                Some(err.to_string()),
            ),
            AppError::RemoteOrder(err) => (
                StatusCode::BAD_GATEWAY,
                "Provider order creation failed".to_string(),
                Some(err.to_string()),
            ),
            AppError::Capture(err) => (
                StatusCode::BAD_GATEWAY,
                "Payment capture failed".to_string(),
                Some(err.to_string()),
            ),
            AppError::Refund(err) => (
                StatusCode::BAD_GATEWAY,
                "Refund failed".to_string(),
                Some(err.to_string()),
            ),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(format!("{:#}", err)),
            ),
            AppError::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Config(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
