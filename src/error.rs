use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed caller input.
    #[error("{0}")]
    Validation(String),

    /// The dashboard PIN did not match.
    #[error("{0}")]
    Auth(String),

    /// A required setting is missing or unusable.
    #[error("{0}")]
    Config(String),

    /// The SmartAPI endpoint could not be reached.
    #[error("SmartAPI request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// SmartAPI answered, but not with a usable login.
    #[error("{0}")]
    Upstream(String),

    /// The session file could not be persisted.
    #[error("{0}")]
    Storage(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Network(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                msg.clone()
            }

            AppError::Auth(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                msg.clone()
            }

            AppError::Config(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                msg.clone()
            }

            AppError::Network(ref e) => {
                tracing::error!("Network error: {}", e);
                self.to_string()
            }

            AppError::Upstream(ref msg) => {
                tracing::warn!("Upstream error: {}", msg);
                msg.clone()
            }

            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                msg.clone()
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "status": "error",
            "message": message
        }))
        .unwrap_or_else(|_| r#"{"status":"error","message":"Internal server error"}"#.to_string());

        (
            status,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
