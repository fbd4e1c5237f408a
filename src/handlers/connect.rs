use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::connect::{ConnectRequest, ConnectResponse},
    services::connect as connect_service,
    state::AppState,
};

/// Handles `POST /api/angel_connect`.
///
/// The body is read raw so that malformed JSON is reported as a missing
/// field (400) instead of the extractor's own rejection. An unreadable or
/// oversized body gets the same JSON error shape.
#[axum::debug_handler]
pub async fn connect(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("❌ Unreadable connect body: {}", rejection);
            let error = AppError::Validation(format!(
                "Invalid request body: {}",
                rejection.body_text()
            ));
            state.diagnostics.record_error(&error).await;
            return error.into_response();
        }
    };

    let request = ConnectRequest::from_body(&body);
    tracing::info!("🔐 Connect attempt for client {:?}", request.clientcode.trim());

    match connect_service::connect(&state, request).await {
        Ok(outcome) => {
            let payload = ConnectResponse::from(outcome);
            match sonic_rs::to_string(&payload) {
                Ok(body) => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
                    body,
                )
                    .into_response(),
                Err(e) => {
                    AppError::Internal(format!("Response serialization failed: {}", e))
                        .into_response()
                }
            }
        }
        Err(e) => {
            state.diagnostics.record_error(&e).await;
            e.into_response()
        }
    }
}

/// Handles `OPTIONS /api/angel_connect` for clients that preflight without CORS headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
