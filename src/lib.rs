use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::post,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod totp;
}

pub mod models {
    pub mod connect;
    pub mod session;
    pub mod smartapi;
}

pub mod repositories {
    pub mod session;
}

pub mod storage {
    pub mod atomic;
}

pub mod services {
    pub mod connect;
    pub mod diagnostics;
    pub mod smartapi;
}

pub mod handlers {
    pub mod connect;
}

pub mod validation {
    pub mod connect;
}

use state::AppState;

/// Largest accepted request body. The connect payload is two short strings.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Builds the CORS policy for the configured origin.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = match allowed_origin {
        "*" | "" => AllowOrigin::any(),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("⚠️ APP_DOMAIN {:?} is not a valid origin, allowing any", origin);
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let web_root = state.config.web_root.clone();
    let cors = cors_layer(&state.config.allowed_origin);

    let connect_routes = Router::new()
        .route(
            "/api/angel_connect",
            post(handlers::connect::connect).options(handlers::connect::preflight),
        )
        .with_state(state);

    Router::new()
        .merge(connect_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .fallback_service(ServeDir::new(web_root))
}
