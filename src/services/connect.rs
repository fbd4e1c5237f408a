use chrono::Utc;

use crate::crypto::totp;
use crate::error::{AppError, Result};
use crate::models::connect::{ConnectOutcome, ConnectRequest};
use crate::models::session::SessionRecord;
use crate::models::smartapi::LoginByPasswordRequest;
use crate::repositories::session as session_repo;
use crate::state::AppState;
use crate::validation::connect::{validate_connect_request, verify_dashboard_pin};

/// Logs in to SmartAPI on behalf of the dashboard and saves the session.
///
/// Every failure is terminal for the request; nothing is retried. The
/// session file is only touched once SmartAPI has returned a usable token.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The parsed request body.
///
/// # Returns
///
/// Where the session was written and when.
pub async fn connect(state: &AppState, request: ConnectRequest) -> Result<ConnectOutcome> {
    let credentials = validate_connect_request(request)?;
    let config = &state.config;

    verify_dashboard_pin(
        &credentials.pin,
        config.dashboard_pin.as_ref().map(|pin| pin.as_str()),
    )?;

    if config.smartapi_base.is_empty() {
        return Err(AppError::Config("SMARTAPI_BASE not configured".to_string()));
    }
    if config.totp_secret.trim().is_empty() {
        return Err(AppError::Config("TOTP secret is not configured".to_string()));
    }

    let code = totp::generate_current_code(&config.totp_secret)?;

    let reply = state
        .smartapi
        .login_by_password(
            &config.smartapi_base,
            &LoginByPasswordRequest {
                clientcode: &credentials.client_code,
                password: &credentials.pin,
                totp: &code,
            },
        )
        .await?;

    state.diagnostics.record_upstream_reply(&reply).await;

    let tokens = reply.into_tokens()?;
    tracing::info!("✅ SmartAPI login succeeded for {}", credentials.client_code);

    let now = Utc::now();
    let record = SessionRecord::new(tokens, &credentials.client_code, now);

    session_repo::save_session(&config.session_file, &config.web_root, record).await?;
    tracing::info!("✅ Session saved to {}", config.session_file.display());

    session_repo::mark_manual_connect(&config.session_file, now.timestamp()).await;

    Ok(ConnectOutcome {
        session_file: config.session_file.clone(),
        server_ts: Utc::now(),
    })
}
