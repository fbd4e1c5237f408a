use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use angel_connect::{config::Config, router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    if config.dashboard_pin.is_none() {
        tracing::warn!("⚠️ DASHBOARD_PIN is not set, every connect request will be rejected");
    }
    if config.smartapi_base.is_empty() || config.totp_secret.is_empty() {
        tracing::warn!("⚠️ SMARTAPI_BASE or SMARTAPI_TOTP_SECRET is not set, connect requests will fail");
    }

    let addr = config.bind_addr;
    let session_file = config.session_file.clone();
    let web_root = config.web_root.clone();

    let state = AppState::new(config)?;
    tracing::info!("✅ AppState initialized");

    let app = router(state);

    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("💾 Session file: {}", session_file.display());
    tracing::info!("🌐 Serving static files from {}", web_root.display());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
