use std::sync::Arc;

use crate::config::Config;
use crate::services::diagnostics::Diagnostics;
use crate::services::smartapi::SmartApiClient;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// The SmartAPI login client.
    pub smartapi: SmartApiClient,
    /// Flat-file operator logs.
    pub diagnostics: Diagnostics,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let smartapi = SmartApiClient::new(&config)?;
        tracing::info!("✅ SmartAPI client initialized (timeout {:?})", config.upstream_timeout);

        let diagnostics = Diagnostics::new(config.error_log.clone(), config.debug_log.clone());

        Ok(AppState {
            config: Arc::new(config),
            smartapi,
            diagnostics,
        })
    }
}
