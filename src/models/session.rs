use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::smartapi::LoginTokens;

/// The SmartAPI session persisted for other processes to reuse.
///
/// Written as the sole content of the session file and replaced wholesale
/// on every successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Bearer token for subsequent SmartAPI calls.
    pub jwt_token: String,
    pub refresh_token: Option<String>,
    pub feed_token: Option<String>,
    /// Upper-cased client code that performed the login.
    pub last_login_client_code: String,
    /// Unix seconds.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Builds a record from a validated login reply.
    pub fn new(tokens: LoginTokens, client_code: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            jwt_token: tokens.jwt_token,
            refresh_token: tokens.refresh_token,
            feed_token: tokens.feed_token,
            last_login_client_code: client_code.to_string(),
            created_at,
        }
    }
}
