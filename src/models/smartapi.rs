use http::StatusCode;
use serde::{Deserialize, Serialize};
use sonic_rs::JsonValueTrait;

use crate::error::{AppError, Result};

/// Body of `loginByPassword`.
#[derive(Serialize, Debug)]
pub struct LoginByPasswordRequest<'a> {
    pub clientcode: &'a str,
    pub password: &'a str,
    pub totp: &'a str,
}

/// The envelope SmartAPI wraps every reply in.
///
/// Fields are kept as raw values: the upstream is loose with types, and a
/// malformed `data` must still be reported as a missing token rather than
/// as a failed login.
#[derive(Deserialize, Debug, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub status: Option<sonic_rs::Value>,
    #[serde(default)]
    pub message: Option<sonic_rs::Value>,
    #[serde(default)]
    pub data: Option<sonic_rs::Value>,
}

impl LoginResponse {
    /// Whether `status` is truthy (`true`, a non-zero number, or a non-empty string other than "0").
    fn succeeded(&self) -> bool {
        let Some(status) = self.status.as_ref() else {
            return false;
        };

        if let Some(flag) = status.as_bool() {
            flag
        } else if let Some(n) = status.as_f64() {
            n != 0.0
        } else if let Some(s) = status.as_str() {
            !s.is_empty() && s != "0"
        } else {
            false
        }
    }

    fn message(&self) -> Option<String> {
        self.message
            .as_ref()
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    /// A token from `data`, accepting strings and integers.
    fn token(&self, key: &str) -> Option<String> {
        let value = self.data.as_ref()?.get(key)?;
        if let Some(s) = value.as_str() {
            Some(s.to_string())
        } else if let Some(n) = value.as_u64() {
            Some(n.to_string())
        } else {
            value.as_i64().map(|n| n.to_string())
        }
    }
}

/// Tokens from a login that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginTokens {
    pub jwt_token: String,
    pub refresh_token: Option<String>,
    pub feed_token: Option<String>,
}

/// An HTTP reply from SmartAPI, not yet interpreted.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamReply {
    /// Validates the reply and extracts the session tokens.
    pub fn into_tokens(self) -> Result<LoginTokens> {
        let parsed = sonic_rs::from_str::<Option<LoginResponse>>(&self.body)
            .ok()
            .flatten();

        let response = match parsed {
            Some(response) if self.status == StatusCode::OK && response.succeeded() => response,
            other => {
                let message = other
                    .and_then(|r| r.message())
                    .unwrap_or_else(|| format!("HTTP {}", self.status.as_u16()));
                return Err(AppError::Upstream(format!(
                    "SmartAPI login failed: {}",
                    message
                )));
            }
        };

        match response.token("jwtToken").filter(|t| !t.is_empty()) {
            Some(jwt_token) => Ok(LoginTokens {
                jwt_token,
                refresh_token: response.token("refreshToken"),
                feed_token: response.token("feedToken"),
            }),
            None => Err(AppError::Upstream(
                "SmartAPI did not return jwtToken".to_string(),
            )),
        }
    }

    /// The first `max_chars` characters of the body, for diagnostics.
    pub fn body_excerpt(&self, max_chars: usize) -> String {
        self.body.chars().take(max_chars).collect()
    }
}
