use chrono::{DateTime, Utc};
use serde::Serialize;
use sonic_rs::JsonValueTrait;
use std::path::PathBuf;

/// The raw connect request as sent by the dashboard.
///
/// Parsing never fails: an unreadable body yields empty fields, which the
/// validation step turns into a 400.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectRequest {
    pub clientcode: String,
    pub pin: String,
}

impl ConnectRequest {
    /// Extracts `clientcode` and `pin` from a JSON body.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(json) = sonic_rs::from_slice::<sonic_rs::Value>(body) else {
            return Self::default();
        };

        Self {
            clientcode: field_as_string(&json, "clientcode"),
            pin: field_as_string(&json, "pin"),
        }
    }
}

/// Reads a string field, accepting integers as their decimal form.
fn field_as_string(json: &sonic_rs::Value, key: &str) -> String {
    let Some(value) = json.get(key) else {
        return String::new();
    };

    if let Some(s) = value.as_str() {
        s.to_string()
    } else if let Some(n) = value.as_u64() {
        n.to_string()
    } else if let Some(n) = value.as_i64() {
        n.to_string()
    } else {
        String::new()
    }
}

/// What a successful connect produced.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub session_file: PathBuf,
    pub server_ts: DateTime<Utc>,
}

/// The success payload returned to the dashboard.
#[derive(Serialize)]
pub struct ConnectResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(rename = "sessionFile")]
    pub session_file: String,
    #[serde(rename = "serverTs")]
    pub server_ts: i64,
}

impl From<ConnectOutcome> for ConnectResponse {
    fn from(outcome: ConnectOutcome) -> Self {
        Self {
            status: "ok",
            message: "Connected to SmartAPI and session saved.".to_string(),
            session_file: outcome.session_file.display().to_string(),
            server_ts: outcome.server_ts.timestamp(),
        }
    }
}
