use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Default upstream timeout for the login call, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 25;

/// Identity headers sent with every SmartAPI request.
#[derive(Clone, Debug)]
pub struct ClientIdentity {
    /// `X-UserType`.
    pub user_type: String,
    /// `X-SourceID`.
    pub source_id: String,
    /// `X-ClientLocalIP`.
    pub local_ip: String,
    /// `X-ClientPublicIP`. The upstream has not been verified to accept an empty value.
    pub public_ip: String,
    /// `X-MACAddress`. Same caveat as `public_ip`.
    pub mac_address: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            user_type: "USER".to_string(),
            source_id: "WEB".to_string(),
            local_ip: "127.0.0.1".to_string(),
            public_ip: String::new(),
            mac_address: String::new(),
        }
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The PIN callers must present. `None` rejects every request.
    pub dashboard_pin: Option<Zeroizing<String>>,
    /// SmartAPI base URL, without a trailing slash. Empty when unset.
    pub smartapi_base: String,
    /// SmartAPI private key (`X-PrivateKey`).
    pub api_key: Zeroizing<String>,
    /// Base32 TOTP shared secret. Empty when unset.
    pub totp_secret: Zeroizing<String>,
    /// Identity headers.
    pub identity: ClientIdentity,
    /// Where the session record is written.
    pub session_file: PathBuf,
    /// Directory served as static files. Session files are never written under it.
    pub web_root: PathBuf,
    /// Allowed CORS origin, `*` for any.
    pub allowed_origin: String,
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Upstream request timeout.
    pub upstream_timeout: Duration,
    /// Append-only error log for operators.
    pub error_log: PathBuf,
    /// Append-only log of raw upstream replies.
    pub debug_log: PathBuf,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn secret_var(name: &str) -> Zeroizing<String> {
    Zeroizing::new(env::var(name).map(|v| v.trim().to_string()).unwrap_or_default())
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Missing SmartAPI settings are not fatal here: they are reported per
    /// request so the dashboard gets a readable error instead of a dead socket.
    pub fn from_env() -> Result<Self> {
        let defaults = ClientIdentity::default();

        let dashboard_pin = env::var("DASHBOARD_PIN")
            .ok()
            .filter(|pin| !pin.is_empty())
            .map(Zeroizing::new);

        let upstream_timeout = Duration::from_secs(
            var_or("SMARTAPI_TIMEOUT_SECS", &DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string())
                .parse()
                .context("Invalid SMARTAPI_TIMEOUT_SECS")?,
        );

        Ok(Self {
            dashboard_pin,
            smartapi_base: normalize_base_url(&var_or("SMARTAPI_BASE", "")),
            api_key: secret_var("SMARTAPI_API_KEY"),
            totp_secret: secret_var("SMARTAPI_TOTP_SECRET"),
            identity: ClientIdentity {
                user_type: var_or("SMARTAPI_USER_TYPE", &defaults.user_type),
                source_id: var_or("SMARTAPI_SOURCE_ID", &defaults.source_id),
                local_ip: var_or("SMARTAPI_LOCAL_IP", &defaults.local_ip),
                public_ip: var_or("SMARTAPI_PUBLIC_IP", &defaults.public_ip),
                mac_address: var_or("SMARTAPI_MAC", &defaults.mac_address),
            },
            session_file: PathBuf::from(var_or(
                "SMARTAPI_SESSION_FILE",
                "storage/smartapi_session.json",
            )),
            web_root: PathBuf::from(var_or("WEB_ROOT", "public")),
            allowed_origin: var_or("APP_DOMAIN", "*"),
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:3000")
                .parse()
                .context("BIND_ADDR must be a socket address such as 127.0.0.1:3000")?,
            upstream_timeout,
            error_log: PathBuf::from(var_or(
                "CONNECT_ERROR_LOG",
                "storage/logs/angel_connect_error.log",
            )),
            debug_log: env::var("CONNECT_DEBUG_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("debug_angel_login.log")),
        })
    }
}

/// Trims whitespace and trailing slashes from a base URL.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        assert_eq!(
            normalize_base_url(" https://apiconnect.angelone.in// "),
            "https://apiconnect.angelone.in"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn identity_defaults_match_web_login() {
        let identity = ClientIdentity::default();
        assert_eq!(identity.user_type, "USER");
        assert_eq!(identity.source_id, "WEB");
        assert_eq!(identity.local_ip, "127.0.0.1");
        assert!(identity.public_ip.is_empty());
        assert!(identity.mac_address.is_empty());
    }
}
