//! SmartAPI (Angel One) login client.

use anyhow::Context;
use http::{HeaderMap, HeaderName, HeaderValue, header};
use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::smartapi::{LoginByPasswordRequest, UpstreamReply};

/// Path of the password + TOTP login, relative to the SmartAPI base URL.
pub const LOGIN_BY_PASSWORD_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";

/// Thin client around the SmartAPI login endpoint.
#[derive(Clone)]
pub struct SmartApiClient {
    client: Client,
}

impl SmartApiClient {
    /// Builds the client with the identity headers and timeout from `config`.
    ///
    /// Fails if any configured header value is not a valid HTTP header value.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(config.upstream_timeout)
            .build()
            .context("Failed to build SmartAPI HTTP client")?;

        Ok(Self { client })
    }

    /// Calls `loginByPassword`.
    ///
    /// Only transport failures are errors here; the reply is returned as-is
    /// for the caller to log and interpret.
    pub async fn login_by_password(
        &self,
        base_url: &str,
        request: &LoginByPasswordRequest<'_>,
    ) -> Result<UpstreamReply> {
        let url = format!("{}{}", base_url, LOGIN_BY_PASSWORD_PATH);
        let body = sonic_rs::to_string(request)
            .map_err(|e| AppError::Internal(format!("Login body serialization failed: {}", e)))?;

        tracing::debug!(clientcode = %request.clientcode, "🔐 SmartAPI loginByPassword");

        let response = self.client.post(&url).body(body).send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "SmartAPI loginByPassword response");

        Ok(UpstreamReply { status, body })
    }
}

fn default_headers(config: &Config) -> anyhow::Result<HeaderMap> {
    let identity = &config.identity;
    let pairs: [(&'static str, &str); 6] = [
        ("x-usertype", &identity.user_type),
        ("x-sourceid", &identity.source_id),
        ("x-clientlocalip", &identity.local_ip),
        ("x-clientpublicip", &identity.public_ip),
        ("x-macaddress", &identity.mac_address),
        ("x-privatekey", config.api_key.as_str()),
    ];

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in pairs {
        let mut value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {}", name))?;
        if name == "x-privatekey" {
            value.set_sensitive(true);
        }
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok(headers)
}
