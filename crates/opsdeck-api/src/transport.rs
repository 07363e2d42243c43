// Shared transport configuration for building reqwest::Client instances.
//
// The REST client and the SSE stream share timeout, auth header, and
// user-agent settings through this module.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Request timeout. `None` inherits the platform default (no client
    /// timeout), which the SSE stream requires for long-lived responses.
    pub timeout: Option<Duration>,
    /// Optional bearer token sent as `Authorization` on every request.
    pub bearer_token: Option<SecretString>,
}

impl TransportConfig {
    /// Standard config for REST calls: 30s timeout, optional token.
    pub fn rest(token: Option<SecretString>) -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            bearer_token: token,
        }
    }

    /// Config for the SSE stream: no request timeout, same auth.
    pub fn streaming(&self) -> Self {
        Self {
            timeout: None,
            bearer_token: self.bearer_token.clone(),
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder().user_agent("opsdeck/0.1.0");

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref token) = self.bearer_token {
            let mut headers = HeaderMap::new();
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| {
                    crate::error::Error::ClientBuild(format!("invalid token header value: {e}"))
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }
}
