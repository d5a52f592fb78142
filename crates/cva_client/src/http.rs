//! HTTP transport backed by `reqwest`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{EndpointRequest, EndpointResponse, Method, Transport};

/// Transport for the platform's REST API.
///
/// Relative paths are joined onto the base URL; absolute URLs (as returned in
/// `location` headers) are used as-is. Authentication is limited to attaching
/// a pre-issued bearer token.
pub struct HttpTransport {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given base URL and request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_token: None,
            client,
        })
    }

    /// Creates a transport from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(match &config.api_token {
            Some(token) => transport.with_api_token(token.clone()),
            None => transport,
        })
    }

    /// Attaches a bearer token to every request.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a relative path against the base URL.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: EndpointRequest) -> Result<EndpointResponse, TransportError> {
        let url = self.resolve(&request.url);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.header(CONTENT_TYPE, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let text = response.text().await?;

        debug!(status, url = %url, "Received response");

        Ok(EndpointResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
