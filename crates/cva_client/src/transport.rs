//! Transport capability.
//!
//! Everything that talks to the platform goes through [`Transport`], so the
//! job client, calculator and portfolio loader can run against the real
//! HTTP stack or a scripted fake.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

/// HTTP method of an endpoint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST with a JSON body
    Post,
}

impl FromStr for Method {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(TransportError::InvalidResponse(format!(
                "Unsupported method: {other}"
            ))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A request to a platform endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRequest {
    /// HTTP method
    pub method: Method,
    /// Relative path or absolute URL
    pub url: String,
    /// JSON body for POST
    pub body: Option<Value>,
}

impl EndpointRequest {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    /// Creates a POST request with a JSON body.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// A response from a platform endpoint.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// JSON body; non-JSON bodies are kept as a string value
    pub body: Value,
}

impl EndpointResponse {
    /// Creates a response without headers.
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body rendered as text for error messages.
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Capability to exchange one request/response with the platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and returns the raw response, whatever its status.
    async fn send(&self, request: EndpointRequest) -> Result<EndpointResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: EndpointRequest) -> Result<EndpointResponse, TransportError> {
        (**self).send(request).await
    }
}
