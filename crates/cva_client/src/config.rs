//! Client configuration management
//!
//! Handles loading configuration from TOML files, environment variables and
//! CLI arguments.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::calculator::DEFAULT_CVA_ENDPOINT;
use crate::job::PollPolicy;

/// Environment variable names recognised by [`ClientConfig::apply_env_overrides`].
pub const ENV_BASE_URL: &str = "CVA_BASE_URL";
/// Bearer token
pub const ENV_API_TOKEN: &str = "CVA_API_TOKEN";
/// CVA service endpoint
pub const ENV_ENDPOINT: &str = "CVA_ENDPOINT";
/// Request timeout in seconds
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CVA_REQUEST_TIMEOUT_SECS";
/// Log level
pub const ENV_LOG_LEVEL: &str = "CVA_LOG_LEVEL";
/// Maximum polls per phase
pub const ENV_POLL_MAX_ATTEMPTS: &str = "CVA_POLL_MAX_ATTEMPTS";
/// Initial poll interval in milliseconds
pub const ENV_POLL_INTERVAL_MS: &str = "CVA_POLL_INTERVAL_MS";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown log level
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// A value is out of range or unparseable
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending setting
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The configuration file could not be read or parsed
    #[error("Configuration file error: {0}")]
    FileError(String),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Log levels supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// trace
    Trace,
    /// debug
    Debug,
    /// info
    #[default]
    Info,
    /// warn
    Warn,
    /// error
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Job polling settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay after the first unsuccessful poll
    pub initial_interval_ms: u64,
    /// Growth factor of the delay
    pub backoff_factor: f64,
    /// Upper bound of the delay
    pub max_interval_ms: u64,
    /// Maximum polls per phase
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            initial_interval_ms: policy.initial_interval.as_millis() as u64,
            backoff_factor: policy.backoff_factor,
            max_interval_ms: policy.max_interval.as_millis() as u64,
            max_attempts: policy.max_attempts,
        }
    }
}

impl PollConfig {
    /// Converts to a polling policy.
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            backoff_factor: self.backoff_factor,
            max_interval: Duration::from_millis(self.max_interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

/// Client configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the platform API
    pub base_url: String,
    /// Pre-issued bearer token
    pub api_token: Option<String>,
    /// Path of the CVA job service
    pub cva_endpoint: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Job polling
    pub poll: PollConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_token: None,
            cva_endpoint: DEFAULT_CVA_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            log_level: LogLevel::Info,
            poll: PollConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Override settings from process environment variables
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override settings from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = Some(token).filter(|t| !t.trim().is_empty());
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.cva_endpoint = endpoint;
        }
        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_number(ENV_REQUEST_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(attempts) = lookup(ENV_POLL_MAX_ATTEMPTS) {
            self.poll.max_attempts = parse_number(ENV_POLL_MAX_ATTEMPTS, &attempts)?;
        }
        if let Some(interval) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll.initial_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &interval)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("base_url", "must not be empty"));
        }
        if self.cva_endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("cva_endpoint", "must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be positive"));
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::invalid("poll.max_attempts", "must be positive"));
        }
        if !self.poll.backoff_factor.is_finite() || self.poll.backoff_factor < 1.0 {
            return Err(ConfigError::invalid(
                "poll.backoff_factor",
                format!("must be at least 1.0, got {}", self.poll.backoff_factor),
            ));
        }
        if self.poll.max_interval_ms < self.poll.initial_interval_ms {
            return Err(ConfigError::invalid(
                "poll.max_interval_ms",
                "must not be below poll.initial_interval_ms",
            ));
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(url) = &cli.base_url {
            self.base_url = url.clone();
        }
        if let Some(token) = &cli.api_token {
            self.api_token = Some(token.clone());
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
        if let Some(attempts) = cli.max_attempts {
            self.poll.max_attempts = attempts;
        }
    }
}

fn parse_number<N: FromStr>(field: &'static str, raw: &str) -> Result<N, ConfigError>
where
    N::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: N::Err| ConfigError::invalid(field, format!("{raw:?}: {e}")))
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Base URL override
    pub base_url: Option<String>,
    /// Bearer token override
    pub api_token: Option<String>,
    /// Log level override
    pub log_level: Option<String>,
    /// Poll attempts override
    pub max_attempts: Option<u32>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ClientConfig, ConfigError> {
    build_config_with(cli, |key| std::env::var(key).ok())
}

/// [`build_config`] with an explicit variable lookup
pub fn build_config_with<F>(cli: &CliArgs, lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &cli.config_file {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    config.apply_overrides(lookup)?;
    config.merge_with_cli(cli);
    config.validate()?;

    Ok(config)
}
