//! Error types for the remote job client.
//!
//! - `TransportError`: a single request/response exchange failed
//! - `JobError`: an accepted job could not be driven to completion
//! - `LoaderError`: portfolio data could not be loaded
//! - `CalculationError`: typed result of a CVA calculation

use std::fmt;

use cva_core::ValidationError;
use thiserror::Error;

/// Failure of a single exchange with the platform.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP layer failed (connection, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a status other than 200/202
    #[error("Error: {status} - {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as text
        body: String,
    },

    /// A required response header was absent
    #[error("Response is missing the {0} header")]
    MissingHeader(&'static str),

    /// The response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Polling phase of an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Polling the status resource
    Status,
    /// Polling the result resource
    Result,
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollPhase::Status => write!(f, "status"),
            PollPhase::Result => write!(f, "result"),
        }
    }
}

/// Failure to drive an accepted job to completion.
#[derive(Debug, Error)]
pub enum JobError {
    /// A polling request failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The retry budget of a phase ran out
    #[error("Job {phase} polling gave up after {attempts} attempts")]
    Timeout {
        /// Phase that ran out of attempts
        phase: PollPhase,
        /// Attempts made
        attempts: u32,
    },

    /// The job failed and no result resource is available
    #[error("Job failed: {0}")]
    Failed(String),

    /// A status or result resource had an unexpected shape
    #[error("Invalid job response: {0}")]
    InvalidResponse(String),
}

/// Failure to load portfolio data.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A platform request failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response had an unexpected shape
    #[error("Invalid portfolio response: {0}")]
    InvalidResponse(String),

    /// An operation needs a portfolio code but none was selected
    #[error("No portfolio selected")]
    NoPortfolioSelected,
}

impl LoaderError {
    /// Create an invalid response error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Typed failure of a CVA calculation.
///
/// Callers can tell input problems (`Validation`) from remote problems
/// (`Transport`, `Job`) and from unexpected result shapes (`Decode`).
#[derive(Debug, Error)]
pub enum CalculationError {
    /// The inputs do not form a valid request
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submission failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Polling failed
    #[error(transparent)]
    Job(#[from] JobError),

    /// The request document could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The result payload could not be read as a table
    #[error("Failed to decode result: {0}")]
    Decode(String),
}

impl CalculationError {
    /// Returns true for input validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, CalculationError::Validation(_))
    }
}
