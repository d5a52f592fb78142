//! Error types for the command line.

use cva_client::{CalculationError, ConfigError, LoaderError, TransportError};
use cva_core::ValidationError;
use index_constituents::ChangeError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file could not be parsed
    #[error("Invalid input file {path}: {reason}")]
    InvalidInput {
        /// File path
        path: String,
        /// Parse failure
        reason: String,
    },

    /// Inputs do not form a valid request
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Calculation failed
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Portfolio could not be loaded
    #[error("Portfolio error: {0}")]
    Loader(#[from] LoaderError),

    /// A command-line argument required by the chosen options is absent
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Transport could not be created
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Constituent changes could not be read
    #[error("Constituent change error: {0}")]
    Changes(#[from] ChangeError),

    /// Output could not be written
    #[error("Output error: {0}")]
    Output(String),

    /// The service answered without running the job
    #[error("Calculation was not accepted: {0}")]
    Rejected(String),
}

impl CliError {
    /// Create an invalid input error
    pub fn invalid_input(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::InvalidInput {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an output error
    pub fn output(msg: impl ToString) -> Self {
        Self::Output(msg.to_string())
    }
}

/// Result alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
