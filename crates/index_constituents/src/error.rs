//! Error types for constituent change parsing.

use thiserror::Error;

/// Failure to read constituent change events.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChangeError {
    /// A required column is absent from the change table
    #[error("Change table has no {0} column")]
    MissingColumn(&'static str),

    /// A cell could not be read
    #[error("Row {row}: invalid {column}: {value}")]
    InvalidCell {
        /// Zero-based row index
        row: usize,
        /// Column name
        column: &'static str,
        /// Offending cell rendered as text
        value: String,
    },

    /// The change kind is neither Joiner nor Leaver
    #[error("Unknown change kind: {0}")]
    UnknownKind(String),
}
