//! Validation errors for request inputs.
//!
//! Validation errors are the recoverable failure kind of the request
//! pipeline: every variant names the offending instrument, counterparty or
//! field so the caller can repair the input and retry.

use thiserror::Error;

/// Categorised validation failures.
///
/// # Examples
/// ```
/// use cva_core::ValidationError;
///
/// let err = ValidationError::MissingCsaTag { instrument: "IRS-001".to_string() };
/// assert_eq!(err.to_string(), "Instrument IRS-001 does not have a csaTag assigned");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A supported instrument carries no counterparty assignment
    #[error("Instrument {instrument} does not have a csaTag assigned")]
    MissingCsaTag {
        /// Instrument tag
        instrument: String,
    },

    /// Nothing survived universe filtering
    #[error(
        "No valid instruments found for CVA calculation. Ensure that the instruments have a \
         csaTag assigned and the maturity date is not earlier than the valuation date"
    )]
    EmptyUniverse,

    /// A counterparty or entity lacks a parameter required by the request
    #[error(
        "Counterparty {counterparty} is missing required parameter {field}. \
         Enrich the counterparty to add missing parameters"
    )]
    MissingField {
        /// Counterparty or entity name
        counterparty: String,
        /// Missing parameter key
        field: &'static str,
    },

    /// Enrichment targeted an organisation that was never registered
    #[error("Counterparty with org_id {0} does not exist")]
    UnknownCounterparty(String),

    /// A date field could not be read as a calendar date
    #[error("Invalid date for {field}: {value:?}")]
    InvalidDate {
        /// Field description
        field: String,
        /// Raw value
        value: String,
    },

    /// A payload did not have the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl ValidationError {
    /// Create a malformed payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Create an invalid date error
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }
}
