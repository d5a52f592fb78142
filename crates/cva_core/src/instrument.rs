//! Instrument descriptors.
//!
//! Instruments arrive from the platform as translated definitions. The core
//! reads only the type tag, the instrument tag, the maturity and the
//! counterparty (CSA) assignment; everything else is passed through to the
//! request untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::date::parse_calendar_date;
use crate::error::ValidationError;

/// Instrument types the valuation adjustment service does not price.
pub const UNSUPPORTED_INSTRUMENT_TYPES: [&str; 4] = ["FxCross", "FxOption", "TermDeposit", "Repo"];

const UNTAGGED: &str = "<untagged>";

/// An instrument of the portfolio universe.
///
/// # Examples
///
/// ```
/// use cva_core::Instrument;
///
/// let swap = Instrument::new("Swap", "IRS-001")
///     .with_csa_tag("AcmeBank")
///     .with_end_date("2030-06-28");
///
/// assert!(swap.is_supported());
/// assert_eq!(swap.tag(), "IRS-001");
/// assert_eq!(swap.csa_tag(), Some("AcmeBank"));
///
/// let fx = Instrument::new("FxCross", "FX-001");
/// assert!(!fx.is_supported());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Instrument type tag (e.g. `Swap`, `FxCross`)
    pub instrument_type: String,
    /// Definition block; may contain `instrumentTag` and `endDate`
    #[serde(default)]
    pub instrument_definition: Map<String, Value>,
    /// Counterparty assignment, matched against counterparty names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csa_tag: Option<String>,
    /// Remaining fields, passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instrument {
    /// Creates an instrument with a type and instrument tag.
    pub fn new(instrument_type: impl Into<String>, instrument_tag: impl Into<String>) -> Self {
        let mut instrument = Self {
            instrument_type: instrument_type.into(),
            instrument_definition: Map::new(),
            csa_tag: None,
            extra: Map::new(),
        };
        instrument.set_instrument_tag(instrument_tag);
        instrument
    }

    /// Sets the counterparty assignment.
    pub fn with_csa_tag(mut self, csa_tag: impl Into<String>) -> Self {
        self.csa_tag = Some(csa_tag.into());
        self
    }

    /// Sets the maturity date in the definition block.
    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.instrument_definition
            .insert("endDate".into(), Value::from(end_date.into()));
        self
    }

    /// Adds a field to the definition block.
    pub fn with_definition_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.instrument_definition.insert(key.into(), value.into());
        self
    }

    /// Writes the instrument tag into the definition block.
    pub fn set_instrument_tag(&mut self, instrument_tag: impl Into<String>) {
        self.instrument_definition
            .insert("instrumentTag".into(), Value::from(instrument_tag.into()));
    }

    /// Returns the instrument tag, if present.
    pub fn instrument_tag(&self) -> Option<&str> {
        self.instrument_definition
            .get("instrumentTag")
            .and_then(Value::as_str)
    }

    /// Returns the instrument tag for messages, `<untagged>` when absent.
    pub fn tag(&self) -> &str {
        self.instrument_tag().unwrap_or(UNTAGGED)
    }

    /// Returns the counterparty assignment; blank tags count as absent.
    pub fn csa_tag(&self) -> Option<&str> {
        self.csa_tag.as_deref().filter(|tag| !tag.trim().is_empty())
    }

    /// Returns true unless the type is in [`UNSUPPORTED_INSTRUMENT_TYPES`].
    pub fn is_supported(&self) -> bool {
        !UNSUPPORTED_INSTRUMENT_TYPES.contains(&self.instrument_type.as_str())
    }

    /// Returns the maturity date from the definition block.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidDate` when `endDate` is present but is
    /// not a date.
    pub fn end_date(&self) -> Result<Option<NaiveDate>, ValidationError> {
        match self.instrument_definition.get("endDate") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => parse_calendar_date(raw)
                .map(Some)
                .ok_or_else(|| self.invalid_end_date(raw)),
            Some(other) => Err(self.invalid_end_date(&other.to_string())),
        }
    }

    fn invalid_end_date(&self, raw: &str) -> ValidationError {
        ValidationError::invalid_date(format!("endDate of instrument {}", self.tag()), raw)
    }
}
