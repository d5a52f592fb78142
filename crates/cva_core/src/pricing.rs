//! Pricing parameters for a valuation adjustment run.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::date::parse_calendar_date;
use crate::entity::{merge_extensions, Extensions};
use crate::error::ValidationError;

/// Numeraire convention used when none is given.
pub const DEFAULT_NUMERAIRE_TYPE: &str = "TerminalZeroCoupon";

/// Pricing parameters of a calculation.
///
/// The valuation date is compared as a calendar date but sent under
/// `valuationDate` exactly as it was given, so a date-time keeps its time
/// part. Parameters built from a [`NaiveDate`] send `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use cva_core::PricingParameters;
///
/// let params = PricingParameters::parse("2024-06-28", 2000, "MyBank", 40.0, "USD")
///     .unwrap()
///     .with_extension("timeBucketTenors", serde_json::json!(["1Y", "5Y"]));
///
/// let map = params.to_map();
/// assert_eq!(map["valuationDate"], "2024-06-28");
/// assert_eq!(map["numeraireType"], "TerminalZeroCoupon");
/// assert_eq!(map["timeBucketTenors"][1], "5Y");
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingParameters {
    #[serde(deserialize_with = "deserialize_valuation_date")]
    valuation_date: ValuationDate,
    simulation_count: u32,
    self_reference_entity: String,
    self_recovery_rate_percent: f64,
    report_ccy: String,
    #[serde(default = "default_numeraire_type")]
    numeraire_type: String,
    #[serde(flatten, default)]
    extensions: Extensions,
}

#[derive(Clone, Debug, PartialEq)]
struct ValuationDate {
    date: NaiveDate,
    text: String,
}

impl ValuationDate {
    fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        parse_calendar_date(text)
            .map(|date| Self {
                date,
                text: text.to_string(),
            })
            .ok_or_else(|| ValidationError::invalid_date("valuationDate", text))
    }
}

impl From<NaiveDate> for ValuationDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            date,
            text: date.format("%Y-%m-%d").to_string(),
        }
    }
}

fn default_numeraire_type() -> String {
    DEFAULT_NUMERAIRE_TYPE.to_string()
}

fn deserialize_valuation_date<'de, D>(deserializer: D) -> Result<ValuationDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ValuationDate::parse(&s).map_err(serde::de::Error::custom)
}

impl PricingParameters {
    /// Creates pricing parameters from an already-parsed valuation date.
    pub fn new(
        valuation_date: NaiveDate,
        simulation_count: u32,
        self_reference_entity: impl Into<String>,
        self_recovery_rate_percent: f64,
        report_ccy: impl Into<String>,
    ) -> Self {
        Self {
            valuation_date: valuation_date.into(),
            simulation_count,
            self_reference_entity: self_reference_entity.into(),
            self_recovery_rate_percent,
            report_ccy: report_ccy.into(),
            numeraire_type: default_numeraire_type(),
            extensions: Extensions::new(),
        }
    }

    /// Creates pricing parameters from a date string.
    ///
    /// The string is kept for the request; only its date part takes part in
    /// maturity comparisons.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidDate` if `valuation_date` is neither an
    /// ISO date nor an ISO-8601 date-time.
    pub fn parse(
        valuation_date: &str,
        simulation_count: u32,
        self_reference_entity: impl Into<String>,
        self_recovery_rate_percent: f64,
        report_ccy: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let valuation_date = ValuationDate::parse(valuation_date)?;
        Ok(Self {
            valuation_date,
            simulation_count,
            self_reference_entity: self_reference_entity.into(),
            self_recovery_rate_percent,
            report_ccy: report_ccy.into(),
            numeraire_type: default_numeraire_type(),
            extensions: Extensions::new(),
        })
    }

    /// Sets the numeraire convention.
    pub fn with_numeraire_type(mut self, numeraire_type: impl Into<String>) -> Self {
        self.numeraire_type = numeraire_type.into();
        self
    }

    /// Adds an extension field.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Returns the valuation date.
    #[inline]
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date.date
    }

    /// Returns the number of Monte Carlo simulations.
    #[inline]
    pub fn simulation_count(&self) -> u32 {
        self.simulation_count
    }

    /// Returns the report currency.
    #[inline]
    pub fn report_ccy(&self) -> &str {
        &self.report_ccy
    }

    /// Returns the numeraire convention.
    #[inline]
    pub fn numeraire_type(&self) -> &str {
        &self.numeraire_type
    }

    /// Flat key/value view merged with extension fields.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "valuationDate".into(),
            Value::from(self.valuation_date.text.as_str()),
        );
        map.insert("simulationCount".into(), Value::from(self.simulation_count));
        map.insert(
            "selfReferenceEntity".into(),
            Value::from(self.self_reference_entity.as_str()),
        );
        map.insert(
            "selfRecoveryRatePercent".into(),
            Value::from(self.self_recovery_rate_percent),
        );
        map.insert("reportCcy".into(), Value::from(self.report_ccy.as_str()));
        map.insert(
            "numeraireType".into(),
            Value::from(self.numeraire_type.as_str()),
        );
        merge_extensions(map, &self.extensions)
    }
}
