//! Request document sent to the valuation adjustment service.
//!
//! Field names follow the service's JSON contract (camelCase); the structure
//! is fixed, only the list contents vary between requests.

use cva_core::Instrument;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output sections requested from the service.
pub const REQUEST_OUTPUTS: [&str; 3] = ["Headers", "Data", "MarketData"];

/// Result columns requested from the service, in output order.
pub const REQUEST_FIELDS: [&str; 10] = [
    "CsaTag",
    "BilateralCvaInReportCcy",
    "BilateralDvaInReportCcy",
    "UnilateralCvaInReportCcy",
    "UnilateralDvaInReportCcy",
    "MarketValueInReportCcyArray",
    "Exposure",
    "PotentialFutureExposure",
    "Allocations",
    "ErrorMessage",
];

/// Complete request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDocument {
    /// Output sections
    pub outputs: Vec<String>,
    /// Result columns
    pub fields: Vec<String>,
    /// One collateral agreement per retained counterparty
    pub csas: Vec<CsaDescriptor>,
    /// Filtered instrument universe
    pub universe: Vec<Instrument>,
    /// Serialised pricing parameters
    pub pricing_parameters: Map<String, Value>,
    /// Reference entity to market data assignments
    pub market_data_assignments: MarketDataAssignments,
    /// Credit curves per reference entity
    pub market_data: MarketData,
}

impl RequestDocument {
    /// Converts the document to a JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Collateral support agreement descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsaDescriptor {
    /// Counterparty name, matched by instrument `csaTag`
    pub csa_tag: String,
    /// Organisation id of the counterparty
    pub reference_entity: String,
    /// Collateral currency
    pub collateral_ccy: String,
    /// Counterparty recovery rate in percent
    pub counterparty_recovery_rate_percent: f64,
    /// Whether posted collateral is modelled
    pub use_collateral: bool,
}

/// Market data assignments section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDataAssignments {
    /// Credit assignments
    pub credit: CreditAssignments,
}

/// Credit assignments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAssignments {
    /// Default probability source per reference entity
    pub default_probability: Vec<DefaultProbabilityAssignment>,
}

/// Maps a reference entity to an assignment tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultProbabilityAssignment {
    /// Assignment key
    pub key: AssignmentKey,
    /// Tag of the credit curve used for the entity
    pub assignment_tag: String,
}

impl DefaultProbabilityAssignment {
    /// Creates an assignment.
    pub fn new(reference_entity: impl Into<String>, assignment_tag: impl Into<String>) -> Self {
        Self {
            key: AssignmentKey {
                reference_entity: reference_entity.into(),
            },
            assignment_tag: assignment_tag.into(),
        }
    }
}

/// Assignment key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentKey {
    /// Reference entity
    pub reference_entity: String,
}

/// Market data section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    /// Credit curves
    pub credit_curves: Vec<CreditCurve>,
}

/// Credit curve entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCurve {
    /// Tag linking the curve to assignments
    pub assignment_tag: String,
    /// Curve source
    pub curve_definition: CurveDefinition,
    /// Curve parameters
    pub curve_parameters: CurveParameters,
}

/// Credit curve source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveDefinition {
    /// Curve identifier
    pub reference_entity: String,
    /// Kind of identifier (e.g. `ChainRic`)
    pub reference_entity_type: String,
}

/// Credit curve parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveParameters {
    /// Recovery rate in percent
    pub recovery_rate_percent: f64,
}
