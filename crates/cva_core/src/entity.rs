//! Credit parameter descriptors for the calculating entity and its
//! counterparties.
//!
//! Both descriptors serialise to a flat key/value mapping using the platform's
//! key names, merged with caller-supplied extension fields. Extension fields
//! win on key collision so callers can override any built-in value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form fields merged into a descriptor at serialisation time.
pub type Extensions = Map<String, Value>;

/// Credit parameters of the calculating party itself.
///
/// # Examples
///
/// ```
/// use cva_core::SelfEntity;
///
/// let entity = SelfEntity::new("MyBank", "USD", 40.0, 40.0, "MyBankCDS=R");
/// let map = entity.to_map();
/// assert_eq!(map["Name"], "MyBank");
/// assert_eq!(map["CurveID"], "MyBankCDS=R");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelfEntity {
    /// Distinguished name, also used as reference entity and assignment tag
    #[serde(rename = "Name")]
    pub name: String,
    /// Collateral currency (ISO code)
    #[serde(rename = "CollateralCurrency")]
    pub collateral_currency: String,
    /// Recovery rate percent on instruments
    #[serde(rename = "RecoveryInstrument")]
    pub recovery_instrument: f64,
    /// Recovery rate percent on deals
    #[serde(rename = "RecoveryDeal")]
    pub recovery_deal: f64,
    /// Credit curve identifier
    #[serde(rename = "CurveID")]
    pub curve_id: String,
    /// Extension fields
    #[serde(flatten, default)]
    pub extensions: Extensions,
}

impl SelfEntity {
    /// Creates a self-entity descriptor without extension fields.
    pub fn new(
        name: impl Into<String>,
        collateral_currency: impl Into<String>,
        recovery_instrument: f64,
        recovery_deal: f64,
        curve_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            collateral_currency: collateral_currency.into(),
            recovery_instrument,
            recovery_deal,
            curve_id: curve_id.into(),
            extensions: Extensions::new(),
        }
    }

    /// Adds an extension field.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Flat key/value view merged with extension fields.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("Name".into(), Value::from(self.name.as_str()));
        map.insert(
            "CollateralCurrency".into(),
            Value::from(self.collateral_currency.as_str()),
        );
        map.insert(
            "RecoveryInstrument".into(),
            Value::from(self.recovery_instrument),
        );
        map.insert("RecoveryDeal".into(), Value::from(self.recovery_deal));
        map.insert("CurveID".into(), Value::from(self.curve_id.as_str()));
        merge_extensions(map, &self.extensions)
    }
}

/// Enrichment data for a registered counterparty.
///
/// # Examples
///
/// ```
/// use cva_core::CounterpartyParams;
///
/// let params = CounterpartyParams::new("AcmeCDS=R", 40.0, 35.0, "EUR")
///     .with_extension("Sector", "Banking");
/// let map = params.to_map();
/// assert_eq!(map["CollateralCurrency"], "EUR");
/// assert_eq!(map["Sector"], "Banking");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyParams {
    /// Credit curve identifier
    #[serde(rename = "CurveID")]
    pub curve_id: String,
    /// Recovery rate percent on instruments
    #[serde(rename = "RecoveryInstrument")]
    pub recovery_instrument: f64,
    /// Recovery rate percent on deals
    #[serde(rename = "RecoveryDeal")]
    pub recovery_deal: f64,
    /// Collateral currency (ISO code)
    #[serde(rename = "CollateralCurrency")]
    pub collateral_currency: String,
    /// Extension fields
    #[serde(flatten, default)]
    pub extensions: Extensions,
}

impl CounterpartyParams {
    /// Creates counterparty enrichment data without extension fields.
    pub fn new(
        curve_id: impl Into<String>,
        recovery_instrument: f64,
        recovery_deal: f64,
        collateral_currency: impl Into<String>,
    ) -> Self {
        Self {
            curve_id: curve_id.into(),
            recovery_instrument,
            recovery_deal,
            collateral_currency: collateral_currency.into(),
            extensions: Extensions::new(),
        }
    }

    /// Adds an extension field.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Flat key/value view merged with extension fields.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("CurveID".into(), Value::from(self.curve_id.as_str()));
        map.insert(
            "CollateralCurrency".into(),
            Value::from(self.collateral_currency.as_str()),
        );
        map.insert(
            "RecoveryInstrument".into(),
            Value::from(self.recovery_instrument),
        );
        map.insert("RecoveryDeal".into(), Value::from(self.recovery_deal));
        merge_extensions(map, &self.extensions)
    }
}

pub(crate) fn merge_extensions(
    mut map: Map<String, Value>,
    extensions: &Extensions,
) -> Map<String, Value> {
    for (key, value) in extensions {
        map.insert(key.clone(), value.clone());
    }
    map
}
