//! Counterparty records and the deduplicating registry.
//!
//! Raw counterparty data arrives grouped by organisation id with one entry per
//! transaction; the registry keeps exactly one canonical record per
//! organisation (first seen wins) and lets callers fill in the credit
//! parameters the platform does not provide.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{merge_extensions, CounterpartyParams, Extensions};
use crate::error::ValidationError;
use crate::ids::OrgId;
use crate::table::Table;

/// A counterparty as known to the registry.
///
/// `name` doubles as the CSA tag that instruments reference. The credit
/// fields start empty for records built from portfolio transactions and are
/// filled in by [`CounterpartyRegistry::enrich`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyRecord {
    /// Display name and CSA tag
    pub name: String,
    /// Instrument id the record was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Credit curve identifier
    #[serde(rename = "CurveID", default, skip_serializing_if = "Option::is_none")]
    pub curve_id: Option<String>,
    /// Collateral currency (ISO code)
    #[serde(
        rename = "CollateralCurrency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub collateral_currency: Option<String>,
    /// Recovery rate percent on instruments
    #[serde(
        rename = "RecoveryInstrument",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recovery_instrument: Option<f64>,
    /// Recovery rate percent on deals
    #[serde(rename = "RecoveryDeal", default, skip_serializing_if = "Option::is_none")]
    pub recovery_deal: Option<f64>,
    /// Extension fields
    #[serde(flatten, default)]
    pub extensions: Extensions,
}

impl CounterpartyRecord {
    /// Creates a bare record with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a record assigned to an instrument.
    pub fn assigned(name: impl Into<String>, instrument_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assigned_to: Some(instrument_id.into()),
            ..Default::default()
        }
    }

    /// Overwrites credit fields and merges extension fields.
    pub fn apply(&mut self, params: &CounterpartyParams) {
        self.curve_id = Some(params.curve_id.clone());
        self.collateral_currency = Some(params.collateral_currency.clone());
        self.recovery_instrument = Some(params.recovery_instrument);
        self.recovery_deal = Some(params.recovery_deal);
        for (key, value) in &params.extensions {
            self.extensions.insert(key.clone(), value.clone());
        }
    }

    /// Flat key/value view, omitting unset fields.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name.as_str()));
        if let Some(assigned_to) = &self.assigned_to {
            map.insert("assigned_to".into(), Value::from(assigned_to.as_str()));
        }
        if let Some(curve_id) = &self.curve_id {
            map.insert("CurveID".into(), Value::from(curve_id.as_str()));
        }
        if let Some(ccy) = &self.collateral_currency {
            map.insert("CollateralCurrency".into(), Value::from(ccy.as_str()));
        }
        if let Some(recovery) = self.recovery_instrument {
            map.insert("RecoveryInstrument".into(), Value::from(recovery));
        }
        if let Some(recovery) = self.recovery_deal {
            map.insert("RecoveryDeal".into(), Value::from(recovery));
        }
        merge_extensions(map, &self.extensions)
    }
}

/// Registry of canonical counterparty records keyed by organisation id.
///
/// Iteration is ordered by organisation id.
///
/// # Examples
///
/// ```
/// use cva_core::{CounterpartyRecord, CounterpartyRegistry};
///
/// let registry = CounterpartyRegistry::from_raw(vec![
///     ("100", vec![
///         CounterpartyRecord::assigned("AcmeBank", "LUID_1"),
///         CounterpartyRecord::assigned("AcmeBank", "LUID_2"),
///     ]),
///     ("", vec![CounterpartyRecord::named("Unresolved")]),
/// ]);
///
/// assert_eq!(registry.len(), 1);
/// assert_eq!(registry.get("100").unwrap().assigned_to.as_deref(), Some("LUID_1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CounterpartyRegistry {
    records: BTreeMap<OrgId, CounterpartyRecord>,
}

impl CounterpartyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from raw entries grouped by organisation id.
    pub fn from_raw<I, K>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<CounterpartyRecord>)>,
        K: Into<OrgId>,
    {
        let mut registry = Self::new();
        registry.register(raw);
        registry
    }

    /// Registers raw entries, keeping the first entry of each organisation.
    ///
    /// Organisations with an empty id or no entries are skipped. An
    /// organisation that is already registered keeps its existing record.
    pub fn register<I, K>(&mut self, raw: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Vec<CounterpartyRecord>)>,
        K: Into<OrgId>,
    {
        for (org_id, entries) in raw {
            let org_id = org_id.into();
            if org_id.is_empty() {
                tracing::debug!("Skipping counterparty entries without an org id");
                continue;
            }
            let Some(first) = entries.into_iter().next() else {
                continue;
            };
            self.records.entry(org_id).or_insert(first);
        }
        self
    }

    /// Fills in credit parameters of a registered counterparty.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownCounterparty` if `org_id` is not
    /// registered.
    pub fn enrich(
        &mut self,
        org_id: &str,
        params: &CounterpartyParams,
    ) -> Result<(), ValidationError> {
        let record = self
            .records
            .get_mut(org_id)
            .ok_or_else(|| ValidationError::UnknownCounterparty(org_id.to_string()))?;
        record.apply(params);
        tracing::debug!(org_id, name = %record.name, "Counterparty enriched");
        Ok(())
    }

    /// Returns the record of an organisation.
    pub fn get(&self, org_id: &str) -> Option<&CounterpartyRecord> {
        self.records.get(org_id)
    }

    /// Returns true if the organisation is registered.
    pub fn contains(&self, org_id: &str) -> bool {
        self.records.contains_key(org_id)
    }

    /// Number of registered organisations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no organisation is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records ordered by organisation id.
    pub fn iter(&self) -> impl Iterator<Item = (&OrgId, &CounterpartyRecord)> {
        self.records.iter()
    }

    /// Tabular view: one row per organisation, `OrgId` first.
    ///
    /// Columns are the union of record keys in first-seen order; cells of
    /// unset fields are null.
    pub fn as_table(&self) -> Table {
        let maps: Vec<(&OrgId, Map<String, Value>)> = self
            .records
            .iter()
            .map(|(org_id, record)| (org_id, record.to_map()))
            .collect();

        let mut headers = vec!["OrgId".to_string()];
        for (_, map) in &maps {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = maps
            .into_iter()
            .map(|(org_id, map)| {
                headers
                    .iter()
                    .map(|header| {
                        if header == "OrgId" {
                            Value::from(org_id.as_str())
                        } else {
                            map.get(header).cloned().unwrap_or(Value::Null)
                        }
                    })
                    .collect()
            })
            .collect();

        Table::new(headers, rows)
    }

    /// Mapping view: organisation id to flat record.
    pub fn as_mapping(&self) -> Map<String, Value> {
        self.records
            .iter()
            .map(|(org_id, record)| (org_id.to_string(), Value::Object(record.to_map())))
            .collect()
    }
}
