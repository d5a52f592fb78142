//! Calculation job files.
//!
//! A job file is a JSON document holding every input of one calculation:
//!
//! ```json
//! {
//!   "pricingParameters": {"valuationDate": "2024-06-28", "simulationCount": 2000,
//!                         "selfReferenceEntity": "MyBank", "selfRecoveryRatePercent": 40,
//!                         "reportCcy": "USD"},
//!   "entity": {"Name": "MyBank", "CollateralCurrency": "USD", "RecoveryInstrument": 40,
//!              "RecoveryDeal": 40, "CurveID": "MyBankCDS=R"},
//!   "universe": [{"instrumentType": "Swap", "instrumentDefinition": {...}, "csaTag": "AcmeBank"}],
//!   "counterparties": {"4295905573": [{"name": "AcmeBank"}]},
//!   "enrichments": {"4295905573": {"CurveID": "AcmeCDS=R", "RecoveryInstrument": 40,
//!                                  "RecoveryDeal": 40, "CollateralCurrency": "USD"}}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use cva_core::{
    CounterpartyParams, CounterpartyRecord, CounterpartyRegistry, Instrument, PricingParameters,
    SelfEntity, ValidationError,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, Result};

/// Inputs of one CVA calculation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvaJob {
    /// Pricing parameters
    pub pricing_parameters: PricingParameters,
    /// Calculating entity
    pub entity: SelfEntity,
    /// Instrument universe
    pub universe: Vec<Instrument>,
    /// Raw counterparty records by organisation id
    #[serde(default)]
    pub counterparties: BTreeMap<String, Vec<CounterpartyRecord>>,
    /// Credit parameters by organisation id
    #[serde(default)]
    pub enrichments: BTreeMap<String, CounterpartyParams>,
}

impl CvaJob {
    /// Reads a job file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let job: CvaJob =
            serde_json::from_str(&content).map_err(|e| CliError::invalid_input(path, e))?;
        debug!(
            path = %path.display(),
            instruments = job.universe.len(),
            counterparties = job.counterparties.len(),
            "Job file loaded"
        );
        Ok(job)
    }

    /// Builds the deduplicated, enriched counterparty registry.
    pub fn registry(&self) -> std::result::Result<CounterpartyRegistry, ValidationError> {
        let mut registry = CounterpartyRegistry::from_raw(
            self.counterparties
                .iter()
                .map(|(org_id, records)| (org_id.as_str(), records.clone())),
        );
        for (org_id, params) in &self.enrichments {
            registry.enrich(org_id, params)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(enrichments: serde_json::Value) -> CvaJob {
        serde_json::from_value(json!({
            "pricingParameters": {
                "valuationDate": "2024-06-28",
                "simulationCount": 2000,
                "selfReferenceEntity": "MyBank",
                "selfRecoveryRatePercent": 40,
                "reportCcy": "USD"
            },
            "entity": {
                "Name": "MyBank",
                "CollateralCurrency": "USD",
                "RecoveryInstrument": 40,
                "RecoveryDeal": 40,
                "CurveID": "MyBankCDS=R"
            },
            "universe": [],
            "counterparties": {"100": [{"name": "Acme"}, {"name": "Acme again"}]},
            "enrichments": enrichments
        }))
        .unwrap()
    }

    #[test]
    fn test_registry_enriched() {
        let registry = job(json!({
            "100": {
                "CurveID": "AcmeCDS=R",
                "RecoveryInstrument": 40,
                "RecoveryDeal": 35,
                "CollateralCurrency": "EUR"
            }
        }))
        .registry()
        .unwrap();

        let record = registry.get("100").unwrap();
        assert_eq!(record.name, "Acme");
        assert_eq!(record.curve_id.as_deref(), Some("AcmeCDS=R"));
        assert_eq!(record.collateral_currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_enrichment_of_unknown_counterparty() {
        let err = job(json!({
            "999": {
                "CurveID": "X",
                "RecoveryInstrument": 40,
                "RecoveryDeal": 40,
                "CollateralCurrency": "USD"
            }
        }))
        .registry()
        .unwrap_err();
        assert_eq!(err, ValidationError::UnknownCounterparty("999".into()));
    }
}
