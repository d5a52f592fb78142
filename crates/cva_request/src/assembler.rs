//! CVA request assembly.
//!
//! Turns a portfolio universe, a counterparty registry, pricing parameters
//! and the self-entity descriptor into a single [`RequestDocument`]:
//!
//! ```text
//! universe ──filter──▶ CVA universe ──csaTags──▶ retained counterparties
//!                           │                          │
//!                           │              ┌───────────┼─────────────┐
//!                           ▼              ▼           ▼             ▼
//!                       universe         csas   assignments   credit curves
//! ```
//!
//! All working state lives inside one `assemble` call, so successive calls
//! on the same assembler never see each other's data.

use std::collections::HashSet;

use chrono::NaiveDate;
use cva_core::{
    CounterpartyRecord, CounterpartyRegistry, Instrument, OrgId, PricingParameters, SelfEntity,
    ValidationError, UNSUPPORTED_INSTRUMENT_TYPES,
};
use tracing::{info, warn};

use crate::advisory::Advisory;
use crate::document::{
    CreditAssignments, CreditCurve, CsaDescriptor, CurveDefinition, CurveParameters,
    DefaultProbabilityAssignment, MarketData, MarketDataAssignments, RequestDocument,
    REQUEST_FIELDS, REQUEST_OUTPUTS,
};

/// Curve identifier kind used when none is configured.
pub const DEFAULT_CURVE_REFERENCE_TYPE: &str = "ChainRic";

/// Configuration for request assembly.
#[derive(Clone, Debug)]
pub struct AssemblerConfig {
    /// Instrument types excluded from the universe
    pub unsupported_types: Vec<String>,
    /// Kind of identifier carried by credit curve definitions
    pub curve_reference_type: String,
    /// Value of `useCollateral` on every CSA descriptor
    pub use_collateral: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            unsupported_types: UNSUPPORTED_INSTRUMENT_TYPES
                .iter()
                .map(|ty| ty.to_string())
                .collect(),
            curve_reference_type: DEFAULT_CURVE_REFERENCE_TYPE.to_string(),
            use_collateral: false,
        }
    }
}

/// Assembled request with the advisories raised while building it.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledRequest {
    /// Request body
    pub document: RequestDocument,
    /// Items left out of the request, in the order they were dropped
    pub advisories: Vec<Advisory>,
}

/// Builds CVA request documents.
///
/// # Examples
///
/// ```
/// use cva_core::{
///     CounterpartyParams, CounterpartyRecord, CounterpartyRegistry, Instrument,
///     PricingParameters, SelfEntity,
/// };
/// use cva_request::CvaRequestAssembler;
///
/// let universe = vec![
///     Instrument::new("Swap", "IRS-1").with_csa_tag("AcmeBank").with_end_date("2030-01-01"),
///     Instrument::new("FxCross", "FX-1"),
/// ];
/// let mut registry = CounterpartyRegistry::from_raw(vec![
///     ("100", vec![CounterpartyRecord::named("AcmeBank")]),
/// ]);
/// registry
///     .enrich("100", &CounterpartyParams::new("AcmeCDS=R", 40.0, 40.0, "USD"))
///     .unwrap();
///
/// let pricing = PricingParameters::parse("2024-06-28", 1000, "MyBank", 40.0, "USD").unwrap();
/// let entity = SelfEntity::new("MyBank", "USD", 40.0, 40.0, "MyBankCDS=R");
///
/// let request = CvaRequestAssembler::new()
///     .assemble(&universe, &registry, &pricing, &entity)
///     .unwrap();
///
/// assert_eq!(request.document.universe.len(), 1);
/// assert_eq!(request.document.csas.len(), 1);
/// assert_eq!(request.advisories.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CvaRequestAssembler {
    config: AssemblerConfig,
}

impl CvaRequestAssembler {
    /// Creates an assembler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assembler with the given configuration.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assembles a request document.
    ///
    /// # Errors
    ///
    /// - `MissingCsaTag` if a supported instrument has no counterparty
    ///   assignment
    /// - `InvalidDate` if an instrument maturity cannot be read
    /// - `EmptyUniverse` if no instrument survives filtering
    /// - `MissingField` if a retained counterparty lacks collateral currency,
    ///   recovery rate or curve id
    pub fn assemble(
        &self,
        universe: &[Instrument],
        registry: &CounterpartyRegistry,
        pricing: &PricingParameters,
        entity: &SelfEntity,
    ) -> Result<AssembledRequest, ValidationError> {
        let mut advisories = Vec::new();

        let cva_universe =
            self.select_universe(universe, pricing.valuation_date(), &mut advisories)?;
        let counterparties = select_counterparties(registry, &cva_universe, &mut advisories);

        let csas = counterparties
            .iter()
            .map(|(org_id, record)| self.build_csa(org_id, record))
            .collect::<Result<Vec<_>, _>>()?;
        let market_data_assignments = build_assignments(entity, &counterparties);
        let market_data = self.build_market_data(entity, &counterparties)?;

        info!(
            instruments = cva_universe.len(),
            excluded = universe.len() - cva_universe.len(),
            counterparties = csas.len(),
            "CVA request assembled"
        );

        let document = RequestDocument {
            outputs: REQUEST_OUTPUTS.iter().map(|s| s.to_string()).collect(),
            fields: REQUEST_FIELDS.iter().map(|s| s.to_string()).collect(),
            csas,
            universe: cva_universe,
            pricing_parameters: pricing.to_map(),
            market_data_assignments,
            market_data,
        };

        Ok(AssembledRequest {
            document,
            advisories,
        })
    }

    fn is_supported(&self, instrument: &Instrument) -> bool {
        !self
            .config
            .unsupported_types
            .iter()
            .any(|ty| ty == &instrument.instrument_type)
    }

    fn select_universe(
        &self,
        universe: &[Instrument],
        valuation_date: NaiveDate,
        advisories: &mut Vec<Advisory>,
    ) -> Result<Vec<Instrument>, ValidationError> {
        let mut selected = Vec::with_capacity(universe.len());

        for instrument in universe {
            if !self.is_supported(instrument) {
                let advisory = Advisory::UnsupportedType {
                    instrument: instrument.tag().to_string(),
                    instrument_type: instrument.instrument_type.clone(),
                };
                warn!(instrument = instrument.tag(), "{}", advisory);
                advisories.push(advisory);
                continue;
            }

            if instrument.csa_tag().is_none() {
                return Err(ValidationError::MissingCsaTag {
                    instrument: instrument.tag().to_string(),
                });
            }

            if let Some(end_date) = instrument.end_date()? {
                if end_date < valuation_date {
                    let advisory = Advisory::Matured {
                        instrument: instrument.tag().to_string(),
                        end_date,
                        valuation_date,
                    };
                    warn!(instrument = instrument.tag(), "{}", advisory);
                    advisories.push(advisory);
                    continue;
                }
            }

            selected.push(instrument.clone());
        }

        if selected.is_empty() {
            return Err(ValidationError::EmptyUniverse);
        }
        Ok(selected)
    }

    fn build_csa(
        &self,
        org_id: &OrgId,
        record: &CounterpartyRecord,
    ) -> Result<CsaDescriptor, ValidationError> {
        Ok(CsaDescriptor {
            csa_tag: record.name.clone(),
            reference_entity: org_id.to_string(),
            collateral_ccy: require(
                record,
                "CollateralCurrency",
                record.collateral_currency.clone(),
            )?,
            counterparty_recovery_rate_percent: require(
                record,
                "RecoveryInstrument",
                record.recovery_instrument,
            )?,
            use_collateral: self.config.use_collateral,
        })
    }

    fn build_market_data(
        &self,
        entity: &SelfEntity,
        counterparties: &[(&OrgId, &CounterpartyRecord)],
    ) -> Result<MarketData, ValidationError> {
        let mut credit_curves = Vec::with_capacity(counterparties.len() + 1);
        credit_curves.push(self.credit_curve(
            &entity.name,
            &entity.curve_id,
            entity.recovery_instrument,
        ));

        for (_, record) in counterparties {
            let curve_id = require(record, "CurveID", record.curve_id.clone())?;
            let recovery = require(record, "RecoveryInstrument", record.recovery_instrument)?;
            credit_curves.push(self.credit_curve(&record.name, &curve_id, recovery));
        }

        Ok(MarketData { credit_curves })
    }

    fn credit_curve(
        &self,
        assignment_tag: &str,
        curve_id: &str,
        recovery_rate: f64,
    ) -> CreditCurve {
        CreditCurve {
            assignment_tag: assignment_tag.to_string(),
            curve_definition: CurveDefinition {
                reference_entity: curve_id.to_string(),
                reference_entity_type: self.config.curve_reference_type.clone(),
            },
            curve_parameters: CurveParameters {
                recovery_rate_percent: recovery_rate,
            },
        }
    }
}

/// Keeps counterparties whose name is a CSA tag of the CVA universe.
fn select_counterparties<'a>(
    registry: &'a CounterpartyRegistry,
    cva_universe: &[Instrument],
    advisories: &mut Vec<Advisory>,
) -> Vec<(&'a OrgId, &'a CounterpartyRecord)> {
    let referenced: HashSet<&str> = cva_universe.iter().filter_map(Instrument::csa_tag).collect();

    registry
        .iter()
        .filter(|(org_id, record)| {
            if referenced.contains(record.name.as_str()) {
                return true;
            }
            let advisory = Advisory::UnreferencedCounterparty {
                name: record.name.clone(),
            };
            warn!(org_id = org_id.as_str(), "{}", advisory);
            advisories.push(advisory);
            false
        })
        .collect()
}

fn build_assignments(
    entity: &SelfEntity,
    counterparties: &[(&OrgId, &CounterpartyRecord)],
) -> MarketDataAssignments {
    let mut default_probability = Vec::with_capacity(counterparties.len() + 1);
    default_probability.push(DefaultProbabilityAssignment::new(&entity.name, &entity.name));
    default_probability.extend(
        counterparties
            .iter()
            .map(|(org_id, record)| {
                DefaultProbabilityAssignment::new(org_id.as_str(), &record.name)
            }),
    );

    MarketDataAssignments {
        credit: CreditAssignments {
            default_probability,
        },
    }
}

fn require<T>(
    record: &CounterpartyRecord,
    field: &'static str,
    value: Option<T>,
) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        counterparty: record.name.clone(),
        field,
    })
}
