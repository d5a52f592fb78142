//! Advisory exclusions.
//!
//! Advisories are non-fatal: the affected item is dropped from the request
//! and the caller is told why. They are logged at warn level as they are
//! raised and returned alongside the assembled document.

use std::fmt;

use chrono::NaiveDate;

/// Reason an item was left out of the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// Instrument type is not priced by the service
    UnsupportedType {
        /// Instrument tag
        instrument: String,
        /// Instrument type
        instrument_type: String,
    },
    /// Instrument matured before the valuation date
    Matured {
        /// Instrument tag
        instrument: String,
        /// Maturity date
        end_date: NaiveDate,
        /// Valuation date
        valuation_date: NaiveDate,
    },
    /// Counterparty is not referenced by any retained instrument
    UnreferencedCounterparty {
        /// Counterparty name
        name: String,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::UnsupportedType {
                instrument,
                instrument_type,
            } => write!(
                f,
                "Instrument type {} of {} is not supported for CVA calculation; \
                 calculation will be done on supported instruments only",
                instrument_type, instrument
            ),
            Advisory::Matured {
                instrument,
                end_date,
                valuation_date,
            } => write!(
                f,
                "Maturity date {} of instrument {} is earlier than the valuation date {}",
                end_date, instrument, valuation_date
            ),
            Advisory::UnreferencedCounterparty { name } => write!(
                f,
                "Counterparty with csaTag {} does not exist in the supported universe; \
                 CVA calculation will not account for {}",
                name, name
            ),
        }
    }
}
