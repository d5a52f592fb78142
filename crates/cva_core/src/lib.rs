//! # cva_core: Data Model for Counterparty Valuation Requests
//!
//! ## Foundation Role
//!
//! cva_core is the bottom layer of the workspace, providing:
//! - Instrument descriptors as returned by the platform (`instrument`)
//! - Counterparty records and the deduplicating registry (`counterparty`)
//! - Parameter objects for the calculating entity, counterparties and
//!   pricing (`entity`, `pricing`)
//! - Tabular results (`table`)
//! - Calendar date parsing shared by every layer (`date`)
//! - Validation errors (`error`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            cva_cli (Service)            │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │   cva_client  (transport, job polling)  │
//! │   index_constituents (history)          │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │   cva_request (request assembly)        │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │   cva_core (data model)                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ```rust
//! use cva_core::{CounterpartyParams, CounterpartyRecord, CounterpartyRegistry};
//!
//! let mut registry = CounterpartyRegistry::from_raw(vec![(
//!     "4295905573",
//!     vec![CounterpartyRecord::named("AcmeBank")],
//! )]);
//!
//! let params = CounterpartyParams::new("AcmeCDS=R", 40.0, 40.0, "USD");
//! registry.enrich("4295905573", &params).unwrap();
//!
//! let record = registry.get("4295905573").unwrap();
//! assert_eq!(record.collateral_currency.as_deref(), Some("USD"));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod counterparty;
pub mod date;
pub mod entity;
pub mod error;
pub mod ids;
pub mod instrument;
pub mod pricing;
pub mod table;

pub use counterparty::{CounterpartyRecord, CounterpartyRegistry};
pub use date::parse_calendar_date;
pub use entity::{CounterpartyParams, Extensions, SelfEntity};
pub use error::ValidationError;
pub use ids::OrgId;
pub use instrument::{Instrument, UNSUPPORTED_INSTRUMENT_TYPES};
pub use pricing::{PricingParameters, DEFAULT_NUMERAIRE_TYPE};
pub use table::Table;
