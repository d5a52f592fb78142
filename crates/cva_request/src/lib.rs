//! # cva_request: CVA Request Assembly
//!
//! Filters an instrument universe, cross-references counterparties and
//! builds the nested request document expected by the valuation adjustment
//! service.
//!
//! ## Pipeline
//!
//! 1. Drop unsupported instrument types and matured instruments (advisory)
//! 2. Reject supported instruments without a counterparty assignment
//! 3. Reject an empty universe
//! 4. Keep only counterparties referenced by the universe (advisory)
//! 5. Build CSA descriptors, market data assignments and credit curves
//!
//! Advisories are logged with `tracing` and returned with the document;
//! validation failures are returned as [`cva_core::ValidationError`].

#![warn(missing_docs)]

mod advisory;
mod assembler;
pub mod document;

pub use advisory::Advisory;
pub use assembler::{
    AssembledRequest, AssemblerConfig, CvaRequestAssembler, DEFAULT_CURVE_REFERENCE_TYPE,
};
pub use document::{CsaDescriptor, RequestDocument, REQUEST_FIELDS, REQUEST_OUTPUTS};
