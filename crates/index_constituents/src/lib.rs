//! # index_constituents: Historical Index Membership
//!
//! Rebuilds the membership of an equity index over time from its list of
//! constituents on a start date and the joiner/leaver events that followed.
//!
//! ```text
//! initial list @ start ──┐
//!                        ├──▶ reconstruct ──▶ ConstituentHistory ──▶ members_on(date)
//! change table ──────────┘        (one full list per change date)
//! ```
//!
//! Change tables use the platform's tabular result shape
//! ([`cva_core::Table`]) with `Date`, `Constituent RIC` and `Change` columns.

#![warn(missing_docs)]

mod change;
mod error;
mod history;

pub use change::{ChangeKind, ConstituentChange, CHANGE_COLUMN, DATE_COLUMN, RIC_COLUMN};
pub use error::ChangeError;
pub use history::{reconstruct, ConstituentHistory, Snapshot};
