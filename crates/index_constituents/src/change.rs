//! Constituent change events.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use cva_core::{parse_calendar_date, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChangeError;

/// Column holding the effective date of a change.
pub const DATE_COLUMN: &str = "Date";
/// Column holding the instrument code of the constituent.
pub const RIC_COLUMN: &str = "Constituent RIC";
/// Column holding the change kind.
pub const CHANGE_COLUMN: &str = "Change";

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The constituent enters the index
    Joiner,
    /// The constituent leaves the index
    Leaver,
}

impl FromStr for ChangeKind {
    type Err = ChangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Joiner" => Ok(ChangeKind::Joiner),
            "Leaver" => Ok(ChangeKind::Leaver),
            other => Err(ChangeError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Joiner => write!(f, "Joiner"),
            ChangeKind::Leaver => write!(f, "Leaver"),
        }
    }
}

/// One membership change of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituentChange {
    /// Effective date
    pub date: NaiveDate,
    /// Constituent instrument code
    pub ric: String,
    /// Joiner or leaver
    pub kind: ChangeKind,
}

impl ConstituentChange {
    /// Creates a joiner event.
    pub fn joiner(date: NaiveDate, ric: impl Into<String>) -> Self {
        Self {
            date,
            ric: ric.into(),
            kind: ChangeKind::Joiner,
        }
    }

    /// Creates a leaver event.
    pub fn leaver(date: NaiveDate, ric: impl Into<String>) -> Self {
        Self {
            date,
            ric: ric.into(),
            kind: ChangeKind::Leaver,
        }
    }

    /// Reads change events from a table with `Date`, `Constituent RIC` and
    /// `Change` columns. Other columns are ignored.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, ChangeError> {
        let date_idx = column(table, DATE_COLUMN)?;
        let ric_idx = column(table, RIC_COLUMN)?;
        let change_idx = column(table, CHANGE_COLUMN)?;

        table
            .rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let date = text(cells, date_idx, row, DATE_COLUMN)?;
                let date = parse_calendar_date(date).ok_or_else(|| ChangeError::InvalidCell {
                    row,
                    column: DATE_COLUMN,
                    value: date.to_string(),
                })?;
                let ric = text(cells, ric_idx, row, RIC_COLUMN)?;
                let kind = text(cells, change_idx, row, CHANGE_COLUMN)?.parse()?;

                Ok(Self {
                    date,
                    ric: ric.to_string(),
                    kind,
                })
            })
            .collect()
    }
}

fn column(table: &Table, name: &'static str) -> Result<usize, ChangeError> {
    table
        .column_index(name)
        .ok_or(ChangeError::MissingColumn(name))
}

fn text<'a>(
    cells: &'a [Value],
    idx: usize,
    row: usize,
    column: &'static str,
) -> Result<&'a str, ChangeError> {
    match cells.get(idx) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        other => Err(ChangeError::InvalidCell {
            row,
            column,
            value: other.map(Value::to_string).unwrap_or_default(),
        }),
    }
}
