//! Constituents command implementation
//!
//! Rebuilds index membership from an initial list and a change table.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use cva_core::Table;
use index_constituents::{reconstruct, ConstituentChange, ConstituentHistory};
use tracing::info;

use crate::commands::open_output;
use crate::error::{CliError, Result};

/// Reads an initial constituent list: one code per line, blank lines and
/// `#` comments ignored.
pub fn read_initial(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Reads change events from a `{headers, data}` JSON table.
pub fn read_changes(path: &Path) -> Result<Vec<ConstituentChange>> {
    let content = std::fs::read_to_string(path)?;
    let payload: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| CliError::invalid_input(path, e))?;
    let table = Table::from_payload(&payload)?;
    Ok(ConstituentChange::from_table(&table)?)
}

/// Writes the full history, or only the membership on `as_of`, as CSV.
pub fn write_history<W: Write>(
    history: &ConstituentHistory,
    as_of: Option<NaiveDate>,
    out: &mut W,
) -> Result<()> {
    let table = match as_of {
        Some(date) => {
            let day = date.format("%Y-%m-%d").to_string();
            Table::new(
                vec!["Date".to_string(), "RIC".to_string()],
                history
                    .members_on(date)
                    .into_iter()
                    .map(|ric| vec![day.clone().into(), ric.into()])
                    .collect(),
            )
        }
        None => history.to_table(),
    };
    table.write_csv(out).map_err(CliError::output)
}

/// Run the constituents command
pub fn run(
    start: NaiveDate,
    initial_path: &Path,
    changes_path: &Path,
    as_of: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    let initial = read_initial(initial_path)?;
    let changes = read_changes(changes_path)?;
    let history = reconstruct(start, initial, &changes);
    info!(
        snapshots = history.dates().len(),
        rows = history.len(),
        "Constituent history rebuilt"
    );

    let mut out = open_output(output)?;
    write_history(&history, as_of, &mut out)?;
    out.flush()?;
    Ok(())
}
