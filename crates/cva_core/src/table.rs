//! Tabular results.
//!
//! The platform returns results as `{"headers": [{"name": ...}], "data":
//! [[...], ...]}`. [`Table`] keeps that shape (header names plus rows of JSON
//! cells) and offers column access and CSV export.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Column-named rows of JSON cells.
///
/// # Examples
///
/// ```
/// use cva_core::Table;
/// use serde_json::json;
///
/// let payload = json!({
///     "headers": [{"name": "CsaTag"}, {"name": "BilateralCvaInReportCcy"}],
///     "data": [["AcmeBank", -1250.5], ["BetaBank", -310.0]]
/// });
///
/// let table = Table::from_payload(&payload).unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.column("CsaTag").unwrap()[1], "BetaBank");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table from header names and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from a `{headers: [{name}], data: rows}` payload.
    ///
    /// A missing `data` key is read as no rows.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MalformedPayload` if `headers` is missing,
    /// a header has no string `name`, or a row is not an array.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let headers = payload
            .get("headers")
            .and_then(Value::as_array)
            .ok_or_else(|| ValidationError::malformed("result payload has no headers array"))?
            .iter()
            .enumerate()
            .map(|(i, header)| {
                header
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::malformed(format!("header {i} has no name")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = match payload.get("data") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rows)) => rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    row.as_array()
                        .cloned()
                        .ok_or_else(|| {
                            ValidationError::malformed(format!("row {i} is not an array"))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ValidationError::malformed("result data is not an array")),
        };

        Ok(Self { headers, rows })
    }

    /// Header names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows of cells.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of a column; short rows yield null.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Value::Null))
                .collect(),
        )
    }

    /// Rows as header-keyed objects.
    pub fn row_maps(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().chain(std::iter::repeat(Value::Null)))
                    .collect()
            })
            .collect()
    }

    /// Writes the table as CSV with a header record.
    ///
    /// String cells are written raw, nulls as empty fields and every other
    /// cell as compact JSON.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(cell_to_field))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn cell_to_field(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::from_payload(&json!({
            "headers": [{"name": "CsaTag"}, {"name": "Exposure"}, {"name": "ErrorMessage"}],
            "data": [
                ["AcmeBank", [1.0, 2.5], null],
                ["BetaBank", [0.5], "curve missing"]
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_payload_missing_headers() {
        let err = Table::from_payload(&json!({"data": []})).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPayload(_)));
    }

    #[test]
    fn test_from_payload_row_not_array() {
        let err = Table::from_payload(&json!({
            "headers": [{"name": "A"}],
            "data": [{"A": 1}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn test_from_payload_without_data() {
        let table = Table::from_payload(&json!({"headers": [{"name": "A"}]})).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers(), &["A".to_string()]);
    }

    #[test]
    fn test_row_maps_pads_short_rows() {
        let table = Table::new(
            vec!["A".into(), "B".into()],
            vec![vec![json!(1)]],
        );
        let maps = table.row_maps();
        assert_eq!(maps[0]["A"], 1);
        assert_eq!(maps[0]["B"], Value::Null);
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        sample().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "CsaTag,Exposure,ErrorMessage");
        assert_eq!(lines[1], "AcmeBank,\"[1.0,2.5]\",");
        assert_eq!(lines[2], "BetaBank,[0.5],curve missing");
    }

    #[test]
    fn test_unknown_column() {
        assert!(sample().column("Missing").is_none());
    }
}
