//! Dataset preparation
//!
//! Turns a [`RawTable`] of strings into a typed [`Dataset`]:
//!
//! 1. blank cells become `Null`
//! 2. a trailing `.0` left by spreadsheet exports is stripped (`100000.0` -> `100000`)
//! 3. numeric columns become decimals; anything unparsable becomes `0`
//! 4. timestamp columns are parsed with the configured format, then with
//!    [`TIMESTAMP_FORMAT`] (the form recovery files are written in); anything
//!    else becomes `Null`
//! 5. the provenance column is filled with the source file name
//!
//! Columns named in the config but missing from the file are ignored.

use crate::error::{Error, Result};
use crate::source::RawTable;
use crate::types::{Dataset, Row, Value, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Preparation rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Columns converted to decimals
    #[serde(default)]
    pub numeric_columns: Vec<String>,

    /// Columns parsed as timestamps
    #[serde(default)]
    pub timestamp_columns: Vec<String>,

    /// chrono format for timestamp columns
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Strip a trailing `.0` from cells
    #[serde(default = "default_true")]
    pub strip_float_suffix: bool,

    /// Column holding the source file name (None = not added)
    #[serde(default = "default_source_column")]
    pub source_column: Option<String>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            numeric_columns: Vec::new(),
            timestamp_columns: Vec::new(),
            timestamp_format: default_timestamp_format(),
            strip_float_suffix: default_true(),
            source_column: default_source_column(),
        }
    }
}

fn default_timestamp_format() -> String {
    "%d/%m/%Y %H:%M:%S".to_string()
}

fn default_true() -> bool {
    true
}

fn default_source_column() -> Option<String> {
    Some("SourceFile".to_string())
}

impl PrepareConfig {
    /// Set numeric columns
    #[must_use]
    pub fn with_numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set timestamp columns
    #[must_use]
    pub fn with_timestamp_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamp_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set or clear the provenance column
    #[must_use]
    pub fn with_source_column(mut self, column: Option<String>) -> Self {
        self.source_column = column;
        self
    }
}

#[derive(Clone, Copy)]
enum ColumnKind {
    Text,
    Numeric,
    Timestamp,
}

/// Convert a raw table into a typed dataset
pub fn prepare(table: RawTable, config: &PrepareConfig) -> Result<Dataset> {
    let RawTable {
        source,
        mut headers,
        rows,
    } = table;

    let width = headers.len();
    if let Some((index, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(Error::preparation(
            source,
            format!("row {index} has {} cells, expected {width}", cells.len()),
        ));
    }

    let kinds: Vec<ColumnKind> = headers
        .iter()
        .map(|name| {
            if config.numeric_columns.contains(name) {
                ColumnKind::Numeric
            } else if config.timestamp_columns.contains(name) {
                ColumnKind::Timestamp
            } else {
                ColumnKind::Text
            }
        })
        .collect();

    let provenance = config.source_column.as_ref().map(|name| {
        headers.iter().position(|h| h == name).unwrap_or_else(|| {
            headers.push(name.clone());
            headers.len() - 1
        })
    });

    let mut coerced = 0usize;
    let typed: Vec<Row> = rows
        .into_iter()
        .map(|cells| {
            let mut row: Row = cells
                .into_iter()
                .enumerate()
                .map(|(i, cell)| {
                    let (value, fallback) = convert(cell, kinds[i], config);
                    coerced += usize::from(fallback);
                    value
                })
                .collect();
            match provenance {
                Some(index) if index < width => row[index] = Value::text(&source),
                Some(_) => row.push(Value::text(&source)),
                None => {}
            }
            row
        })
        .collect();

    if coerced > 0 {
        debug!("  {} cells in {} could not be converted", coerced, source);
    }

    Dataset::new(source, headers, typed)
}

/// Convert one cell; the flag is set when a fallback value was used
fn convert(cell: String, kind: ColumnKind, config: &PrepareConfig) -> (Value, bool) {
    let trimmed = cell.trim();
    let text = if config.strip_float_suffix {
        trimmed.strip_suffix(".0").unwrap_or(trimmed)
    } else {
        trimmed
    };

    match kind {
        ColumnKind::Text if trimmed.is_empty() => (Value::Null, false),
        ColumnKind::Text if text.len() == cell.len() => (Value::Text(cell), false),
        ColumnKind::Text => (Value::text(text), false),
        ColumnKind::Numeric => match parse_decimal(text) {
            Some(d) => (Value::Decimal(d), false),
            None => (Value::Decimal(Decimal::ZERO), !text.is_empty()),
        },
        ColumnKind::Timestamp if text.is_empty() => (Value::Null, false),
        ColumnKind::Timestamp => match parse_timestamp(text, &config.timestamp_format) {
            Some(ts) => (Value::Timestamp(ts), false),
            None => (Value::Null, true),
        },
    }
}

fn parse_timestamp(s: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, format)
        .or_else(|_| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT))
        .ok()
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            source: "march.csv".to_string(),
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        }
    }

    fn vnpay_config() -> PrepareConfig {
        PrepareConfig::default()
            .with_numeric_columns(["Số tiền"])
            .with_timestamp_columns(["Thời gian thanh toán"])
    }

    #[test]
    fn test_prepare_types_cells() {
        let table = raw(
            &["Mã GD", "Số tiền", "Thời gian thanh toán"],
            &[&["TX-1", "100000.0", "20/04/2025 08:16:41"]],
        );

        let dataset = prepare(table, &vnpay_config()).unwrap();

        assert_eq!(
            dataset.columns(),
            &["Mã GD", "Số tiền", "Thời gian thanh toán", "SourceFile"]
        );
        let ts = NaiveDate::from_ymd_opt(2025, 4, 20)
            .unwrap()
            .and_hms_opt(8, 16, 41)
            .unwrap();
        assert_eq!(
            dataset.rows()[0],
            vec![
                Value::text("TX-1"),
                Value::Decimal(Decimal::from(100_000)),
                Value::Timestamp(ts),
                Value::text("march.csv"),
            ]
        );
    }

    #[test_case("" => Value::Decimal(Decimal::ZERO) ; "empty")]
    #[test_case("abc" => Value::Decimal(Decimal::ZERO) ; "unparsable")]
    #[test_case("25.50" => Value::Decimal(Decimal::new(2550, 2)) ; "keeps scale")]
    #[test_case("1e3" => Value::Decimal(Decimal::from(1000)) ; "scientific")]
    #[test_case(" 7 " => Value::Decimal(Decimal::from(7)) ; "padded")]
    fn test_numeric_cells(cell: &str) -> Value {
        let dataset = prepare(raw(&["Số tiền"], &[&[cell]]), &vnpay_config()).unwrap();
        dataset.rows()[0][0].clone()
    }

    #[test_case("" ; "empty")]
    #[test_case("20-04-2025 08:16" ; "wrong format")]
    #[test_case("31/02/2025 00:00:00" ; "invalid date")]
    fn test_unparsable_timestamp_is_null(cell: &str) {
        let table = raw(&["Thời gian thanh toán"], &[&[cell]]);
        let dataset = prepare(table, &vnpay_config()).unwrap();
        assert_eq!(dataset.rows()[0][0], Value::Null);
    }

    #[test]
    fn test_rendered_timestamp_reads_back() {
        let ts = NaiveDate::from_ymd_opt(2025, 4, 20)
            .unwrap()
            .and_hms_opt(8, 16, 41)
            .unwrap();
        let rendered = Value::Timestamp(ts).to_text().unwrap();
        assert_eq!(rendered, "2025-04-20 08:16:41");

        let table = raw(&["Thời gian thanh toán"], &[&[rendered.as_str()]]);
        let dataset = prepare(table, &vnpay_config()).unwrap();
        assert_eq!(dataset.rows()[0][0], Value::Timestamp(ts));
    }

    #[test_case("10.0" => Value::text("10") ; "float suffix")]
    #[test_case("1.50" => Value::text("1.50") ; "other decimals kept")]
    #[test_case("   " => Value::Null ; "whitespace")]
    #[test_case("0901234567" => Value::text("0901234567") ; "leading zero kept")]
    fn test_text_cells(cell: &str) -> Value {
        let table = raw(&["Số điện thoại"], &[&[cell]]);
        let dataset = prepare(table, &vnpay_config()).unwrap();
        dataset.rows()[0][0].clone()
    }

    #[test]
    fn test_float_suffix_kept_when_disabled() {
        let config = PrepareConfig {
            strip_float_suffix: false,
            ..PrepareConfig::default()
        };
        let dataset = prepare(raw(&["STT"], &[&["3.0"]]), &config).unwrap();
        assert_eq!(dataset.rows()[0][0], Value::text("3.0"));
    }

    #[test]
    fn test_existing_provenance_column_is_overwritten() {
        let table = raw(&["id", "SourceFile"], &[&["1", "old.xlsx"]]);
        let dataset = prepare(table, &PrepareConfig::default()).unwrap();

        assert_eq!(dataset.columns(), &["id", "SourceFile"]);
        assert_eq!(dataset.rows()[0][1], Value::text("march.csv"));
    }

    #[test]
    fn test_provenance_column_disabled() {
        let config = PrepareConfig::default().with_source_column(None);
        let dataset = prepare(raw(&["id"], &[&["1"]]), &config).unwrap();
        assert_eq!(dataset.columns(), &["id"]);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let table = raw(&["a", "b"], &[&["1", "2"], &["3"]]);
        let err = prepare(table, &PrepareConfig::default()).unwrap_err();

        assert!(matches!(err, crate::error::Error::Preparation { .. }));
        assert!(err.to_string().contains("march.csv"));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_empty_table() {
        let dataset = prepare(raw(&["a"], &[]), &PrepareConfig::default()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.columns(), &["a", "SourceFile"]);
    }
}
