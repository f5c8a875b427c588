//! Tests for source module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

// ============================================================================
// read_table Tests
// ============================================================================

#[test]
fn test_read_table_with_bom_and_quotes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("march.csv");
    fs::write(
        &path,
        "\u{feff}Mã GD,Số tiền,Ghi chú\nTX-1,100000.0,\"thanh toán, hóa đơn\"\nTX-2,,\n",
    )
    .unwrap();

    let table = read_table(&path, &SourceConfig::default()).unwrap();

    assert_eq!(table.source, "march.csv");
    assert_eq!(table.headers, vec!["Mã GD", "Số tiền", "Ghi chú"]);
    assert_eq!(
        table.rows,
        vec![
            vec!["TX-1", "100000.0", "thanh toán, hóa đơn"],
            vec!["TX-2", "", ""],
        ]
    );
}

#[test]
fn test_read_table_custom_delimiter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("april.csv");
    fs::write(&path, "a;b\n1;2\n").unwrap();

    let table = read_table(&path, &SourceConfig::default().with_delimiter(';')).unwrap();
    assert_eq!(table.headers, vec!["a", "b"]);
    assert_eq!(table.rows, vec![vec!["1", "2"]]);
}

#[test]
fn test_read_table_keeps_ragged_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    fs::write(&path, "a,b\n1,2\n3\n").unwrap();

    let table = read_table(&path, &SourceConfig::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[1], vec!["3"]);
}

#[test]
fn test_read_table_header_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "a,b\n").unwrap();

    let table = read_table(&path, &SourceConfig::default()).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.headers, vec!["a", "b"]);
}

#[test]
fn test_read_table_missing_file() {
    let err = read_table("/nonexistent/file.csv", &SourceConfig::default()).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_multibyte_delimiter_rejected() {
    let config = SourceConfig::default().with_delimiter('→');
    let err = config.delimiter_byte().unwrap_err();
    assert!(err.to_string().contains("source.delimiter"));
}

// ============================================================================
// discover_sources Tests
// ============================================================================

#[test]
fn test_discover_sources_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    for name in ["b.csv", "a.CSV", "notes.txt", "c.tsv"] {
        fs::write(dir.path().join(name), "x\n").unwrap();
    }
    fs::create_dir(dir.path().join("nested.csv")).unwrap();

    let found = discover_sources(dir.path(), &["csv".to_string(), "tsv".to_string()]).unwrap();
    let names: Vec<String> = found.iter().map(|p| source_name(p)).collect();

    assert_eq!(names, vec!["a.CSV", "b.csv", "c.tsv"]);
}

#[test]
fn test_discover_sources_empty_dir() {
    let dir = tempdir().unwrap();
    let found = discover_sources(dir.path(), &["csv".to_string()]).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_discover_sources_missing_dir() {
    assert!(discover_sources("/nonexistent/dir", &["csv".to_string()]).is_err());
}

#[test]
fn test_source_config_from_yaml() {
    let config: SourceConfig = serde_yaml::from_str("delimiter: \"\\t\"").unwrap();
    assert_eq!(config.delimiter, '\t');
    assert_eq!(config.extensions, vec!["csv"]);
}
