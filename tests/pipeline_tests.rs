//! End-to-end pipeline tests
//!
//! Source directory -> orchestrator -> sink, with recovery files checked on
//! disk and fed back into a second run.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use txload::orchestrator::FileStatus;
use txload::recovery::FailedUploadScope;
use txload::sink::{DuckDbSink, MemorySink};
use txload::source::discover_sources;
use txload::{load_config_from_str, LoadConfig, Orchestrator, Value};

fn write_export(dir: &Path, name: &str, rows: usize) {
    let mut content = String::from("Mã GD,Số tiền,Thời gian thanh toán\n");
    for i in 0..rows {
        content.push_str(&format!(
            "TX-{i:06},{}.0,{:02}/04/2025 10:{:02}:00\n",
            i * 1_000,
            i % 28 + 1,
            i % 60
        ));
    }
    fs::write(dir.join(name), content).unwrap();
}

fn config(recovery_dir: &Path) -> LoadConfig {
    let yaml = "prepare:
  numeric_columns: [Số tiền]
  timestamp_columns: [Thời gian thanh toán]
";
    let mut config = load_config_from_str(yaml).unwrap();
    config.recovery.dir = recovery_dir.to_path_buf();
    config
}

#[tokio::test]
async fn test_directory_into_duckdb() {
    let input = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_export(input.path(), "01_march.csv", 2_500);
    write_export(input.path(), "02_april.csv", 11_000);
    fs::write(input.path().join("03_empty.csv"), "Mã GD\n").unwrap();
    fs::write(input.path().join("readme.txt"), "not a source").unwrap();

    let sources = discover_sources(input.path(), &["csv".to_string()]).unwrap();
    assert_eq!(sources.len(), 3);

    let db_path = work.path().join("tx.duckdb");
    let mut sink = DuckDbSink::open(&db_path).unwrap();
    let summary = Orchestrator::new(&config(work.path()), "vnpay.transactions")
        .with_create_table(true)
        .run(&sources, &mut sink)
        .await;

    assert_eq!(summary.files_found, 3);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.total_rows, 13_500);
    assert_eq!(sink.row_count("vnpay.transactions").unwrap(), 13_500);
    assert_eq!(summary.recovery_files().count(), 0);
}

#[tokio::test]
async fn test_connection_loss_then_reload_from_recovery_file() {
    let input = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_export(input.path(), "march.csv", 12_000);

    // First run: the store goes away after 5,000 rows (one 5,000-row chunk)
    let mut flaky = MemorySink::new().losing_connection_after(5_000);
    let sources = vec![input.path().join("march.csv")];
    let summary = Orchestrator::new(&config(work.path()), "tx")
        .run(&sources, &mut flaky)
        .await;

    let file = &summary.files[0];
    assert_eq!(file.status, FileStatus::Partial);
    assert_eq!(file.rows_uploaded, 5_000);
    assert!(file.error.is_some());
    let artifact = file.recovery.clone().unwrap();
    assert_eq!(artifact.rows, 7_000);
    assert_eq!(
        artifact.path.file_name().unwrap().to_string_lossy(),
        "failed_upload_march.csv.csv"
    );

    // Second run: same config, the recovery file is a valid source on its own
    let mut healthy = MemorySink::new();
    let summary = Orchestrator::new(&config(work.path()), "tx")
        .run(&[artifact.path.clone()], &mut healthy)
        .await;

    assert_eq!(summary.total_rows, 7_000);
    let rows = healthy.rows("tx");
    assert_eq!(rows[0][0], Value::text("TX-005000"));
    assert_eq!(rows[6_999][0], Value::text("TX-011999"));
    assert!(rows.iter().all(|row| matches!(row[2], Value::Timestamp(_))));
    assert_eq!(rows[0][3], Value::text("failed_upload_march.csv.csv"));

    // Nothing lost, nothing duplicated
    assert_eq!(flaky.confirmed() + healthy.confirmed(), 12_000);
}

#[tokio::test]
async fn test_full_scope_dumps_whole_dataset() {
    let input = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_export(input.path(), "march.csv", 12_000);

    let mut config = config(work.path());
    config.recovery.failed_upload_scope = FailedUploadScope::Full;
    let mut flaky = MemorySink::new().losing_connection_after(5_000);

    let summary = Orchestrator::new(&config, "tx")
        .run(&[input.path().join("march.csv")], &mut flaky)
        .await;

    let artifact = summary.files[0].recovery.as_ref().unwrap();
    assert_eq!(artifact.rows, 12_000);
}
