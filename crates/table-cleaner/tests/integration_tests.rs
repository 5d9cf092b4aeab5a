//! Integration tests for the table cleaner.
//!
//! These tests run the full pipeline and the batch driver against the CSV
//! fixtures and role files under `tests/fixtures`.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use table_cleaner::io::read_table;
use table_cleaner::utils::column_names;
use table_cleaner::{
    ActionType, BatchProcessor, CleaningOptions, CleaningStage, ColumnRoleConfig, DataCleaner,
    ProcessedTable, TablePreprocessor,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_roles() -> ColumnRoleConfig {
    ColumnRoleConfig::from_dir(fixtures_path().join("config")).expect("Failed to load roles")
}

fn clean_fixture(filename: &str) -> table_cleaner::CleaningResult<ProcessedTable> {
    let df = read_table(fixtures_path().join(filename)).expect("Failed to read fixture");
    TablePreprocessor::builder()
        .roles(fixture_roles())
        .build()
        .expect("Failed to build preprocessor")
        .process(df)
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

fn assert_close(actual: &[Option<f64>], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        let a = a.expect("unexpected missing value");
        assert!((a - e).abs() < 1e-9, "expected {}, got {}", e, a);
    }
}

fn copy_fixture(name: &str, dir: &Path) -> PathBuf {
    let target = dir.join(name);
    fs::copy(fixtures_path().join(name), &target).expect("Failed to copy fixture");
    target
}

// ============================================================================
// Role Configuration Tests
// ============================================================================

#[test]
fn test_roles_from_fixture_dir() {
    let roles = fixture_roles();

    assert!(roles.date_cols.contains("release_date"));
    assert_eq!(roles.id_cols.len(), 2);
    assert!(roles.numeric_cols.contains("tempo"));
    assert!(roles.ignore_cols.contains("lyrics"));
    assert!(!roles.date_cols.iter().any(|c| c.starts_with('#')));
}

#[test]
fn test_roles_from_missing_dir_is_empty() {
    let roles = ColumnRoleConfig::from_dir(fixtures_path().join("no_such_dir")).unwrap();
    assert!(roles.is_empty());
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_tracks() {
    let result = clean_fixture("tracks.csv").unwrap();
    let df = &result.table;

    assert_eq!(
        column_names(df),
        vec![
            "track_id",
            "playlist_id",
            "release_date",
            "danceability",
            "energy",
            "extra_notes"
        ]
    );
    assert_eq!(result.unclassified_columns, vec!["extra_notes"]);

    // one duplicate removed, one row with "n/a" date dropped
    assert_eq!(df.height(), 3);
    assert_eq!(result.summary.duplicates_removed, 1);
    assert_eq!(result.summary.invalid_date_rows_removed, 1);
    assert_eq!(df.column("release_date").unwrap().dtype(), &DataType::Date);

    assert_eq!(ints(df, "track_id"), vec![Some(1), Some(0), Some(0)]);
    assert_eq!(ints(df, "playlist_id"), vec![Some(0), Some(1), Some(0)]);

    assert_close(&floats(df, "danceability"), &[1.0, 0.0, 0.4 / 0.6]);
    // the missing energy was filled with the median 0.5 before scaling
    assert_close(&floats(df, "energy"), &[1.0, 1.0, 0.0]);

    assert_eq!(result.summary.dropped_columns, vec!["lyrics"]);
    assert_eq!(result.summary.missing_configured_columns, vec!["tempo"]);
}

#[test]
fn test_full_pipeline_records_actions() {
    let summary = clean_fixture("tracks.csv").unwrap().summary;

    assert_eq!(summary.rows_before, 5);
    assert_eq!(summary.rows_after, 3);
    assert_eq!(summary.columns_before, 7);
    assert_eq!(summary.columns_after, 6);

    let imputed: Vec<&str> = summary
        .actions_of(ActionType::ValueImputed)
        .map(|a| a.target.as_str())
        .collect();
    assert_eq!(imputed, vec!["energy"]);
    assert_eq!(summary.actions_of(ActionType::CategoriesEncoded).count(), 2);
    assert_eq!(summary.actions_of(ActionType::DataNormalized).count(), 2);
}

#[test]
fn test_full_pipeline_empty_config_passes_everything_through() {
    let df = read_table(fixtures_path().join("tracks.csv")).unwrap();
    let original_columns = column_names(&df);

    let result = TablePreprocessor::builder()
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    assert_eq!(result.unclassified_columns, original_columns);
    assert_eq!(column_names(&result.table), original_columns);
    // only the exact duplicate goes; the "n/a" date row stays
    assert_eq!(result.table.height(), 4);
    assert_eq!(
        result.table.column("track_id").unwrap().dtype(),
        &DataType::String
    );
    assert_eq!(
        result.table.column("release_date").unwrap().dtype(),
        &DataType::String
    );
}

#[test]
fn test_full_pipeline_type_mismatch() {
    let err = clean_fixture("broken_types.csv").unwrap_err();

    assert_eq!(err.error_code(), "TYPE_MISMATCH");
    assert!(err.is_config_mismatch());
    assert!(err.to_string().contains("tempo"));
}

#[test]
fn test_deduplication_is_idempotent() {
    let result = clean_fixture("tracks.csv").unwrap();
    let height = result.table.height();

    let (again, removed) = DataCleaner::remove_duplicates(result.table).unwrap();
    assert_eq!(removed, 0);
    assert_eq!(again.height(), height);
}

#[test]
fn test_second_pass_changes_nothing() {
    let preprocessor = TablePreprocessor::builder()
        .roles(fixture_roles())
        .build()
        .unwrap();

    let df = read_table(fixtures_path().join("tracks.csv")).unwrap();
    let first = preprocessor.process(df).unwrap();
    let second = preprocessor.process(first.table.clone()).unwrap();

    assert_eq!(second.summary.duplicates_removed, 0);
    assert_eq!(second.summary.invalid_date_rows_removed, 0);
    assert_eq!(column_names(&second.table), column_names(&first.table));
    assert!(second.table.equals_missing(&first.table));
}

#[test]
fn test_scaled_columns_stay_in_unit_interval() {
    let result = clean_fixture("tracks.csv").unwrap();

    for name in ["danceability", "energy"] {
        for value in floats(&result.table, name).into_iter().flatten() {
            assert!((0.0..=1.0).contains(&value), "{} out of range: {}", name, value);
        }
    }
}

#[test]
fn test_progress_reaches_complete() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    let df = read_table(fixtures_path().join("tracks.csv")).unwrap();
    TablePreprocessor::builder()
        .roles(fixture_roles())
        .on_progress(move |update| updates_clone.lock().unwrap().push(update))
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    let updates = updates.lock().unwrap();
    let last = updates.last().expect("no progress reported");
    assert_eq!(last.stage, CleaningStage::Complete);
    assert_eq!(last.progress, 1.0);
    assert!(
        updates.windows(2).all(|w| w[0].progress <= w[1].progress + 1e-6),
        "progress should never go backwards"
    );
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn test_batch_one_bad_one_good() {
    let dir = tempfile::tempdir().unwrap();
    let broken = copy_fixture("broken_types.csv", dir.path());
    let tracks = copy_fixture("tracks.csv", dir.path());

    let preprocessor = TablePreprocessor::builder()
        .roles(fixture_roles())
        .build()
        .unwrap();
    let batch = BatchProcessor::new(preprocessor, None).run(&[broken, tracks]);

    assert_eq!(batch.failed(), 1);
    assert_eq!(batch.succeeded(), 1);

    let failure = batch.files[0].failure.as_ref().unwrap();
    assert_eq!(failure.code, "TYPE_MISMATCH");
    assert!(failure.message.contains("broken_types.csv"));
    assert!(!dir.path().join("cleaned_broken_types.csv").exists());

    let written = read_table(dir.path().join("cleaned_tracks.csv")).unwrap();
    assert_eq!(written.height(), 3);
    assert_eq!(
        column_names(&written),
        vec![
            "track_id",
            "playlist_id",
            "release_date",
            "danceability",
            "energy",
            "extra_notes"
        ]
    );
}

#[test]
fn test_batch_output_dir_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let tracks = copy_fixture("tracks.csv", dir.path());
    let out = dir.path().join("out");

    let options = CleaningOptions::builder()
        .output_prefix("clean_")
        .emit_report(true)
        .build()
        .unwrap();
    let preprocessor = TablePreprocessor::builder()
        .roles(fixture_roles())
        .options(options)
        .build()
        .unwrap();

    let batch = BatchProcessor::new(preprocessor, Some(out.clone())).run(&[tracks]);

    assert!(!batch.has_failures());
    assert!(out.join("clean_tracks.csv").exists());

    let report_path = out.join("clean_tracks_report.json");
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["duplicates_removed"], 1);
    assert_eq!(report["summary"]["unclassified_columns"][0], "extra_notes");

    let batch_json = serde_json::to_value(&batch).unwrap();
    assert_eq!(batch_json["files"][0]["unclassified_columns"][0], "extra_notes");
}
