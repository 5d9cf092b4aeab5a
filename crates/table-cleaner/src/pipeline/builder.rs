//! Main cleaning pipeline module.
//!
//! This module provides the core `TablePreprocessor` struct and builder for
//! running the fixed cleaning sequence over one table.

use crate::cleaner::DataCleaner;
use crate::config::{CleaningOptions, ColumnRole, ColumnRoleConfig, ConfigValidationError};
use crate::error::{CleaningError, Result};
use crate::imputers::StatisticalImputer;
use crate::pipeline::encoding::IdEncoder;
use crate::pipeline::progress::{
    CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::scaling::MinMaxScaler;
use crate::types::{ActionType, CleaningAction, CleaningSummary, ProcessedTable};
use crate::utils::column_names;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs the cleaning stages over a table.
///
/// Use [`TablePreprocessor::builder()`] to create one. A preprocessor holds
/// no per-table state and can be reused for any number of tables.
///
/// # Example
///
/// ```rust,ignore
/// use table_cleaner::{ColumnRoleConfig, TablePreprocessor};
///
/// let roles = ColumnRoleConfig::from_dir("dataset")?;
///
/// let result = TablePreprocessor::builder()
///     .roles(roles)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
///
/// println!("untouched: {:?}", result.unclassified_columns);
/// ```
pub struct TablePreprocessor {
    roles: ColumnRoleConfig,
    options: CleaningOptions,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(TablePreprocessor: Send, Sync);

impl TablePreprocessor {
    /// Create a new preprocessor builder.
    pub fn builder() -> TablePreprocessorBuilder {
        TablePreprocessorBuilder::default()
    }

    /// The column roles this preprocessor applies.
    pub fn roles(&self) -> &ColumnRoleConfig {
        &self.roles
    }

    /// The options this preprocessor was built with.
    pub fn options(&self) -> &CleaningOptions {
        &self.options
    }

    /// Clean a table.
    ///
    /// Returns the cleaned table, the columns that were passed through
    /// untouched, and a summary of every action taken.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::TypeMismatch`] when a column configured as
    /// numeric holds text that is not a number. Unknown column names, absent
    /// configuration and unparsable date cells are never errors.
    pub fn process(&self, df: DataFrame) -> Result<ProcessedTable> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Cleaning completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Cleaning error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage_start(&self, stage: CleaningStage) {
        info!("{}...", stage.display_name());
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            format!("{}...", stage.display_name()),
        ));
    }

    fn stage_done(&self, stage: CleaningStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn process_internal(&self, df: DataFrame) -> Result<ProcessedTable> {
        let start_time = Instant::now();

        let mut summary = CleaningSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        // Step 1: Column triage on the untouched column order
        self.stage_start(CleaningStage::Triage);
        let original_order = column_names(&df);
        let unclassified = DataCleaner::unclassified_columns(&original_order, &self.roles);
        summary.unclassified_columns = unclassified.clone();
        summary.missing_configured_columns = self.missing_configured_columns(&original_order);

        for name in self.roles.overlaps() {
            summary.add_warning(format!(
                "Column '{}' is configured for more than one role; using '{:?}'",
                name,
                self.roles.role_of(&name)
            ));
        }
        if !summary.missing_configured_columns.is_empty() {
            debug!(
                "Configured columns not in table: {:?}",
                summary.missing_configured_columns
            );
        }
        self.stage_done(
            CleaningStage::Triage,
            format!("{} unclassified columns", unclassified.len()),
        );

        // Step 2: Drop ignored columns
        self.stage_start(CleaningStage::DropIgnored);
        let (df, dropped) = DataCleaner::drop_ignored_columns(df, &self.roles);
        for name in &dropped {
            summary.add_action(CleaningAction::new(
                ActionType::ColumnRemoved,
                name,
                "Dropped ignored column",
            ));
        }
        summary.dropped_columns = dropped;
        self.stage_done(
            CleaningStage::DropIgnored,
            format!("Dropped {} columns", summary.dropped_columns.len()),
        );

        // Step 3: Restore column order
        self.stage_start(CleaningStage::RestoreOrder);
        let df = DataCleaner::restore_column_order(df, &original_order)
            .map_err(|e| CleaningError::from_stage("restore_order", e))?;
        self.stage_done(CleaningStage::RestoreOrder, "Column order restored");

        // Step 4: Deduplicate rows
        let df = if self.options.remove_duplicates {
            self.stage_start(CleaningStage::Deduplicate);
            let (df, removed) = DataCleaner::remove_duplicates(df)
                .map_err(|e| CleaningError::from_stage("deduplicate", e))?;
            if removed > 0 {
                summary.add_action(CleaningAction::new(
                    ActionType::DuplicatesRemoved,
                    "dataset",
                    format!("Removed {} duplicate rows", removed),
                ));
            }
            summary.duplicates_removed = removed;
            self.stage_done(
                CleaningStage::Deduplicate,
                format!("Removed {} duplicate rows", removed),
            );
            df
        } else {
            info!("Skipping duplicate removal (disabled)");
            df
        };

        // Step 5: Median imputation of numeric-typed columns
        self.stage_start(CleaningStage::Imputation);
        let mut df = df;
        let imputed = StatisticalImputer::impute_numeric_medians(&mut df)
            .map_err(|e| CleaningError::from_stage("imputation", e))?;
        for column in &imputed {
            summary.add_action(
                CleaningAction::new(
                    ActionType::ValueImputed,
                    &column.column,
                    format!("Filled {} missing values with the median", column.filled),
                )
                .with_details(format!("median = {}", column.fill_value)),
            );
        }
        self.stage_done(
            CleaningStage::Imputation,
            format!("Imputed {} columns", imputed.len()),
        );

        // Step 6: Parse dates and drop rows without a valid date
        self.stage_start(CleaningStage::DateValidation);
        let present = column_names(&df);
        let date_cols = self.roles.columns_with_role(&present, ColumnRole::Date);
        let (df, validation) =
            DataCleaner::validate_dates(df, &date_cols, &self.options.date_formats)
                .map_err(|e| CleaningError::from_stage("date_validation", e))?;
        for (column, invalid) in &validation.invalid_cells {
            let mut action =
                CleaningAction::new(ActionType::DatesParsed, column, "Parsed column as dates");
            if *invalid > 0 {
                let details = format!("{} unparsable cells set to missing", invalid);
                action = action.with_details(details);
            }
            summary.add_action(action);
        }
        if validation.rows_dropped > 0 {
            summary.add_action(CleaningAction::new(
                ActionType::RowsRemoved,
                "dataset",
                format!(
                    "Removed {} rows with a missing or invalid date",
                    validation.rows_dropped
                ),
            ));
        }
        summary.invalid_date_rows_removed = validation.rows_dropped;
        self.stage_done(
            CleaningStage::DateValidation,
            format!("Removed {} rows with invalid dates", validation.rows_dropped),
        );

        // Step 7: Encode identifier columns
        self.stage_start(CleaningStage::IdEncoding);
        let mut df = df;
        let present = column_names(&df);
        let id_cols = self.roles.columns_with_role(&present, ColumnRole::Identifier);
        for (i, col_name) in id_cols.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                CleaningStage::IdEncoding,
                format!("Column: {}", col_name),
                i,
                id_cols.len(),
                format!("Encoding '{}'", col_name),
            ));
            let encoded = IdEncoder::encode_column(
                &mut df,
                col_name,
                self.options.id_code_order,
                self.options.missing_id_code,
            )
            .map_err(|e| CleaningError::from_stage("id_encoding", e))?;

            let mut action = CleaningAction::new(
                ActionType::CategoriesEncoded,
                &encoded.column,
                format!("Encoded {} distinct values as integer codes", encoded.distinct_values),
            );
            if encoded.missing > 0 {
                action = action.with_details(format!(
                    "{} missing values encoded as {}",
                    encoded.missing, self.options.missing_id_code
                ));
            }
            summary.add_action(action);
        }
        self.stage_done(
            CleaningStage::IdEncoding,
            format!("Encoded {} identifier columns", id_cols.len()),
        );

        // Step 8: Min-max scale numeric columns
        self.stage_start(CleaningStage::Normalization);
        let numeric_cols = self.roles.columns_with_role(&present, ColumnRole::Numeric);
        for (i, col_name) in numeric_cols.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                CleaningStage::Normalization,
                format!("Column: {}", col_name),
                i,
                numeric_cols.len(),
                format!("Scaling '{}'", col_name),
            ));
            let scaled = MinMaxScaler::scale_column(&mut df, col_name)
                .map_err(|e| CleaningError::from_stage("normalization", e))?;

            match (scaled.min, scaled.max) {
                (Some(min), Some(max)) => {
                    summary.add_action(
                        CleaningAction::new(
                            ActionType::DataNormalized,
                            &scaled.column,
                            "Scaled to [0, 1]",
                        )
                        .with_details(format!("min = {}, max = {}", min, max)),
                    );
                    if scaled.degenerate {
                        summary.add_warning(format!(
                            "Column '{}' has a single value; all values set to 0",
                            scaled.column
                        ));
                    }
                }
                _ => {
                    warn!("Column '{}' has no values to scale", scaled.column);
                    summary.add_warning(format!(
                        "Column '{}' has no values to scale",
                        scaled.column
                    ));
                }
            }
        }
        self.stage_done(
            CleaningStage::Normalization,
            format!("Scaled {} numeric columns", numeric_cols.len()),
        );

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Cleaning complete: {} -> {} rows, {} -> {} columns ({} ms)",
            summary.rows_before,
            summary.rows_after,
            summary.columns_before,
            summary.columns_after,
            summary.duration_ms
        );

        Ok(ProcessedTable {
            table: df,
            unclassified_columns: unclassified,
            summary,
        })
    }

    /// Configured names that the table does not contain, sorted.
    fn missing_configured_columns(&self, columns: &[String]) -> Vec<String> {
        let present: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        let configured: BTreeSet<&String> = self
            .roles
            .date_cols
            .iter()
            .chain(&self.roles.id_cols)
            .chain(&self.roles.numeric_cols)
            .chain(&self.roles.ignore_cols)
            .collect();

        configured
            .into_iter()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect()
    }
}

/// Builder for creating a [`TablePreprocessor`] instance.
#[derive(Default)]
pub struct TablePreprocessorBuilder {
    roles: Option<ColumnRoleConfig>,
    options: Option<CleaningOptions>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(TablePreprocessorBuilder: Send);

impl TablePreprocessorBuilder {
    /// Set the column roles. Defaults to an empty configuration, which
    /// leaves every column unclassified.
    pub fn roles(mut self, roles: ColumnRoleConfig) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Set the cleaning options.
    pub fn options(mut self, options: CleaningOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the preprocessor.
    ///
    /// Returns an error if the options are invalid.
    pub fn build(self) -> std::result::Result<TablePreprocessor, ConfigValidationError> {
        let options = self.options.unwrap_or_default();
        options.validate()?;

        Ok(TablePreprocessor {
            roles: self.roles.unwrap_or_default(),
            options,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdCodeOrder;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn track_roles() -> ColumnRoleConfig {
        ColumnRoleConfig::new()
            .with_date_cols(["release_date"])
            .with_id_cols(["track_id", "playlist_id"])
            .with_numeric_cols(["danceability"])
    }

    fn float_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    fn int_column(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect()
    }

    // ========================================================================
    // Builder tests
    // ========================================================================

    #[test]
    fn test_builder_default() {
        let preprocessor = TablePreprocessor::builder().build().unwrap();
        assert!(preprocessor.roles().is_empty());
        assert_eq!(preprocessor.options().output_prefix, "cleaned_");
    }

    #[test]
    fn test_builder_rejects_invalid_options() {
        let options = CleaningOptions {
            missing_id_code: 0,
            ..CleaningOptions::default()
        };
        let result = TablePreprocessor::builder().options(options).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::NonNegativeMissingCode(0))
        ));
    }

    #[test]
    fn test_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let preprocessor = TablePreprocessor::builder()
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        preprocessor.report_progress(ProgressUpdate::new(CleaningStage::Triage, 0.5, "Test"));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    // ========================================================================
    // Pipeline behavior tests
    // ========================================================================

    #[test]
    fn test_process_track_scenario() {
        let df = df![
            "track_id" => ["t1", "t1"],
            "playlist_id" => ["p9", "p9"],
            "release_date" => ["2020-01-01", "n/a"],
            "danceability" => [0.42, 0.42],
        ]
        .unwrap();

        let result = TablePreprocessor::builder()
            .roles(track_roles())
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert_eq!(result.table.height(), 1);
        assert_eq!(int_column(&result.table, "track_id"), vec![Some(0)]);
        assert_eq!(int_column(&result.table, "playlist_id"), vec![Some(0)]);
        assert_eq!(float_column(&result.table, "danceability"), vec![Some(0.0)]);
        assert!(result.unclassified_columns.is_empty());
        assert_eq!(result.summary.invalid_date_rows_removed, 1);
        assert_eq!(result.summary.duplicates_removed, 0);
    }

    #[test]
    fn test_process_empty_config_touches_nothing_but_duplicates() {
        let df = df![
            "track_id" => ["t2", "t1", "t2"],
            "release_date" => ["garbage", "2020-01-01", "garbage"],
            "tempo" => [120.0, 95.0, 120.0],
        ]
        .unwrap();

        let result = TablePreprocessor::builder()
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert_eq!(result.table.height(), 2);
        assert_eq!(
            result.unclassified_columns,
            vec!["track_id", "release_date", "tempo"]
        );
        assert_eq!(result.table.column("track_id").unwrap().dtype(), &DataType::String);
        assert_eq!(float_column(&result.table, "tempo"), vec![Some(120.0), Some(95.0)]);
        assert_eq!(result.summary.invalid_date_rows_removed, 0);
    }

    #[test]
    fn test_process_unclassified_column_kept_in_place() {
        let df = df![
            "track_id" => ["a", "b"],
            "extra_notes" => ["first", "second"],
            "lyrics" => ["la", "la la"],
            "danceability" => [0.1, 0.9],
        ]
        .unwrap();

        let roles = ColumnRoleConfig::new()
            .with_id_cols(["track_id"])
            .with_numeric_cols(["danceability"])
            .with_ignore_cols(["lyrics"]);

        let result = TablePreprocessor::builder()
            .roles(roles)
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert_eq!(
            column_names(&result.table),
            vec!["track_id", "extra_notes", "danceability"]
        );
        assert_eq!(result.unclassified_columns, vec!["extra_notes"]);

        let notes: Vec<Option<&str>> = result
            .table
            .column("extra_notes")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(notes, vec![Some("first"), Some("second")]);
        assert_eq!(result.summary.dropped_columns, vec!["lyrics"]);
    }

    #[test]
    fn test_process_imputes_before_scaling() {
        let df = df![
            "energy" => [Some(0.0), None, Some(10.0), Some(4.0)],
        ]
        .unwrap();

        let result = TablePreprocessor::builder()
            .roles(ColumnRoleConfig::new().with_numeric_cols(["energy"]))
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        // median of [0, 10, 4] = 4, then scaled over [0, 10]
        assert_eq!(
            float_column(&result.table, "energy"),
            vec![Some(0.0), Some(0.4), Some(1.0), Some(0.4)]
        );
        assert_eq!(result.summary.actions_of(ActionType::ValueImputed).count(), 1);
    }

    #[test]
    fn test_process_infinite_values_imputed_before_scaling() {
        let df = df![
            "x" => [1.0, 2.0, f64::INFINITY],
        ]
        .unwrap();

        let result = TablePreprocessor::builder()
            .roles(ColumnRoleConfig::new().with_numeric_cols(["x"]))
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        // infinity counts as missing and takes the median 1.5
        assert_eq!(
            float_column(&result.table, "x"),
            vec![Some(0.0), Some(1.0), Some(0.5)]
        );
    }

    #[test]
    fn test_process_type_mismatch_names_column() {
        let df = df![
            "tempo" => ["120", "fast", "90"],
        ]
        .unwrap();

        let err = TablePreprocessor::builder()
            .roles(ColumnRoleConfig::new().with_numeric_cols(["tempo"]))
            .build()
            .unwrap()
            .process(df)
            .unwrap_err();

        assert_eq!(err.error_code(), "TYPE_MISMATCH");
        assert!(err.to_string().contains("tempo"));
    }

    #[test]
    fn test_process_records_missing_configured_columns() {
        let df = df!["a" => [1, 2]].unwrap();
        let roles = ColumnRoleConfig::new()
            .with_date_cols(["release_date"])
            .with_ignore_cols(["lyrics"]);

        let result = TablePreprocessor::builder()
            .roles(roles)
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert_eq!(
            result.summary.missing_configured_columns,
            vec!["lyrics", "release_date"]
        );
        assert_eq!(result.table.height(), 2);
    }

    #[test]
    fn test_process_first_appearance_codes() {
        let df = df!["playlist_id" => ["zeta", "alpha", "zeta"], "n" => [1, 2, 3]].unwrap();
        let options = CleaningOptions::builder()
            .id_code_order(IdCodeOrder::FirstAppearance)
            .build()
            .unwrap();

        let result = TablePreprocessor::builder()
            .roles(ColumnRoleConfig::new().with_id_cols(["playlist_id"]))
            .options(options)
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert_eq!(
            int_column(&result.table, "playlist_id"),
            vec![Some(0), Some(1), Some(0)]
        );
    }

    #[test]
    fn test_process_reports_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let df = df!["x" => [1.0, 2.0]].unwrap();
        TablePreprocessor::builder()
            .roles(ColumnRoleConfig::new().with_numeric_cols(["x"]))
            .on_progress(move |update| {
                let mut seen = stages_clone.lock().unwrap();
                if seen.last() != Some(&update.stage) {
                    seen.push(update.stage);
                }
            })
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                CleaningStage::Triage,
                CleaningStage::DropIgnored,
                CleaningStage::RestoreOrder,
                CleaningStage::Deduplicate,
                CleaningStage::Imputation,
                CleaningStage::DateValidation,
                CleaningStage::IdEncoding,
                CleaningStage::Normalization,
                CleaningStage::Complete,
            ]
        );
    }
}
