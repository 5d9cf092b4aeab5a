use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output of [`TablePreprocessor::process`](crate::TablePreprocessor::process).
#[derive(Debug, Clone)]
pub struct ProcessedTable {
    /// The cleaned table.
    pub table: DataFrame,
    /// Columns named in no role set, in original table order.
    pub unclassified_columns: Vec<String>,
    /// Manifest of what the pipeline did to this table.
    pub summary: CleaningSummary,
}

// ============================================================================
// Cleaning Summary Types
// ============================================================================

/// Record of every decision the pipeline made for one table.
///
/// Serialized into the per-file JSON manifest and into the batch summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows before cleaning.
    pub rows_before: usize,
    /// Number of rows after cleaning.
    pub rows_after: usize,

    /// Number of columns before cleaning.
    pub columns_before: usize,
    /// Number of columns after cleaning.
    pub columns_after: usize,

    /// Rows removed as exact duplicates of an earlier row.
    pub duplicates_removed: usize,
    /// Rows removed because a date column was missing or unparsable.
    pub invalid_date_rows_removed: usize,

    /// Columns dropped because they were ignored.
    pub dropped_columns: Vec<String>,
    /// Columns passed through untouched.
    pub unclassified_columns: Vec<String>,
    /// Configured column names absent from this table.
    pub missing_configured_columns: Vec<String>,

    /// List of actions taken, in pipeline order.
    pub actions: Vec<CleaningAction>,

    /// Warnings and notes generated during cleaning.
    pub warnings: Vec<String>,
}

impl CleaningSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: CleaningAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Actions of a given type.
    pub fn actions_of(&self, action_type: ActionType) -> impl Iterator<Item = &CleaningAction> {
        self.actions
            .iter()
            .filter(move |a| a.action_type == action_type)
    }
}

/// A single action taken during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., fill value, observed range).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CleaningAction {
    /// Create a new cleaning action.
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions that can be taken during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A column was removed from the table.
    ColumnRemoved,
    /// Duplicate rows were removed.
    DuplicatesRemoved,
    /// Missing values were imputed.
    ValueImputed,
    /// A column was parsed as dates.
    DatesParsed,
    /// Rows were removed because of invalid dates.
    RowsRemoved,
    /// Identifier values were replaced by codes.
    CategoriesEncoded,
    /// A column was min-max scaled.
    DataNormalized,
}

// ============================================================================
// Batch Types
// ============================================================================

/// Result of processing one file in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Input file.
    pub input: PathBuf,
    /// Output file, when the file was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// JSON manifest path, when one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    /// Columns passed through untouched.
    pub unclassified_columns: Vec<String>,
    /// Cleaning manifest, when processing got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CleaningSummary>,
    /// Failure details, when the file could not be cleaned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FileFailure>,
}

impl FileOutcome {
    /// Whether the file was cleaned and written.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Why a file in a batch failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    /// Stable error code, see [`CleaningError::error_code`](crate::CleaningError::error_code).
    pub code: String,
    /// Human-readable message, including the file name.
    pub message: String,
}

/// Outcome of a whole batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// One entry per requested file, in request order.
    pub files: Vec<FileOutcome>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
}

impl BatchSummary {
    /// Number of files cleaned and written.
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Whether any file failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}
