//! Custom error types for the table cleaning pipeline.
//!
//! This module provides the error hierarchy using `thiserror`.
//! Per-cell and per-column problems (unparsable dates, unknown column names,
//! zero-variance columns) are resolved inside the stages and never surface
//! here; only failures that make a file's output impossible do.
//!
//! Errors are serializable so the batch driver can emit them in its JSON
//! summary.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// A column configured for a numeric operation holds values that
    /// cannot be read as numbers.
    #[error("Column '{column}' is configured as numeric but holds non-numeric data: {reason}")]
    TypeMismatch { column: String, reason: String },

    /// Reading or parsing an input table failed.
    #[error("Failed to read table '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    /// Writing an output table failed.
    #[error("Failed to write table '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    /// A pipeline stage failed for a reason other than a type mismatch.
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::ReadFailed { .. } => "READ_FAILED",
            Self::WriteFailed { .. } => "WRITE_FAILED",
            Self::StageFailed { .. } => "STAGE_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error comes from a configuration/data mismatch
    /// rather than an I/O or library failure.
    pub fn is_config_mismatch(&self) -> bool {
        match self {
            Self::TypeMismatch { .. } => true,
            Self::WithContext { source, .. } => source.is_config_mismatch(),
            _ => false,
        }
    }

    /// Wrap an `anyhow` error coming out of a stage helper.
    ///
    /// Type mismatches raised inside the helper keep their variant.
    pub(crate) fn from_stage(stage: &str, err: anyhow::Error) -> Self {
        match err.downcast::<CleaningError>() {
            Ok(typed) => typed,
            Err(other) => CleaningError::StageFailed {
                stage: stage.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Io(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
