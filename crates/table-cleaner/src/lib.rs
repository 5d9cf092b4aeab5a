//! Table Cleaner Library
//!
//! A batch cleaning library for CSV tables, built with Rust and Polars.
//!
//! # Overview
//!
//! Each table runs through a fixed sequence of stages driven by per-role
//! column lists:
//!
//! - **Triage**: columns named in no role list are reported and left untouched
//! - **Ignored columns**: dropped, with the remaining columns kept in input order
//! - **Duplicates**: exact duplicate rows removed, first occurrence kept
//! - **Imputation**: numeric gaps filled with the column median
//! - **Dates**: date columns parsed; rows without a valid date dropped
//! - **Identifiers**: replaced with dense integer codes
//! - **Numeric features**: min-max scaled to [0, 1]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use table_cleaner::{ColumnRoleConfig, TablePreprocessor, io::read_table};
//!
//! let roles = ColumnRoleConfig::new()
//!     .with_date_cols(["release_date"])
//!     .with_id_cols(["track_id", "playlist_id"])
//!     .with_numeric_cols(["danceability", "energy"])
//!     .with_ignore_cols(["lyrics"]);
//!
//! let result = TablePreprocessor::builder()
//!     .roles(roles)
//!     .build()?
//!     .process(read_table("dataset/tracks.csv")?)?;
//!
//! println!("untouched columns: {:?}", result.unclassified_columns);
//! ```
//!
//! # Batches
//!
//! [`BatchProcessor`] runs a preprocessor over a list of files, writing
//! `cleaned_<name>` next to each input (or into an output directory). A file
//! that fails is recorded in the [`BatchSummary`] and the rest still run.
//!
//! ```rust,ignore
//! use table_cleaner::{BatchProcessor, ColumnRoleConfig, TablePreprocessor};
//!
//! let preprocessor = TablePreprocessor::builder()
//!     .roles(ColumnRoleConfig::from_dir("dataset")?)
//!     .build()?;
//!
//! let batch = BatchProcessor::new(preprocessor, None).run(&files);
//! for outcome in batch.files.iter().filter(|f| !f.is_success()) {
//!     eprintln!("{:?}", outcome.failure);
//! }
//! ```

pub mod batch;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use batch::BatchProcessor;
pub use cleaner::{DataCleaner, DateValidation};
pub use config::{
    CleaningOptions, CleaningOptionsBuilder, ColumnRole, ColumnRoleConfig, ConfigValidationError,
    IdCodeOrder,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{ImputedColumn, StatisticalImputer};
pub use pipeline::{
    CleaningStage, ClosureProgressReporter, EncodedColumn, IdEncoder, MinMaxScaler,
    ProgressReporter, ProgressUpdate, ScaledColumn, TablePreprocessor, TablePreprocessorBuilder,
};
pub use reporting::{CleaningReport, ReportWriter};
pub use types::{
    ActionType, BatchSummary, CleaningAction, CleaningSummary, FileFailure, FileOutcome,
    ProcessedTable,
};
pub use utils::{clean_numeric_string, is_missing_marker, is_numeric_dtype, parse_numeric_string};
