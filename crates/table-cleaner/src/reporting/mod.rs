//! Report generation module.
//!
//! Cleaning summaries are written as pretty-printed JSON, one manifest per
//! cleaned file plus an optional summary for the whole batch.
//!
//! # Example
//!
//! ```rust,ignore
//! use table_cleaner::reporting::{CleaningReport, ReportWriter};
//!
//! let report = CleaningReport::new(&input, Some(&output), &roles, &result.summary);
//! ReportWriter::new("dataset").write_report_to_file(&report, "tracks")?;
//! ```

mod generator;

pub use generator::{BATCH_SUMMARY_FILE, CleaningReport, ReportWriter};
