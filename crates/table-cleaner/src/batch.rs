//! Sequential batch driver.
//!
//! Runs a [`TablePreprocessor`] over a list of files chosen by the caller,
//! writing one cleaned file per input. A failing file is recorded and the
//! remaining files still run.

use crate::error::{CleaningError, Result};
use crate::io::{cleaned_file_path, read_table, write_table};
use crate::pipeline::TablePreprocessor;
use crate::reporting::{CleaningReport, ReportWriter};
use crate::types::{BatchSummary, CleaningSummary, FileFailure, FileOutcome};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Cleans files one at a time with a shared preprocessor.
pub struct BatchProcessor {
    preprocessor: TablePreprocessor,
    output_dir: Option<PathBuf>,
}

static_assertions::assert_impl_all!(BatchProcessor: Send);

impl BatchProcessor {
    /// Create a batch processor.
    ///
    /// `output_dir` overrides the preprocessor's configured output directory;
    /// when both are `None` each cleaned file is written next to its input.
    pub fn new(preprocessor: TablePreprocessor, output_dir: Option<PathBuf>) -> Self {
        let output_dir = output_dir.or_else(|| preprocessor.options().output_dir.clone());
        Self {
            preprocessor,
            output_dir,
        }
    }

    /// Clean every file in `files`, in order.
    pub fn run(&self, files: &[PathBuf]) -> BatchSummary {
        let start_time = Instant::now();
        let mut batch = BatchSummary::default();

        for (i, path) in files.iter().enumerate() {
            info!("[{}/{}] Processing {}", i + 1, files.len(), path.display());
            let outcome = match self.process_file(path) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let e = e.with_context(format!("Processing '{}'", path.display()));
                    error!("{}", e);
                    FileOutcome {
                        input: path.clone(),
                        output: None,
                        report: None,
                        unclassified_columns: Vec::new(),
                        summary: None,
                        failure: Some(FileFailure {
                            code: e.error_code().to_string(),
                            message: e.to_string(),
                        }),
                    }
                }
            };
            batch.files.push(outcome);
        }

        batch.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Batch complete: {} succeeded, {} failed ({} ms)",
            batch.succeeded(),
            batch.failed(),
            batch.duration_ms
        );
        batch
    }

    /// Read, clean and write a single file.
    pub fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let options = self.preprocessor.options();
        let output = cleaned_file_path(path, self.output_dir.as_deref(), &options.output_prefix)
            .ok_or_else(|| CleaningError::WriteFailed {
                path: path.display().to_string(),
                reason: "input path has no file name".to_string(),
            })?;

        let df = read_table(path)?;
        let mut result = self.preprocessor.process(df)?;

        if !result.unclassified_columns.is_empty() {
            warn!(
                "{}: columns passed through unchanged: {}",
                path.display(),
                result.unclassified_columns.join(", ")
            );
        }

        write_table(&mut result.table, &output)?;

        let report = if options.emit_report {
            Some(self.write_report(path, &output, &result.summary)?)
        } else {
            None
        };

        Ok(FileOutcome {
            input: path.to_path_buf(),
            output: Some(output),
            report,
            unclassified_columns: result.unclassified_columns,
            summary: Some(result.summary),
            failure: None,
        })
    }

    fn write_report(
        &self,
        input: &Path,
        output: &Path,
        summary: &CleaningSummary,
    ) -> Result<PathBuf> {
        let dir = output.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let report = CleaningReport::new(input, Some(output), self.preprocessor.roles(), summary);
        ReportWriter::new(dir).write_report_to_file(&report, &stem)
    }
}
