use crate::config::ColumnRoleConfig;
use crate::types::{BatchSummary, CleaningSummary};
use crate::error::{Result, ResultExt};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the batch summary written by [`ReportWriter::write_batch_summary`].
pub const BATCH_SUMMARY_FILE: &str = "cleaning_summary.json";

// ============================================================================
// Report Types
// ============================================================================

/// Manifest for one cleaned file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the cleaned output file
    pub output_file: Option<String>,
    /// Column roles in effect for this run
    pub roles: ColumnRoleConfig,
    /// What the pipeline did to the table
    pub summary: CleaningSummary,
}

impl CleaningReport {
    pub fn new(
        input: &Path,
        output: Option<&Path>,
        roles: &ColumnRoleConfig,
        summary: &CleaningSummary,
    ) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            input_file: input.display().to_string(),
            output_file: output.map(|p| p.display().to_string()),
            roles: roles.clone(),
            summary: summary.clone(),
        }
    }
}

/// Writes JSON manifests.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write a per-file report as `<base_name>_report.json`.
    pub fn write_report_to_file(
        &self,
        report: &CleaningReport,
        base_name: &str,
    ) -> Result<PathBuf> {
        let report_path = self.output_dir.join(format!("{}_report.json", base_name));
        self.write_json(&report_path, report)?;
        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Write the batch summary as [`BATCH_SUMMARY_FILE`].
    pub fn write_batch_summary(&self, batch: &BatchSummary) -> Result<PathBuf> {
        let path = self.output_dir.join(BATCH_SUMMARY_FILE);
        self.write_json(&path, batch)?;
        info!("Batch summary saved: {}", path.display());
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.output_dir)
            .context(format!("Creating '{}'", self.output_dir.display()))?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).context(format!("Writing '{}'", path.display()))
    }
}
