//! CLI entry point for the table cleaner.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::fs;
use std::path::{Path, PathBuf};
use table_cleaner::{
    BatchProcessor, CleaningOptions, ColumnRoleConfig, IdCodeOrder, ReportWriter, TablePreprocessor,
};
use tracing::{debug, info, warn};

/// CLI-compatible identifier code ordering
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliIdOrder {
    /// Codes follow sorted value order
    Sorted,
    /// Codes follow first appearance in the table
    FirstAppearance,
}

impl From<CliIdOrder> for IdCodeOrder {
    fn from(cli: CliIdOrder) -> Self {
        match cli {
            CliIdOrder::Sorted => IdCodeOrder::Sorted,
            CliIdOrder::FirstAppearance => IdCodeOrder::FirstAppearance,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Batch cleaner for CSV tables",
    long_about = "Cleans every CSV file in a directory using per-role column lists.\n\n\
                  ROLE FILES (one column name per line, in the config directory):\n  \
                  date_cols.txt     parsed as dates; rows with invalid dates are dropped\n  \
                  id_cols.txt       replaced with integer codes\n  \
                  numeric_cols.txt  min-max scaled to [0, 1]\n  \
                  ignore_cols.txt   dropped\n\n\
                  EXAMPLES:\n  \
                  # Clean everything in ./dataset\n  \
                  table-cleaner\n\n  \
                  # Clean two files into a separate directory\n  \
                  table-cleaner -i data --file tracks.csv --file playlists.csv -o out/"
)]
struct Args {
    /// Directory containing the CSV files to clean
    #[arg(short, long, default_value = "dataset")]
    input_dir: PathBuf,

    /// Directory containing the role files (default: input directory)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Directory for cleaned files (default: input directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Clean only these files (by name); may be repeated
    #[arg(short, long = "file")]
    files: Vec<String>,

    /// Prefix for cleaned file names
    #[arg(long, default_value = "cleaned_")]
    prefix: String,

    /// Ordering used for identifier codes
    #[arg(long, value_enum, default_value = "sorted")]
    id_order: CliIdOrder,

    /// Keep duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Write a <name>_report.json manifest next to each cleaned file, plus
    /// a cleaning_summary.json for the whole batch
    #[arg(long)]
    emit_report: bool,

    /// Print the batch summary as JSON to stdout (disables logging)
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(level: &str, quiet: bool, json_output: bool) {
    // stdout carries only the JSON summary in --json mode
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// CSV files in `dir`, sorted by name, excluding earlier cleaner output.
fn discover_csv_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Cannot read input directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| !name.to_string_lossy().starts_with(prefix))
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Restrict `discovered` to the requested names, keeping request order.
fn select_files(discovered: Vec<PathBuf>, requested: &[String]) -> Result<Vec<PathBuf>> {
    if requested.is_empty() {
        return Ok(discovered);
    }

    requested
        .iter()
        .map(|name| {
            discovered
                .iter()
                .find(|path| path.file_name().is_some_and(|f| f.to_string_lossy() == *name))
                .cloned()
                .ok_or_else(|| anyhow!("File '{}' is not among the discovered CSV files", name))
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !args.input_dir.is_dir() {
        return Err(anyhow!(
            "Input directory not found: {}",
            args.input_dir.display()
        ));
    }

    let discovered = discover_csv_files(&args.input_dir, &args.prefix)?;
    if discovered.is_empty() {
        warn!("No CSV files found in {}", args.input_dir.display());
        return Ok(());
    }
    info!(
        "Found {} CSV files: {}",
        discovered.len(),
        discovered
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let files = select_files(discovered, &args.files)?;

    let config_dir = args.config_dir.as_deref().unwrap_or(&args.input_dir);
    let roles = ColumnRoleConfig::from_dir(config_dir).with_context(|| {
        format!("Cannot load column roles from '{}'", config_dir.display())
    })?;
    debug!("Column roles: {:?}", roles);
    if roles.is_empty() {
        warn!(
            "No role files found in {}; every column will be passed through",
            config_dir.display()
        );
    }

    let options = CleaningOptions::builder()
        .output_prefix(&args.prefix)
        .id_code_order(args.id_order.into())
        .remove_duplicates(!args.keep_duplicates)
        .emit_report(args.emit_report)
        .build()?;

    let preprocessor = TablePreprocessor::builder()
        .roles(roles)
        .options(options)
        .build()?;

    let batch = BatchProcessor::new(preprocessor, args.output_dir.clone()).run(&files);

    if args.emit_report {
        let summary_dir = args.output_dir.as_deref().unwrap_or(&args.input_dir);
        ReportWriter::new(summary_dir).write_batch_summary(&batch)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        for outcome in &batch.files {
            match (&outcome.output, &outcome.failure) {
                (Some(output), _) => {
                    info!("Cleaned {} -> {}", outcome.input.display(), output.display())
                }
                (None, Some(failure)) => warn!("[{}] {}", failure.code, failure.message),
                (None, None) => {}
            }
        }
    }

    if batch.has_failures() {
        return Err(anyhow!(
            "{} of {} files failed",
            batch.failed(),
            batch.files.len()
        ));
    }

    Ok(())
}
