//! Reading and writing delimited tables.

use crate::error::{CleaningError, Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load a comma-delimited file with a header row.
///
/// The schema is inferred from the whole file so late rows with a different
/// shape do not fail the read. If the strict read fails, the content is
/// pre-cleaned (blank lines removed) and read once more.
pub fn read_table(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let read_failed = |reason: String| CleaningError::ReadFailed {
        path: path.display().to_string(),
        reason,
    };

    let strict = CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish());

    match strict {
        Ok(df) => {
            debug!("Loaded {} with shape {:?}", path.display(), df.shape());
            return Ok(df);
        }
        Err(e) => {
            debug!("Standard loading of {} failed: {}", path.display(), e);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| read_failed(e.to_string()))?;
    let cleaned = clean_csv_content(&content);

    CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| read_failed(e.to_string()))
}

/// Drop blank lines that confuse the CSV parser.
fn clean_csv_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a table as comma-delimited text with a header row.
///
/// The parent directory is created if needed.
pub fn write_table(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let context = || format!("Writing '{}'", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(context())?;
    }

    let mut file = File::create(path).context(context())?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(context())?;

    info!("Table saved: {}", path.display());
    Ok(())
}

/// Output file name for an input file: `<prefix><input file name>`.
///
/// Returns `None` if the input path has no file name.
pub fn cleaned_file_name(input: impl AsRef<Path>, prefix: &str) -> Option<String> {
    input
        .as_ref()
        .file_name()
        .map(|name| format!("{}{}", prefix, name.to_string_lossy()))
}

/// Output path for an input file inside `output_dir`.
///
/// When `output_dir` is `None` the cleaned file lands next to the input.
pub fn cleaned_file_path(
    input: impl AsRef<Path>,
    output_dir: Option<&Path>,
    prefix: &str,
) -> Option<PathBuf> {
    let input = input.as_ref();
    let name = cleaned_file_name(input, prefix)?;
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Some(dir.join(name))
}
