//! Configuration types for the table cleaning pipeline.
//!
//! Two kinds of configuration drive a run:
//!
//! - [`ColumnRoleConfig`]: which columns are dates, identifiers, numeric
//!   features, or to be ignored. Loaded from plain text files, one column
//!   name per line. Missing files mean "no columns in this role".
//! - [`CleaningOptions`]: everything else (output prefix, id code ordering,
//!   accepted date formats), built with a fluent builder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the date role list inside a configuration directory.
pub const DATE_COLS_FILE: &str = "date_cols.txt";
/// File name of the identifier role list.
pub const ID_COLS_FILE: &str = "id_cols.txt";
/// File name of the numeric role list.
pub const NUMERIC_COLS_FILE: &str = "numeric_cols.txt";
/// File name of the ignore role list.
pub const IGNORE_COLS_FILE: &str = "ignore_cols.txt";

/// Default prefix prepended to cleaned output file names.
pub const DEFAULT_OUTPUT_PREFIX: &str = "cleaned_";

/// Code assigned to missing identifier values.
pub const DEFAULT_MISSING_ID_CODE: i64 = -1;

/// Read a newline-delimited list of column names.
///
/// Each line is trimmed; blank lines and lines starting with `#` are skipped.
/// A source that does not exist yields an empty set. Other I/O failures
/// (permissions, invalid UTF-8) are returned as errors.
pub fn load_role_list(path: impl AsRef<Path>) -> std::io::Result<BTreeSet<String>> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Role list {} not found, using empty set", path.display());
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(e),
    };

    Ok(parse_role_list(&content))
}

/// Parse role list content (see [`load_role_list`]).
pub fn parse_role_list(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// The effective role of a column after resolving the role sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Parsed as a date; rows with invalid dates are dropped.
    Date,
    /// Replaced by dense integer codes.
    Identifier,
    /// Min-max scaled to [0, 1].
    Numeric,
    /// Dropped from the output.
    Ignored,
    /// Not named in any role set; passed through untouched.
    Unclassified,
}

/// Column roles for one run.
///
/// The sets may overlap. `ignore_cols` wins over everything else; among the
/// other three the precedence is date, then identifier, then numeric (see
/// [`ColumnRoleConfig::role_of`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoleConfig {
    /// Columns parsed and validated as dates.
    pub date_cols: BTreeSet<String>,
    /// Columns encoded as integer codes.
    pub id_cols: BTreeSet<String>,
    /// Columns min-max scaled.
    pub numeric_cols: BTreeSet<String>,
    /// Columns dropped before any other processing.
    pub ignore_cols: BTreeSet<String>,
}

impl ColumnRoleConfig {
    /// Create an empty configuration (every column unclassified).
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the four role lists from a directory.
    ///
    /// Looks for [`DATE_COLS_FILE`], [`ID_COLS_FILE`], [`NUMERIC_COLS_FILE`]
    /// and [`IGNORE_COLS_FILE`]; each is optional.
    pub fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let config = Self {
            date_cols: load_role_list(dir.join(DATE_COLS_FILE))?,
            id_cols: load_role_list(dir.join(ID_COLS_FILE))?,
            numeric_cols: load_role_list(dir.join(NUMERIC_COLS_FILE))?,
            ignore_cols: load_role_list(dir.join(IGNORE_COLS_FILE))?,
        };

        for name in config.overlaps() {
            warn!(
                "Column '{}' is listed under more than one role; using '{:?}'",
                name,
                config.role_of(&name)
            );
        }

        Ok(config)
    }

    /// Set the date columns.
    pub fn with_date_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the identifier columns.
    pub fn with_id_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the numeric columns.
    pub fn with_numeric_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ignored columns.
    pub fn with_ignore_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// True when no role set has any entry.
    pub fn is_empty(&self) -> bool {
        self.date_cols.is_empty()
            && self.id_cols.is_empty()
            && self.numeric_cols.is_empty()
            && self.ignore_cols.is_empty()
    }

    /// Whether a column is named in any of the four role sets.
    pub fn is_classified(&self, name: &str) -> bool {
        self.date_cols.contains(name)
            || self.id_cols.contains(name)
            || self.numeric_cols.contains(name)
            || self.ignore_cols.contains(name)
    }

    /// Resolve the effective role of a column.
    ///
    /// Precedence: ignored > date > identifier > numeric.
    pub fn role_of(&self, name: &str) -> ColumnRole {
        if self.ignore_cols.contains(name) {
            ColumnRole::Ignored
        } else if self.date_cols.contains(name) {
            ColumnRole::Date
        } else if self.id_cols.contains(name) {
            ColumnRole::Identifier
        } else if self.numeric_cols.contains(name) {
            ColumnRole::Numeric
        } else {
            ColumnRole::Unclassified
        }
    }

    /// Names listed under more than one of {date, id, numeric}.
    ///
    /// Overlap with `ignore_cols` is not reported; ignoring always wins.
    pub fn overlaps(&self) -> Vec<String> {
        let mut names: BTreeSet<&String> = BTreeSet::new();
        names.extend(self.date_cols.intersection(&self.id_cols));
        names.extend(self.date_cols.intersection(&self.numeric_cols));
        names.extend(self.id_cols.intersection(&self.numeric_cols));
        names
            .into_iter()
            .filter(|name| !self.ignore_cols.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Column names whose effective role is `role`, in table order.
    pub fn columns_with_role<'a>(&self, columns: &'a [String], role: ColumnRole) -> Vec<&'a str> {
        columns
            .iter()
            .filter(|name| self.role_of(name) == role)
            .map(String::as_str)
            .collect()
    }
}

/// Order in which distinct identifier values receive their codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IdCodeOrder {
    /// Codes follow sorted value order (numeric order for numeric columns).
    #[default]
    Sorted,
    /// Codes follow the order in which values first appear.
    FirstAppearance,
}

/// Date and date-time formats tried, in order, for every date cell.
///
/// Formats without a time part are parsed as dates at midnight.
pub fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d.%m.%Y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Options for the cleaning pipeline that are not column roles.
///
/// Use [`CleaningOptions::builder()`] for a fluent setup.
///
/// # Example
///
/// ```rust,ignore
/// use table_cleaner::config::{CleaningOptions, IdCodeOrder};
///
/// let options = CleaningOptions::builder()
///     .output_prefix("clean_")
///     .id_code_order(IdCodeOrder::FirstAppearance)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningOptions {
    /// Prefix prepended to the input file name to form the output name.
    /// Default: "cleaned_"
    pub output_prefix: String,

    /// Ordering used when assigning identifier codes.
    /// Default: Sorted
    pub id_code_order: IdCodeOrder,

    /// Code written for missing identifier values. Must be negative so it
    /// never collides with a real code.
    /// Default: -1
    pub missing_id_code: i64,

    /// chrono format strings tried for every date cell, in order.
    /// Year-only and year-month values are always accepted in addition.
    pub date_formats: Vec<String>,

    /// Whether to remove duplicate rows.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether to write a JSON manifest next to each output file.
    /// Default: false
    pub emit_report: bool,

    /// Directory for cleaned output. `None` writes next to each input.
    pub output_dir: Option<PathBuf>,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            id_code_order: IdCodeOrder::default(),
            missing_id_code: DEFAULT_MISSING_ID_CODE,
            date_formats: default_date_formats(),
            remove_duplicates: true,
            emit_report: false,
            output_dir: None,
        }
    }
}

impl CleaningOptions {
    /// Create a new options builder.
    pub fn builder() -> CleaningOptionsBuilder {
        CleaningOptionsBuilder::default()
    }

    /// Validate the options and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.output_prefix.is_empty() {
            return Err(ConfigValidationError::EmptyOutputPrefix);
        }

        if self.output_prefix.contains(['/', '\\']) {
            return Err(ConfigValidationError::InvalidOutputPrefix(
                self.output_prefix.clone(),
            ));
        }

        if self.missing_id_code >= 0 {
            return Err(ConfigValidationError::NonNegativeMissingCode(
                self.missing_id_code,
            ));
        }

        if self.date_formats.is_empty() {
            return Err(ConfigValidationError::NoDateFormats);
        }

        Ok(())
    }
}

/// Errors that can occur during options validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Output prefix must not be empty")]
    EmptyOutputPrefix,

    #[error("Output prefix '{0}' must not contain path separators")]
    InvalidOutputPrefix(String),

    #[error("Missing identifier code {0} must be negative")]
    NonNegativeMissingCode(i64),

    #[error("At least one date format is required")]
    NoDateFormats,
}

/// Builder for [`CleaningOptions`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningOptionsBuilder {
    output_prefix: Option<String>,
    id_code_order: Option<IdCodeOrder>,
    missing_id_code: Option<i64>,
    date_formats: Option<Vec<String>>,
    remove_duplicates: Option<bool>,
    emit_report: Option<bool>,
    output_dir: Option<PathBuf>,
}

impl CleaningOptionsBuilder {
    /// Set the prefix for output file names.
    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = Some(prefix.into());
        self
    }

    /// Set the ordering used for identifier codes.
    pub fn id_code_order(mut self, order: IdCodeOrder) -> Self {
        self.id_code_order = Some(order);
        self
    }

    /// Set the code used for missing identifier values.
    pub fn missing_id_code(mut self, code: i64) -> Self {
        self.missing_id_code = Some(code);
        self
    }

    /// Replace the list of accepted date formats.
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable per-file JSON manifests.
    pub fn emit_report(mut self, emit: bool) -> Self {
        self.emit_report = Some(emit);
        self
    }

    /// Set the output directory for cleaned files.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the options.
    ///
    /// Returns validated `CleaningOptions` or an error if validation fails.
    pub fn build(self) -> Result<CleaningOptions, ConfigValidationError> {
        let options = CleaningOptions {
            output_prefix: self
                .output_prefix
                .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            id_code_order: self.id_code_order.unwrap_or_default(),
            missing_id_code: self.missing_id_code.unwrap_or(DEFAULT_MISSING_ID_CODE),
            date_formats: self.date_formats.unwrap_or_else(default_date_formats),
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            emit_report: self.emit_report.unwrap_or(false),
            output_dir: self.output_dir,
        };

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_role_list_trims_and_skips_blanks() {
        let set = parse_role_list("  track_id \n\n# comment\nplaylist_id\n   \n");
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["playlist_id".to_string(), "track_id".to_string()]
        );
    }

    #[test]
    fn test_load_role_list_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = load_role_list(dir.path().join("nope.txt")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_dir_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DATE_COLS_FILE), "release_date\n").unwrap();
        fs::write(dir.path().join(IGNORE_COLS_FILE), "notes\r\nlyrics\r\n").unwrap();

        let config = ColumnRoleConfig::from_dir(dir.path()).unwrap();
        assert!(config.date_cols.contains("release_date"));
        assert!(config.ignore_cols.contains("notes"));
        assert!(config.ignore_cols.contains("lyrics"));
        assert!(config.id_cols.is_empty());
        assert!(config.numeric_cols.is_empty());
    }

    #[test]
    fn test_from_dir_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = ColumnRoleConfig::from_dir(dir.path().join("absent")).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_role_precedence() {
        let config = ColumnRoleConfig::new()
            .with_date_cols(["a", "b"])
            .with_id_cols(["b", "c"])
            .with_numeric_cols(["c", "d"])
            .with_ignore_cols(["a"]);

        assert_eq!(config.role_of("a"), ColumnRole::Ignored);
        assert_eq!(config.role_of("b"), ColumnRole::Date);
        assert_eq!(config.role_of("c"), ColumnRole::Identifier);
        assert_eq!(config.role_of("d"), ColumnRole::Numeric);
        assert_eq!(config.role_of("e"), ColumnRole::Unclassified);
    }

    #[test]
    fn test_overlaps_excludes_ignored() {
        let config = ColumnRoleConfig::new()
            .with_date_cols(["a", "b"])
            .with_id_cols(["a", "b"])
            .with_ignore_cols(["a"]);

        assert_eq!(config.overlaps(), vec!["b".to_string()]);
    }

    #[test]
    fn test_columns_with_role_keeps_table_order() {
        let config = ColumnRoleConfig::new().with_numeric_cols(["tempo", "energy"]);
        let columns = vec![
            "energy".to_string(),
            "name".to_string(),
            "tempo".to_string(),
        ];
        assert_eq!(
            config.columns_with_role(&columns, ColumnRole::Numeric),
            vec!["energy", "tempo"]
        );
    }

    #[test]
    fn test_options_defaults() {
        let options = CleaningOptions::builder().build().unwrap();
        assert_eq!(options.output_prefix, "cleaned_");
        assert_eq!(options.id_code_order, IdCodeOrder::Sorted);
        assert_eq!(options.missing_id_code, -1);
        assert!(options.remove_duplicates);
        assert!(!options.emit_report);
        assert!(!options.date_formats.is_empty());
    }

    #[test]
    fn test_options_validation() {
        assert!(matches!(
            CleaningOptions::builder().output_prefix("").build(),
            Err(ConfigValidationError::EmptyOutputPrefix)
        ));
        assert!(matches!(
            CleaningOptions::builder().output_prefix("out/").build(),
            Err(ConfigValidationError::InvalidOutputPrefix(_))
        ));
        assert!(matches!(
            CleaningOptions::builder().missing_id_code(0).build(),
            Err(ConfigValidationError::NonNegativeMissingCode(0))
        ));
        assert!(matches!(
            CleaningOptions::builder()
                .date_formats(Vec::<String>::new())
                .build(),
            Err(ConfigValidationError::NoDateFormats)
        ));
    }

    #[test]
    fn test_role_config_serialization() {
        let config = ColumnRoleConfig::new().with_id_cols(["track_id"]);
        let json = serde_json::to_string(&config).unwrap();
        let back: ColumnRoleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
