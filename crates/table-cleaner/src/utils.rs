//! Shared utilities for the table cleaning pipeline.
//!
//! This module contains helper functions used across multiple stages
//! to keep dtype checks and value parsing consistent.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Column names of a DataFrame as owned strings, in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Textual markers that mean "no value" inside otherwise numeric text.
pub const MISSING_MARKERS: [&str; 8] = [
    "nan", "n/a", "na", "null", "none", "missing", "#n/a", "-",
];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is a missing-value marker (case-insensitive).
pub fn is_missing_marker(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || MISSING_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles thousands separators, currency symbols and percent signs.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let values = series.cast(&DataType::Float64)?;
    let filled: Vec<Option<f64>> = values
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Read a Series as optional f64 values.
///
/// Numeric columns are cast directly; NaN and infinite values become nulls.
/// String columns are parsed cell by cell; missing markers become nulls.
/// The first unparsable cell is returned as the error value.
pub fn series_to_f64(series: &Series) -> Result<Vec<Option<f64>>, String> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) || dtype == &DataType::Null {
        let cast = series
            .cast(&DataType::Float64)
            .map_err(|e| e.to_string())?;
        let values = cast.f64().map_err(|e| e.to_string())?;
        return Ok(values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect());
    }

    if dtype == &DataType::Boolean {
        return Err("boolean values cannot be scaled".to_string());
    }

    if dtype != &DataType::String {
        return Err(format!("unsupported dtype {}", dtype));
    }

    let strings = series.str().map_err(|e| e.to_string())?;
    let mut out = Vec::with_capacity(strings.len());
    for opt in strings.into_iter() {
        match opt {
            None => out.push(None),
            Some(s) if is_missing_marker(s) => out.push(None),
            Some(s) => match parse_numeric_string(s) {
                Some(v) => out.push(Some(v)),
                None => return Err(format!("value '{}' is not a number", s)),
            },
        }
    }
    Ok(out)
}

// =============================================================================
// Tests
// =============================================================================
