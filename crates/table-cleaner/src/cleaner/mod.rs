//! Structural cleaning of tables.
//!
//! This module provides functionality for:
//! - Splitting columns into classified and unclassified
//! - Dropping ignored columns and restoring column order
//! - Removing duplicate rows
//! - Parsing date columns and dropping rows with invalid dates

mod converters;

use crate::config::ColumnRoleConfig;
use anyhow::Result;
use converters::string_to_date;
use polars::prelude::*;
use tracing::debug;

/// Result of the date validation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateValidation {
    /// `(column, unparsable cell count)` for each date column processed.
    pub invalid_cells: Vec<(String, usize)>,
    /// Rows dropped because any date column was missing.
    pub rows_dropped: usize,
}

/// Data cleaner for the structural stages of the pipeline.
pub struct DataCleaner;

impl DataCleaner {
    /// Columns named in no role set, in table order.
    pub fn unclassified_columns(columns: &[String], roles: &ColumnRoleConfig) -> Vec<String> {
        columns
            .iter()
            .filter(|name| !roles.is_classified(name))
            .cloned()
            .collect()
    }

    /// Drop every column listed in `ignore_cols`.
    ///
    /// Names that are not in the table are skipped. Returns the new table and
    /// the names actually dropped, in table order.
    pub fn drop_ignored_columns(
        df: DataFrame,
        roles: &ColumnRoleConfig,
    ) -> (DataFrame, Vec<String>) {
        let to_drop: Vec<PlSmallStr> = df
            .get_column_names()
            .into_iter()
            .filter(|name| roles.ignore_cols.contains(name.as_str()))
            .cloned()
            .collect();

        if to_drop.is_empty() {
            return (df, Vec::new());
        }

        let dropped = to_drop.iter().map(|s| s.to_string()).collect();
        (df.drop_many(to_drop), dropped)
    }

    /// Reorder columns to follow `original_order`.
    ///
    /// Names in `original_order` that are no longer in the table are skipped;
    /// columns missing from `original_order` keep their relative order at
    /// the end.
    pub fn restore_column_order(df: DataFrame, original_order: &[String]) -> Result<DataFrame> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut order: Vec<PlSmallStr> = original_order
            .iter()
            .filter(|name| present.contains(name))
            .map(|name| name.as_str().into())
            .collect();

        for name in &present {
            if !original_order.contains(name) {
                order.push(name.as_str().into());
            }
        }

        if order.iter().map(|s| s.as_str()).eq(present.iter().map(String::as_str)) {
            return Ok(df);
        }

        Ok(df.select(order)?)
    }

    /// Remove rows identical to an earlier row across all columns.
    ///
    /// The first occurrence is kept and row order is preserved. Returns the new
    /// table and the number of rows removed.
    pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
        if df.width() == 0 || df.height() < 2 {
            return Ok((df, 0));
        }

        let before = df.height();
        let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = before - deduped.height();

        debug!("Removed {} duplicate rows", removed);
        Ok((deduped, removed))
    }

    /// Parse every date column and drop rows with a missing date.
    ///
    /// `date_cols` must already be filtered to columns present in the table.
    /// Unparsable cells become nulls. Afterwards any row with a null in any
    /// of the date columns is removed. With no date columns the table is
    /// returned unchanged.
    pub fn validate_dates(
        mut df: DataFrame,
        date_cols: &[&str],
        formats: &[String],
    ) -> Result<(DataFrame, DateValidation)> {
        let mut validation = DateValidation::default();
        if date_cols.is_empty() {
            return Ok((df, validation));
        }

        for &col_name in date_cols {
            let series = df.column(col_name)?.as_materialized_series().clone();
            let (parsed, invalid) = string_to_date(&series, formats)?;
            df.replace(col_name, parsed)?;

            debug!("Parsed '{}' as dates ({} invalid cells)", col_name, invalid);
            validation.invalid_cells.push((col_name.to_string(), invalid));
        }

        let mut mask = BooleanChunked::full("keep".into(), true, df.height());
        for &col_name in date_cols {
            let not_null = df.column(col_name)?.as_materialized_series().is_not_null();
            mask = &mask & &not_null;
        }

        let before = df.height();
        let df = df.filter(&mask)?;
        validation.rows_dropped = before - df.height();

        Ok((df, validation))
    }
}
