//! Statistical imputation methods.
//!
//! Missing numeric cells are filled with the column's own median.

use crate::utils::{fill_numeric_nulls, is_numeric_dtype, series_to_f64};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use tracing::debug;

/// One column filled by the imputer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputedColumn {
    /// Column name.
    pub column: String,
    /// Median used as the fill value.
    pub fill_value: f64,
    /// Number of cells filled.
    pub filled: usize,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing values in every numeric-typed column with its median.
    ///
    /// Columns are selected by dtype, not by role. Float NaN counts as
    /// missing. Columns without missing values are left untouched (and keep
    /// their dtype); empty or all-missing columns are skipped. Returns one
    /// entry per column that was filled, in table order.
    pub fn impute_numeric_medians(df: &mut DataFrame) -> Result<Vec<ImputedColumn>> {
        let numeric_cols: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect();

        let mut imputed = Vec::new();
        for col_name in &numeric_cols {
            if let Some(result) = Self::apply_numeric_median(df, col_name)? {
                imputed.push(result);
            }
        }
        Ok(imputed)
    }

    /// Apply median imputation to a single numeric column.
    ///
    /// Returns `None` when the column is absent, has nothing to fill, or has
    /// no observed values to take a median from.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
    ) -> Result<Option<ImputedColumn>> {
        let Ok(column) = df.column(col_name) else {
            return Ok(None);
        };
        let series = column.as_materialized_series();

        let values = series_to_f64(series).map_err(|reason| anyhow!(reason))?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            return Ok(None);
        }

        let observed = Series::new(series.name().clone(), values);
        let Some(median_val) = observed.median() else {
            debug!("Column '{}' has no observed values, skipping median fill", col_name);
            return Ok(None);
        };

        let filled = fill_numeric_nulls(&observed, median_val)?;
        df.replace(col_name, filled)?;

        debug!("Filled {} cells in '{}' with median {:.4}", missing, col_name, median_val);
        Ok(Some(ImputedColumn {
            column: col_name.to_string(),
            fill_value: median_val,
            filled: missing,
        }))
    }
}
