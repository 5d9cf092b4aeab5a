//! Min-max scaling of numeric feature columns.

use crate::error::CleaningError;
use crate::utils::series_to_f64;
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// One column after scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledColumn {
    /// Column name.
    pub column: String,
    /// Observed minimum, `None` if the column had no values.
    pub min: Option<f64>,
    /// Observed maximum, `None` if the column had no values.
    pub max: Option<f64>,
    /// Whether min equaled max, so every value was mapped to 0.
    pub degenerate: bool,
}

/// Scale values to [0, 1] using the observed range.
///
/// `scaled = (x - min) / (max - min)`; a zero-width range maps every
/// value to 0. Missing values stay missing. Ranges wider than `f64::MAX`
/// are computed on halved values.
pub fn min_max_scale(values: &[Option<f64>]) -> (Vec<Option<f64>>, Option<(f64, f64)>) {
    let range = values.iter().flatten().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(match acc {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        })
    });

    let Some((min, max)) = range else {
        return (values.to_vec(), None);
    };

    let width = max - min;
    let scale = |v: f64| {
        if min == max {
            0.0
        } else if width.is_finite() {
            ((v - min) / width).clamp(0.0, 1.0)
        } else {
            ((v / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)).clamp(0.0, 1.0)
        }
    };
    let scaled = values.iter().map(|opt| opt.map(scale)).collect();

    (scaled, Some((min, max)))
}

/// Scaler for numeric feature columns.
pub struct MinMaxScaler;

impl MinMaxScaler {
    /// Scale one column in place.
    ///
    /// Numeric columns are scaled directly. Text columns are coerced when
    /// every present cell parses as a number; otherwise a
    /// [`CleaningError::TypeMismatch`] naming the column is returned.
    pub fn scale_column(df: &mut DataFrame, col_name: &str) -> Result<ScaledColumn> {
        let series = df.column(col_name)?.as_materialized_series().clone();

        let values = series_to_f64(&series).map_err(|reason| CleaningError::TypeMismatch {
            column: col_name.to_string(),
            reason,
        })?;

        let (scaled, range) = min_max_scale(&values);
        df.replace(col_name, Series::new(col_name.into(), scaled))?;

        let result = ScaledColumn {
            column: col_name.to_string(),
            min: range.map(|(lo, _)| lo),
            max: range.map(|(_, hi)| hi),
            degenerate: range.is_some_and(|(lo, hi)| lo == hi),
        };

        debug!(
            "Scaled '{}' (min={:?}, max={:?}, degenerate={})",
            col_name, result.min, result.max, result.degenerate
        );
        Ok(result)
    }
}
