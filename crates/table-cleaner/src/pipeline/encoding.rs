//! Identifier encoding.
//!
//! Replaces the values of identifier columns with dense integer codes.

use crate::config::IdCodeOrder;
use crate::utils::{is_numeric_dtype, series_to_f64};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use tracing::debug;

/// One identifier column after encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedColumn {
    /// Column name.
    pub column: String,
    /// Number of distinct non-missing values (codes `0..distinct_values`).
    pub distinct_values: usize,
    /// Number of cells that received the missing-value code.
    pub missing: usize,
}

/// f64 key with a total order, used so numeric ids sort numerically.
#[derive(Debug, Clone, Copy)]
struct NumericKey(f64);

impl NumericKey {
    fn new(value: f64) -> Self {
        // fold -0.0 into 0.0 so both get the same code
        Self(if value == 0.0 { 0.0 } else { value })
    }
}

impl PartialEq for NumericKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for NumericKey {}

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for NumericKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Assign a code to every present value.
///
/// Returns one optional code per input cell and the number of distinct values.
fn assign_codes<T>(values: &[Option<T>], order: IdCodeOrder) -> (Vec<Option<i64>>, usize)
where
    T: Ord + Hash + Clone,
{
    let lookup: HashMap<T, i64> = match order {
        IdCodeOrder::Sorted => {
            let sorted: BTreeSet<&T> = values.iter().flatten().collect();
            sorted
                .into_iter()
                .enumerate()
                .map(|(code, v)| (v.clone(), code as i64))
                .collect()
        }
        IdCodeOrder::FirstAppearance => {
            let mut lookup = HashMap::new();
            for value in values.iter().flatten() {
                let next = lookup.len() as i64;
                lookup.entry(value.clone()).or_insert(next);
            }
            lookup
        }
    };

    let codes = values
        .iter()
        .map(|opt| opt.as_ref().and_then(|v| lookup.get(v).copied()))
        .collect();

    (codes, lookup.len())
}

/// Encoder for identifier columns.
pub struct IdEncoder;

impl IdEncoder {
    /// Replace a column's values with dense integer codes.
    ///
    /// Numeric columns are ordered numerically; everything else is ordered as
    /// text. Missing values receive `missing_code`. The result is an Int64
    /// column with the same name and position.
    pub fn encode_column(
        df: &mut DataFrame,
        col_name: &str,
        order: IdCodeOrder,
        missing_code: i64,
    ) -> Result<EncodedColumn> {
        let series = df.column(col_name)?.as_materialized_series().clone();

        let (codes, distinct_values) = if is_numeric_dtype(series.dtype()) {
            let values: Vec<Option<NumericKey>> = series_to_f64(&series)
                .map_err(|reason| anyhow!(reason))?
                .into_iter()
                .map(|v| v.map(NumericKey::new))
                .collect();
            assign_codes(&values, order)
        } else {
            let as_text = series.cast(&DataType::String)?;
            let values: Vec<Option<String>> = as_text
                .str()?
                .into_iter()
                .map(|v| v.map(String::from))
                .collect();
            assign_codes(&values, order)
        };

        let missing = codes.iter().filter(|c| c.is_none()).count();
        let encoded: Vec<i64> = codes
            .into_iter()
            .map(|c| c.unwrap_or(missing_code))
            .collect();

        df.replace(col_name, Series::new(col_name.into(), encoded))?;

        debug!(
            "Encoded '{}' into {} codes ({} missing)",
            col_name, distinct_values, missing
        );
        Ok(EncodedColumn {
            column: col_name.to_string(),
            distinct_values,
            missing,
        })
    }
}
