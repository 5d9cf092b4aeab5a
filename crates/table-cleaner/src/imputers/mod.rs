//! Imputation module.
//!
//! This module provides median imputation for numeric columns.

mod statistical;

pub use statistical::{ImputedColumn, StatisticalImputer};
