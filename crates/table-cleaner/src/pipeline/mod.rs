//! Pipeline module.
//!
//! This module provides the cleaning pipeline and the column-wise stages it
//! runs after the structural cleaning in [`crate::cleaner`].

mod builder;
pub mod encoding;
pub mod progress;
pub mod scaling;

pub use builder::{TablePreprocessor, TablePreprocessorBuilder};
pub use encoding::{EncodedColumn, IdEncoder};
pub use progress::{ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate};
pub use scaling::{MinMaxScaler, ScaledColumn};
