//! Imputation module for handling missing values.
//!
//! Every declared column is filled from its own statistic: median for
//! numeric columns, mode for categorical ones.

mod statistical;

pub use statistical::{ImputationOutcome, StatisticalImputer};
