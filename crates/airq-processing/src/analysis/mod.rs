//! Analysis over the clean dataset.
//!
//! Everything here is read-only: functions take the clean frame and return
//! a new frame or a plain result struct.

pub mod binning;
pub mod correlation;
mod derived;
mod describe;
mod filters;

pub use binning::{BinCount, BinDistribution, BinRule, DEFAULT_BIN_RULES, bin_distribution};
pub use correlation::{
    CorrelationMatrix, StationCorrelation, correlation_by_station, correlation_matrix, pearson,
};
pub use derived::{AQI_COLUMN, with_aqi};
pub use describe::{ColumnDescription, describe};
pub use filters::{latest_timestamp, summer, trailing_years};

use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// Values of a numeric column as `f64`, nulls kept in place.
pub(crate) fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}
