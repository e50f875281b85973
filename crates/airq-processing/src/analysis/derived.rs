//! Derived columns.

use crate::analysis::column_values;
use crate::error::Result;
use polars::prelude::*;

/// Name of the simple air-quality index column.
pub const AQI_COLUMN: &str = "AQI";

/// Add an `AQI` column: the larger of PM2.5 and PM10 on each row.
///
/// A null on one side yields the other side; two nulls yield null.
pub fn with_aqi(df: &DataFrame) -> Result<DataFrame> {
    let pm25 = column_values(df, "PM2.5")?;
    let pm10 = column_values(df, "PM10")?;

    let aqi: Vec<Option<f64>> = pm25
        .into_iter()
        .zip(pm10)
        .map(|pair| match pair {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Series::new(AQI_COLUMN.into(), aqi))?;
    Ok(out)
}
