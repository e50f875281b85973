//! Timestamp derivation from the year/month/day/hour columns.

use crate::schema::{DATETIME_COLUMN, DAY_COLUMN, HOUR_COLUMN, MONTH_COLUMN, YEAR_COLUMN};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Build a timestamp from its components.
///
/// Returns `None` for anything that is not a real calendar hour: missing
/// components, month 13, February 30th, hour 24, negative values.
pub fn compose_timestamp(
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    hour: Option<i64>,
) -> Option<NaiveDateTime> {
    let year = i32::try_from(year?).ok()?;
    let month = u32::try_from(month?).ok()?;
    let day = u32::try_from(day?).ok()?;
    let hour = u32::try_from(hour?).ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

fn int_column(df: &DataFrame, name: &str) -> PolarsResult<Int64Chunked> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(series.i64()?.clone())
}

/// Derive the `DateTime` column for every row of `df`.
///
/// Rows whose components do not form a valid timestamp get a null; the
/// second element of the result counts them.
pub fn derive_timestamps(df: &DataFrame) -> PolarsResult<(Series, usize)> {
    let years = int_column(df, YEAR_COLUMN)?;
    let months = int_column(df, MONTH_COLUMN)?;
    let days = int_column(df, DAY_COLUMN)?;
    let hours = int_column(df, HOUR_COLUMN)?;

    let mut invalid = 0;
    let millis: Vec<Option<i64>> = years
        .into_iter()
        .zip(months.into_iter())
        .zip(days.into_iter())
        .zip(hours.into_iter())
        .map(|(((y, m), d), h)| {
            let ts = compose_timestamp(y, m, d, h).map(|dt| dt.and_utc().timestamp_millis());
            if ts.is_none() {
                invalid += 1;
            }
            ts
        })
        .collect();

    let series = Int64Chunked::from_iter_options(DATETIME_COLUMN.into(), millis.into_iter())
        .into_datetime(TimeUnit::Milliseconds, None)
        .into_series();

    Ok((series, invalid))
}

/// Read the `DateTime` column back as chrono values.
pub fn timestamps(df: &DataFrame) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let millis = df
        .column(DATETIME_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;

    Ok(millis
        .i64()?
        .into_iter()
        .map(|ms| {
            ms.and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.naive_utc())
        })
        .collect())
}
