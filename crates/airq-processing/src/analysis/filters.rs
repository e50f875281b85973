//! Row filters by season and time window.

use crate::error::Result;
use crate::ingest::timestamp::timestamps;
use chrono::{Datelike, Months, NaiveDateTime};
use polars::prelude::*;

const SUMMER_MONTHS: [u32; 3] = [6, 7, 8];

fn filter_by_timestamp<F>(df: &DataFrame, keep: F) -> Result<DataFrame>
where
    F: Fn(NaiveDateTime) -> bool,
{
    let mask_values: Vec<bool> = timestamps(df)?
        .into_iter()
        .map(|ts| ts.is_some_and(&keep))
        .collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
    Ok(df.filter(&mask)?)
}

/// Rows recorded in June, July or August of any year.
pub fn summer(df: &DataFrame) -> Result<DataFrame> {
    filter_by_timestamp(df, |ts| SUMMER_MONTHS.contains(&ts.month()))
}

/// Latest non-null timestamp.
pub fn latest_timestamp(df: &DataFrame) -> Result<Option<NaiveDateTime>> {
    Ok(timestamps(df)?.into_iter().flatten().max())
}

/// Rows within `years` calendar years of the latest timestamp, both ends
/// inclusive. Rows without a timestamp are dropped.
pub fn trailing_years(df: &DataFrame, years: u32) -> Result<DataFrame> {
    let Some(end) = latest_timestamp(df)? else {
        return Ok(df.clear());
    };
    let start = end.checked_sub_months(Months::new(years.saturating_mul(12)));

    filter_by_timestamp(df, |ts| start.is_none_or(|start| ts >= start) && ts <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::timestamp::derive_timestamps;

    fn frame(rows: &[(i64, i64, i64)]) -> DataFrame {
        let mut df = df![
            "year" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            "month" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            "day" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            "hour" => vec![0i64; rows.len()],
        ]
        .unwrap();
        let (ts, _) = derive_timestamps(&df).unwrap();
        df.with_column(ts).unwrap();
        df
    }

    #[test]
    fn test_summer_keeps_june_to_august() {
        let df = frame(&[(2014, 5, 31), (2014, 6, 1), (2015, 8, 31), (2015, 9, 1), (2016, 7, 4)]);
        assert_eq!(summer(&df).unwrap().height(), 3);
    }

    #[test]
    fn test_trailing_years_is_inclusive() {
        let df = frame(&[(2014, 2, 27), (2014, 2, 28), (2015, 6, 1), (2017, 2, 28)]);

        let window = trailing_years(&df, 3).unwrap();
        // 2017-02-28 minus three years is 2014-02-28
        assert_eq!(window.height(), 3);
    }

    #[test]
    fn test_trailing_years_drops_invalid_timestamps() {
        let df = frame(&[(2016, 2, 30), (2016, 3, 1)]);
        assert_eq!(trailing_years(&df, 1).unwrap().height(), 1);
        assert_eq!(
            latest_timestamp(&df).unwrap().map(|ts| ts.month()),
            Some(3)
        );
    }
}
