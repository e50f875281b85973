//! Shared utilities for the pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Collect the present (non-null, non-NaN) values of a numeric Series.
pub fn present_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

/// Present values of a numeric Series in ascending order.
pub fn sorted_present_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let mut values = present_values(series)?;
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values)
}

/// Quantile of already sorted values, linearly interpolated between the
/// two nearest order statistics.
pub fn quantile_sorted(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(values[lower]);
    }
    let weight = pos - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * weight)
}

/// Median of the present values of a numeric Series.
pub fn numeric_median(series: &Series) -> PolarsResult<Option<f64>> {
    let sorted = sorted_present_values(series)?;
    Ok(quantile_sorted(&sorted, 0.5))
}

/// Most frequent value of a string Series.
///
/// Ties go to the value encountered first.
pub fn string_mode(series: &Series) -> PolarsResult<Option<String>> {
    let str_series = series.cast(&DataType::String)?;
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (idx, val) in str_series.str()?.into_iter().enumerate() {
        if let Some(val) = val {
            counts.entry(val).or_insert((0, idx)).0 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(val, _)| val.to_string()))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is Float64 regardless of the input dtype.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let filled: Float64Chunked = float_series
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.cast(&DataType::String)?;
    let filled: StringChunked = str_series
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Keep the rows of `df` where `keep` returns true for the value of
/// `column`. Nulls are passed to `keep` as `None`.
pub fn filter_by_f64<F>(df: &DataFrame, column: &str, keep: F) -> PolarsResult<DataFrame>
where
    F: Fn(Option<f64>) -> bool,
{
    let float_series = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let mask_values: Vec<bool> = float_series.f64()?.into_iter().map(keep).collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
    df.filter(&mask)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_quantile_sorted_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&values, 0.75), Some(3.25));
        assert_eq!(quantile_sorted(&values, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&values, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_numeric_median_ignores_nulls() {
        let series = Series::new("pm".into(), &[Some(3.0), None, Some(1.0), Some(2.0)]);
        assert_eq!(numeric_median(&series).unwrap(), Some(2.0));

        let all_null = Series::new("pm".into(), &[Option::<f64>::None, None]);
        assert_eq!(numeric_median(&all_null).unwrap(), None);
    }

    #[test]
    fn test_numeric_median_of_integers() {
        let series = Series::new("hour".into(), &[Some(1i64), Some(4), None]);
        assert_eq!(numeric_median(&series).unwrap(), Some(2.5));
    }

    #[test]
    fn test_string_mode() {
        let series = Series::new("wd".into(), &["N", "E", "N", "S", "N"]);
        assert_eq!(string_mode(&series).unwrap(), Some("N".to_string()));
    }

    #[test]
    fn test_string_mode_tie_goes_to_first_encountered() {
        let series = Series::new(
            "wd".into(),
            &[None, Some("SE"), Some("NW"), Some("NW"), Some("SE")],
        );
        assert_eq!(string_mode(&series).unwrap(), Some("SE".to_string()));
    }

    #[test]
    fn test_string_mode_all_null() {
        let series = Series::new("wd".into(), &[Option::<&str>::None, None]);
        assert_eq!(string_mode(&series).unwrap(), None);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.name().as_str(), "test");
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_string_nulls_keeps_values_unquoted() {
        let series = Series::new("wd".into(), &[Some("N"), None]);
        let filled = fill_string_nulls(&series, "E").unwrap();
        let values: Vec<Option<&str>> = filled.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("N"), Some("E")]);
    }

    #[test]
    fn test_filter_by_f64() {
        let df = df![
            "v" => [Some(1.0), None, Some(10.0)],
            "k" => ["a", "b", "c"],
        ]
        .unwrap();

        let kept = filter_by_f64(&df, "v", |v| v.is_some_and(|x| x < 5.0)).unwrap();
        assert_eq!(kept.height(), 1);
        let keys = kept.column("k").unwrap().as_materialized_series().clone();
        assert_eq!(keys.str().unwrap().get(0), Some("a"));
    }
}
