//! Summary statistics per numeric column.

use crate::error::Result;
use crate::schema::DATETIME_COLUMN;
use crate::utils::{is_numeric_dtype, quantile_sorted, sorted_present_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Count, mean, sample standard deviation, and quartiles of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

fn describe_series(series: &Series) -> Result<ColumnDescription> {
    let values = sorted_present_values(series)?;
    let count = values.len();

    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = match mean {
        Some(mean) if count > 1 => {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            Some(variance.sqrt())
        }
        _ => None,
    };

    Ok(ColumnDescription {
        column: series.name().to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q75: quantile_sorted(&values, 0.75),
        max: values.last().copied(),
    })
}

/// Describe every numeric column of `df` in column order.
pub fn describe(df: &DataFrame) -> Result<Vec<ColumnDescription>> {
    df.get_columns()
        .iter()
        .filter(|c| c.name().as_str() != DATETIME_COLUMN && is_numeric_dtype(c.dtype()))
        .map(|c| describe_series(c.as_materialized_series()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_numeric_columns_only() {
        let df = df![
            "PM10" => [
                Some(2.0),
                Some(4.0),
                None,
                Some(4.0),
                Some(5.0),
                Some(7.0),
                Some(9.0),
                Some(4.0),
                Some(5.0),
            ],
            "wd" => ["N", "N", "E", "E", "S", "S", "W", "W", "N"],
        ]
        .unwrap();

        let described = describe(&df).unwrap();
        assert_eq!(described.len(), 1);

        let pm10 = &described[0];
        assert_eq!(pm10.column, "PM10");
        assert_eq!(pm10.count, 8);
        assert_eq!(pm10.mean, Some(5.0));
        // sample variance 32 / 7
        assert!((pm10.std.unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(pm10.min, Some(2.0));
        assert_eq!(pm10.median, Some(4.5));
        assert_eq!(pm10.max, Some(9.0));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let df = df!["SO2" => [3.0]].unwrap();
        let described = describe(&df).unwrap();
        assert_eq!(described[0].std, None);
        assert_eq!(described[0].q25, Some(3.0));
    }
}
