//! Pearson correlation.
//!
//! Pairs are taken pairwise-complete: a row counts for two columns when
//! both values are present. An undefined coefficient (fewer than two
//! pairs, or a constant side) is `None` and serializes as `null`.

use crate::analysis::column_values;
use crate::error::{PipelineError, Result};
use crate::schema::STATION_COLUMN;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pearson correlation over the rows where both sides are present.
///
/// NaN counts as missing. The coefficient itself comes from polars.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
            _ => None,
        })
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let xs = Float64Chunked::from_vec("x".into(), xs);
    let ys = Float64Chunked::from_vec("y".into(), ys);

    // polars yields NaN when either side has zero variance
    cov::pearson_corr(&xs, &ys)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0))
}

/// Square correlation matrix, rows and columns in `columns` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pairwise Pearson correlation between `columns`.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    let data = columns
        .iter()
        .map(|c| column_values(df, c))
        .collect::<Result<Vec<_>>>()?;

    let mut values = vec![vec![None; columns.len()]; columns.len()];
    for i in 0..columns.len() {
        for j in i..columns.len() {
            let r = pearson(&data[i], &data[j]);
            // a defined self-correlation is exactly one
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

/// Correlation between two columns within one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCorrelation {
    pub station: String,
    pub rows: usize,
    pub correlation: Option<f64>,
}

/// Pearson correlation of `x` and `y` per station, stations in order of
/// first appearance. Rows without a station are ignored.
pub fn correlation_by_station(df: &DataFrame, x: &str, y: &str) -> Result<Vec<StationCorrelation>> {
    let xs = column_values(df, x)?;
    let ys = column_values(df, y)?;
    let stations = df
        .column(STATION_COLUMN)
        .map_err(|_| PipelineError::ColumnNotFound(STATION_COLUMN.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (Vec<Option<f64>>, Vec<Option<f64>>)> = HashMap::new();
    for ((station, a), b) in stations.str()?.into_iter().zip(xs).zip(ys) {
        let Some(station) = station else {
            continue;
        };
        let group = groups.entry(station.to_string()).or_insert_with(|| {
            order.push(station.to_string());
            (Vec::new(), Vec::new())
        });
        group.0.push(a);
        group.1.push(b);
    }

    Ok(order
        .into_iter()
        .filter_map(|station| {
            let (a, b) = groups.remove(&station)?;
            Some(StationCorrelation {
                rows: a.len(),
                correlation: pearson(&a, &b),
                station,
            })
        })
        .collect())
}
