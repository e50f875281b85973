//! Outlier handling module.
//!
//! Rows are dropped column by column using the IQR rule. Filtering is
//! sequential: a row that survives one column's filter is then tested
//! against the next, so the order of the monitored columns matters.

use crate::config::BoundsBasis;
use crate::error::{PipelineError, Result};
use crate::pipeline::progress::{PipelineStage, ProgressReporter, ProgressUpdate};
use crate::types::OutlierStep;
use crate::utils::{filter_by_f64, quantile_sorted, sorted_present_values};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Inclusive outlier bounds for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Bounds from ascending values; `None` when there are no values.
    pub fn compute(sorted: &[f64], multiplier: f64) -> Option<Self> {
        let q1 = quantile_sorted(sorted, 0.25)?;
        let q3 = quantile_sorted(sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Bounds over the present values of `column` in `df`.
    pub fn for_column(df: &DataFrame, column: &str, multiplier: f64) -> Result<Option<Self>> {
        let series = df
            .column(column)
            .map_err(|_| PipelineError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();
        let sorted = sorted_present_values(series)?;
        Ok(Self::compute(&sorted, multiplier))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Handles outlier detection and removal.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Drop rows outside the IQR band of each column in `columns`, in order.
    ///
    /// Nulls never fall inside a band, so rows with a null in a filtered
    /// column are dropped too. Columns named in `skipped` are left alone.
    /// Returns the surviving frame and one [`OutlierStep`] per filtered
    /// column. One progress update is reported per monitored column.
    pub fn remove_outliers(
        df: &DataFrame,
        columns: &[String],
        multiplier: f64,
        basis: BoundsBasis,
        skipped: &[String],
        processing_steps: &mut Vec<String>,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<(DataFrame, Vec<OutlierStep>)> {
        let active: Vec<&String> = columns.iter().filter(|c| !skipped.contains(*c)).collect();

        let snapshot: HashMap<&str, Option<IqrBounds>> = match basis {
            BoundsBasis::ImputedSnapshot => active
                .iter()
                .map(|&col| Ok((col.as_str(), IqrBounds::for_column(df, col, multiplier)?)))
                .collect::<Result<_>>()?,
            BoundsBasis::SurvivingRows => HashMap::new(),
        };

        let mut current = df.clone();
        let mut steps = Vec::with_capacity(active.len());
        let total = active.len();
        let report = |idx: usize, col: &str, message: String| {
            if let Some(reporter) = progress {
                reporter.report(ProgressUpdate::with_items(
                    PipelineStage::OutlierRemoval,
                    col,
                    idx + 1,
                    total,
                    message,
                ));
            }
        };

        for (idx, col) in active.into_iter().enumerate() {
            let bounds = match basis {
                BoundsBasis::SurvivingRows => IqrBounds::for_column(&current, col, multiplier)?,
                BoundsBasis::ImputedSnapshot => snapshot.get(col.as_str()).copied().flatten(),
            };

            let Some(bounds) = bounds else {
                processing_steps.push(format!("Skipped outlier filter on '{}': no values", col));
                report(idx, col.as_str(), format!("Skipped '{}': no values", col));
                continue;
            };

            let rows_before = current.height();
            current = filter_by_f64(&current, col, |v| v.is_some_and(|v| bounds.contains(v)))?;
            let rows_after = current.height();

            debug!(
                "'{}' bounds [{:.3}, {:.3}] kept {}/{} rows",
                col, bounds.lower, bounds.upper, rows_after, rows_before
            );
            processing_steps.push(format!(
                "Removed {} outlier rows on '{}' (bounds [{:.2}, {:.2}])",
                rows_before - rows_after,
                col,
                bounds.lower,
                bounds.upper
            ));

            report(
                idx,
                col.as_str(),
                format!("'{}' kept {} of {} rows", col, rows_after, rows_before),
            );

            steps.push(OutlierStep {
                column: col.clone(),
                q1: bounds.q1,
                q3: bounds.q3,
                iqr: bounds.iqr,
                lower_bound: bounds.lower,
                upper_bound: bounds.upper,
                rows_before,
                rows_after,
            });
        }

        Ok((current, steps))
    }
}
