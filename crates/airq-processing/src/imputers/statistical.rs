//! Statistical imputation methods.
//!
//! Numeric columns are filled with their median, categorical columns with
//! their mode. Statistics are taken over the present values of the whole
//! merged dataset.

use crate::config::EmptyColumnPolicy;
use crate::error::{PipelineError, Result};
use crate::pipeline::progress::{PipelineStage, ProgressReporter, ProgressUpdate};
use crate::schema::{ColumnKind, STATION_COLUMNS};
use crate::types::ImputationRecord;
use crate::utils::{fill_numeric_nulls, fill_string_nulls, numeric_median, string_mode};
use polars::prelude::*;
use tracing::{debug, warn};

/// Result of imputing a whole dataset.
#[derive(Debug, Clone, Default)]
pub struct ImputationOutcome {
    pub records: Vec<ImputationRecord>,
    /// Columns left null because they had no present values.
    pub skipped_columns: Vec<String>,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every declared column that has nulls.
    ///
    /// The derived `DateTime` column is never imputed. A column with nulls
    /// and no present value is handled according to `policy`. One progress
    /// update is reported per column with nulls.
    pub fn impute_dataset(
        df: &mut DataFrame,
        policy: EmptyColumnPolicy,
        processing_steps: &mut Vec<String>,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<ImputationOutcome> {
        let mut outcome = ImputationOutcome::default();

        let mut pending = Vec::new();
        for (name, kind) in STATION_COLUMNS {
            let null_count = df
                .column(name)
                .map_err(|_| PipelineError::ColumnNotFound((*name).to_string()))?
                .null_count();
            if null_count > 0 {
                pending.push((*name, *kind));
            }
        }

        for (idx, (name, kind)) in pending.iter().enumerate() {
            let record = if kind.is_numeric() {
                Self::apply_numeric_median(df, name, *kind, processing_steps)?
            } else {
                Self::apply_mode_imputation(df, name, processing_steps)?
            };

            let message = match record {
                Some(record) => {
                    let message = format!("Filled '{}' with {}", name, record.fill_value);
                    outcome.records.push(record);
                    message
                }
                None => match policy {
                    EmptyColumnPolicy::Fail => {
                        return Err(PipelineError::NoUsableData(format!(
                            "column '{}' has no values to impute from",
                            name
                        )));
                    }
                    EmptyColumnPolicy::Skip => {
                        warn!("Column '{}' has no present values; left unimputed", name);
                        processing_steps.push(format!("Skipped '{}': no present values", name));
                        outcome.skipped_columns.push((*name).to_string());
                        format!("Skipped '{}'", name)
                    }
                },
            };

            if let Some(reporter) = progress {
                reporter.report(ProgressUpdate::with_items(
                    PipelineStage::Imputation,
                    *name,
                    idx + 1,
                    pending.len(),
                    message,
                ));
            }
        }

        Ok(outcome)
    }

    /// Apply median imputation to a numeric column.
    ///
    /// Returns `None` when the column has no present value to take a median
    /// of. Integer columns stay Int64 when the median is a whole number.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        kind: ColumnKind,
        processing_steps: &mut Vec<String>,
    ) -> Result<Option<ImputationRecord>> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let filled_count = series.null_count();

        let Some(median_val) = numeric_median(&series)? else {
            return Ok(None);
        };

        let mut filled = fill_numeric_nulls(&series, median_val)?;
        if kind == ColumnKind::Integer && median_val.fract() == 0.0 {
            filled = filled.cast(&DataType::Int64)?;
        }
        df.replace(col_name, filled)?;

        processing_steps.push(format!(
            "Filled '{}' with median: {:.2}",
            col_name, median_val
        ));
        debug!(
            "Filled {} nulls in '{}' with median {}",
            filled_count, col_name, median_val
        );

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            method: "median".to_string(),
            fill_value: format!("{}", median_val),
            filled: filled_count,
        }))
    }

    /// Apply mode imputation to a categorical column.
    ///
    /// Returns `None` when the column has no present value.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<Option<ImputationRecord>> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let filled_count = series.null_count();

        let Some(mode_val) = string_mode(&series)? else {
            return Ok(None);
        };

        let filled = fill_string_nulls(&series, &mode_val)?;
        df.replace(col_name, filled)?;

        processing_steps.push(format!("Filled '{}' with mode: '{}'", col_name, mode_val));
        debug!(
            "Filled {} nulls in '{}' with mode '{}'",
            filled_count, col_name, mode_val
        );

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            method: "mode".to_string(),
            fill_value: mode_val,
            filled: filled_count,
        }))
    }
}
