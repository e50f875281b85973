//! Configuration types for the ingestion and cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::schema::{self, ColumnKind, DEFAULT_MONITORED_COLUMNS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which rows the per-column outlier bounds are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundsBasis {
    /// Quartiles of each column are taken over the rows that survived the
    /// previous column's filter.
    #[default]
    SurvivingRows,
    /// Quartiles of every column are taken once over the imputed full
    /// dataset, then the filters are applied one after another.
    ImputedSnapshot,
}

/// What to do with a column that has no present values before imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EmptyColumnPolicy {
    /// Abort with a `NoUsableData` error naming the column.
    #[default]
    Fail,
    /// Leave the column null and skip it during outlier removal.
    Skip,
}

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use airq_processing::config::{PipelineConfig, BoundsBasis};
///
/// let config = PipelineConfig::builder()
///     .data_dir("data")
///     .bounds_basis(BoundsBasis::SurvivingRows)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding one CSV file per station.
    /// Default: "data"
    pub data_dir: PathBuf,

    /// Glob pattern matched against file names inside `data_dir`.
    /// Default: "*.csv"
    pub file_pattern: String,

    /// Cell values read as null.
    /// Default: "", "NA", "NaN", "N/A", "null"
    pub null_values: Vec<String>,

    /// Columns checked for outliers, in processing order.
    /// Order changes the result and is preserved exactly.
    pub monitored_columns: Vec<String>,

    /// Width of the IQR band on each side of the quartiles.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Rows the outlier bounds are computed from.
    /// Default: SurvivingRows
    pub bounds_basis: BoundsBasis,

    /// Handling of columns with no present values.
    /// Default: Fail
    pub empty_column_policy: EmptyColumnPolicy,
}

fn default_null_values() -> Vec<String> {
    ["", "NA", "NaN", "N/A", "null"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_monitored_columns() -> Vec<String> {
    DEFAULT_MONITORED_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_pattern: "*.csv".to_string(),
            null_values: default_null_values(),
            monitored_columns: default_monitored_columns(),
            iqr_multiplier: 1.5,
            bounds_basis: BoundsBasis::default(),
            empty_column_policy: EmptyColumnPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields are not defaulted; the file must describe a full
    /// configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.file_pattern.trim().is_empty() {
            return Err(ConfigValidationError::EmptyPattern);
        }

        if let Err(e) = glob::Pattern::new(&self.file_pattern) {
            return Err(ConfigValidationError::InvalidPattern {
                pattern: self.file_pattern.clone(),
                reason: e.to_string(),
            });
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        for (idx, name) in self.monitored_columns.iter().enumerate() {
            match schema::column_kind(name) {
                Some(kind) if kind.is_numeric() => {}
                Some(ColumnKind::Categorical) => {
                    return Err(ConfigValidationError::NonNumericMonitoredColumn(
                        name.clone(),
                    ));
                }
                _ => return Err(ConfigValidationError::UnknownColumn(name.clone())),
            }
            if self.monitored_columns[..idx].contains(name) {
                return Err(ConfigValidationError::DuplicateMonitoredColumn(name.clone()));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("File pattern must not be empty")]
    EmptyPattern,

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid IQR multiplier: {0} (must be a finite value >= 0)")]
    InvalidMultiplier(f64),

    #[error("Monitored column '{0}' is not part of the station schema")]
    UnknownColumn(String),

    #[error("Monitored column '{0}' is categorical")]
    NonNumericMonitoredColumn(String),

    #[error("Monitored column '{0}' is listed more than once")]
    DuplicateMonitoredColumn(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    data_dir: Option<PathBuf>,
    file_pattern: Option<String>,
    null_values: Option<Vec<String>>,
    monitored_columns: Option<Vec<String>>,
    iqr_multiplier: Option<f64>,
    bounds_basis: Option<BoundsBasis>,
    empty_column_policy: Option<EmptyColumnPolicy>,
}

impl PipelineConfigBuilder {
    /// Set the directory holding the station files.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set the glob pattern matched against file names.
    pub fn file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = Some(pattern.into());
        self
    }

    /// Set the cell values read as null.
    pub fn null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the monitored columns, in processing order.
    pub fn monitored_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.monitored_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the IQR multiplier.
    ///
    /// # Arguments
    /// * `multiplier` - Band width on each side of the quartiles (e.g., 1.5)
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set which rows the outlier bounds are computed from.
    pub fn bounds_basis(mut self, basis: BoundsBasis) -> Self {
        self.bounds_basis = Some(basis);
        self
    }

    /// Set the handling of all-null columns.
    pub fn empty_column_policy(mut self, policy: EmptyColumnPolicy) -> Self {
        self.empty_column_policy = Some(policy);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            data_dir: self.data_dir.unwrap_or_else(|| PathBuf::from("data")),
            file_pattern: self.file_pattern.unwrap_or_else(|| "*.csv".to_string()),
            null_values: self.null_values.unwrap_or_else(default_null_values),
            monitored_columns: self
                .monitored_columns
                .unwrap_or_else(default_monitored_columns),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(1.5),
            bounds_basis: self.bounds_basis.unwrap_or_default(),
            empty_column_policy: self.empty_column_policy.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.file_pattern, "*.csv");
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.bounds_basis, BoundsBasis::SurvivingRows);
        assert_eq!(config.empty_column_policy, EmptyColumnPolicy::Fail);
        assert_eq!(config.monitored_columns.len(), 11);
        assert_eq!(config.monitored_columns[0], "PM2.5");
        assert_eq!(config.monitored_columns[10], "WSPM");
        assert!(config.null_values.contains(&"NA".to_string()));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .data_dir("stations")
            .file_pattern("PRSA_*.csv")
            .monitored_columns(["TEMP", "PM10"])
            .iqr_multiplier(3.0)
            .bounds_basis(BoundsBasis::ImputedSnapshot)
            .empty_column_policy(EmptyColumnPolicy::Skip)
            .build()
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("stations"));
        assert_eq!(config.file_pattern, "PRSA_*.csv");
        assert_eq!(config.monitored_columns, vec!["TEMP", "PM10"]);
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.bounds_basis, BoundsBasis::ImputedSnapshot);
        assert_eq!(config.empty_column_policy, EmptyColumnPolicy::Skip);
    }

    #[test]
    fn test_validation_unknown_monitored_column() {
        let result = PipelineConfig::builder()
            .monitored_columns(["PM2.5", "humidity"])
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::UnknownColumn(col) if col == "humidity"
        ));
    }

    #[test]
    fn test_validation_categorical_monitored_column() {
        let result = PipelineConfig::builder().monitored_columns(["wd"]).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NonNumericMonitoredColumn(_)
        ));
    }

    #[test]
    fn test_validation_duplicate_monitored_column() {
        let result = PipelineConfig::builder()
            .monitored_columns(["CO", "NO2", "CO"])
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::DuplicateMonitoredColumn(_)
        ));
    }

    #[test]
    fn test_validation_invalid_multiplier() {
        let result = PipelineConfig::builder().iqr_multiplier(-1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidMultiplier(_)
        ));
    }

    #[test]
    fn test_validation_invalid_pattern() {
        let result = PipelineConfig::builder().file_pattern("[*.csv").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.monitored_columns, deserialized.monitored_columns);
        assert_eq!(config.bounds_basis, deserialized.bounds_basis);
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "data_dir": "/srv/air",
            "file_pattern": "*.csv",
            "null_values": ["NA"],
            "monitored_columns": ["PM2.5", "PM10"],
            "iqr_multiplier": 1.5,
            "bounds_basis": "ImputedSnapshot",
            "empty_column_policy": "Skip"
        }"#;

        let config: PipelineConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.data_dir.to_str().unwrap(), "/srv/air");
        assert_eq!(config.null_values, vec!["NA"]);
        assert_eq!(config.bounds_basis, BoundsBasis::ImputedSnapshot);
        assert_eq!(config.empty_column_policy, EmptyColumnPolicy::Skip);
        assert!(config.validate().is_ok());
    }
}
