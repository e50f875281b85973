//! Error types for the air-quality ingestion and cleaning pipeline.
//!
//! Fatal conditions (missing directory, no station files, nothing parseable)
//! are variants of [`PipelineError`] and halt the run. Per-file parse
//! failures are not errors: they are collected as
//! [`FileParseWarning`](crate::types::FileParseWarning)s on the dataset.
//!
//! Errors serialize as `{ code, message }` so a front end can branch on the
//! code without parsing text.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The configured input is unusable (e.g. the data directory is absent).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The data directory exists but holds no matching station files.
    #[error("No files matching '{pattern}' found in {}", .dir.display())]
    NoData { dir: PathBuf, pattern: String },

    /// Nothing usable survived parsing, or a column has no values at all.
    #[error("No usable data: {0}")]
    NoUsableData(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// A file does not match the declared station schema.
    #[error("Column '{column}' expected {expected}, found {found}")]
    SchemaMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The process-wide dataset cache was used before being installed.
    #[error("Dataset cache not installed; call install_global() first")]
    CacheNotInstalled,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NoData { .. } => "NO_DATA",
            Self::NoUsableData(_) => "NO_USABLE_DATA",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::CacheNotInstalled => "CACHE_NOT_INSTALLED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PipelineError::Configuration("missing".to_string()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            PipelineError::NoData {
                dir: PathBuf::from("data"),
                pattern: "*.csv".to_string(),
            }
            .error_code(),
            "NO_DATA"
        );
    }

    #[test]
    fn test_no_data_message_names_directory() {
        let error = PipelineError::NoData {
            dir: PathBuf::from("stations"),
            pattern: "*.csv".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("stations"));
        assert!(message.contains("*.csv"));
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::ColumnNotFound("WSPM".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("WSPM"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::NoUsableData("all files failed".to_string())
            .with_context("During merge");
        assert!(error.to_string().contains("During merge"));
        assert_eq!(error.error_code(), "NO_USABLE_DATA");
    }
}
