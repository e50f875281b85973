use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A station file that could not be parsed and was left out of the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileParseWarning {
    pub file: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for FileParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to read {}: {}", self.file.display(), self.reason)
    }
}

/// What the ingestion stage read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Every file matched by discovery, in discovery order.
    pub discovered_files: Vec<PathBuf>,
    /// Files that made it into the merge, in merge order.
    pub parsed_files: Vec<PathBuf>,
    /// Files that were skipped.
    pub warnings: Vec<FileParseWarning>,
    /// Rows whose date components did not form a valid timestamp.
    pub null_timestamps: usize,
}

/// Merged station rows plus the derived `DateTime` column.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub frame: DataFrame,
    pub ingest: IngestReport,
}

impl Dataset {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn warnings(&self) -> &[FileParseWarning] {
        &self.ingest.warnings
    }
}

/// How nulls in one column were filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    /// "median" or "mode".
    pub method: String,
    /// Display form of the fill value.
    pub fill_value: String,
    pub filled: usize,
}

/// IQR filter applied for one monitored column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierStep {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl OutlierStep {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Summary of the cleaning stages for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub imputations: Vec<ImputationRecord>,
    pub outlier_steps: Vec<OutlierStep>,
    /// Columns skipped because they had no present values.
    pub skipped_columns: Vec<String>,
    pub processing_steps: Vec<String>,
    pub duration_ms: u64,
}

impl CleaningSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Imputed, outlier-filtered dataset shared by every report.
#[derive(Debug, Clone)]
pub struct CleanDataset {
    pub frame: DataFrame,
    pub ingest: IngestReport,
    pub summary: CleaningSummary,
}

impl CleanDataset {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn warnings(&self) -> &[FileParseWarning] {
        &self.ingest.warnings
    }
}
