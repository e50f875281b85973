//! Progress reporting for the pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use airq_processing::Pipeline;
//!
//! let clean = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Enumerating station files
    Discovery,
    /// Reading station files and deriving timestamps
    Parsing,
    /// Filling missing values
    Imputation,
    /// Sequential IQR filtering
    OutlierRemoval,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Discovery => "Discovering Files",
            Self::Parsing => "Parsing Files",
            Self::Imputation => "Imputing Values",
            Self::OutlierRemoval => "Removing Outliers",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run spent in this stage.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Discovery => 0.05,
            Self::Parsing => 0.60,
            Self::Imputation => 0.20,
            Self::OutlierRemoval => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Discovery => 0.0,
            Self::Parsing => 0.05,
            Self::Imputation => 0.65,
            Self::OutlierRemoval => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Optional sub-stage description (e.g., a file name or column)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    /// Number of items processed in current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Total items in current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a new progress update with item counts.
    pub fn with_items(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: Some(sub_stage.into()),
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: Some(current),
            items_total: Some(total),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            sub_stage: None,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            sub_stage: None,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }
}

/// Trait for receiving progress updates.
///
/// Implementations must be `Send + Sync` because the pipeline lives inside
/// the process-wide dataset cache.
pub trait ProgressReporter: Send + Sync {
    /// Called once per stage transition and once per file or column.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_stage_weights_cover_run() {
        let total: f32 = [
            PipelineStage::Discovery,
            PipelineStage::Parsing,
            PipelineStage::Imputation,
            PipelineStage::OutlierRemoval,
        ]
        .iter()
        .map(|s| s.weight())
        .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            PipelineStage::Parsing,
            "station_a.csv",
            1,
            2,
            "Parsed station_a.csv",
        );
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.35).abs() < 1e-6);
        assert_eq!(update.items_total, Some(2));
    }

    #[test]
    fn test_progress_update_serialization() {
        let update = ProgressUpdate::new(PipelineStage::OutlierRemoval, 0.0, "Filtering");
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("outlier_removal"));
        assert!(!json.contains("sub_stage"));
    }

    #[test]
    fn test_closure_reporter() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let reporter = ClosureProgressReporter::new(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::complete("done"));
        reporter.report(ProgressUpdate::failed("boom"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
