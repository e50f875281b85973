//! Pipeline module.
//!
//! This module provides the ingestion and cleaning pipeline and its
//! components.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use outliers::{IqrBounds, OutlierHandler};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
