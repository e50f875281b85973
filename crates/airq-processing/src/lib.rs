//! Air-Quality Ingestion and Cleaning Library
//!
//! Loads per-station air-quality CSV files, merges them into one dataset,
//! and cleans it for analysis, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Ingestion**: file discovery, schema-typed parsing, timestamp
//!   derivation, and merging with per-file warnings
//! - **Cleaning**: median/mode imputation, then sequential IQR outlier
//!   removal over an ordered list of monitored columns
//! - **Caching**: one clean dataset per process, shared by every report
//! - **Analysis**: seasonal and trailing-window filters, a simple AQI,
//!   Pearson correlation, fixed-threshold binning
//! - **Reporting**: the dashboard pages as one serializable report
//! - **Progress Reporting**: stage-by-stage progress updates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use airq_processing::{cache, DashboardReport, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .data_dir("data")
//!     .build()?;
//!
//! let pipeline = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//!
//! cache::install_global(pipeline);
//! let clean = cache::clean_dataset()?;
//!
//! println!("{} rows, {} files skipped", clean.height(), clean.warnings().len());
//! let report = DashboardReport::build(&clean)?;
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to customize the pipeline:
//!
//! ```rust,ignore
//! use airq_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .data_dir("data/beijing")
//!     .file_pattern("PRSA_Data_*.csv")
//!     .monitored_columns(["PM2.5", "PM10", "CO"])
//!     .bounds_basis(BoundsBasis::ImputedSnapshot)
//!     .empty_column_policy(EmptyColumnPolicy::Skip)
//!     .build()?;
//! ```

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod imputers;
pub mod ingest;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    BoundsBasis, ConfigValidationError, EmptyColumnPolicy, PipelineConfig, PipelineConfigBuilder,
};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use imputers::{ImputationOutcome, StatisticalImputer};
pub use ingest::{Ingestor, discover_files, read_station_file};
pub use pipeline::{
    ClosureProgressReporter, IqrBounds, OutlierHandler, Pipeline, PipelineBuilder, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{DashboardReport, ReportGenerator};
pub use types::{
    CleanDataset, CleaningSummary, Dataset, FileParseWarning, ImputationRecord, IngestReport,
    OutlierStep,
};
