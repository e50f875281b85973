//! Main pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating ingestion and cleaning.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::ingest::Ingestor;
use crate::pipeline::outliers::OutlierHandler;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{CleanDataset, CleaningSummary, Dataset};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The ingestion and cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use airq_processing::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder().data_dir("data").build()?;
///
/// let clean = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("{} rows after cleaning", clean.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Shared by every report through the process-wide cache.
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Discover, parse, impute, and filter the configured station files.
    pub fn run(&self) -> Result<CleanDataset> {
        let result = Ingestor::new(&self.config)
            .with_progress(self)
            .ingest()
            .and_then(|dataset| self.clean_internal(dataset));
        self.finish(result)
    }

    /// Impute and filter an already ingested dataset.
    pub fn clean(&self, dataset: Dataset) -> Result<CleanDataset> {
        let result = self.clean_internal(dataset);
        self.finish(result)
    }

    fn finish(&self, result: Result<CleanDataset>) -> Result<CleanDataset> {
        match result {
            Ok(clean) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Clean dataset ready: {} rows",
                    clean.height()
                )));
                Ok(clean)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn clean_internal(&self, dataset: Dataset) -> Result<CleanDataset> {
        let start_time = Instant::now();
        let Dataset { mut frame, ingest } = dataset;

        let mut summary = CleaningSummary {
            rows_before: frame.height(),
            ..CleaningSummary::default()
        };
        let mut processing_steps: Vec<String> = Vec::new();

        // Step 1: imputation over the whole merged dataset
        info!("Imputing missing values over {} rows...", frame.height());
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            0.0,
            "Imputing missing values...",
        ));
        let imputation = StatisticalImputer::impute_dataset(
            &mut frame,
            self.config.empty_column_policy,
            &mut processing_steps,
            Some(self as &dyn ProgressReporter),
        )?;

        // Step 2: sequential outlier removal
        info!(
            "Removing outliers over {} monitored columns ({:?})...",
            self.config.monitored_columns.len(),
            self.config.bounds_basis
        );
        self.report_progress(ProgressUpdate::new(
            PipelineStage::OutlierRemoval,
            0.0,
            "Removing outliers...",
        ));
        let (frame, outlier_steps) = OutlierHandler::remove_outliers(
            &frame,
            &self.config.monitored_columns,
            self.config.iqr_multiplier,
            self.config.bounds_basis,
            &imputation.skipped_columns,
            &mut processing_steps,
            Some(self as &dyn ProgressReporter),
        )?;

        summary.rows_after = frame.height();
        summary.imputations = imputation.records;
        summary.skipped_columns = imputation.skipped_columns;
        summary.outlier_steps = outlier_steps;
        summary.processing_steps = processing_steps;
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Cleaning completed in {}ms: {} -> {} rows",
            summary.duration_ms, summary.rows_before, summary.rows_after
        );

        Ok(CleanDataset {
            frame,
            ingest,
            summary,
        })
    }
}

impl ProgressReporter for Pipeline {
    fn report(&self, update: ProgressUpdate) {
        self.report_progress(update);
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use airq_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StderrReporter;
    ///
    /// impl ProgressReporter for StderrReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         eprintln!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StderrReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyColumnPolicy;
    use crate::schema::{ColumnKind, STATION_COLUMNS};
    use crate::types::IngestReport;
    use parking_lot::Mutex;
    use polars::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dataset(pm25: Vec<Option<f64>>) -> Dataset {
        let height = pm25.len();
        let columns: Vec<Column> = STATION_COLUMNS
            .iter()
            .map(|(name, kind)| match (*name, kind) {
                ("PM2.5", _) => Series::new((*name).into(), pm25.clone()).into(),
                (_, ColumnKind::Integer) => Series::new((*name).into(), vec![1i64; height]).into(),
                (_, ColumnKind::Float) => Series::new((*name).into(), vec![2.0f64; height]).into(),
                (_, ColumnKind::Categorical) => {
                    Series::new((*name).into(), vec!["S"; height]).into()
                }
            })
            .collect();
        Dataset {
            frame: DataFrame::new(columns).unwrap(),
            ingest: IngestReport::default(),
        }
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.progress_reporter.is_none());
        assert_eq!(pipeline.config().iqr_multiplier, 1.5);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.iqr_multiplier = -1.0;
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.report_progress(ProgressUpdate::new(PipelineStage::Parsing, 0.5, "Test"));

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clean_imputes_before_filtering() {
        // 500 is an outlier among the present values; the null becomes the
        // median (30) and survives the filter.
        let pipeline = Pipeline::builder().build().unwrap();
        let clean = pipeline
            .clean(dataset(vec![
                Some(10.0),
                Some(20.0),
                None,
                Some(30.0),
                Some(40.0),
                Some(500.0),
            ]))
            .unwrap();

        assert_eq!(clean.summary.rows_before, 6);
        assert_eq!(clean.height(), 5);
        assert_eq!(clean.summary.imputations.len(), 1);
        assert_eq!(clean.summary.imputations[0].fill_value, "30");
        assert_eq!(clean.frame.column("PM2.5").unwrap().null_count(), 0);
        assert_eq!(
            clean.summary.outlier_steps.len(),
            pipeline.config().monitored_columns.len()
        );
    }

    #[test]
    fn test_clean_reports_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| stages_clone.lock().push(update.stage))
            .build()
            .unwrap();
        pipeline
            .clean(dataset(vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();

        let stages = stages.lock();
        assert_eq!(stages.first(), Some(&PipelineStage::Imputation));
        assert_eq!(stages.last(), Some(&PipelineStage::Complete));
        assert!(stages.contains(&PipelineStage::OutlierRemoval));
    }

    #[test]
    fn test_clean_failure_reports_failed_stage() {
        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| *last_clone.lock() = Some(update.stage))
            .build()
            .unwrap();
        let err = pipeline.clean(dataset(vec![None, None])).unwrap_err();

        assert_eq!(err.error_code(), "NO_USABLE_DATA");
        assert_eq!(*last.lock(), Some(PipelineStage::Failed));
    }

    #[test]
    fn test_clean_skip_policy_keeps_rows() {
        let config = PipelineConfig::builder()
            .empty_column_policy(EmptyColumnPolicy::Skip)
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let clean = pipeline.clean(dataset(vec![None, None, None])).unwrap();
        assert_eq!(clean.height(), 3);
        assert_eq!(clean.summary.skipped_columns, vec!["PM2.5".to_string()]);
    }
}
