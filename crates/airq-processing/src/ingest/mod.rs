//! Ingestion: station file discovery, parsing, and merging.
//!
//! [`Ingestor::ingest`] turns a data directory into one [`Dataset`]:
//!
//! 1. [`discover_files`] lists matching files (fatal if none).
//! 2. Each file is read with the static schema and gets a `DateTime`
//!    column. A file that fails is skipped with a
//!    [`FileParseWarning`](crate::types::FileParseWarning).
//! 3. Parsed files are stacked in discovery order (fatal if none parsed).

mod discovery;
mod reader;
pub mod timestamp;

pub use discovery::discover_files;
pub use reader::{StationFrame, read_station_file};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::progress::{PipelineStage, ProgressReporter, ProgressUpdate};
use crate::types::{Dataset, FileParseWarning, IngestReport};
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

/// Reads the configured data directory into a [`Dataset`].
pub struct Ingestor<'a> {
    config: &'a PipelineConfig,
    progress: Option<&'a dyn ProgressReporter>,
}

impl<'a> Ingestor<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Report per-file progress to `reporter`.
    pub fn with_progress(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.progress = Some(reporter);
        self
    }

    fn report(&self, update: ProgressUpdate) {
        if let Some(reporter) = self.progress {
            reporter.report(update);
        }
    }

    /// Discover station files in the configured directory.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        self.report(ProgressUpdate::new(
            PipelineStage::Discovery,
            0.0,
            format!("Scanning {}", self.config.data_dir.display()),
        ));
        let files = discover_files(&self.config.data_dir, &self.config.file_pattern)?;
        self.report(ProgressUpdate::new(
            PipelineStage::Discovery,
            1.0,
            format!("Found {} station files", files.len()),
        ));
        Ok(files)
    }

    /// Parse every file and stack the successful ones.
    ///
    /// Row order is kept within each file and files are stacked in the
    /// order given.
    pub fn parse_and_merge(&self, files: &[PathBuf]) -> Result<Dataset> {
        let mut report = IngestReport {
            discovered_files: files.to_vec(),
            ..IngestReport::default()
        };
        let mut merged: Option<DataFrame> = None;

        for (idx, file) in files.iter().enumerate() {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());

            match read_station_file(file, &self.config.null_values) {
                Ok(StationFrame {
                    frame,
                    null_timestamps,
                }) => {
                    match merged.as_mut() {
                        Some(acc) => {
                            acc.vstack_mut(&frame)?;
                        }
                        None => merged = Some(frame),
                    }
                    report.null_timestamps += null_timestamps;
                    report.parsed_files.push(file.clone());
                    self.report(ProgressUpdate::with_items(
                        PipelineStage::Parsing,
                        name.as_str(),
                        idx + 1,
                        files.len(),
                        format!("Parsed {}", name),
                    ));
                }
                Err(e) => {
                    let warning = FileParseWarning {
                        file: file.clone(),
                        reason: e.to_string(),
                    };
                    warn!("{}", warning);
                    report.warnings.push(warning);
                    self.report(ProgressUpdate::with_items(
                        PipelineStage::Parsing,
                        name.as_str(),
                        idx + 1,
                        files.len(),
                        format!("Skipped {}", name),
                    ));
                }
            }
        }

        let Some(frame) = merged else {
            return Err(PipelineError::NoUsableData(format!(
                "none of the {} discovered files could be parsed",
                files.len()
            )));
        };

        if frame.height() == 0 {
            return Err(PipelineError::NoUsableData(
                "parsed station files contain no rows".to_string(),
            ));
        }

        info!(
            "Merged {} rows from {}/{} files ({} skipped, {} rows without timestamp)",
            frame.height(),
            report.parsed_files.len(),
            files.len(),
            report.warnings.len(),
            report.null_timestamps
        );

        Ok(Dataset {
            frame,
            ingest: report,
        })
    }

    /// Discover and then parse-and-merge.
    pub fn ingest(&self) -> Result<Dataset> {
        let files = self.discover()?;
        self.parse_and_merge(&files)
    }
}
