//! Process-wide memoization of the clean dataset.
//!
//! Every report page reads the same [`CleanDataset`]. The first call to
//! [`clean_dataset`] runs the pipeline; later calls return the same
//! `Arc` without touching the disk again. A failed run is not cached, so
//! a later call retries.
//!
//! ```rust,ignore
//! use airq_processing::{cache, Pipeline};
//!
//! cache::install_global(Pipeline::builder().build()?);
//! let clean = cache::clean_dataset()?;
//! ```

use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;
use crate::types::CleanDataset;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();

/// Lazily computed, shared clean dataset.
pub struct DatasetCache {
    pipeline: Pipeline,
    slot: Mutex<Option<Arc<CleanDataset>>>,
}

static_assertions::assert_impl_all!(DatasetCache: Send, Sync);

impl DatasetCache {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached dataset, running the pipeline on first use.
    ///
    /// The lock is held while the pipeline runs so concurrent first callers
    /// wait for one run instead of starting their own.
    pub fn get(&self) -> Result<Arc<CleanDataset>> {
        let mut slot = self.slot.lock();
        if let Some(clean) = slot.as_ref() {
            debug!("Serving cached clean dataset");
            return Ok(Arc::clone(clean));
        }

        info!("Building clean dataset...");
        let clean = Arc::new(self.pipeline.run()?);
        *slot = Some(Arc::clone(&clean));
        Ok(clean)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Install the pipeline behind [`clean_dataset`].
///
/// Returns `false` if a cache was already installed; the first pipeline
/// stays in place.
pub fn install_global(pipeline: Pipeline) -> bool {
    GLOBAL.set(DatasetCache::new(pipeline)).is_ok()
}

/// The process-wide clean dataset.
pub fn clean_dataset() -> Result<Arc<CleanDataset>> {
    GLOBAL
        .get()
        .ok_or(PipelineError::CacheNotInstalled)?
        .get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str =
        "No,year,month,day,hour,PM2.5,PM10,SO2,NO2,CO,O3,TEMP,PRES,DEWP,RAIN,wd,WSPM,station";

    fn pipeline_for(dir: &std::path::Path) -> Pipeline {
        let config = PipelineConfig::builder().data_dir(dir).build().unwrap();
        Pipeline::builder().config(config).build().unwrap()
    }

    #[test]
    fn test_cache_returns_same_dataset() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("a.csv"),
            format!("{HEADER}\n1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,A\n"),
        )
        .unwrap();

        let cache = DatasetCache::new(pipeline_for(tmp.path()));
        assert!(!cache.is_loaded());

        let first = cache.get().unwrap();
        // Removing the input proves the second call does not re-read it.
        fs::remove_file(tmp.path().join("a.csv")).unwrap();
        let second = cache.get().unwrap();

        assert!(cache.is_loaded());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_run_is_not_cached() {
        let tmp = TempDir::new().unwrap();
        let cache = DatasetCache::new(pipeline_for(tmp.path()));

        let err = cache.get().unwrap_err();
        assert_eq!(err.error_code(), "NO_DATA");
        assert!(!cache.is_loaded());

        fs::write(
            tmp.path().join("a.csv"),
            format!("{HEADER}\n1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,A\n"),
        )
        .unwrap();
        assert_eq!(cache.get().unwrap().height(), 1);
    }
}
