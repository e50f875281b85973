//! Report generation module.
//!
//! [`DashboardReport`] gathers every dashboard page (overview, the three
//! questions, binning) into one serializable value, used for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use airq_processing::reporting::{DashboardReport, ReportGenerator};
//!
//! let clean = airq_processing::cache::clean_dataset()?;
//! let report = DashboardReport::build(&clean)?;
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"));
//! generator.write_report_to_file(&report, "beijing")?;
//! ```

mod generator;

pub use generator::{
    BinningSection, CorrelationSection, DashboardReport, OverviewSection, POLLUTANT_WINDOW_YEARS,
    ReportGenerator, SummerWindSection, TimeRange, WEATHER_WINDOW_YEARS,
};
