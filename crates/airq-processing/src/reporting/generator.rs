use crate::analysis::{
    self, AQI_COLUMN, BinDistribution, ColumnDescription, CorrelationMatrix, DEFAULT_BIN_RULES,
    StationCorrelation,
};
use crate::error::{PipelineError, Result};
use crate::ingest::timestamp::timestamps;
use crate::schema::{DATETIME_COLUMN, STATION_COLUMN};
use crate::types::{CleanDataset, CleaningSummary, FileParseWarning};
use chrono::{Local, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

const HEAD_ROWS: usize = 5;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Window used by the pollutant question and the binning page.
pub const POLLUTANT_WINDOW_YEARS: u32 = 3;
/// Window used by the weather question.
pub const WEATHER_WINDOW_YEARS: u32 = 5;

// ============================================================================
// Report Types
// ============================================================================

/// Every page of the dashboard, computed from one clean dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub overview: OverviewSection,
    /// Summer wind speed vs PM2.5
    pub summer_wind: SummerWindSection,
    /// NO2 and CO vs the simple AQI over the trailing three years
    pub urban_pollutants: CorrelationSection,
    /// TEMP and DEWP vs PM10 and SO2 over the trailing five years
    pub weather_effects: CorrelationSection,
    pub binning: BinningSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewSection {
    pub rows: usize,
    pub columns: Vec<String>,
    /// Stations in order of first appearance
    pub stations: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub files_parsed: usize,
    pub warnings: Vec<FileParseWarning>,
    pub cleaning: CleaningSummary,
    pub describe: Vec<ColumnDescription>,
    /// First rows of the clean dataset, one JSON object per row
    pub head: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummerWindSection {
    pub rows: usize,
    pub correlation: Option<f64>,
    pub by_station: Vec<StationCorrelation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationSection {
    pub window_years: u32,
    pub rows: usize,
    pub matrix: CorrelationMatrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningSection {
    pub window_years: u32,
    pub rows: usize,
    pub distributions: Vec<BinDistribution>,
}

impl DashboardReport {
    /// Compute every section from `clean`.
    pub fn build(clean: &CleanDataset) -> Result<Self> {
        let df = &clean.frame;

        let overview = Self::overview(clean)?;

        let summer_df = analysis::summer(df)?;
        let summer_wind = SummerWindSection {
            rows: summer_df.height(),
            correlation: analysis::correlation_matrix(&summer_df, &["WSPM", "PM2.5"])?
                .get("WSPM", "PM2.5"),
            by_station: analysis::correlation_by_station(&summer_df, "WSPM", "PM2.5")?,
        };

        let three_year =
            analysis::with_aqi(&analysis::trailing_years(df, POLLUTANT_WINDOW_YEARS)?)?;
        let urban_pollutants = CorrelationSection {
            window_years: POLLUTANT_WINDOW_YEARS,
            rows: three_year.height(),
            matrix: analysis::correlation_matrix(&three_year, &["NO2", "CO", AQI_COLUMN])?,
        };

        let five_year = analysis::trailing_years(df, WEATHER_WINDOW_YEARS)?;
        let weather_effects = CorrelationSection {
            window_years: WEATHER_WINDOW_YEARS,
            rows: five_year.height(),
            matrix: analysis::correlation_matrix(&five_year, &["TEMP", "DEWP", "PM10", "SO2"])?,
        };

        let binning = BinningSection {
            window_years: POLLUTANT_WINDOW_YEARS,
            rows: three_year.height(),
            distributions: DEFAULT_BIN_RULES
                .iter()
                .map(|rule| analysis::bin_distribution(&three_year, rule))
                .collect::<Result<_>>()?,
        };

        debug!(
            "Built dashboard report: {} summer rows, {} rows in 3y window, {} in 5y window",
            summer_wind.rows, urban_pollutants.rows, weather_effects.rows
        );

        Ok(Self {
            generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            overview,
            summer_wind,
            urban_pollutants,
            weather_effects,
            binning,
        })
    }

    fn overview(clean: &CleanDataset) -> Result<OverviewSection> {
        let df = &clean.frame;
        let ts: Vec<NaiveDateTime> = timestamps(df)?.into_iter().flatten().collect();
        let time_range = match (ts.iter().min(), ts.iter().max()) {
            (Some(start), Some(end)) => Some(TimeRange {
                start: start.format(TIMESTAMP_FORMAT).to_string(),
                end: end.format(TIMESTAMP_FORMAT).to_string(),
            }),
            _ => None,
        };

        Ok(OverviewSection {
            rows: df.height(),
            columns: df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            stations: station_list(df)?,
            time_range,
            files_parsed: clean.ingest.parsed_files.len(),
            warnings: clean.ingest.warnings.clone(),
            cleaning: clean.summary.clone(),
            describe: analysis::describe(df)?,
            head: head_rows(df, HEAD_ROWS)?,
        })
    }
}

/// Distinct station names in order of first appearance.
fn station_list(df: &DataFrame) -> Result<Vec<String>> {
    let stations = df
        .column(STATION_COLUMN)
        .map_err(|_| PipelineError::ColumnNotFound(STATION_COLUMN.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;

    let mut seen = HashSet::new();
    Ok(stations
        .str()?
        .into_iter()
        .flatten()
        .filter(|s| seen.insert(*s))
        .map(String::from)
        .collect())
}

fn cell_to_json(value: &AnyValue) -> Value {
    if value.is_null() {
        Value::Null
    } else if let Some(s) = value.get_str() {
        json!(s)
    } else if let Some(f) = value.extract::<f64>() {
        json!(f)
    } else {
        json!(value.to_string())
    }
}

fn head_rows(df: &DataFrame, n: usize) -> Result<Vec<Map<String, Value>>> {
    let head = df.head(Some(n));
    let ts = timestamps(&head).ok();

    let mut rows = Vec::with_capacity(head.height());
    for i in 0..head.height() {
        let mut row = Map::new();
        for col in head.get_columns() {
            let value = if col.name().as_str() == DATETIME_COLUMN {
                ts.as_ref()
                    .and_then(|ts| ts[i])
                    .map(|t| json!(t.format(TIMESTAMP_FORMAT).to_string()))
                    .unwrap_or(Value::Null)
            } else {
                cell_to_json(&col.get(i)?)
            };
            row.insert(col.name().to_string(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// Report Generator
// ============================================================================

/// Writes dashboard reports to disk.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator writing into `output_dir`.
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Write a report to a JSON file.
    ///
    /// If `report_base_name` is "beijing", the file will be
    /// "beijing_report.json" inside the output directory.
    pub fn write_report_to_file(
        &self,
        report: &DashboardReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
