//! CLI entry point for the air-quality ingestion and cleaning pipeline.

use airq_processing::{
    BoundsBasis, CleanDataset, DashboardReport, EmptyColumnPolicy, Pipeline, PipelineConfig,
    ReportGenerator, cache,
};
use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use tracing::{error, info};

/// Environment variable overriding the configured data directory.
const DATA_DIR_ENV: &str = "AIRQ_DATA_DIR";

/// CLI-compatible bounds basis enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBoundsBasis {
    /// Quartiles over the rows surviving the previous column's filter
    Surviving,
    /// Quartiles over the imputed dataset, computed once
    Snapshot,
}

impl From<CliBoundsBasis> for BoundsBasis {
    fn from(cli: CliBoundsBasis) -> Self {
        match cli {
            CliBoundsBasis::Surviving => BoundsBasis::SurvivingRows,
            CliBoundsBasis::Snapshot => BoundsBasis::ImputedSnapshot,
        }
    }
}

/// CLI-compatible empty column policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEmptyColumns {
    /// Abort when a column has no values at all
    Fail,
    /// Leave such columns null and skip their outlier filter
    Skip,
}

impl From<CliEmptyColumns> for EmptyColumnPolicy {
    fn from(cli: CliEmptyColumns) -> Self {
        match cli {
            CliEmptyColumns::Fail => EmptyColumnPolicy::Fail,
            CliEmptyColumns::Skip => EmptyColumnPolicy::Skip,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Air-quality station data ingestion and cleaning",
    long_about = "Loads every station CSV in a directory, imputes missing values, \
                  removes IQR outliers, and summarizes the clean dataset.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  AIRQ_DATA_DIR    Data directory (overridden by --data-dir)\n  \
                  RUST_LOG         Log filter (overrides --log-level)\n\n\
                  EXAMPLES:\n  \
                  airq-processing --data-dir data/\n\n  \
                  airq-processing --data-dir data/ --monitored PM2.5,PM10,CO --bounds snapshot\n\n  \
                  airq-processing --data-dir data/ --json | jq .overview.rows"
)]
struct Args {
    /// Directory holding one CSV file per station
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Glob pattern matched against file names in the data directory
    #[arg(short, long)]
    pattern: Option<String>,

    /// JSON configuration file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monitored columns for outlier removal, in processing order
    #[arg(short, long, value_delimiter = ',')]
    monitored: Option<Vec<String>>,

    /// Rows the outlier bounds are computed from
    #[arg(long, value_enum)]
    bounds: Option<CliBoundsBasis>,

    /// Handling of columns with no values at all
    #[arg(long, value_enum)]
    empty_columns: Option<CliEmptyColumns>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the dashboard report as JSON to stdout instead of a summary
    ///
    /// Disables all logs so stdout only carries the JSON.
    #[arg(long)]
    json: bool,

    /// Write the dashboard report to the output directory
    ///
    /// The report will be saved as <data_dir_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output directory for reports
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let config = build_config(&args)?;
    info!(
        "Reading '{}' from {}",
        config.file_pattern,
        config.data_dir.display()
    );

    let pipeline = build_pipeline(&args, config.clone())?;
    cache::install_global(pipeline);

    let clean = match cache::clean_dataset() {
        Ok(clean) => clean,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    handle_output(&clean, &config, &args)
}

/// Defaults, then the JSON file, then the environment, then flags.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .map_err(|e| anyhow!("Failed to load config {}: {}", path.display(), e))?,
        None => PipelineConfig::default(),
    };

    if let Ok(dir) = env::var(DATA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        config.data_dir = PathBuf::from(dir);
    }

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(pattern) = &args.pattern {
        config.file_pattern = pattern.clone();
    }
    if let Some(columns) = &args.monitored {
        config.monitored_columns = columns.iter().map(|c| c.trim().to_string()).collect();
    }
    if let Some(bounds) = args.bounds {
        config.bounds_basis = bounds.into();
    }
    if let Some(policy) = args.empty_columns {
        config.empty_column_policy = policy.into();
    }

    config.validate()?;
    Ok(config)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print the dashboard report as JSON to stdout only (no logs)
/// - `--emit-report`: Write the dashboard report to a file
fn handle_output(clean: &CleanDataset, config: &PipelineConfig, args: &Args) -> Result<()> {
    if args.json || args.emit_report {
        let report = DashboardReport::build(clean)?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let base_name = config
            .data_dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("airq")
            .to_string();
        let generator = ReportGenerator::new(args.output.clone());
        let report_path = generator.write_report_to_file(&report, &base_name)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(clean, config);
    Ok(())
}

/// Print a human-readable summary of the clean dataset.
fn print_human_readable_summary(clean: &CleanDataset, config: &PipelineConfig) {
    let summary = &clean.summary;
    let ingest = &clean.ingest;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} of {} files parsed)",
        config.data_dir.display(),
        ingest.parsed_files.len(),
        ingest.discovered_files.len()
    );
    println!(
        "Output: {} rows x {} columns",
        clean.height(),
        clean.frame.width()
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed()
    );
    if ingest.null_timestamps > 0 {
        println!("  Rows without a valid timestamp: {}", ingest.null_timestamps);
    }
    println!();

    if !summary.imputations.is_empty() {
        println!("Imputation:");
        for record in &summary.imputations {
            println!(
                "  - {}: {} nulls filled with {} {}",
                record.column, record.filled, record.method, record.fill_value
            );
        }
        println!();
    }

    if !summary.outlier_steps.is_empty() {
        println!("Outlier Removal ({:?}):", config.bounds_basis);
        for step in &summary.outlier_steps {
            println!(
                "  - {:<6} [{:>10.2}, {:>10.2}]  {} -> {}",
                step.column, step.lower_bound, step.upper_bound, step.rows_before, step.rows_after
            );
        }
        println!();
    }

    if !summary.skipped_columns.is_empty() || !ingest.warnings.is_empty() {
        println!("Warnings:");
        for column in &summary.skipped_columns {
            println!("  ! Column '{}' has no values; left unimputed", column);
        }
        for warning in &ingest.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the dashboard report");
    println!("{}", "=".repeat(80));
}
