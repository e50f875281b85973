//! Reading a single station file into a schema-conformant frame.

use crate::error::Result;
use crate::ingest::timestamp::derive_timestamps;
use crate::schema;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// One parsed station file.
#[derive(Debug)]
pub struct StationFrame {
    /// Declared columns in schema order, followed by `DateTime`.
    pub frame: DataFrame,
    /// Rows whose date components did not form a timestamp.
    pub null_timestamps: usize,
}

/// Parse one station file.
///
/// Columns are read with the declared dtypes. A measurement that cannot be
/// parsed, a missing column, or a malformed file fails the whole file. A
/// date component that is not a whole number becomes null, and the row is
/// kept with a null timestamp. Extra columns are dropped. The file handle
/// lives only as long as the reader inside this call.
pub fn read_station_file(path: &Path, null_values: &[String]) -> Result<StationFrame> {
    let null_values = NullValues::AllColumns(
        null_values
            .iter()
            .map(|v| PlSmallStr::from(v.as_str()))
            .collect(),
    );

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(schema::station_schema()))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(null_values)),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    for name in schema::DATE_COLUMNS {
        if let Ok(column) = df.column(name) {
            let coerced = coerce_date_component(column)?;
            df.with_column(coerced)?;
        }
    }

    schema::validate_frame(&df)?;

    let mut frame = df.select(schema::column_names())?;
    let (timestamps, null_timestamps) = derive_timestamps(&frame)?;
    frame.with_column(timestamps)?;

    debug!(
        "Read {} rows from {} ({} without a valid timestamp)",
        frame.height(),
        path.display(),
        null_timestamps
    );

    Ok(StationFrame {
        frame,
        null_timestamps,
    })
}

/// Whole numbers as Int64; anything else, `2013.5` or `abc`, is null.
fn coerce_date_component(column: &Column) -> PolarsResult<Series> {
    let parsed = column.as_materialized_series().cast(&DataType::Float64)?;
    let whole: Int64Chunked = parsed
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| v.is_finite() && v.fract() == 0.0).map(|v| v as i64))
        .collect();
    Ok(whole.with_name(column.name().clone()).into_series())
}
