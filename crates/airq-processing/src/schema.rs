//! Static column schema for station files.
//!
//! Every station file carries the same columns. Their semantic kind is
//! declared here once instead of being guessed from whatever dtype the CSV
//! reader infers, so a column full of `NA` can never turn a measurement
//! into a string column.

use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;

/// Name of the derived timestamp column.
pub const DATETIME_COLUMN: &str = "DateTime";

/// Name of the station identifier column.
pub const STATION_COLUMN: &str = "station";

/// Date/time component columns, in the order they compose a timestamp.
pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const DAY_COLUMN: &str = "day";
pub const HOUR_COLUMN: &str = "hour";

pub const DATE_COLUMNS: [&str; 4] = [YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN, HOUR_COLUMN];

/// Semantic kind of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Whole numbers (row number, date components).
    Integer,
    /// Measurements.
    Float,
    /// Free-form labels (station, wind direction).
    Categorical,
}

impl ColumnKind {
    /// Polars dtype the column is read as.
    pub fn dtype(self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Categorical => DataType::String,
        }
    }

    /// Numeric columns are median-imputed, categorical ones mode-imputed.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// Declared columns of a station file, in file order.
pub const STATION_COLUMNS: &[(&str, ColumnKind)] = &[
    ("No", ColumnKind::Integer),
    (YEAR_COLUMN, ColumnKind::Integer),
    (MONTH_COLUMN, ColumnKind::Integer),
    (DAY_COLUMN, ColumnKind::Integer),
    (HOUR_COLUMN, ColumnKind::Integer),
    ("PM2.5", ColumnKind::Float),
    ("PM10", ColumnKind::Float),
    ("SO2", ColumnKind::Float),
    ("NO2", ColumnKind::Float),
    ("CO", ColumnKind::Float),
    ("O3", ColumnKind::Float),
    ("TEMP", ColumnKind::Float),
    ("PRES", ColumnKind::Float),
    ("DEWP", ColumnKind::Float),
    ("RAIN", ColumnKind::Float),
    ("wd", ColumnKind::Categorical),
    ("WSPM", ColumnKind::Float),
    (STATION_COLUMN, ColumnKind::Categorical),
];

/// Monitored columns for outlier removal, in processing order.
pub const DEFAULT_MONITORED_COLUMNS: [&str; 11] = [
    "PM2.5", "PM10", "SO2", "NO2", "CO", "O3", "TEMP", "PRES", "DEWP", "RAIN", "WSPM",
];

static STATION_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::from_iter(STATION_COLUMNS.iter().map(|(name, kind)| {
        let dtype = if DATE_COLUMNS.contains(name) {
            DataType::String
        } else {
            kind.dtype()
        };
        Field::new((*name).into(), dtype)
    })))
});

/// Polars schema used to override the reader's dtype inference.
///
/// Date components are read as text and coerced after reading, so a bad
/// value costs the row its timestamp rather than failing the file.
pub fn station_schema() -> SchemaRef {
    STATION_SCHEMA.clone()
}

/// Look up the declared kind of a column.
pub fn column_kind(name: &str) -> Option<ColumnKind> {
    STATION_COLUMNS
        .iter()
        .find(|(col, _)| *col == name)
        .map(|(_, kind)| *kind)
}

/// Names of all declared columns, in file order.
pub fn column_names() -> impl Iterator<Item = &'static str> {
    STATION_COLUMNS.iter().map(|(name, _)| *name)
}

/// Check that a freshly read frame carries every declared column with the
/// declared dtype.
pub fn validate_frame(df: &DataFrame) -> Result<()> {
    for (name, kind) in STATION_COLUMNS {
        let expected = kind.dtype();
        match df.column(name) {
            Ok(col) if col.dtype() == &expected => {}
            Ok(col) => {
                return Err(PipelineError::SchemaMismatch {
                    column: (*name).to_string(),
                    expected: expected.to_string(),
                    found: col.dtype().to_string(),
                });
            }
            Err(_) => {
                return Err(PipelineError::SchemaMismatch {
                    column: (*name).to_string(),
                    expected: expected.to_string(),
                    found: "missing column".to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitored_columns_are_float() {
        for name in DEFAULT_MONITORED_COLUMNS {
            assert_eq!(column_kind(name), Some(ColumnKind::Float), "{name}");
        }
    }

    #[test]
    fn test_column_kind_lookup() {
        assert_eq!(column_kind("year"), Some(ColumnKind::Integer));
        assert_eq!(column_kind("station"), Some(ColumnKind::Categorical));
        assert_eq!(column_kind("DateTime"), None);
        assert!(ColumnKind::Integer.is_numeric());
        assert!(!ColumnKind::Categorical.is_numeric());
    }

    #[test]
    fn test_station_schema_matches_declaration() {
        let schema = station_schema();
        assert_eq!(schema.len(), STATION_COLUMNS.len());
        assert_eq!(schema.get("PM2.5"), Some(&DataType::Float64));
        assert_eq!(schema.get("wd"), Some(&DataType::String));
        assert_eq!(schema.get("year"), Some(&DataType::String));
        assert_eq!(schema.get("No"), Some(&DataType::Int64));
    }

    #[test]
    fn test_validate_frame_reports_missing_column() {
        let df = df![
            "year" => [2013i64],
        ]
        .unwrap();

        let err = validate_frame(&df).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
        assert!(err.to_string().contains("missing column"));
    }

    #[test]
    fn test_validate_frame_reports_wrong_dtype() {
        let mut columns: Vec<Column> = STATION_COLUMNS
            .iter()
            .map(|(name, kind)| Series::full_null((*name).into(), 1, &kind.dtype()).into())
            .collect();
        // PM2.5 read as text
        columns[5] = Series::new("PM2.5".into(), ["high"]).into();
        let df = DataFrame::new(columns).unwrap();

        let err = validate_frame(&df).unwrap_err();
        assert!(err.to_string().contains("PM2.5"));
    }
}
