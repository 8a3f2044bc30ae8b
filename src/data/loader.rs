//! CSV Data Loader Module
//! Handles CSV file loading and order date parsing using Polars.

use crate::data::dates;
use crate::data::Table;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Column converted to a datetime at load time when present.
pub const DATE_COLUMN: &str = "order_date";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Unparseable {column} value {value:?} in data row {row}")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },
    #[error("CSV has no columns")]
    NoColumns,
}

/// Reads delimited sales files into a [`Table`].
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file, converting `order_date` when the column exists.
    pub fn load_csv(path: &Path) -> Result<Table, LoaderError> {
        Self::read(path)
            .inspect(|table| {
                info!(
                    path = %path.display(),
                    rows = table.height(),
                    columns = table.width(),
                    "Data loaded successfully"
                )
            })
            .inspect_err(|e| error!(path = %path.display(), "Error loading data: {e}"))
    }

    fn read(path: &Path) -> Result<Table, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        if df.width() == 0 {
            return Err(LoaderError::NoColumns);
        }

        let df = if df.column(DATE_COLUMN).is_ok() {
            Self::parse_dates(df, DATE_COLUMN)?
        } else {
            df
        };

        Ok(Table::new(df))
    }

    /// Replace a text column with millisecond datetimes. Empty cells stay
    /// missing; any other unparseable cell fails the load.
    fn parse_dates(mut df: DataFrame, column: &str) -> Result<DataFrame, LoaderError> {
        let raw = df.column(column)?.cast(&DataType::String)?;
        let mut millis: Vec<Option<i64>> = Vec::with_capacity(raw.len());

        for (i, value) in raw.str()?.into_iter().enumerate() {
            let parsed = match value.map(str::trim) {
                None | Some("") => None,
                Some(text) => Some(dates::parse_timestamp(text).ok_or_else(|| {
                    LoaderError::DateParse {
                        column: column.to_string(),
                        row: i + 1,
                        value: text.to_string(),
                    }
                })?),
            };
            millis.push(parsed);
        }

        let parsed = Series::new(column.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        df.with_column(parsed)?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnKind;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("sales.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_reports_shape_and_kinds() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "order_id,order_date,category,quantity,total_amount\n\
             O1,2024-01-05,A,1,10.5\n\
             O2,2024-02-10,B,2,20\n",
        );

        let table = DataLoader::load_csv(&path).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 5);
        assert_eq!(table.kind("order_date"), Some(ColumnKind::Date));
        assert_eq!(table.kind("category"), Some(ColumnKind::Categorical));
        assert_eq!(table.kind("total_amount"), Some(ColumnKind::Numeric));

        let ts = table.timestamps("order_date").unwrap();
        assert_eq!(ts[0], dates::parse_timestamp("2024-01-05"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DataLoader::load_csv(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn test_bad_date_fails_load() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "order_id,order_date,total_amount\nO1,2024-01-05,10\nO2,not-a-date,20\n",
        );

        match DataLoader::load_csv(&path) {
            Err(LoaderError::DateParse { row, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected date parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_date_stays_missing() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "order_id,order_date,total_amount\nO1,2024-01-05,10\nO2,,20\n",
        );

        let table = DataLoader::load_csv(&path).unwrap();
        let ts = table.timestamps("order_date").unwrap();
        assert!(ts[0].is_some());
        assert!(ts[1].is_none());
    }

    #[test]
    fn test_no_date_column_is_fine() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "order_id,total_amount\nO1,10\n");

        let table = DataLoader::load_csv(&path).unwrap();
        assert!(table.columns_of_kind(ColumnKind::Date).is_empty());
    }
}
