//! Table Module
//! A Polars DataFrame paired with a per-column kind tag fixed at load time.

use crate::data::dates;
use polars::prelude::*;
use std::collections::HashSet;

/// How a column is treated by cleaning and aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Date,
}

impl ColumnKind {
    /// Classify a parsed column by its dtype.
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Numeric,
            DataType::Date | DataType::Datetime(_, _) => ColumnKind::Date,
            _ => ColumnKind::Categorical,
        }
    }
}

/// A single spreadsheet-ready cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Integer(i64),
    Text(String),
    Empty,
}

/// In-memory sales table with its schema.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
    schema: Vec<(String, ColumnKind)>,
}

impl Table {
    /// Wrap a DataFrame, tagging every column from its dtype.
    pub fn new(df: DataFrame) -> Self {
        let schema = df
            .get_columns()
            .iter()
            .map(|col| (col.name().to_string(), ColumnKind::of(col.dtype())))
            .collect();
        Self { df, schema }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Replace the frame while keeping the schema established at load time.
    pub(crate) fn replace_frame(&mut self, df: DataFrame) {
        self.df = df;
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.schema.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.kind(name).is_some()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.schema
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, kind)| *kind)
    }

    /// Names of all columns tagged with `kind`, in schema order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.schema
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn null_count(&self, name: &str) -> PolarsResult<usize> {
        Ok(self.df.column(name)?.null_count())
    }

    /// Non-missing values of a column as f64.
    pub fn numeric_values(&self, name: &str) -> PolarsResult<Vec<f64>> {
        let values = self.df.column(name)?.cast(&DataType::Float64)?;
        let ca = values.f64()?;
        Ok(ca.into_iter().flatten().filter(|v| !v.is_nan()).collect())
    }

    /// Per-row text rendering of a column, `None` where missing.
    pub fn text_values(&self, name: &str) -> PolarsResult<Vec<Option<String>>> {
        let values = self.df.column(name)?.cast(&DataType::String)?;
        let ca = values.str()?;
        Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Per-row epoch milliseconds of a date column.
    pub fn timestamps(&self, name: &str) -> PolarsResult<Vec<Option<i64>>> {
        let values = self.df.column(name)?.cast(&DataType::Int64)?;
        let ca = values.i64()?;
        Ok(ca.into_iter().collect())
    }

    /// Number of distinct non-missing values in a column.
    pub fn distinct_count(&self, name: &str) -> PolarsResult<usize> {
        let distinct: HashSet<String> = self.text_values(name)?.into_iter().flatten().collect();
        Ok(distinct.len())
    }

    /// First `n` rows, same schema.
    pub fn head(&self, n: usize) -> Table {
        Self {
            df: self.df.head(Some(n)),
            schema: self.schema.clone(),
        }
    }

    /// Cells of one column rendered according to its kind.
    pub fn cells(&self, name: &str) -> PolarsResult<Vec<CellValue>> {
        let cells = match self.kind(name) {
            Some(ColumnKind::Numeric) if self.df.column(name)?.dtype().is_integer() => {
                let values = self.df.column(name)?.cast(&DataType::Int64)?;
                values
                    .i64()?
                    .into_iter()
                    .map(|v| v.map_or(CellValue::Empty, CellValue::Integer))
                    .collect()
            }
            Some(ColumnKind::Numeric) => {
                let values = self.df.column(name)?.cast(&DataType::Float64)?;
                values
                    .f64()?
                    .into_iter()
                    .map(|v| v.map_or(CellValue::Empty, CellValue::Number))
                    .collect()
            }
            Some(ColumnKind::Date) => self
                .timestamps(name)?
                .into_iter()
                .map(|ts| {
                    ts.and_then(dates::format_timestamp)
                        .map_or(CellValue::Empty, CellValue::Text)
                })
                .collect(),
            _ => self
                .text_values(name)?
                .into_iter()
                .map(|v| v.map_or(CellValue::Empty, CellValue::Text))
                .collect(),
        };
        Ok(cells)
    }

    /// Row-major cells for every column, limited to the first `limit` rows.
    pub fn rows(&self, limit: usize) -> PolarsResult<Vec<Vec<CellValue>>> {
        let sample = self.head(limit);
        let columns = sample
            .column_names()
            .into_iter()
            .map(|name| sample.cells(name))
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok((0..sample.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|col| col.get(row).cloned().unwrap_or(CellValue::Empty))
                    .collect()
            })
            .collect())
    }
}
