//! Data Cleaner Module
//! Removes duplicate rows and imputes missing values per column kind.

use crate::data::{ColumnKind, Table};
use crate::stats::StatsCalculator;
use polars::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Cannot impute column '{0}': it has no non-missing values")]
    CannotImpute(String),
}

/// Value substituted for missing entries of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    Median(f64),
    Mode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    pub column: String,
    pub filled: usize,
    pub value: FillValue,
}

/// What a cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub duplicates_removed: usize,
    pub imputed: Vec<Imputation>,
    /// Columns left with missing values because nothing could be imputed.
    pub skipped: Vec<String>,
}

/// Handles deduplication and missing-value imputation.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a loaded table.
    ///
    /// Exact duplicate rows are dropped (first occurrence kept, order
    /// preserved), then numeric gaps get the column median and categorical
    /// gaps the column mode. Date columns are left as is. A column with no
    /// values at all is recorded in [`CleaningReport::skipped`].
    pub fn clean(table: Table) -> Result<(Table, CleaningReport), CleanError> {
        let rows_before = table.height();
        let mut table = Self::drop_duplicates(table)?;

        let mut report = CleaningReport {
            rows_before,
            duplicates_removed: rows_before - table.height(),
            ..Default::default()
        };
        info!(
            duplicates_removed = report.duplicates_removed,
            "Duplicates removed: {}", report.duplicates_removed
        );

        for column in table.columns_of_kind(ColumnKind::Numeric) {
            let outcome = Self::impute_median(&mut table, &column);
            Self::record(&mut report, outcome)?;
        }
        for column in table.columns_of_kind(ColumnKind::Categorical) {
            let outcome = Self::impute_mode(&mut table, &column);
            Self::record(&mut report, outcome)?;
        }

        Ok((table, report))
    }

    fn record(
        report: &mut CleaningReport,
        outcome: Result<Option<Imputation>, CleanError>,
    ) -> Result<(), CleanError> {
        match outcome {
            Ok(Some(imputation)) => {
                info!(
                    column = %imputation.column,
                    filled = imputation.filled,
                    value = ?imputation.value,
                    "Imputed missing values"
                );
                report.imputed.push(imputation);
            }
            Ok(None) => {}
            Err(CleanError::CannotImpute(column)) => {
                warn!(column = %column, "Cannot impute column with no values; left as is");
                report.skipped.push(column);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn drop_duplicates(table: Table) -> Result<Table, CleanError> {
        let deduped = table
            .dataframe()
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        let mut table = table;
        table.replace_frame(deduped);
        Ok(table)
    }

    fn impute_median(table: &mut Table, column: &str) -> Result<Option<Imputation>, CleanError> {
        let missing = table.null_count(column)?;
        if missing == 0 {
            return Ok(None);
        }

        let values = table.numeric_values(column)?;
        let median = StatsCalculator::median(&values)
            .ok_or_else(|| CleanError::CannotImpute(column.to_string()))?;

        Self::fill(table, column, lit(median))?;
        Ok(Some(Imputation {
            column: column.to_string(),
            filled: missing,
            value: FillValue::Median(median),
        }))
    }

    fn impute_mode(table: &mut Table, column: &str) -> Result<Option<Imputation>, CleanError> {
        let missing = table.null_count(column)?;
        if missing == 0 {
            return Ok(None);
        }

        let values = table.text_values(column)?;
        let mode = StatsCalculator::mode(values.iter().flatten().map(String::as_str))
            .ok_or_else(|| CleanError::CannotImpute(column.to_string()))?;

        Self::fill(table, column, lit(mode.clone()))?;
        Ok(Some(Imputation {
            column: column.to_string(),
            filled: missing,
            value: FillValue::Mode(mode),
        }))
    }

    fn fill(table: &mut Table, column: &str, value: Expr) -> Result<(), CleanError> {
        let filled = table
            .dataframe()
            .clone()
            .lazy()
            .with_column(col(column).fill_null(value))
            .collect()?;
        table.replace_frame(filled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_table() -> Table {
        let df = DataFrame::new(vec![
            Column::new("order_id".into(), ["O1", "O2", "O2", "O3", "O4", "O5"]),
            Column::new(
                "category".into(),
                [Some("A"), Some("B"), Some("B"), None, Some("B"), Some("A")],
            ),
            Column::new(
                "quantity".into(),
                [Some(1i64), Some(4), Some(4), None, Some(2), Some(8)],
            ),
            Column::new(
                "total_amount".into(),
                [Some(10.0), None, None, Some(30.0), Some(50.0), Some(70.0)],
            ),
        ])
        .unwrap();
        Table::new(df)
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let (table, report) = DataCleaner::clean(raw_table()).unwrap();
        assert_eq!(report.rows_before, 6);
        assert_eq!(report.duplicates_removed, 1);

        let ids: Vec<String> = table
            .text_values("order_id")
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ids, vec!["O1", "O2", "O3", "O4", "O5"]);
    }

    #[test]
    fn test_numeric_gaps_take_median_after_dedup() {
        let (table, report) = DataCleaner::clean(raw_table()).unwrap();

        // After dedup: amounts [10, _, 30, 50, 70] -> median 40
        let amounts = table.numeric_values("total_amount").unwrap();
        assert_eq!(amounts, vec![10.0, 40.0, 30.0, 50.0, 70.0]);

        // quantities [1, 4, _, 2, 8] -> median 3
        let quantities = table.numeric_values("quantity").unwrap();
        assert_eq!(quantities, vec![1.0, 4.0, 3.0, 2.0, 8.0]);

        let amount = report
            .imputed
            .iter()
            .find(|i| i.column == "total_amount")
            .unwrap();
        assert_eq!(amount.filled, 1);
        assert_eq!(amount.value, FillValue::Median(40.0));
        assert_eq!(table.kind("quantity"), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_categorical_gaps_take_mode() {
        let (table, _) = DataCleaner::clean(raw_table()).unwrap();

        // After dedup: [A, B, _, B, A] -> tie broken towards "A"
        let categories: Vec<Option<String>> = table.text_values("category").unwrap();
        assert_eq!(categories[2].as_deref(), Some("A"));
        assert_eq!(table.null_count("category").unwrap(), 0);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let (once, _) = DataCleaner::clean(raw_table()).unwrap();
        let (twice, report) = DataCleaner::clean(once.clone()).unwrap();

        assert_eq!(report.duplicates_removed, 0);
        assert!(report.imputed.is_empty());
        assert!(once.dataframe().equals_missing(twice.dataframe()));
    }

    #[test]
    fn test_all_missing_column_is_skipped() {
        let df = DataFrame::new(vec![
            Column::new("total_amount".into(), [Some(1.0), None]),
            Column::new("note".into(), [None::<&str>, None]),
        ])
        .unwrap();

        let (table, report) = DataCleaner::clean(Table::new(df)).unwrap();
        assert_eq!(report.skipped, vec!["note".to_string()]);
        assert_eq!(table.null_count("note").unwrap(), 2);
        assert_eq!(table.null_count("total_amount").unwrap(), 0);
    }
}
