//! Sales Aggregator Module
//! Summary statistics, category breakdown and monthly trend views.

use crate::data::{dates, ColumnKind, Table, DATE_COLUMN};
use crate::stats::StatsCalculator;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

pub const AMOUNT_COLUMN: &str = "total_amount";
pub const QUANTITY_COLUMN: &str = "quantity";
pub const ORDER_ID_COLUMN: &str = "order_id";
pub const CUSTOMER_ID_COLUMN: &str = "customer_id";
pub const PRODUCT_ID_COLUMN: &str = "product_id";
pub const CATEGORY_COLUMN: &str = "category";

const MONTH_COLUMN: &str = "month_year";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Required column '{0}' is missing")]
    MissingColumn(&'static str),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Overall sales figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_sales: f64,
    pub average_order_value: f64,
    pub total_orders: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_customers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_products: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub total_sales: f64,
    pub total_quantity: f64,
    pub order_count: usize,
}

/// Per-category totals, highest sales first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub rows: Vec<CategoryRow>,
}

impl CategoryBreakdown {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `n` categories (already sorted by sales).
    pub fn top(&self, n: usize) -> &[CategoryRow] {
        &self.rows[..n.min(self.rows.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    /// `YYYY-MM`
    pub month: String,
    pub total_sales: f64,
    pub total_quantity: f64,
    pub unique_customers: usize,
    pub order_count: usize,
    /// Percent change in sales from the previous month.
    pub growth_rate: Option<f64>,
}

/// Calendar-month totals in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub rows: Vec<MonthRow>,
}

impl MonthlyTrend {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pure derivations over a cleaned table.
pub struct Aggregator;

impl Aggregator {
    /// Totals over every row. Fails only when `total_amount` is absent;
    /// other missing identifier columns just leave their field unset.
    pub fn basic_stats(table: &Table) -> Result<SummaryStats, AggregateError> {
        Self::require(table, &[AMOUNT_COLUMN])?;

        let amounts = table.numeric_values(AMOUNT_COLUMN)?;
        let unique_customers = Self::distinct_if_present(table, CUSTOMER_ID_COLUMN)?;
        let unique_products = Self::distinct_if_present(table, PRODUCT_ID_COLUMN)?;

        let (start_date, end_date) = if table.kind(DATE_COLUMN) == Some(ColumnKind::Date) {
            let stamps: Vec<i64> = table.timestamps(DATE_COLUMN)?.into_iter().flatten().collect();
            (
                stamps.iter().min().copied().and_then(dates::to_datetime),
                stamps.iter().max().copied().and_then(dates::to_datetime),
            )
        } else {
            (None, None)
        };

        Ok(SummaryStats {
            total_sales: amounts.iter().sum(),
            average_order_value: StatsCalculator::mean(&amounts),
            total_orders: table.height(),
            unique_customers,
            unique_products,
            start_date,
            end_date,
        })
    }

    /// Sales, quantity and order count per category. Empty when the table
    /// has no `category` column.
    pub fn by_category(table: &Table) -> Result<CategoryBreakdown, AggregateError> {
        if !table.has_column(CATEGORY_COLUMN) {
            return Ok(CategoryBreakdown::default());
        }
        Self::require(table, &[AMOUNT_COLUMN, QUANTITY_COLUMN, ORDER_ID_COLUMN])?;

        let out = table
            .dataframe()
            .clone()
            .lazy()
            .filter(col(CATEGORY_COLUMN).is_not_null())
            .group_by_stable([col(CATEGORY_COLUMN)])
            .agg([
                col(AMOUNT_COLUMN)
                    .cast(DataType::Float64)
                    .sum()
                    .alias("total_sales"),
                col(QUANTITY_COLUMN)
                    .cast(DataType::Float64)
                    .sum()
                    .alias("total_quantity"),
                col(ORDER_ID_COLUMN).count().alias("order_count"),
            ])
            .sort(
                ["total_sales"],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?;

        let categories = Self::labels(&out, CATEGORY_COLUMN)?;
        let sales = Self::floats(&out, "total_sales")?;
        let quantities = Self::floats(&out, "total_quantity")?;
        let counts = Self::counts(&out, "order_count")?;

        let rows = categories
            .into_iter()
            .zip(sales)
            .zip(quantities)
            .zip(counts)
            .map(|(((category, total_sales), total_quantity), order_count)| CategoryRow {
                category,
                total_sales,
                total_quantity,
                order_count,
            })
            .collect();

        Ok(CategoryBreakdown { rows })
    }

    /// Per calendar month totals with month-over-month sales growth. Empty
    /// when the table has no parsed `order_date` column.
    pub fn monthly_trends(table: &Table) -> Result<MonthlyTrend, AggregateError> {
        if table.kind(DATE_COLUMN) != Some(ColumnKind::Date) {
            return Ok(MonthlyTrend::default());
        }
        Self::require(
            table,
            &[
                AMOUNT_COLUMN,
                QUANTITY_COLUMN,
                CUSTOMER_ID_COLUMN,
                ORDER_ID_COLUMN,
            ],
        )?;

        let months: Vec<Option<String>> = table
            .timestamps(DATE_COLUMN)?
            .into_iter()
            .map(|ts| ts.and_then(dates::month_label))
            .collect();

        let mut frame = table.dataframe().clone();
        frame.with_column(Series::new(MONTH_COLUMN.into(), months))?;

        let out = frame
            .lazy()
            .filter(col(MONTH_COLUMN).is_not_null())
            .group_by([col(MONTH_COLUMN)])
            .agg([
                col(AMOUNT_COLUMN)
                    .cast(DataType::Float64)
                    .sum()
                    .alias("total_sales"),
                col(QUANTITY_COLUMN)
                    .cast(DataType::Float64)
                    .sum()
                    .alias("total_quantity"),
                col(CUSTOMER_ID_COLUMN)
                    .drop_nulls()
                    .n_unique()
                    .alias("unique_customers"),
                col(ORDER_ID_COLUMN).count().alias("order_count"),
            ])
            .sort([MONTH_COLUMN], SortMultipleOptions::default())
            .collect()?;

        let labels = Self::labels(&out, MONTH_COLUMN)?;
        let sales = Self::floats(&out, "total_sales")?;
        let quantities = Self::floats(&out, "total_quantity")?;
        let customers = Self::counts(&out, "unique_customers")?;
        let orders = Self::counts(&out, "order_count")?;
        let growth = StatsCalculator::pct_change(&sales);

        let rows = labels
            .into_iter()
            .enumerate()
            .map(|(i, month)| MonthRow {
                month,
                total_sales: sales[i],
                total_quantity: quantities[i],
                unique_customers: customers[i],
                order_count: orders[i],
                growth_rate: growth[i],
            })
            .collect();

        Ok(MonthlyTrend { rows })
    }

    fn require(table: &Table, columns: &[&'static str]) -> Result<(), AggregateError> {
        match columns.iter().find(|c| !table.has_column(c)) {
            Some(missing) => Err(AggregateError::MissingColumn(*missing)),
            None => Ok(()),
        }
    }

    fn distinct_if_present(table: &Table, column: &str) -> Result<Option<usize>, AggregateError> {
        if table.has_column(column) {
            Ok(Some(table.distinct_count(column)?))
        } else {
            Ok(None)
        }
    }

    fn labels(df: &DataFrame, column: &str) -> PolarsResult<Vec<String>> {
        let values = df.column(column)?.cast(&DataType::String)?;
        Ok(values
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }

    fn floats(df: &DataFrame, column: &str) -> PolarsResult<Vec<f64>> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
    }

    fn counts(df: &DataFrame, column: &str) -> PolarsResult<Vec<usize>> {
        let values = df.column(column)?.cast(&DataType::UInt64)?;
        Ok(values
            .u64()?
            .into_iter()
            .map(|v| v.unwrap_or(0) as usize)
            .collect())
    }
}
