//! Stats module - Statistical calculations and sales aggregation

mod aggregator;
mod calculator;

pub use aggregator::{Aggregator, CategoryBreakdown, MonthlyTrend, SummaryStats, AMOUNT_COLUMN};
pub use calculator::StatsCalculator;

#[cfg(test)]
pub use aggregator::{CategoryRow, MonthRow};
