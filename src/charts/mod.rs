//! Charts module - Chart rendering

mod plotter;

pub use plotter::{ChartError, ChartPlotter};

#[cfg(test)]
pub use plotter::{CATEGORY_CHART_FILE, DISTRIBUTION_CHART_FILE, TREND_CHART_FILE};
