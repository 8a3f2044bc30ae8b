//! Chart Plotter Module
//! Renders the sales charts to PNG files using plotters.

use crate::data::Table;
use crate::stats::{CategoryBreakdown, MonthlyTrend, AMOUNT_COLUMN};
use plotters::prelude::*;
use polars::prelude::PolarsError;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const TREND_CHART_FILE: &str = "monthly_sales_trend.png";
pub const CATEGORY_CHART_FILE: &str = "category_sales.png";
pub const DISTRIBUTION_CHART_FILE: &str = "order_value_distribution.png";

/// Number of categories shown in the bar chart
pub const TOP_CATEGORIES: usize = 10;
/// Equal-width bins in the order value histogram
pub const HISTOGRAM_BINS: usize = 30;

/// 10x5 inch figure at 100 DPI
const CHART_SIZE: (u32, u32) = (1000, 500);

const BAR_COLOR: RGBColor = RGBColor(52, 152, 219);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create chart directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw {chart}: {message}")]
    Draw { chart: &'static str, message: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One histogram bar: `[start, end)`, the last bin also includes its end.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Creates the static report charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Line chart of monthly sales. Skipped (`Ok(None)`) when there are no months.
    pub fn monthly_sales_trend(
        trend: &MonthlyTrend,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>, ChartError> {
        if trend.is_empty() {
            info!("No monthly data; skipping trend chart");
            return Ok(None);
        }

        let path = Self::target(output_dir, TREND_CHART_FILE)?;
        Self::draw_trend(&path, trend).map_err(|e| ChartError::Draw {
            chart: TREND_CHART_FILE,
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "Chart saved");
        Ok(Some(path))
    }

    /// Bar chart of the top categories. Skipped when there are no categories.
    pub fn category_sales(
        breakdown: &CategoryBreakdown,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>, ChartError> {
        if breakdown.is_empty() {
            info!("No category data; skipping category chart");
            return Ok(None);
        }

        let path = Self::target(output_dir, CATEGORY_CHART_FILE)?;
        Self::draw_categories(&path, breakdown).map_err(|e| ChartError::Draw {
            chart: CATEGORY_CHART_FILE,
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "Chart saved");
        Ok(Some(path))
    }

    /// Histogram of order values. Skipped when `total_amount` is absent.
    pub fn order_value_distribution(
        table: &Table,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>, ChartError> {
        if !table.has_column(AMOUNT_COLUMN) {
            info!("No {AMOUNT_COLUMN} column; skipping distribution chart");
            return Ok(None);
        }

        let bins = Self::histogram_bins(&table.numeric_values(AMOUNT_COLUMN)?, HISTOGRAM_BINS);
        let path = Self::target(output_dir, DISTRIBUTION_CHART_FILE)?;
        Self::draw_histogram(&path, &bins).map_err(|e| ChartError::Draw {
            chart: DISTRIBUTION_CHART_FILE,
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "Chart saved");
        Ok(Some(path))
    }

    /// Split finite values into `bins` equal-width bins spanning min..max.
    /// A constant sample spans value +/- 0.5.
    pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return Vec::new();
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (lo, hi) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (hi - lo) / bins as f64;

        let mut out: Vec<Bin> = (0..bins)
            .map(|i| Bin {
                start: lo + i as f64 * width,
                end: lo + (i + 1) as f64 * width,
                count: 0,
            })
            .collect();

        for v in finite {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            out[idx].count += 1;
        }
        out
    }

    fn target(output_dir: &Path, file_name: &str) -> Result<PathBuf, ChartError> {
        fs::create_dir_all(output_dir).map_err(|source| ChartError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        Ok(output_dir.join(file_name))
    }

    fn draw_trend(path: &Path, trend: &MonthlyTrend) -> Result<(), Box<dyn StdError>> {
        let labels: Vec<&str> = trend.rows.iter().map(|r| r.month.as_str()).collect();
        let sales: Vec<f64> = trend.rows.iter().map(|r| r.total_sales).collect();
        let (y_min, y_max) = Self::padded_range(&sales);

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Monthly Sales Trend", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(80)
            .build_cartesian_2d((0u32..labels.len() as u32).into_segmented(), y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Month")
            .y_desc("Total Sales")
            .x_labels(labels.len())
            .x_label_formatter(&|v| Self::segment_label(&labels, v))
            .draw()?;

        let points: Vec<(SegmentValue<u32>, f64)> = sales
            .iter()
            .enumerate()
            .map(|(i, &v)| (SegmentValue::CenterOf(i as u32), v))
            .collect();

        chart.draw_series(LineSeries::new(points.clone(), LINE_COLOR.stroke_width(2)))?;
        chart.draw_series(
            points
                .into_iter()
                .map(|p| Circle::new(p, 4, LINE_COLOR.filled())),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_categories(path: &Path, breakdown: &CategoryBreakdown) -> Result<(), Box<dyn StdError>> {
        let top = breakdown.top(TOP_CATEGORIES);
        let labels: Vec<&str> = top.iter().map(|r| r.category.as_str()).collect();
        let sales: Vec<f64> = top.iter().map(|r| r.total_sales).collect();
        let (_, y_max) = Self::padded_range(&sales);
        let y_min = sales.iter().copied().fold(0.0, f64::min);

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Top Categories by Sales", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(80)
            .build_cartesian_2d((0u32..labels.len() as u32).into_segmented(), y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Category")
            .y_desc("Total Sales")
            .x_labels(labels.len())
            .x_label_formatter(&|v| Self::segment_label(&labels, v))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(10)
                .data(sales.iter().enumerate().map(|(i, &v)| (i as u32, v))),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_histogram(path: &Path, bins: &[Bin]) -> Result<(), Box<dyn StdError>> {
        let (x_min, x_max) = match (bins.first(), bins.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0.0, 1.0),
        };
        let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.1;

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Order Value Distribution", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Order Value")
            .y_desc("Frequency")
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BAR_COLOR.filled())
        }))?;

        root.present()?;
        Ok(())
    }

    fn segment_label(labels: &[&str], value: &SegmentValue<u32>) -> String {
        match value {
            SegmentValue::CenterOf(i) => labels
                .get(*i as usize)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Axis range around the data with 10% headroom.
    fn padded_range(values: &[f64]) -> (f64, f64) {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return (0.0, 1.0);
        }
        let pad = ((max - min) * 0.1).max(max.abs() * 0.1).max(1.0);
        (min - pad, max + pad)
    }
}
