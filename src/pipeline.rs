//! Pipeline Module
//! Runs load, clean, aggregate, chart and report in sequence.
//!
//! Every step after loading degrades to an empty or partial result on
//! failure, so one bad view never stops the rest of the run.

use crate::charts::{ChartError, ChartPlotter};
use crate::config::Settings;
use crate::data::{CleaningReport, DataCleaner, DataLoader, Table};
use crate::report::ReportGenerator;
use crate::stats::{Aggregator, CategoryBreakdown, MonthlyTrend, SummaryStats};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What a pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub loaded: bool,
    pub cleaning: Option<CleaningReport>,
    pub summary: Option<SummaryStats>,
    pub charts: Vec<PathBuf>,
    pub report_written: bool,
}

pub struct Pipeline;

impl Pipeline {
    pub fn run(settings: &Settings) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::default();

        let table = match DataLoader::load_csv(&settings.input) {
            Ok(table) => table,
            Err(_) => {
                warn!("No data loaded; nothing to analyze");
                return outcome;
            }
        };
        outcome.loaded = true;

        let table = match DataCleaner::clean(table) {
            Ok((table, report)) => {
                outcome.cleaning = Some(report);
                table
            }
            Err(e) => {
                error!("Error cleaning data: {e}");
                return outcome;
            }
        };

        let summary = match Aggregator::basic_stats(&table) {
            Ok(summary) => {
                Self::print_summary(&summary);
                Some(summary)
            }
            Err(e) => {
                error!("Error computing basic statistics: {e}");
                None
            }
        };

        let category = Aggregator::by_category(&table).unwrap_or_else(|e| {
            error!("Error computing category breakdown: {e}");
            CategoryBreakdown::default()
        });
        let monthly = Aggregator::monthly_trends(&table).unwrap_or_else(|e| {
            error!("Error computing monthly trends: {e}");
            MonthlyTrend::default()
        });

        if settings.no_charts {
            info!("Chart rendering disabled");
        } else {
            outcome.charts = Self::render_charts(&table, &monthly, &category, settings);
        }

        outcome.report_written = match &summary {
            Some(summary) => Self::write_report(&table, summary, &monthly, &category, settings),
            None => {
                warn!("Summary statistics unavailable; report not written");
                false
            }
        };
        outcome.summary = summary;

        outcome
    }

    fn print_summary(summary: &SummaryStats) {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("Basic Statistics:\n{json}"),
            Err(e) => error!("Error formatting basic statistics: {e}"),
        }
    }

    fn render_charts(
        table: &Table,
        monthly: &MonthlyTrend,
        category: &CategoryBreakdown,
        settings: &Settings,
    ) -> Vec<PathBuf> {
        let dir = settings.charts_dir.as_path();
        let results: [Result<Option<PathBuf>, ChartError>; 3] = [
            ChartPlotter::monthly_sales_trend(monthly, dir),
            ChartPlotter::category_sales(category, dir),
            ChartPlotter::order_value_distribution(table, dir),
        ];

        results
            .into_iter()
            .filter_map(|result| match result {
                Ok(path) => path,
                Err(e) => {
                    error!("Error creating chart: {e}");
                    None
                }
            })
            .collect()
    }

    fn write_report(
        table: &Table,
        summary: &SummaryStats,
        monthly: &MonthlyTrend,
        category: &CategoryBreakdown,
        settings: &Settings,
    ) -> bool {
        match ReportGenerator::write_report(
            &settings.report,
            summary,
            monthly,
            category,
            table,
            settings.sample_rows,
        ) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %settings.report.display(), "Error generating report: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CATEGORY_SHEET, MONTHLY_SHEET, SAMPLE_SHEET, SUMMARY_SHEET};
    use crate::charts::{CATEGORY_CHART_FILE, DISTRIBUTION_CHART_FILE, TREND_CHART_FILE};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SALES_CSV: &str = "\
order_id,customer_id,product_id,category,quantity,total_amount,order_date
O1,C1,P1,A,1,10,2024-01-05
O2,C2,P2,A,2,20,2024-01-20
O2,C2,P2,A,2,20,2024-01-20
O3,C3,P1,B,3,30,2024-02-03
O4,C1,P3,B,4,40,2024-02-28
";

    fn settings(dir: &TempDir, csv: Option<&str>) -> Settings {
        let input = dir.path().join("raw").join("sales_data.csv");
        if let Some(csv) = csv {
            fs::create_dir_all(input.parent().unwrap()).unwrap();
            fs::write(&input, csv).unwrap();
        }
        Settings {
            input,
            report: dir.path().join("reports").join("sales_report.xlsx"),
            charts_dir: dir.path().join("reports"),
            sample_rows: 1000,
            no_charts: true,
        }
    }

    fn sheet_names(path: &Path) -> Vec<String> {
        let book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
        (0..book.get_sheet_count())
            .filter_map(|i| book.get_sheet(&i))
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn drop_column(csv: &str, name: &str) -> String {
        let header: Vec<&str> = csv.lines().next().unwrap().split(',').collect();
        let idx = header.iter().position(|h| *h == name).unwrap();
        csv.lines()
            .map(|line| {
                line.split(',')
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, cell)| cell)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_end_to_end() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, Some(SALES_CSV));

        let outcome = Pipeline::run(&settings);

        assert!(outcome.loaded);
        assert_eq!(outcome.cleaning.unwrap().duplicates_removed, 1);
        let summary = outcome.summary.unwrap();
        assert_eq!(summary.total_sales, 100.0);
        assert_eq!(summary.total_orders, 4);
        assert_eq!(summary.unique_customers, Some(3));
        assert!(outcome.charts.is_empty());
        assert!(outcome.report_written);
        assert_eq!(
            sheet_names(&settings.report),
            vec![SUMMARY_SHEET, MONTHLY_SHEET, CATEGORY_SHEET, SAMPLE_SHEET]
        );
    }

    #[test]
    fn test_charts_written_to_new_directory() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir, Some(SALES_CSV));
        settings.charts_dir = dir.path().join("out").join("charts");
        settings.no_charts = false;
        assert!(!settings.charts_dir.exists());

        let outcome = Pipeline::run(&settings);

        let expected: Vec<PathBuf> = [TREND_CHART_FILE, CATEGORY_CHART_FILE, DISTRIBUTION_CHART_FILE]
            .iter()
            .map(|name| settings.charts_dir.join(name))
            .collect();
        assert_eq!(outcome.charts, expected);
        for path in &expected {
            assert!(fs::metadata(path).unwrap().len() > 0);
        }
        assert!(outcome.report_written);
    }

    #[test]
    fn test_histogram_drawn_without_date_or_category() {
        let dir = TempDir::new().unwrap();
        let csv = drop_column(&drop_column(SALES_CSV, "order_date"), "category");
        let mut settings = settings(&dir, Some(&csv));
        settings.no_charts = false;

        let outcome = Pipeline::run(&settings);

        assert_eq!(
            outcome.charts,
            vec![settings.charts_dir.join(DISTRIBUTION_CHART_FILE)]
        );
        assert!(!settings.charts_dir.join(TREND_CHART_FILE).exists());
        assert!(!settings.charts_dir.join(CATEGORY_CHART_FILE).exists());
    }

    #[test]
    fn test_missing_category_omits_sheet() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, Some(&drop_column(SALES_CSV, "category")));

        let outcome = Pipeline::run(&settings);

        assert!(outcome.report_written);
        assert_eq!(
            sheet_names(&settings.report),
            vec![SUMMARY_SHEET, MONTHLY_SHEET, SAMPLE_SHEET]
        );
    }

    #[test]
    fn test_missing_order_date_omits_sheet() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, Some(&drop_column(SALES_CSV, "order_date")));

        let outcome = Pipeline::run(&settings);

        assert!(outcome.report_written);
        let summary = outcome.summary.unwrap();
        assert_eq!(summary.start_date, None);
        assert_eq!(
            sheet_names(&settings.report),
            vec![SUMMARY_SHEET, CATEGORY_SHEET, SAMPLE_SHEET]
        );
    }

    #[test]
    fn test_missing_amount_skips_report() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, Some(&drop_column(SALES_CSV, "total_amount")));

        let outcome = Pipeline::run(&settings);

        assert!(outcome.loaded);
        assert!(outcome.summary.is_none());
        assert!(!outcome.report_written);
        assert!(!settings.report.exists());
    }

    #[test]
    fn test_absent_input_is_noop() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, None);

        let outcome = Pipeline::run(&settings);

        assert!(!outcome.loaded);
        assert!(outcome.cleaning.is_none());
        assert!(outcome.summary.is_none());
        assert!(!outcome.report_written);
        assert!(!settings.report.exists());
    }

    #[test]
    fn test_unwritable_report_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir, Some(SALES_CSV));
        // The report path is an existing directory
        settings.report = dir.path().to_path_buf();

        let outcome = Pipeline::run(&settings);

        assert!(outcome.summary.is_some());
        assert!(!outcome.report_written);
    }
}
