//! Configuration Module
//! Command-line and environment settings for a report run.

use crate::report::SAMPLE_ROWS;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "data/raw/sales_data.csv";
pub const DEFAULT_REPORT: &str = "data/reports/sales_report.xlsx";
pub const DEFAULT_CHARTS_DIR: &str = "data/reports";

#[derive(Parser, Debug, Clone)]
#[command(name = "sales_report")]
#[command(about = "Clean sales records, summarize them, and write charts plus an xlsx report")]
#[command(version)]
pub struct Settings {
    /// Input CSV with a header row
    #[arg(long, env = "SALES_INPUT", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Output workbook path
    #[arg(long, env = "SALES_REPORT", default_value = DEFAULT_REPORT)]
    pub report: PathBuf,

    /// Directory for the chart images
    #[arg(long, env = "SALES_CHARTS_DIR", default_value = DEFAULT_CHARTS_DIR)]
    pub charts_dir: PathBuf,

    /// Rows copied into the "Sample Data" sheet
    #[arg(long, env = "SALES_SAMPLE_ROWS", default_value_t = SAMPLE_ROWS)]
    pub sample_rows: usize,

    /// Skip chart rendering
    #[arg(long, env = "SALES_NO_CHARTS")]
    pub no_charts: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_required() {
        let settings = Settings::try_parse_from(["sales_report"]).unwrap();
        assert_eq!(settings.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(settings.report, PathBuf::from(DEFAULT_REPORT));
        assert_eq!(settings.charts_dir, PathBuf::from(DEFAULT_CHARTS_DIR));
        assert_eq!(settings.sample_rows, SAMPLE_ROWS);
        assert!(!settings.no_charts);
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = Settings::try_parse_from([
            "sales_report",
            "--input",
            "in.csv",
            "--report",
            "out/r.xlsx",
            "--sample-rows",
            "5",
            "--no-charts",
        ])
        .unwrap();
        assert_eq!(settings.input, PathBuf::from("in.csv"));
        assert_eq!(settings.report, PathBuf::from("out/r.xlsx"));
        assert_eq!(settings.sample_rows, 5);
        assert!(settings.no_charts);
    }

    #[test]
    fn test_rejects_bad_sample_rows() {
        assert!(Settings::try_parse_from(["sales_report", "--sample-rows", "many"]).is_err());
    }
}
