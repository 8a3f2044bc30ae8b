//! XLSX Report Generator Module
//! Writes the analysis views into a multi-sheet workbook.
//!
//! Sheets are assembled as plain rows first, then copied cell by cell into a
//! `umya-spreadsheet` workbook.

use crate::data::{CellValue, Table};
use crate::stats::{CategoryBreakdown, MonthlyTrend, SummaryStats};
use polars::prelude::PolarsError;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::info;
use umya_spreadsheet::{Spreadsheet, Worksheet, XlsxError};

pub const SUMMARY_SHEET: &str = "Summary";
pub const MONTHLY_SHEET: &str = "Monthly Trends";
pub const CATEGORY_SHEET: &str = "Category Analysis";
pub const SAMPLE_SHEET: &str = "Sample Data";

/// Rows copied into the sample sheet by default
pub const SAMPLE_ROWS: usize = 1000;

/// Largest magnitude a spreadsheet number holds without losing digits (2^53)
const EXACT_INTEGER_LIMIT: u64 = 1 << 53;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Failed to add sheet '{name}': {message}")]
    Sheet { name: &'static str, message: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Workbook generator for the sales report
pub struct ReportGenerator;

impl ReportGenerator {
    /// Write the report workbook. Sheets appear in the order Summary,
    /// Monthly Trends, Category Analysis, Sample Data; the two analysis
    /// sheets are left out when their view is empty.
    pub fn write_report(
        output_path: &Path,
        summary: &SummaryStats,
        monthly: &MonthlyTrend,
        category: &CategoryBreakdown,
        table: &Table,
        sample_rows: usize,
    ) -> Result<(), ReportError> {
        let sheets = Self::build_sheets(summary, monthly, category, table, sample_rows)?;
        Self::write_workbook(output_path, &sheets)?;

        info!(
            path = %output_path.display(),
            sheets = sheets.len(),
            "Report generated: {}",
            output_path.display()
        );
        Ok(())
    }

    pub fn build_sheets(
        summary: &SummaryStats,
        monthly: &MonthlyTrend,
        category: &CategoryBreakdown,
        table: &Table,
        sample_rows: usize,
    ) -> Result<Vec<Sheet>, PolarsError> {
        let mut sheets = vec![Self::summary_sheet(summary)];
        if !monthly.is_empty() {
            sheets.push(Self::monthly_sheet(monthly));
        }
        if !category.is_empty() {
            sheets.push(Self::category_sheet(category));
        }
        sheets.push(Sheet {
            name: SAMPLE_SHEET,
            header: table.column_names().iter().map(|s| s.to_string()).collect(),
            rows: table.rows(sample_rows)?,
        });
        Ok(sheets)
    }

    fn summary_sheet(summary: &SummaryStats) -> Sheet {
        let mut fields: Vec<(&str, CellValue)> = vec![
            ("total_sales", CellValue::Number(summary.total_sales)),
            (
                "average_order_value",
                CellValue::Number(summary.average_order_value),
            ),
            ("total_orders", CellValue::Integer(summary.total_orders as i64)),
        ];
        if let Some(n) = summary.unique_customers {
            fields.push(("unique_customers", CellValue::Integer(n as i64)));
        }
        if let Some(n) = summary.unique_products {
            fields.push(("unique_products", CellValue::Integer(n as i64)));
        }
        if let Some(d) = summary.start_date {
            fields.push(("start_date", CellValue::Text(d.to_string())));
        }
        if let Some(d) = summary.end_date {
            fields.push(("end_date", CellValue::Text(d.to_string())));
        }

        let (header, row): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();

        Sheet {
            name: SUMMARY_SHEET,
            header,
            rows: vec![row],
        }
    }

    fn monthly_sheet(monthly: &MonthlyTrend) -> Sheet {
        let header = [
            "month_year",
            "total_sales",
            "total_quantity",
            "unique_customers",
            "order_count",
            "growth_rate",
        ];
        let rows = monthly
            .rows
            .iter()
            .map(|r| {
                vec![
                    CellValue::Text(r.month.clone()),
                    CellValue::Number(r.total_sales),
                    CellValue::Number(r.total_quantity),
                    CellValue::Integer(r.unique_customers as i64),
                    CellValue::Integer(r.order_count as i64),
                    r.growth_rate.map_or(CellValue::Empty, CellValue::Number),
                ]
            })
            .collect();

        Sheet {
            name: MONTHLY_SHEET,
            header: header.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    fn category_sheet(category: &CategoryBreakdown) -> Sheet {
        let header = ["category", "total_sales", "total_quantity", "order_count"];
        let rows = category
            .rows
            .iter()
            .map(|r| {
                vec![
                    CellValue::Text(r.category.clone()),
                    CellValue::Number(r.total_sales),
                    CellValue::Number(r.total_quantity),
                    CellValue::Integer(r.order_count as i64),
                ]
            })
            .collect();

        Sheet {
            name: CATEGORY_SHEET,
            header: header.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    /// Save the sheets as an .xlsx file. The file handle is released on every
    /// return path.
    pub fn write_workbook(output_path: &Path, sheets: &[Sheet]) -> Result<(), ReportError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let book = Self::workbook(sheets)?;
        let file = File::create(output_path)?;
        umya_spreadsheet::writer::xlsx::write_writer(&book, file)?;
        Ok(())
    }

    fn workbook(sheets: &[Sheet]) -> Result<Spreadsheet, ReportError> {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for sheet in sheets {
            let ws = book.new_sheet(sheet.name).map_err(|e| ReportError::Sheet {
                name: sheet.name,
                message: e.to_string(),
            })?;
            Self::fill_sheet(ws, sheet);
        }
        Ok(book)
    }

    fn fill_sheet(ws: &mut Worksheet, sheet: &Sheet) {
        for (col, name) in (1u32..).zip(&sheet.header) {
            let cell = ws.get_cell_mut((col, 1u32));
            cell.set_value_string(name.as_str());
            cell.get_style_mut().get_font_mut().set_bold(true);
        }

        for (row, values) in (2u32..).zip(&sheet.rows) {
            for (col, value) in (1u32..).zip(values) {
                match value {
                    CellValue::Number(v) if v.is_finite() => {
                        ws.get_cell_mut((col, row)).set_value_number(*v);
                    }
                    CellValue::Integer(v) if v.unsigned_abs() <= EXACT_INTEGER_LIMIT => {
                        ws.get_cell_mut((col, row)).set_value_number(*v as f64);
                    }
                    CellValue::Integer(v) => {
                        ws.get_cell_mut((col, row)).set_value_string(v.to_string());
                    }
                    CellValue::Text(text) => {
                        ws.get_cell_mut((col, row)).set_value_string(text.as_str());
                    }
                    _ => {}
                }
            }
        }
    }
}
