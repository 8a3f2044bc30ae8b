//! Sales Report - CSV Sales Analysis & Report Generator
//!
//! Loads sales records, cleans them, and writes charts plus a multi-sheet
//! spreadsheet summarizing them.

mod charts;
mod config;
mod data;
mod pipeline;
mod report;
mod stats;

use clap::Parser;
use config::Settings;
use pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::parse();
    let outcome = Pipeline::run(&settings);

    if !outcome.loaded {
        anyhow::bail!("No data loaded from {}", settings.input.display());
    }
    if outcome.report_written {
        println!("Report saved to {}", settings.report.display());
    }
    Ok(())
}
