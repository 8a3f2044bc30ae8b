//! Data module - CSV loading, typed table and cleaning

mod cleaner;
pub mod dates;
mod loader;
mod table;

pub use cleaner::{CleaningReport, DataCleaner};
pub use loader::{DataLoader, DATE_COLUMN};
pub use table::{CellValue, ColumnKind, Table};
