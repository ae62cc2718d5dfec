//! price-sheets: print-ready price lists, scale lists and fridge labels
//! from a product catalog.
//!
//! Lists of records are tiled over side-by-side column-groups of a sheet,
//! the sheet is scaled to fill its printed pages and written out as XLSX
//! or PDF.

pub mod builder;
pub mod catalog;
pub mod column;
pub mod error;
pub mod fit;
pub mod layout;
pub mod pdf;
pub mod reports;
pub mod sheet;
pub mod style;
pub mod value;
pub mod xlsx;

use std::path::Path;

pub use builder::{PageOptions, ReportBuilder};
pub use catalog::{Article, Condition, DataSource, Field, JsonCatalog, Query};
pub use column::{ColumnFormat, HeaderTitle, HorizontalAlign};
pub use error::AppError;
pub use fit::{Fit, PageFitter};
pub use layout::{LayoutGeometry, Pos, TableLayout};
pub use reports::{generate, Report};
pub use sheet::{CellRange, CellStyle, GridSheet, Orientation, PageStyle, Sheet};
pub use style::RowStyle;
pub use value::{CellContent, CellValue, Row};

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Write a finished sheet to `path`.
pub fn save(sheet: &GridSheet, path: &Path, format: OutputFormat) -> Result<(), AppError> {
    match format {
        OutputFormat::Xlsx => xlsx::save(sheet, path),
        OutputFormat::Pdf => pdf::save(sheet, path),
    }
}
