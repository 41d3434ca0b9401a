//! Statement Core - Brokerage statement extraction and holdings analysis.
//!
//! This crate turns brokerage statement PDFs into a year-over-year workbook:
//!
//! - **Extraction**: Asset Review pages to per-currency holding tables
//! - **Merging**: New year columns joined onto the accumulated tables by symbol
//! - **Analysis**: Percent price change between consecutive years
//! - **Workbook**: Named sheets written into an existing `.xlsx` file
//!
//! # Example
//!
//! ```rust,no_run
//! use statement_core::{pipeline, Config};
//!
//! let config = Config::default();
//!
//! // First run: seed the workbook from the first statements
//! pipeline::initialize(
//!     "statement_analysis.xlsx",
//!     &["non_registered_2020.pdf", "rrsp_2020.pdf"],
//!     &config,
//! )?;
//!
//! // Every following year: append one statement at a time
//! let summary = pipeline::append("statement_analysis.xlsx", "rrsp_2021.pdf", &config)?;
//! println!("Wrote {} sheets", summary.sheets.len());
//! # Ok::<(), statement_core::Error>(())
//! ```

pub mod analysis;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod table;
pub mod types;
pub mod workbook;

use std::path::PathBuf;

// Re-export commonly used types
pub use config::Config;
pub use table::{Row, Table};
pub use types::{ApiResponse, Currency, HoldingRecord, StatementKind, StatementTables};

// Re-export main functionality
pub use analysis::{merge_columns, percent_change};
pub use extract::{extract_statement, extract_tables, filter_pages, parse_page, source_suffix};
pub use pipeline::{append, initialize, plan_append, plan_initial, RunSummary, SheetSet};
pub use workbook::{write_tables, Workbook};

/// Error types for statement-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Workbook not found: {}", .0.display())]
    WorkbookNotFound(PathBuf),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Malformed page: {0}")]
    MalformedPage(String),

    #[error("Malformed sheet {sheet}: {reason}")]
    MalformedSheet { sheet: String, reason: String },

    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("Column already present: {0}")]
    DuplicateColumn(String),

    #[error("Invalid sheet name: {0:?}")]
    InvalidSheetName(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for statement-core operations.
pub type Result<T> = std::result::Result<T, Error>;
