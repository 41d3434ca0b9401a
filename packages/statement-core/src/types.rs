//! Core data types for statement analysis.

use crate::config::Config;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Field name of the quantity columns (`Quantity_<year>`).
pub const QUANTITY_FIELD: &str = "Quantity";

/// Field name of the price columns (`Price_<year>`).
pub const PRICE_FIELD: &str = "Price";

/// Prefix of the accumulated holding sheets.
pub const DATA_PREFIX: &str = "data";

/// Prefix of the derived percent-change sheets.
pub const ANALYSIS_PREFIX: &str = "analysis";

/// Build a year-tagged column name, e.g. `Price_2020`.
pub fn column_name(field: &str, year: u16) -> String {
    format!("{}_{}", field, year)
}

/// Year suffix of a year-tagged column name.
///
/// Returns `None` when the column does not end in `_<four digits>`.
pub fn column_year(column: &str) -> Option<u16> {
    let (_, year) = column.rsplit_once('_')?;
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        year.parse().ok()
    } else {
        None
    }
}

/// Name of a percent-change column, e.g. `2020_to_2021`.
pub fn change_column_name(from: u16, to: u16) -> String {
    format!("{}_to_{}", from, to)
}

/// Currency bucket a statement page belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Domestic,
    Foreign,
}

impl Currency {
    /// Classify a currency code read from a page header.
    pub fn from_code(code: &str, config: &Config) -> Self {
        if code == config.domestic_code {
            Currency::Domestic
        } else {
            Currency::Foreign
        }
    }

    /// Label used in sheet names (`CDN` / `US` by default).
    pub fn label<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            Currency::Domestic => config.domestic_label.as_str(),
            Currency::Foreign => config.foreign_label.as_str(),
        }
    }
}

/// Statement layout, detected from the file name.
///
/// Registered accounts print the currency in parentheses near the end of the
/// header line; non-registered accounts lead the header with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Registered,
    NonRegistered,
}

impl StatementKind {
    /// Detect the statement kind from a file name (case-insensitive tag match).
    pub fn detect(file_name: &str, registered_tag: &str) -> Self {
        if file_name
            .to_lowercase()
            .contains(&registered_tag.to_lowercase())
        {
            StatementKind::Registered
        } else {
            StatementKind::NonRegistered
        }
    }
}

/// One holding line from an Asset Review section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldingRecord {
    /// Security name as printed
    pub name: String,
    /// Ticker symbol (the row key)
    pub symbol: String,
    /// Number of units held
    pub quantity: f64,
    /// Price per unit at statement date
    pub price: f64,
}

impl HoldingRecord {
    /// Create a new holding record.
    pub fn new(name: &str, symbol: &str, quantity: f64, price: f64) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            quantity,
            price,
        }
    }
}

/// Domestic and foreign holding tables extracted from one statement file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementTables {
    /// Source suffix derived from the file name (e.g. `rrsp`)
    pub suffix: String,
    /// Holdings priced in the domestic currency
    pub domestic: Table,
    /// Holdings priced in a foreign currency
    pub foreign: Table,
}

impl StatementTables {
    /// Table for one currency bucket.
    pub fn table(&self, currency: Currency) -> &Table {
        match currency {
            Currency::Domestic => &self.domestic,
            Currency::Foreign => &self.foreign,
        }
    }

    /// Sheet name holding the accumulated table for a currency.
    pub fn data_sheet(&self, currency: Currency, config: &Config) -> String {
        sheet_name(DATA_PREFIX, currency, &self.suffix, config)
    }

    /// Sheet name holding the change table for a currency.
    pub fn analysis_sheet(&self, currency: Currency, config: &Config) -> String {
        sheet_name(ANALYSIS_PREFIX, currency, &self.suffix, config)
    }
}

/// Build a sheet name such as `data_CDN_rrsp`.
pub fn sheet_name(prefix: &str, currency: Currency, suffix: &str, config: &Config) -> String {
    format!("{}_{}_{}", prefix, currency.label(config), suffix)
}

/// JSON envelope for CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Pretty-printed JSON for stdout.
    ///
    /// If the payload cannot be serialized, an error envelope carrying the
    /// serializer's message is returned instead.
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize response: {}", e);
            serde_json::json!({ "ok": false, "error": e.to_string() }).to_string()
        })
    }
}
