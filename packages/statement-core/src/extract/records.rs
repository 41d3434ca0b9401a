//! Holding record extraction from Asset Review pages.

use super::pages::read_statement_pages;
use crate::config::Config;
use crate::table::Table;
use crate::types::{
    column_name, Currency, HoldingRecord, StatementKind, StatementTables, PRICE_FIELD,
    QUANTITY_FIELD,
};
use crate::{Error, Result};
use std::path::Path;

/// Positional fields of a holdings line: name, symbol, quantity, price,
/// book cost, market value.
const FIELD_COUNT: usize = 6;

/// Year and currency read from a page's header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    /// Statement year
    pub year: u16,
    /// Currency code as printed (e.g. `CDN`)
    pub currency_code: String,
}

/// Holdings parsed from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTable {
    pub year: u16,
    pub currency: Currency,
    pub records: Vec<HoldingRecord>,
}

impl PageTable {
    /// Convert to a `Quantity_<year>` / `Price_<year>` table keyed by symbol.
    pub fn to_table(&self) -> Table {
        let mut table = Table::with_columns([
            column_name(QUANTITY_FIELD, self.year),
            column_name(PRICE_FIELD, self.year),
        ]);

        for record in &self.records {
            // Both cells are always present, so the width check cannot fail.
            let replaced = table
                .upsert_row(&record.symbol, vec![Some(record.quantity), Some(record.price)])
                .unwrap_or(false);
            if replaced {
                tracing::warn!(
                    "Symbol {} listed twice for {}, keeping the later line ({})",
                    record.symbol,
                    self.year,
                    record.name
                );
            }
        }

        table
    }
}

/// Read year and currency code from the second line of a page.
///
/// The year is the last four characters. Registered statements carry the
/// currency in the four characters ending seven before the end of the line
/// (an opening parenthesis is dropped); other statements lead with it.
pub fn parse_header(lines: &[String], kind: StatementKind) -> Result<PageHeader> {
    let header = lines
        .get(1)
        .ok_or_else(|| Error::MalformedPage("missing header line".to_string()))?
        .trim_end();
    let chars: Vec<char> = header.chars().collect();
    let n = chars.len();

    if n < 4 {
        return Err(Error::MalformedPage(format!(
            "header too short for a year: {:?}",
            header
        )));
    }
    let year_text: String = chars[n - 4..].iter().collect();
    if !year_text.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::MalformedPage(format!(
            "header does not end in a year: {:?}",
            header
        )));
    }
    let year: u16 = year_text
        .parse()
        .map_err(|_| Error::MalformedPage(format!("invalid year {:?}", year_text)))?;

    let currency_code = match kind {
        StatementKind::Registered => {
            if n < 11 {
                return Err(Error::MalformedPage(format!(
                    "header too short for a currency: {:?}",
                    header
                )));
            }
            chars[n - 11..n - 7].iter().filter(|&&c| c != '(').collect()
        }
        StatementKind::NonRegistered => chars
            .iter()
            .take(3)
            .collect::<String>()
            .to_uppercase(),
    };

    Ok(PageHeader {
        year,
        currency_code,
    })
}

/// Lines of the holdings section(s) on a page.
///
/// A start marker turns collection on, otherwise an end marker turns it off.
/// The first collected line is the section heading and is skipped.
pub fn section_lines<'a>(lines: &'a [String], config: &Config) -> Vec<&'a str> {
    let mut collecting = false;
    let mut collected = Vec::new();

    for line in lines {
        if config.starts_section(line) {
            collecting = true;
        } else if config.ends_section(line) {
            collecting = false;
        }

        if collecting {
            collected.push(line.as_str());
        }
    }

    collected.into_iter().skip(1).collect()
}

/// Parse a numeric cell, tolerating `$` and thousands separators.
fn parse_number(field: &str, value: &str) -> Result<f64> {
    let cleaned: String = value
        .trim_start_matches('$')
        .chars()
        .filter(|&c| c != ',')
        .collect();

    let invalid = || Error::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    };

    let number: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !number.is_finite() {
        return Err(invalid());
    }
    Ok(number)
}

/// Parse one holdings line.
///
/// Returns `Ok(None)` for lines with fewer than six whitespace-separated
/// fields. Longer lines keep their last five tokens as the fixed fields and
/// join the rest into the name.
pub fn parse_holding(line: &str) -> Result<Option<HoldingRecord>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < FIELD_COUNT {
        return Ok(None);
    }

    let (name, fixed) = tokens.split_at(tokens.len() - (FIELD_COUNT - 1));
    let symbol = fixed[0];
    let quantity = parse_number(QUANTITY_FIELD, fixed[1])?;
    let price = parse_number(PRICE_FIELD, fixed[2])?;

    Ok(Some(HoldingRecord::new(
        &name.join(" "),
        symbol,
        quantity,
        price,
    )))
}

/// Parse the header and holdings of one marked page.
pub fn parse_page(lines: &[String], kind: StatementKind, config: &Config) -> Result<PageTable> {
    let header = parse_header(lines, kind)?;
    let currency = Currency::from_code(&header.currency_code, config);

    let mut records = Vec::new();
    let mut dropped = 0;
    for line in section_lines(lines, config) {
        match parse_holding(line)? {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    tracing::debug!(
        "Page {} {}: {} holdings, {} short lines dropped",
        header.year,
        header.currency_code,
        records.len(),
        dropped
    );

    Ok(PageTable {
        year: header.year,
        currency,
        records,
    })
}

fn file_name_of(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.display().to_string()))
}

/// Source suffix of a statement file: the file name before the first `_`,
/// or the file stem when there is no underscore.
pub fn source_suffix(path: &Path) -> Result<String> {
    let file_name = file_name_of(path)?;

    let suffix = match file_name.split_once('_') {
        Some((prefix, _)) => prefix,
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name),
    };

    if suffix.is_empty() {
        return Err(Error::InvalidFileName(file_name.to_string()));
    }
    Ok(suffix.to_string())
}

/// Build the domestic and foreign tables from a statement's marked pages.
///
/// `file_name` selects the statement layout and the source suffix.
pub fn extract_tables(
    file_name: &str,
    pages: &[Vec<String>],
    config: &Config,
) -> Result<StatementTables> {
    let kind = StatementKind::detect(file_name, &config.registered_tag);
    let suffix = source_suffix(Path::new(file_name))?;

    let mut domestic: Option<Table> = None;
    let mut foreign: Option<Table> = None;

    for lines in pages {
        let page = parse_page(lines, kind, config)?;
        let bucket = match page.currency {
            Currency::Domestic => &mut domestic,
            Currency::Foreign => &mut foreign,
        };

        let table = page.to_table();
        match bucket {
            Some(existing) => {
                let overwritten = existing.append_rows(&table);
                if overwritten > 0 {
                    tracing::warn!(
                        "{} symbols repeated across {} pages of {}",
                        overwritten,
                        page.currency.label(config),
                        file_name
                    );
                }
            }
            None => *bucket = Some(table),
        }
    }

    let finish = |bucket: Option<Table>, currency: Currency| {
        bucket.unwrap_or_else(|| {
            tracing::warn!(
                "No {} holdings found in {}",
                currency.label(config),
                file_name
            );
            Table::new()
        })
    };

    Ok(StatementTables {
        suffix,
        domestic: finish(domestic, Currency::Domestic),
        foreign: finish(foreign, Currency::Foreign),
    })
}

/// Read a statement PDF and extract its holding tables.
pub fn extract_statement(path: impl AsRef<Path>, config: &Config) -> Result<StatementTables> {
    let path = path.as_ref();
    let file_name = file_name_of(path)?;
    let pages = read_statement_pages(path, &config.page_marker)?;
    let tables = extract_tables(file_name, &pages, config)?;

    tracing::info!(
        "Extracted {}: {} domestic, {} foreign holdings",
        file_name,
        tables.domestic.len(),
        tables.foreign.len()
    );
    Ok(tables)
}
