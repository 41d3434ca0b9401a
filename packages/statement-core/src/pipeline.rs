//! Initialize and append runs.
//!
//! Both modes compute the complete set of sheets first and touch the
//! workbook file only once, at the end.

use crate::analysis::{merge_columns, percent_change, price_years};
use crate::config::Config;
use crate::extract::extract_statement;
use crate::table::Table;
use crate::types::{Currency, StatementTables};
use crate::workbook::Workbook;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::workbook::SheetSet;

/// Both currency buckets, in sheet-writing order.
const CURRENCIES: [Currency; 2] = [Currency::Domestic, Currency::Foreign];

/// Shape of one written sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetSummary {
    /// Sheet name
    pub name: String,
    /// Number of symbols
    pub rows: usize,
    /// Column names after the symbol column
    pub columns: Vec<String>,
}

/// Outcome of an initialize or append run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Workbook that was written
    pub workbook: PathBuf,
    /// Source suffixes processed
    pub sources: Vec<String>,
    /// Sheets written, by name
    pub sheets: Vec<SheetSummary>,
    /// When the workbook was saved
    pub completed_at: DateTime<Utc>,
}

impl RunSummary {
    fn new(workbook: &Path, statements: &[&StatementTables], sheets: &SheetSet) -> Self {
        let mut sources: Vec<String> = statements.iter().map(|s| s.suffix.clone()).collect();
        sources.dedup();

        Self {
            workbook: workbook.to_path_buf(),
            sources,
            sheets: sheets
                .iter()
                .map(|(name, table)| SheetSummary {
                    name: name.clone(),
                    rows: table.len(),
                    columns: table.columns().to_vec(),
                })
                .collect(),
            completed_at: Utc::now(),
        }
    }
}

/// Sheets for a fresh workbook built from one or more statements.
///
/// Statements sharing a source suffix are merged column-wise in the order
/// given. A change sheet is added for every data sheet with at least two
/// price years.
pub fn plan_initial(statements: &[StatementTables], config: &Config) -> Result<SheetSet> {
    let mut sheets = SheetSet::new();
    let mut analyses: Vec<(String, String)> = Vec::new();

    for statement in statements {
        for currency in CURRENCIES {
            let data_name = statement.data_sheet(currency, config);
            let table = statement.table(currency);

            let combined = match sheets.remove(&data_name) {
                Some(prior) => merge_columns(&prior, table)?,
                None => table.clone(),
            };
            sheets.insert(data_name.clone(), combined);

            let pair = (data_name, statement.analysis_sheet(currency, config));
            if !analyses.contains(&pair) {
                analyses.push(pair);
            }
        }
    }

    for (data_name, analysis_name) in analyses {
        let Some(data) = sheets.get(&data_name) else {
            continue;
        };
        if price_years(data).len() >= 2 {
            let changes = percent_change(data);
            sheets.insert(analysis_name, changes);
        }
    }

    Ok(sheets)
}

/// Sheets to write when appending one statement to an existing workbook.
///
/// Each currency's prior data sheet is read back and the new year merged on;
/// a missing sheet is a new account and starts empty. Change sheets are
/// always recomputed.
pub fn plan_append(
    workbook: &Workbook,
    statement: &StatementTables,
    config: &Config,
) -> Result<SheetSet> {
    let mut sheets = SheetSet::new();

    for currency in CURRENCIES {
        let data_name = statement.data_sheet(currency, config);
        let prior = match workbook.read_table(&data_name)? {
            Some(table) => table,
            None => {
                tracing::info!("No sheet {} yet, starting a new table", data_name);
                Table::new()
            }
        };

        let merged = merge_columns(&prior, statement.table(currency))?;
        let changes = percent_change(&merged);

        sheets.insert(data_name, merged);
        sheets.insert(statement.analysis_sheet(currency, config), changes);
    }

    Ok(sheets)
}

/// Initialize an existing (empty) workbook from already-extracted statements.
pub fn initialize_with(
    workbook_path: impl AsRef<Path>,
    statements: &[StatementTables],
    config: &Config,
) -> Result<RunSummary> {
    if statements.is_empty() {
        return Err(Error::InvalidOperation(
            "At least one statement is needed to initialize a workbook".to_string(),
        ));
    }

    let mut workbook = Workbook::open(workbook_path)?;
    let sheets = plan_initial(statements, config)?;
    workbook.put_tables(&sheets)?;
    workbook.save()?;

    tracing::info!(
        "Initialized {} with {} sheets",
        workbook.path().display(),
        sheets.len()
    );
    let refs: Vec<&StatementTables> = statements.iter().collect();
    Ok(RunSummary::new(workbook.path(), &refs, &sheets))
}

/// Append an already-extracted statement to an existing workbook.
pub fn append_with(
    workbook_path: impl AsRef<Path>,
    statement: &StatementTables,
    config: &Config,
) -> Result<RunSummary> {
    let mut workbook = Workbook::open(workbook_path)?;
    let sheets = plan_append(&workbook, statement, config)?;
    workbook.put_tables(&sheets)?;
    workbook.save()?;

    tracing::info!(
        "Appended {} to {}",
        statement.suffix,
        workbook.path().display()
    );
    Ok(RunSummary::new(workbook.path(), &[statement], &sheets))
}

/// Build the initial workbook contents from statement PDFs.
///
/// The workbook file must already exist (see [`Workbook::create`]).
pub fn initialize<P: AsRef<Path>>(
    workbook_path: impl AsRef<Path>,
    files: &[P],
    config: &Config,
) -> Result<RunSummary> {
    let workbook_path = workbook_path.as_ref();
    if !workbook_path.exists() {
        return Err(Error::WorkbookNotFound(workbook_path.to_path_buf()));
    }

    let statements = files
        .iter()
        .map(|file| extract_statement(file, config))
        .collect::<Result<Vec<_>>>()?;

    initialize_with(workbook_path, &statements, config)
}

/// Merge one new statement PDF into an existing workbook.
pub fn append(
    workbook_path: impl AsRef<Path>,
    file: impl AsRef<Path>,
    config: &Config,
) -> Result<RunSummary> {
    let workbook_path = workbook_path.as_ref();
    if !workbook_path.exists() {
        return Err(Error::WorkbookNotFound(workbook_path.to_path_buf()));
    }

    let statement = extract_statement(file, config)?;
    append_with(workbook_path, &statement, config)
}
