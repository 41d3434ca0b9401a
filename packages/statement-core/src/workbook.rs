//! Workbook reading and writing.
//!
//! Each table becomes one sheet: `Symbol` in A1, column names across the
//! first row and one row per symbol below. Sheets not named in a write are
//! left untouched.

use crate::table::{Table, INDEX_COLUMN};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Named tables destined for workbook sheets.
pub type SheetSet = BTreeMap<String, Table>;

/// Longest sheet name a workbook accepts.
const MAX_SHEET_NAME: usize = 31;

/// Characters a sheet name may not contain.
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Check a sheet name against workbook naming rules.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0
        || len > MAX_SHEET_NAME
        || name.contains(FORBIDDEN_SHEET_CHARS)
        || name.starts_with('\'')
        || name.ends_with('\'')
    {
        return Err(Error::InvalidSheetName(name.to_string()));
    }
    Ok(())
}

/// Sheet coordinate as (column, row), both 1-based.
fn cell(col: u32, row: u32) -> (u32, u32) {
    (col, row)
}

fn workbook_err(path: &Path, e: impl fmt::Display) -> Error {
    Error::Workbook(format!("{}: {}", path.display(), e))
}

/// An `.xlsx` workbook loaded into memory.
pub struct Workbook {
    /// Path the workbook was opened from and is saved back to
    path: PathBuf,
    book: Spreadsheet,
}

impl fmt::Debug for Workbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbook")
            .field("path", &self.path)
            .field("sheets", &self.sheet_names())
            .finish()
    }
}

impl Workbook {
    /// Create a new, empty workbook file.
    ///
    /// Refuses to overwrite an existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(Error::InvalidOperation(format!(
                "{} already exists",
                path.display()
            )));
        }

        let workbook = Self {
            book: umya_spreadsheet::new_file(),
            path,
        };
        workbook.save()?;
        tracing::info!("Created workbook {}", workbook.path.display());
        Ok(workbook)
    }

    /// Open an existing workbook.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::WorkbookNotFound(path));
        }

        let book = umya_spreadsheet::reader::xlsx::read(&path).map_err(|e| workbook_err(&path, e))?;
        Ok(Self { path, book })
    }

    /// Get the workbook path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all sheets, in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.book
            .get_sheet_collection()
            .iter()
            .find(|ws| ws.get_name() == name)
    }

    /// Read a sheet back into a table.
    ///
    /// Returns `Ok(None)` when the sheet does not exist. Rows with an empty
    /// symbol cell are skipped.
    pub fn read_table(&self, name: &str) -> Result<Option<Table>> {
        let Some(ws) = self.sheet(name) else {
            return Ok(None);
        };

        let malformed = |reason: String| Error::MalformedSheet {
            sheet: name.to_string(),
            reason,
        };

        let index_header = ws.get_value(cell(1, 1));
        if index_header.trim() != INDEX_COLUMN {
            return Err(malformed(format!(
                "expected {:?} in A1, found {:?}",
                INDEX_COLUMN, index_header
            )));
        }

        let last_col = ws.get_highest_column();
        let last_row = ws.get_highest_row();

        let mut columns = Vec::new();
        for col in 2..=last_col {
            let header = ws.get_value(cell(col, 1));
            if header.trim().is_empty() {
                return Err(malformed(format!("empty header in column {}", col)));
            }
            columns.push(header.trim().to_string());
        }

        let mut table = Table::with_columns(columns.iter().cloned());
        for row in 2..=last_row {
            let symbol = ws.get_value(cell(1, row));
            let symbol = symbol.trim();
            if symbol.is_empty() {
                continue;
            }

            let mut values = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let raw = ws.get_value(cell(i as u32 + 2, row));
                let raw = raw.trim();
                if raw.is_empty() {
                    values.push(None);
                } else {
                    let value = raw.parse::<f64>().map_err(|_| Error::InvalidNumber {
                        field: format!("{}!{}", name, column),
                        value: raw.to_string(),
                    })?;
                    values.push(Some(value));
                }
            }

            if table.upsert_row(symbol, values)? {
                return Err(malformed(format!("symbol {} appears twice", symbol)));
            }
        }

        tracing::debug!(
            "Read sheet {}: {} rows x {} columns",
            name,
            table.len(),
            table.columns().len()
        );
        Ok(Some(table))
    }

    /// Write a table into a sheet, replacing any sheet of the same name.
    pub fn put_table(&mut self, name: &str, table: &Table) -> Result<()> {
        validate_sheet_name(name)?;

        if self.sheet(name).is_some() {
            self.book
                .remove_sheet_by_name(name)
                .map_err(|e| workbook_err(&self.path, e))?;
        }
        let path = self.path.clone();
        let ws = self
            .book
            .new_sheet(name)
            .map_err(|e| workbook_err(&path, e))?;

        ws.get_cell_mut(cell(1, 1)).set_value(INDEX_COLUMN);
        for (i, column) in table.columns().iter().enumerate() {
            ws.get_cell_mut(cell(i as u32 + 2, 1)).set_value(column.as_str());
        }

        for (r, row) in table.rows().iter().enumerate() {
            let sheet_row = r as u32 + 2;
            ws.get_cell_mut(cell(1, sheet_row)).set_value(row.symbol.as_str());
            for (i, value) in row.values.iter().enumerate() {
                if let Some(value) = value {
                    ws.get_cell_mut(cell(i as u32 + 2, sheet_row))
                        .set_value_number(*value);
                }
            }
        }

        Ok(())
    }

    /// Write every table of a sheet set.
    pub fn put_tables(&mut self, sheets: &SheetSet) -> Result<()> {
        for (name, table) in sheets {
            self.put_table(name, table)?;
        }
        Ok(())
    }

    /// Save the workbook back to its path.
    ///
    /// Writes a sibling temporary file first and renames it into place, so a
    /// failed write leaves the previous file as it was.
    pub fn save(&self) -> Result<()> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workbook".to_string());
        let tmp = self
            .path
            .with_file_name(format!(".{}.tmp.xlsx", file_name));

        if let Err(e) = umya_spreadsheet::writer::xlsx::write(&self.book, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(workbook_err(&self.path, e));
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Write named tables into an existing workbook, preserving its other sheets.
pub fn write_tables(path: impl AsRef<Path>, sheets: &SheetSet) -> Result<()> {
    let mut workbook = Workbook::open(path)?;
    workbook.put_tables(sheets)?;
    workbook.save()?;

    tracing::info!(
        "Wrote {} sheets to {}",
        sheets.len(),
        workbook.path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Table {
        let mut table = Table::with_columns(["Quantity_2020", "Price_2020"]);
        table
            .upsert_row("ABC", vec![Some(10.0), Some(12.5)])
            .unwrap();
        table.upsert_row("XYZ", vec![Some(3.0), None]).unwrap();
        table
    }

    #[test]
    fn test_sheet_name_rules() {
        assert!(validate_sheet_name("data_CDN_rrsp").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
    }

    #[test]
    fn test_open_missing_workbook() {
        let dir = tempdir().unwrap();
        let result = Workbook::open(dir.path().join("missing.xlsx"));
        assert!(matches!(result, Err(Error::WorkbookNotFound(_))));
    }

    #[test]
    fn test_create_refuses_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        Workbook::create(&path).unwrap();

        let result = Workbook::create(&path);
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_table_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut workbook = Workbook::create(&path).unwrap();

        workbook.put_table("data_CDN_rrsp", &sample()).unwrap();
        workbook.save().unwrap();

        let reopened = Workbook::open(&path).unwrap();
        let table = reopened.read_table("data_CDN_rrsp").unwrap().unwrap();
        assert_eq!(table, sample());
        assert!(reopened.read_table("data_US_rrsp").unwrap().is_none());
    }

    #[test]
    fn test_write_preserves_other_sheets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        Workbook::create(&path).unwrap();

        let mut first = SheetSet::new();
        first.insert("data_CDN_rrsp".to_string(), sample());
        write_tables(&path, &first).unwrap();

        let mut second = SheetSet::new();
        second.insert("data_US_rrsp".to_string(), sample());
        write_tables(&path, &second).unwrap();

        let names = Workbook::open(&path).unwrap().sheet_names();
        assert!(names.contains(&"Sheet1".to_string()));
        assert!(names.contains(&"data_CDN_rrsp".to_string()));
        assert!(names.contains(&"data_US_rrsp".to_string()));
    }

    #[test]
    fn test_overwrite_leaves_no_stale_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut workbook = Workbook::create(&path).unwrap();
        workbook.put_table("data_CDN_rrsp", &sample()).unwrap();

        let mut smaller = Table::with_columns(["Price_2020"]);
        smaller.upsert_row("ABC", vec![Some(1.0)]).unwrap();
        workbook.put_table("data_CDN_rrsp", &smaller).unwrap();
        workbook.save().unwrap();

        let table = Workbook::open(&path)
            .unwrap()
            .read_table("data_CDN_rrsp")
            .unwrap()
            .unwrap();
        assert_eq!(table, smaller);
    }

    #[test]
    fn test_write_requires_existing_workbook() {
        let dir = tempdir().unwrap();
        let result = write_tables(dir.path().join("missing.xlsx"), &SheetSet::new());
        assert!(matches!(result, Err(Error::WorkbookNotFound(_))));
    }
}
