//! Symbol-keyed numeric table.
//!
//! Every sheet the workbook holds is one of these: a `Symbol` key column
//! followed by named numeric columns whose cells may be empty.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Name of the key column as written into sheets.
pub const INDEX_COLUMN: &str = "Symbol";

/// One keyed row of a [`Table`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    /// Row key (ticker symbol)
    pub symbol: String,
    /// One cell per table column, `None` when empty
    pub values: Vec<Option<f64>>,
}

impl Row {
    /// Cell at a column position.
    pub fn value(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }
}

/// Table of numeric columns keyed by symbol.
///
/// Row order is insertion order; a symbol appears at most once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with the given columns.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Find a row by symbol.
    pub fn row(&self, symbol: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }

    /// Cell value by symbol and column name.
    pub fn get(&self, symbol: &str, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.row(symbol)?.value(idx)
    }

    /// Symbols in row order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.symbol.as_str())
    }

    /// Iterate the cells of one column in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(move |r| r.value(idx))
    }

    /// Insert a row, or replace the cells of an existing row with the same symbol.
    ///
    /// Returns `true` when an existing row was replaced.
    pub fn upsert_row(&mut self, symbol: &str, values: Vec<Option<f64>>) -> Result<bool> {
        if values.len() != self.columns.len() {
            return Err(Error::InvalidOperation(format!(
                "Row {} has {} cells, table has {} columns",
                symbol,
                values.len(),
                self.columns.len()
            )));
        }

        if let Some(existing) = self.rows.iter_mut().find(|r| r.symbol == symbol) {
            existing.values = values;
            Ok(true)
        } else {
            self.rows.push(Row {
                symbol: symbol.to_string(),
                values,
            });
            Ok(false)
        }
    }

    /// Add a column, filling existing rows with empty cells.
    ///
    /// Returns the position of the column; an existing column is reused.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.values.push(None);
        }
        self.columns.len() - 1
    }

    /// Concatenate another table's rows onto this one.
    ///
    /// Columns are unioned (new ones appended). A symbol already present has
    /// the other table's cells written over it; the count of such symbols is
    /// returned.
    pub fn append_rows(&mut self, other: &Table) -> usize {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| self.ensure_column(c))
            .collect();
        let width = self.columns.len();
        let mut overwritten = 0;

        for row in &other.rows {
            let target = match self.rows.iter().position(|r| r.symbol == row.symbol) {
                Some(pos) => {
                    overwritten += 1;
                    pos
                }
                None => {
                    self.rows.push(Row {
                        symbol: row.symbol.clone(),
                        values: vec![None; width],
                    });
                    self.rows.len() - 1
                }
            };

            for (src, &dst) in mapping.iter().enumerate() {
                self.rows[target].values[dst] = row.value(src);
            }
        }

        overwritten
    }

    /// New table restricted to the columns matching `keep`, in column order.
    pub fn select_columns<F>(&self, keep: F) -> Table
    where
        F: Fn(&str) -> bool,
    {
        let picked: Vec<usize> = (0..self.columns.len())
            .filter(|&i| keep(&self.columns[i]))
            .collect();

        Table {
            columns: picked.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| Row {
                    symbol: r.symbol.clone(),
                    values: picked.iter().map(|&i| r.value(i)).collect(),
                })
                .collect(),
        }
    }

    /// Drop every column in which no row has a value.
    pub fn drop_empty_columns(&mut self) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| self.column_values(i).any(|v| v.is_some()))
            .collect();

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&false));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.values.retain(|_| *flags.next().unwrap_or(&false));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::with_columns(["Quantity_2020", "Price_2020"]);
        table
            .upsert_row("ABC", vec![Some(10.0), Some(100.0)])
            .unwrap();
        table.upsert_row("XYZ", vec![Some(5.0), None]).unwrap();
        table
    }

    #[test]
    fn test_get_and_row() {
        let table = sample();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("ABC", "Price_2020"), Some(100.0));
        assert_eq!(table.get("XYZ", "Price_2020"), None);
        assert_eq!(table.get("NOPE", "Price_2020"), None);
        assert_eq!(table.symbols().collect::<Vec<_>>(), vec!["ABC", "XYZ"]);
    }

    #[test]
    fn test_upsert_replaces() {
        let mut table = sample();
        let replaced = table.upsert_row("ABC", vec![Some(1.0), Some(2.0)]).unwrap();
        assert!(replaced);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("ABC", "Quantity_2020"), Some(1.0));
    }

    #[test]
    fn test_upsert_width_mismatch() {
        let mut table = sample();
        let result = table.upsert_row("DEF", vec![Some(1.0)]);
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_append_rows_unions_columns() {
        let mut table = sample();
        let mut other = Table::with_columns(["Price_2020", "Price_2021"]);
        other.upsert_row("XYZ", vec![Some(7.0), Some(8.0)]).unwrap();
        other.upsert_row("NEW", vec![None, Some(3.0)]).unwrap();

        let overwritten = table.append_rows(&other);

        assert_eq!(overwritten, 1);
        assert_eq!(
            table.columns(),
            &["Quantity_2020", "Price_2020", "Price_2021"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("XYZ", "Quantity_2020"), Some(5.0));
        assert_eq!(table.get("XYZ", "Price_2020"), Some(7.0));
        assert_eq!(table.get("ABC", "Price_2021"), None);
        assert_eq!(table.get("NEW", "Price_2021"), Some(3.0));
    }

    #[test]
    fn test_select_columns() {
        let table = sample();
        let prices = table.select_columns(|c| c.contains("Price"));
        assert_eq!(prices.columns(), &["Price_2020"]);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("ABC", "Price_2020"), Some(100.0));
    }

    #[test]
    fn test_drop_empty_columns() {
        let mut table = Table::with_columns(["a", "b", "c"]);
        table.upsert_row("ABC", vec![None, Some(1.0), None]).unwrap();
        table.upsert_row("XYZ", vec![None, None, Some(2.0)]).unwrap();

        table.drop_empty_columns();

        assert_eq!(table.columns(), &["b", "c"]);
        assert_eq!(table.rows()[0].values, vec![Some(1.0), None]);
        assert_eq!(table.rows()[1].values, vec![None, Some(2.0)]);
    }
}
