//! Percent price change between consecutive years.

use crate::table::Table;
use crate::types::{change_column_name, column_year, PRICE_FIELD};

/// Years of the price columns of a table, in column order.
pub fn price_years(table: &Table) -> Vec<u16> {
    table
        .columns()
        .iter()
        .filter(|c| c.contains(PRICE_FIELD))
        .filter_map(|c| column_year(c))
        .collect()
}

fn pct_change(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    match (from, to) {
        (Some(from), Some(to)) if from != 0.0 => Some((to / from - 1.0) * 100.0),
        _ => None,
    }
}

/// Percent change of each price column against the one before it.
///
/// Works on the `Price_<year>` columns in column order, so callers must keep
/// years ascending. Each result column is named `<prior year>_to_<year>` and
/// holds `(price / prior price - 1) * 100`; a cell is empty when either
/// price is missing or the prior price is zero. Columns with no value at all
/// are dropped. Every symbol of the input keeps a row.
pub fn percent_change(table: &Table) -> Table {
    let prices = table.select_columns(|c| c.contains(PRICE_FIELD) && column_year(c).is_some());
    let years: Vec<u16> = prices
        .columns()
        .iter()
        .filter_map(|c| column_year(c))
        .collect();

    if years.windows(2).any(|w| w[0] >= w[1]) {
        tracing::warn!(
            "Price columns are not in ascending year order: {:?}",
            years
        );
    }

    let mut changes = Table::with_columns(
        years
            .windows(2)
            .map(|w| change_column_name(w[0], w[1])),
    );

    for row in prices.rows() {
        let values: Vec<Option<f64>> = (1..years.len())
            .map(|i| pct_change(row.value(i - 1), row.value(i)))
            .collect();
        // Width always matches the change columns.
        let _ = changes.upsert_row(&row.symbol, values);
    }

    changes.drop_empty_columns();
    changes
}
