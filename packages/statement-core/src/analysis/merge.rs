//! Outer join of yearly tables by symbol.

use crate::table::Table;
use crate::{Error, Result};

/// Join `new` onto `prior` column-wise, matching rows by symbol.
///
/// The result has the prior columns followed by the new ones. Prior rows keep
/// their order; symbols only present in `new` follow in their own order.
/// Cells a side does not have stay empty.
///
/// Returns `Error::DuplicateColumn` if a new column already exists, which
/// happens when the same year is appended twice.
pub fn merge_columns(prior: &Table, new: &Table) -> Result<Table> {
    if let Some(dup) = new
        .columns()
        .iter()
        .find(|c| prior.column_index(c).is_some())
    {
        return Err(Error::DuplicateColumn(dup.clone()));
    }

    let mut merged = prior.clone();
    let overlap = merged.append_rows(new);

    tracing::debug!(
        "Merged {} columns onto {} rows: {} shared symbols, {} total",
        new.columns().len(),
        prior.len(),
        overlap,
        merged.len()
    );
    Ok(merged)
}
