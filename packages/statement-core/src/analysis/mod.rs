//! Year-over-year analysis module.
//!
//! Provides column-wise merging of yearly tables and percent price changes.

mod change;
mod merge;

pub use change::{percent_change, price_years};
pub use merge::merge_columns;
