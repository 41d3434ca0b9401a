//! Statement extraction module.
//!
//! Turns a statement PDF into per-currency holding tables:
//!
//! - **Pages**: keep the pages carrying the Asset Review marker, split into lines
//! - **Records**: parse the header, cut out the holdings section, build tables

mod pages;
mod records;

pub use pages::{
    filter_pages, load_page_texts, normalize_page_text, read_statement_pages, split_lines,
};
pub use records::{
    extract_statement, extract_tables, parse_header, parse_holding, parse_page, section_lines,
    source_suffix, PageHeader, PageTable,
};
