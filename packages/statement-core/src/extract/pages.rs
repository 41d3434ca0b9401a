//! PDF page loading and marker filtering.

use crate::{Error, Result};
use lopdf::Document;
use std::path::Path;

/// Extract the text of every page of a PDF, in page order.
///
/// Text comes from `pdf-extract`, which rebuilds lines from glyph positions.
/// When it cannot read the file, lopdf's per-page extraction is used instead.
/// Each page is normalised with [`normalize_page_text`].
pub fn load_page_texts(path: &Path) -> Result<Vec<String>> {
    let texts = match pdf_extract::extract_text_by_pages(path) {
        Ok(texts) => texts,
        Err(e) => {
            tracing::warn!(
                "pdf-extract failed on {} ({}), falling back to lopdf",
                path.display(),
                e
            );
            load_page_texts_lopdf(path)?
        }
    };

    let texts: Vec<String> = texts.into_iter().map(|t| normalize_page_text(&t)).collect();
    tracing::debug!("Read {} pages from {}", texts.len(), path.display());
    Ok(texts)
}

/// Per-page text via lopdf.
///
/// lopdf ends a line only at `ET`, so several lines drawn in one text
/// object come back joined.
fn load_page_texts_lopdf(path: &Path) -> Result<Vec<String>> {
    let doc = Document::load(path)
        .map_err(|e| Error::Pdf(format!("{}: {}", path.display(), e)))?;

    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());
    for (page_num, _page_id) in pages {
        let text = doc
            .extract_text(&[page_num])
            .map_err(|e| Error::Pdf(format!("{} page {}: {}", path.display(), page_num, e)))?;
        texts.push(text);
    }
    Ok(texts)
}

/// Drop blank lines and trailing whitespace from extracted page text.
///
/// Extractors pad pages with empty lines (pdf-extract starts every page with
/// two), which would move the header off the second line.
pub fn normalize_page_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split page text into lines.
///
/// Every `\n` separates a line, so the count is always one more than the
/// number of newlines; only a trailing `\r` is stripped.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Keep the pages whose text contains `marker`, each split into lines.
pub fn filter_pages<I, S>(texts: I, marker: &str) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .filter(|text| text.as_ref().contains(marker))
        .map(|text| split_lines(text.as_ref()))
        .collect()
}

/// Load a statement and return the line groups of its marked pages.
pub fn read_statement_pages(path: &Path, marker: &str) -> Result<Vec<Vec<String>>> {
    let texts = load_page_texts(path)?;
    let pages = filter_pages(&texts, marker);
    tracing::debug!(
        "{} of {} pages in {} contain {:?}",
        pages.len(),
        texts.len(),
        path.display(),
        marker
    );
    Ok(pages)
}
