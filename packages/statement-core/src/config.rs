//! Extraction settings and their on-disk override.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "STATEMENT_ANALYSIS_CONFIG";

/// Markers and labels used to read statements and name sheets.
///
/// Every field has a default matching the brokerage layout this tool was
/// written against, so a config file only needs the fields it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Text a page must contain to be scanned for holdings
    pub page_marker: String,
    /// Lines containing any of these open a holdings section
    pub section_start: Vec<String>,
    /// Lines containing any of these close a holdings section
    pub section_end: Vec<String>,
    /// File name tag identifying registered-account statements
    pub registered_tag: String,
    /// Header currency code treated as domestic
    pub domestic_code: String,
    /// Sheet label for domestic tables
    pub domestic_label: String,
    /// Sheet label for foreign tables
    pub foreign_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_marker: "Asset Review".to_string(),
            section_start: vec![
                "Common Shares".to_string(),
                "Foreign Securities".to_string(),
            ],
            section_end: vec![
                "TotalValueofCommonShares".to_string(),
                "TotalValueofForeignSecurities".to_string(),
            ],
            registered_tag: "rrsp".to_string(),
            domestic_code: "CDN".to_string(),
            domestic_label: "CDN".to_string(),
            foreign_label: "US".to_string(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/statement-analysis/config.toml`
    /// Can be overridden with `STATEMENT_ANALYSIS_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("", "", "statement-analysis")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("statement-analysis.toml"))
    }

    /// Load from the given path, or from the default path when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_from_path(&Self::default_path()),
        }
    }

    /// Load config from a specific path; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Whether a line opens a holdings section.
    pub fn starts_section(&self, line: &str) -> bool {
        self.section_start.iter().any(|m| line.contains(m.as_str()))
    }

    /// Whether a line closes a holdings section.
    pub fn ends_section(&self, line: &str) -> bool {
        self.section_end.iter().any(|m| line.contains(m.as_str()))
    }
}
