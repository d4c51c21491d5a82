use std::path::Path;

use serde::Deserialize;

use crate::crm::sheets::error::Result;

/// Business-rule limits applied while importing.
///
/// Every field has a default, so an empty TOML document (or no file at all)
/// yields the stock behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportSettings {
    /// Largest interval accepted for a custom frequency.
    pub max_custom_interval: u32,
    /// Smallest week number accepted in a week code.
    pub min_week: u32,
    /// Largest week number accepted in a week code.
    pub max_week: u32,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_custom_interval: 120,
            min_week: 1,
            max_week: 53,
        }
    }
}

impl ImportSettings {
    /// Parses settings from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Loads settings from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
