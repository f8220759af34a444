/// Application configuration
///
/// Loaded once at startup from `config.json` in the user's config directory:
/// - Linux: ~/.config/inventory-lookup/config.json
/// - macOS: ~/Library/Application Support/inventory-lookup/config.json
/// - Windows: %APPDATA%\inventory-lookup\config.json
///
/// Every field has a default, so a missing file or a partial file is fine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "inventory-lookup";

/// Environment variable overriding the catalog database location
pub const DATABASE_ENV: &str = "INVENTORY_DB";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Catalog database file (None = platform data directory)
    pub database_path: Option<PathBuf>,
    /// Search behaviour
    pub search: SearchConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Settling period for text input before a query is dispatched
    pub debounce_ms: u64,
    /// Maximum number of autocomplete suggestions
    pub suggestion_limit: usize,
    /// Collapse suggestions sharing a model name to the first occurrence
    pub dedupe_suggestions: bool,
    /// Brands that imply a type filter when selected
    pub brand_types: BrandTypeMap,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            suggestion_limit: 5,
            dedupe_suggestions: true,
            brand_types: BrandTypeMap::default(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Declarative brand -> type table
///
/// Keys are matched case-insensitively.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct BrandTypeMap(BTreeMap<String, String>);

impl BrandTypeMap {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Type implied by selecting `brand`, if any
    pub fn implied_type(&self, brand: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(brand))
            .map(|(_, kind)| kind.as_str())
    }
}

impl Config {
    /// Load the config from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load the config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the catalog database path.
    ///
    /// Precedence: `INVENTORY_DB`, then `database_path`, then the platform
    /// data directory (e.g. ~/.local/share/inventory-lookup/inventory.db).
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = std::env::var_os(DATABASE_ENV) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push("inventory.db");
        path
    }

    fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push(APP_DIR);
        path.push("config.json");
        Some(path)
    }
}
