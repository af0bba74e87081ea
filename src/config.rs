// CatalogSync - Book Catalog Sync
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Sync configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line flags
//! (which clap also fills from `CATALOG_SYNC_*` environment variables).
//!
//! ```toml
//! database = "library.db"
//! input_dir = "data/processed"
//! file_prefix = "clean_books_"
//! progress_interval = 50
//!
//! [shelves]
//! default = "1A-01"
//!
//! [shelves.categories]
//! "Fiction" = "1C-02"
//! ```

use crate::error::{Result, SyncError};
use crate::storage::queries::normalized_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::info;

/// Shelf used when a book has no category or an unmapped one
pub const DEFAULT_SHELF: &str = "1A-01";

/// Built-in category to shelf table
const BUILTIN_SHELVES: &[(&str, &str)] = &[
    ("Programming", "1A-01"),
    ("Computers", "1A-01"),
    ("AI", "1A-02"),
    ("Artificial Intelligence", "1A-02"),
    ("Data Science", "1A-03"),
    ("Machine Learning", "1A-03"),
    ("History", "1B-01"),
    ("Novel", "1C-01"),
    ("Fiction", "1C-02"),
    ("Science", "1D-01"),
];

/// Category to shelf mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ShelfMapFile", into = "ShelfMapFile")]
pub struct ShelfMap {
    default: String,
    categories: BTreeMap<String, String>,
    // normalized category name -> shelf code
    lookup: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShelfMapFile {
    #[serde(default = "default_shelf")]
    default: String,
    #[serde(default)]
    categories: BTreeMap<String, String>,
}

fn default_shelf() -> String {
    DEFAULT_SHELF.to_string()
}

impl From<ShelfMapFile> for ShelfMap {
    fn from(file: ShelfMapFile) -> Self {
        ShelfMap::new(file.default, file.categories)
    }
}

impl From<ShelfMap> for ShelfMapFile {
    fn from(map: ShelfMap) -> Self {
        ShelfMapFile {
            default: map.default,
            categories: map.categories,
        }
    }
}

impl ShelfMap {
    pub fn new(default: String, categories: BTreeMap<String, String>) -> Self {
        let lookup = categories
            .iter()
            .map(|(category, shelf)| (normalized_key(category), shelf.trim().to_string()))
            .collect();

        Self {
            default: default.trim().to_string(),
            categories,
            lookup,
        }
    }

    /// Shelf code for a book whose primary category is `category`
    ///
    /// Matching ignores case and surrounding whitespace. Always returns a
    /// code: unmapped or missing categories go to the default shelf.
    pub fn shelf_for(&self, category: Option<&str>) -> &str {
        category
            .and_then(|c| self.lookup.get(&normalized_key(c)))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    fn validate(&self) -> Result<()> {
        if self.default.is_empty() {
            return Err(SyncError::ConfigurationError(
                "shelves.default must not be empty".to_string(),
            ));
        }
        if let Some((category, _)) = self.categories.iter().find(|(_, code)| code.trim().is_empty()) {
            return Err(SyncError::ConfigurationError(format!(
                "shelf code for category '{}' is empty",
                category
            )));
        }
        Ok(())
    }
}

impl Default for ShelfMap {
    fn default() -> Self {
        let categories = BUILTIN_SHELVES
            .iter()
            .map(|(category, shelf)| (category.to_string(), shelf.to_string()))
            .collect();
        ShelfMap::new(DEFAULT_SHELF.to_string(), categories)
    }
}

/// Complete sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// SQLite database file
    pub database: PathBuf,
    /// Directory holding processed JSON files
    pub input_dir: PathBuf,
    /// Only files whose name starts with this prefix are synced
    pub file_prefix: Option<String>,
    /// Log a progress line every N records
    pub progress_interval: usize,
    /// Category to shelf mapping
    pub shelves: ShelfMap,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("library.db"),
            input_dir: PathBuf::from("data/processed"),
            file_prefix: None,
            progress_interval: 50,
            shelves: ShelfMap::default(),
        }
    }
}

/// Values supplied on the command line (or via environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
}

impl SyncConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(text)
            .map_err(|e| SyncError::ConfigurationError(format!("failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            SyncError::ConfigurationError(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults, then apply overrides
    pub async fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };

        if let Some(database) = overrides.database {
            config.database = database;
        }
        if let Some(input_dir) = overrides.input_dir {
            config.input_dir = input_dir;
        }
        if overrides.file_prefix.is_some() {
            config.file_prefix = overrides.file_prefix;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(SyncError::ConfigurationError(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        self.shelves.validate()
    }
}
