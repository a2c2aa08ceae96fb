//! Application configuration.
//!
//! Settings come from `<config_dir>/gametracker/config.toml`, overridden by
//! `GAMETRACKER__SECTION__KEY` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    library::StatsSource,
    query::{QueryParams, SearchMode, SortKey},
};

/// Directory name below the platform config directory.
pub const CONFIG_DIR: &str = "gametracker";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "GAMETRACKER";

const DEFAULT_CONFIG: &str = r#"# GameTracker configuration

[api]
# Base URL of the catalog REST API.
base_url = "http://localhost:5000/api"
# Request timeout in seconds.
timeout_secs = 10

[library]
# recent | oldest | title | rating | hours
default_sort = "recent"
# override: a search term ignores the status filter
# combined: search term and status filter must both match
search_mode = "override"
# local: aggregate fetched records | remote: ask the server
stats_source = "local"
"#;

/// Connection settings for the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Library view defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Initial ordering of the game list.
    #[serde(default)]
    pub default_sort: SortKey,
    /// How search interacts with the status filter.
    #[serde(default)]
    pub search_mode: SearchMode,
    /// Where dashboard statistics come from.
    #[serde(default)]
    pub stats_source: StatsSource,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// API connection.
    #[serde(default)]
    pub api: ApiConfig,
    /// Library defaults.
    #[serde(default)]
    pub library: LibraryConfig,
}

impl AppConfig {
    /// Load configuration from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load configuration from `path` plus environment overrides. A missing
    /// file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Query parameters the library view starts with.
    pub fn initial_query(&self) -> QueryParams {
        QueryParams {
            sort: self.library.default_sort,
            search_mode: self.library.search_mode,
            ..QueryParams::default()
        }
    }
}

/// Path of the configuration file under the user's config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
