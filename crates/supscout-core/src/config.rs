use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use supscout_api::OPEN_FOOD_FACTS_BASE;

use crate::collection::MAX_RECENT_SEARCHES;
use crate::lifecycle::StalePolicy;
use crate::search::DEFAULT_SEARCH_PAGE_SIZE;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "SUPSCOUT_API_URL";

/// Main configuration structure
///
/// Loaded from `config.toml` in the platform config dir, then patched with
/// environment overrides. Missing file or missing keys fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Load config from the default location, then apply env overrides
    pub fn load() -> crate::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            // No config file? Use defaults
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `lookup` is `std::env::var` in practice; injectable for tests
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Get the config file path (XDG on Linux, AppData on Windows)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("supscout").join("config.toml"))
    }

    /// Where the favorites/recent-searches database lives
    pub fn storage_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.storage.db_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("supscout").join("storage.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Open Food Facts instance (or a mirror)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Results per search page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Open Food Facts asks clients to identify themselves
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    OPEN_FOOD_FACTS_BASE.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_SEARCH_PAGE_SIZE
}

fn default_user_agent() -> String {
    format!("SupScout/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Override for the SQLite database path
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_recent_limit")]
    pub recent_searches_limit: usize,

    /// Drop responses that answer an outdated query
    #[serde(default = "default_discard_stale")]
    pub discard_stale_responses: bool,
}

fn default_recent_limit() -> usize {
    MAX_RECENT_SEARCHES
}

fn default_discard_stale() -> bool {
    true
}

impl SearchConfig {
    pub fn stale_policy(&self) -> StalePolicy {
        StalePolicy::from_discard_flag(self.discard_stale_responses)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recent_searches_limit: default_recent_limit(),
            discard_stale_responses: default_discard_stale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://world.openfoodfacts.org");
        assert_eq!(config.api.page_size, 20);
        assert!(config.api.user_agent.starts_with("SupScout/"));
        assert_eq!(config.search.recent_searches_limit, 10);
        assert_eq!(config.search.stale_policy(), StalePolicy::DiscardStale);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            page_size = 50

            [search]
            discard_stale_responses = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.page_size, 50);
        assert_eq!(config.api.base_url, OPEN_FOOD_FACTS_BASE);
        assert_eq!(config.search.recent_searches_limit, 10);
        assert_eq!(config.search.stale_policy(), StalePolicy::LastWriteWins);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("page_size"));
        assert!(toml.contains("discard_stale_responses"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.page_size = 12;
        config.storage.db_path = Some(PathBuf::from("/tmp/supscout.db"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api.page_size, 12);
        assert_eq!(loaded.storage_path().unwrap(), PathBuf::from("/tmp/supscout.db"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from(Path::new("/definitely/not/here/config.toml")).unwrap();
        assert_eq!(config.api.page_size, 20);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| {
            (name == API_URL_ENV).then(|| "http://localhost:8080".to_string())
        });
        assert_eq!(config.api.base_url, "http://localhost:8080");

        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }
}
