//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! where user records come from, where the cache lives, the default page
//! size and how long cached entries stay valid.
//!
//! Configuration is stored at `~/.config/lendsqr-admin/config.json`.
//! Environment variables (`LENDSQR_USERS_URL`, `LENDSQR_USERS_FILE`,
//! `LENDSQR_CACHE_DIR`) take precedence over the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::projector::PageSize;
use crate::source::{FileUserSource, HttpUserSource, UserSource};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "lendsqr-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_USERS_URL: &str = "LENDSQR_USERS_URL";
const ENV_USERS_FILE: &str = "LENDSQR_USERS_FILE";
const ENV_CACHE_DIR: &str = "LENDSQR_CACHE_DIR";

/// Where the bundled mock data may sit relative to the working directory.
const BUNDLED_USERS_PATHS: [&str; 3] = [
    "data/users.json",
    "../data/users.json",
    "../../data/users.json",
];

/// Longest configurable cache lifetime: one year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

fn default_ttl_minutes() -> i64 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub users_url: Option<String>,
    pub users_file: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub page_size: PageSize,
    pub cache_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users_url: None,
            users_file: None,
            cache_dir: None,
            page_size: PageSize::default(),
            cache_ttl_minutes: default_ttl_minutes(),
        }
    }
}

/// Where the initial user collection is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocation::Url(url) => write!(f, "{}", url),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent) with environment overrides applied.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override fields from environment variables, looked up through `var`.
    /// Blank values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_USERS_URL) {
            debug!(url = %url, "Users URL from environment");
            self.users_url = Some(url);
        }
        if let Some(file) = lookup(ENV_USERS_FILE) {
            self.users_file = Some(PathBuf::from(file));
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Lifetime of cache entries. Non-positive values fall back to one hour;
    /// values beyond a year are capped.
    pub fn cache_ttl(&self) -> Duration {
        if self.cache_ttl_minutes > 0 {
            Duration::minutes(self.cache_ttl_minutes.min(MAX_TTL_MINUTES))
        } else {
            Duration::minutes(default_ttl_minutes())
        }
    }

    /// URL beats file; with neither configured, the bundled mock data is used.
    pub fn source_location(&self) -> SourceLocation {
        if let Some(url) = self.users_url.as_ref().filter(|u| !u.trim().is_empty()) {
            return SourceLocation::Url(url.clone());
        }
        if let Some(ref file) = self.users_file {
            return SourceLocation::File(file.clone());
        }
        let bundled = BUNDLED_USERS_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .unwrap_or_else(|| PathBuf::from(BUNDLED_USERS_PATHS[0]));
        SourceLocation::File(bundled)
    }

    pub fn user_source(&self) -> Result<Arc<dyn UserSource>> {
        let source: Arc<dyn UserSource> = match self.source_location() {
            SourceLocation::Url(url) => {
                Arc::new(HttpUserSource::new(url).context("Failed to build HTTP client")?)
            }
            SourceLocation::File(path) => Arc::new(FileUserSource::new(path)),
        };
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size, PageSize::Ten);
        assert_eq!(config.cache_ttl(), Duration::hours(1));
        assert!(matches!(config.source_location(), SourceLocation::File(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            users_url: Some("https://example.test/users.json".to_string()),
            page_size: PageSize::Fifty,
            cache_ttl_minutes: 15,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 100}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_size, PageSize::Hundred);
        assert_eq!(config.cache_ttl_minutes, 60);
    }

    #[test]
    fn test_invalid_page_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 25}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LENDSQR_USERS_FILE", "/tmp/users.json"),
            ("LENDSQR_CACHE_DIR", "/tmp/lendsqr-cache"),
            ("LENDSQR_USERS_URL", "  "),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.users_url, None);
        assert_eq!(
            config.source_location(),
            SourceLocation::File(PathBuf::from("/tmp/users.json"))
        );
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/lendsqr-cache"));
    }

    #[test]
    fn test_url_takes_precedence() {
        let config = Config {
            users_url: Some("http://localhost:5173/users.json".to_string()),
            users_file: Some(PathBuf::from("users.json")),
            ..Default::default()
        };
        assert_eq!(
            config.source_location(),
            SourceLocation::Url("http://localhost:5173/users.json".to_string())
        );
    }

    #[test]
    fn test_non_positive_ttl_falls_back() {
        let config = Config {
            cache_ttl_minutes: 0,
            ..Default::default()
        };
        assert_eq!(config.cache_ttl(), Duration::minutes(60));
    }

    #[test]
    fn test_huge_ttl_is_capped() {
        let config = Config {
            cache_ttl_minutes: i64::MAX,
            ..Default::default()
        };
        assert_eq!(config.cache_ttl(), Duration::minutes(MAX_TTL_MINUTES));
    }
}
