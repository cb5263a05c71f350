//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Agent URL used when neither flag, environment nor config file set one
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
}

impl Config {
    /// Load configuration from `~/.config/trustctl/config.json`, if present
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// The flag or environment value wins over the file
    pub fn resolve_api_url(&self, explicit: Option<String>) -> String {
        explicit
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("trustctl").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.api_url.is_none());
        assert_eq!(config.resolve_api_url(None), DEFAULT_API_URL);
    }

    #[test]
    fn test_file_url_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_url":"http://agent:9100"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.resolve_api_url(None), "http://agent:9100");
        assert_eq!(
            config.resolve_api_url(Some("http://other:8080".to_string())),
            "http://other:8080"
        );
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
