//! Configuration management for simsanity

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `backend.base_url`
pub const BACKEND_URL_ENV: &str = "SIMSANITY_BACKEND_URL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Total timeout for request/response exchanges (streams are exempt)
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin tag sent in the `source` field of every chat message
    pub source: String,
    /// Name shown in bot replies and the thinking placeholder
    pub assistant_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            source: "frontend".to_string(),
            assistant_name: "simsanity".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    ///
    /// `SIMSANITY_BACKEND_URL` takes precedence over the file.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend.base_url = url.trim().to_string();
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "simsanity") {
            let config_dir = proj_dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            Ok(config_dir.join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.client.source, "frontend");
        assert_eq!(config.client.assistant_name, "simsanity");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [backend]
            base_url = "http://192.168.1.20:5000"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "http://192.168.1.20:5000");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.client.assistant_name = "plumbob".to_string();
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Config::from_toml_str(&content).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml_str("backend = 5").is_err());
    }
}
