use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable checked before the config file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    /// Forward upstream SSE chunks directly when true (default); fall back
    /// to the word-paced typing effect when false.
    pub stream_upstream: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            gemini_api_key: None,
            stream_upstream: None,
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::read_from(&config_path)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.write_to(&config_path)
    }

    /// Credential for the assistant feature. The environment wins over the
    /// config file; `None` disables only the assistant, not the catalog.
    pub fn api_key(&self) -> Option<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Precedence seam: an env value wins, a blank env value is ignored.
    fn resolve_api_key(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|key| !key.is_empty())
            .or_else(|| self.gemini_api_key.clone())
    }

    pub fn stream_upstream(&self) -> bool {
        self.stream_upstream.unwrap_or(true)
    }

    fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("vistura").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_from(&dir.path().join("config.json")).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert!(config.stream_upstream());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            gemini_api_key: Some("file-key".to_string()),
            stream_upstream: Some(false),
        };
        config.write_to(&path).unwrap();

        let loaded = Config::read_from(&path).unwrap();
        assert_eq!(loaded.gemini_api_key.as_deref(), Some("file-key"));
        assert!(!loaded.stream_upstream());
    }

    // Exercises the precedence seam directly; mutating the process-global
    // environment would race the other tests in this binary.
    #[test]
    fn test_env_key_wins_over_file_key() {
        let config = Config {
            gemini_api_key: Some("file-key".to_string()),
            stream_upstream: None,
        };

        assert_eq!(
            config.resolve_api_key(Some("env-key".to_string())).as_deref(),
            Some("env-key")
        );
        assert_eq!(config.resolve_api_key(None).as_deref(), Some("file-key"));
    }

    #[test]
    fn test_blank_env_key_falls_back_to_file() {
        let config = Config {
            gemini_api_key: Some("file-key".to_string()),
            stream_upstream: None,
        };
        assert_eq!(
            config.resolve_api_key(Some(String::new())).as_deref(),
            Some("file-key")
        );

        let empty = Config::new();
        assert_eq!(empty.resolve_api_key(Some(String::new())), None);
    }
}
