use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::endpoint::Endpoint;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub default_endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            default_endpoint: Some(Endpoint::Chat.as_str().to_string()),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Backend base URL, falling back to [`DEFAULT_BASE_URL`].
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    /// Endpoint used by a plain submit. Unknown names fall back to chat.
    pub fn default_endpoint(&self) -> Endpoint {
        self.default_endpoint
            .as_deref()
            .and_then(Endpoint::from_str)
            .unwrap_or_default()
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("hackterm").join("config.json"))
    }
}
