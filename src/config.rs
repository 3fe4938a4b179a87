//! Configuration Management
//!
//! Everything about a client that can live in a file. Credentials and
//! callbacks are passed to [`crate::ClientBuilder`] directly.

use crate::cache::DEFAULT_MAX_CACHE_SIZE;
use crate::transport::api::{DEFAULT_API_URL, DEFAULT_PREVIEWS_URL};
use crate::transport::cli::DEFAULT_CLI_PATH;
use crate::transport::credential::DEFAULT_SHARE_URL;
use crate::transport::TransportId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the HTTP API
    pub api_url: String,
    /// Base address of the previews service
    pub previews_url: String,
    /// Prefix of share links
    pub share_url: String,
    /// Path of the `abstract-cli` executable
    pub cli_path: PathBuf,
    /// Default transport order
    pub transports: Vec<TransportId>,
    /// Maximum number of cached responses
    pub max_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            previews_url: DEFAULT_PREVIEWS_URL.to_string(),
            share_url: DEFAULT_SHARE_URL.to_string(),
            cli_path: PathBuf::from(DEFAULT_CLI_PATH),
            transports: vec![TransportId::Api],
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("abstract-sdk").join("config.json"))
    }

    /// Load configuration from the default location, or defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; a missing or unreadable file gives defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}
