//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, the origin serving the web app's assets, where the
//! session is persisted, and the last used username.
//!
//! Configuration is stored at `~/.config/findwarranty/config.json`.
//! `FINDWARRANTY_API_URL`, `FINDWARRANTY_APP_URL` and
//! `FINDWARRANTY_SESSION_BACKEND` override the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};

/// Application name used for config/data/cache directory paths
pub const APP_NAME: &str = "findwarranty";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default origin of the web app, used for the offline asset cache
pub const DEFAULT_APP_URL: &str = "http://localhost:5173";

pub const ENV_API_URL: &str = "FINDWARRANTY_API_URL";
pub const ENV_APP_URL: &str = "FINDWARRANTY_APP_URL";
pub const ENV_SESSION_BACKEND: &str = "FINDWARRANTY_SESSION_BACKEND";

/// Where the signed-in user is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(SessionBackend::File),
            "keyring" => Ok(SessionBackend::Keyring),
            "memory" => Ok(SessionBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown session backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub app_url: String,
    pub session_backend: SessionBackend,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            session_backend: SessionBackend::default(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load only the config file, without environment overrides.
    pub fn load_file() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup. Invalid values are logged and
    /// ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(url) = lookup(ENV_APP_URL).filter(|v| !v.trim().is_empty()) {
            self.app_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_SESSION_BACKEND) {
            match raw.parse() {
                Ok(backend) => self.session_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_SESSION_BACKEND),
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Record the last used username in the config file. Only the file's
    /// own values are written back; environment and command line
    /// overrides stay out of it.
    pub fn remember_username(username: &str) -> Result<()> {
        Self::remember_username_at(&Self::config_path()?, username)
    }

    fn remember_username_at(path: &Path, username: &str) -> Result<()> {
        let mut config = Self::load_from(path)?;
        config.last_username = Some(username.to_string());
        config.save_to(path)
    }

    /// HTTP timeout; zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => Duration::from_secs(REQUEST_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session for the `file` backend
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Root directory for the offline asset cache
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
