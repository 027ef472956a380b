//! Configuration Management
//!
//! Persistent settings for tf-mock-provider. Command-line flags win over the
//! config file, which wins over environment variables and built-in defaults.

use crate::resource::DEFAULT_PROVIDER;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

pub const BACKEND_URL_ENV: &str = "AWS_MOCK_BACKEND_URL";
pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Base URL of the mock backend
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Provider schema dump to load instead of the bundled one
    #[serde(default)]
    pub descriptor_path: Option<PathBuf>,
    /// Provider identity to select from the schema dump
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tf-mock-provider").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; a missing or unreadable file yields defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective backend URL (config > env > default)
    pub fn effective_backend_url(&self) -> String {
        self.backend_url
            .clone()
            .or_else(|| env_var(BACKEND_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    /// Get effective region (config > env); there is no default region
    pub fn effective_region(&self) -> Option<String> {
        self.region.clone().or_else(|| env_var(REGION_ENV))
    }

    pub fn effective_provider(&self) -> String {
        self.provider
            .clone()
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Set backend and region and save
    pub fn set_backend(&mut self, backend_url: &str, region: &str) -> Result<()> {
        self.backend_url = Some(backend_url.to_string());
        self.region = Some(region.to_string());
        self.save()
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
