// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::validate_base_url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote image collection, e.g. "http://localhost:8080/api/v1/images"
    pub api_base_url: String,

    /// Optional bearer token for the image API
    pub api_key: Option<String>,

    /// Directory batch downloads are written to
    pub download_dir: PathBuf,

    /// Filename used for batch download archives
    pub archive_name: String,

    /// Seconds an informational status stays visible
    pub status_clear_secs: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    ///
    /// `config_path` takes precedence over `GALLERY_CONFIG`. A missing file means defaults.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(
                std::env::var("GALLERY_CONFIG").unwrap_or_else(|_| "gallery.toml".to_string()),
            ),
        };

        let mut config: Config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Invalid config {}", config_path.display()))?
        } else {
            Config::default()
        };

        if let Ok(val) = std::env::var("GALLERY_API_BASE_URL") {
            config.api_base_url = val;
        }
        if let Ok(val) = std::env::var("GALLERY_API_KEY") {
            config.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("GALLERY_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GALLERY_ARCHIVE_NAME") {
            config.archive_name = val;
        }
        if let Ok(val) = std::env::var("GALLERY_STATUS_CLEAR_SECS") {
            config.status_clear_secs = val.parse().context("GALLERY_STATUS_CLEAR_SECS must be a number")?;
        }
        if let Ok(val) = std::env::var("GALLERY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val.parse().context("GALLERY_REQUEST_TIMEOUT_SECS must be a number")?;
        }
        if let Ok(val) = std::env::var("GALLERY_LOG_LEVEL") {
            config.log_level = val;
        }

        // Blank keys in the file or env mean "no token"
        if config.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            config.api_key = None;
        }

        validate_base_url(&config.api_base_url)?;

        Ok(config)
    }

    pub fn status_display(&self) -> Duration {
        Duration::from_secs(self.status_clear_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::from("http://localhost:8080/api/v1/images"),
            api_key: None,
            download_dir: PathBuf::from("."),
            archive_name: String::from("images.zip"),
            status_clear_secs: 3,
            request_timeout_secs: 30,
            log_level: String::from("info"),
        }
    }
}
