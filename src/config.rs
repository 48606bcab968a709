//! Application configuration
//!
//! Resolution order:
//! 1. File named by the `MUSICFOX_CONFIG` environment variable
//! 2. `.config/musicfox-rs.toml` in the working directory
//! 3. Built-in defaults
//!
//! Missing keys in a file fall back to their defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_ENV_VAR: &str = "MUSICFOX_CONFIG";
const DEFAULT_CONFIG_PATH: &str = ".config/musicfox-rs.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the NeteaseCloudMusicApi-compatible server
    pub api_base_url: String,
    /// Requested stream bitrate in bit/s
    pub bitrate: u32,
    pub show_lyric: bool,
    /// Snapshot and play-mode records
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Raw `Cookie` header value saved by a previous login
    pub cookie_file: PathBuf,
    /// Playlist shown at startup
    pub playlist_id: Option<i64>,
    /// Tracks fetched per playlist page
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".to_string(),
            bitrate: 320_000,
            show_lyric: true,
            data_dir: PathBuf::from(".cache"),
            log_dir: PathBuf::from(".logs"),
            cookie_file: PathBuf::from(".cache/cookie"),
            playlist_id: None,
            page_size: 50,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        if config.page_size == 0 {
            anyhow::bail!("page_size must be greater than zero");
        }
        Ok(config)
    }
}
