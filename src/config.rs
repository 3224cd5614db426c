use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::naming::DEFAULT_FORMAT;

/// Application configuration loaded from ~/.config/libby2m4b/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Where finished m4b files go and how they are named
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Naming template, e.g. "{author}/{title} - {year?}/{title}"
    pub format: Option<String>,

    /// Default destination directory
    pub dest: Option<PathBuf>,
}

/// Audio codec handling for the mux step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// Re-encode to AAC
    #[default]
    Aac,
    /// Keep the MP3 stream as-is inside the mp4 container
    Copy,
}

/// Settings for the ffmpeg invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// ffmpeg binary name or path
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default)]
    pub codec: AudioCodec,

    /// AAC bitrate, ignored when copying
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_bitrate() -> String {
    "64k".to_string()
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            codec: AudioCodec::default(),
            bitrate: default_bitrate(),
        }
    }
}

/// HTTP settings for part and cover downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-part request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_cover_timeout")]
    pub cover_timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_cover_timeout() -> u64 {
    15
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            cover_timeout_secs: default_cover_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default path (~/.config/libby2m4b/config.toml)
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("libby2m4b").join("config.toml"))
    }

    /// Naming template, with CLI override taking precedence
    pub fn format(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(String::from)
            .or_else(|| self.output.format.clone())
            .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
    }

    /// Destination directory, with CLI override taking precedence.
    ///
    /// Falls back to ~/Music/Audiobooks (or ./Audiobooks without a home).
    pub fn dest(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.output.dest.clone())
            .unwrap_or_else(default_dest)
    }
}

fn default_dest() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
        .map(|p| p.join("Audiobooks"))
        .unwrap_or_else(|| PathBuf::from("Audiobooks"))
}
