// Persisted settings: tool locations and last-used destination folders

use crate::engine::{DEFAULT_COOKIE_FILE, JobKind, ToolPaths};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "vidtool";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub destinations: DestinationsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Full path to the ffmpeg executable; ffprobe is expected next to it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Downloader executable; `yt-dlp` on PATH when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloader_path: Option<PathBuf>,

    /// Netscape cookie jar handed to the downloader when it exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_file: Option<PathBuf>,
}

/// Last folder used by each job type, offered as the default next time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<PathBuf>,
}

impl Config {
    /// Directory holding the config file and the default cookie jar
    pub fn config_dir() -> Result<PathBuf> {
        let base = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
        } else {
            dirs::config_dir().context("Could not determine config directory")?
        };
        Ok(base.join(APP_DIR))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the config, falling back to defaults when no file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Serialize the whole document and write it in one go
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Write a default config file unless one is already there
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            Config::default().save()?;
        }
        Ok(())
    }

    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths::new(
            self.tools.ffmpeg_path.clone(),
            self.tools.downloader_path.clone(),
        )
    }

    /// Configured cookie file, or `cookieyt.txt` inside `config_dir`
    pub fn cookie_file_in(&self, config_dir: &Path) -> PathBuf {
        self.tools
            .cookie_file
            .clone()
            .unwrap_or_else(|| config_dir.join(DEFAULT_COOKIE_FILE))
    }

    pub fn destination(&self, kind: JobKind) -> Option<&Path> {
        match kind {
            JobKind::Download => self.destinations.download.as_deref(),
            JobKind::Compression => self.destinations.compression.as_deref(),
            JobKind::Conversion => self.destinations.conversion.as_deref(),
        }
    }

    /// Record the destination used by a job. Returns true when it changed,
    /// so callers only write the file when needed.
    pub fn remember_destination(&mut self, kind: JobKind, dir: &Path) -> bool {
        let slot = match kind {
            JobKind::Download => &mut self.destinations.download,
            JobKind::Compression => &mut self.destinations.compression,
            JobKind::Conversion => &mut self.destinations.conversion,
        };
        if slot.as_deref() == Some(dir) {
            return false;
        }
        *slot = Some(dir.to_path_buf());
        true
    }
}
