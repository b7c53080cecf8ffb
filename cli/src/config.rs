//! Configuration management for the command line.
//!
//! Configuration is stored in ~/.beatvault/{app_name}/config.yaml

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::Paths;

/// Which content store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One file per key under a directory.
    #[default]
    File,
    /// Single-file embedded database.
    Redb,
    /// In-process only; nothing survives the command.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "redb" => Ok(StoreBackend::Redb),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown store backend '{}', expected file, redb or memory", other),
        }
    }
}

/// Content store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Store location; defaults to the app data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    #[serde(default)]
    pub store: StoreConfig,

    /// Samples per channel in each encoded frame.
    #[serde(default = "default_samples_per_frame")]
    pub samples_per_frame: usize,

    /// Default target bitrate preset (kbps320, kbps256 or kbps128).
    #[serde(default = "default_bit_rate")]
    pub bit_rate: String,

    #[serde(default = "default_min_bpm")]
    pub min_bpm: f32,

    #[serde(default = "default_max_bpm")]
    pub max_bpm: f32,

    /// Log filter used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

fn default_samples_per_frame() -> usize {
    960
}

fn default_bit_rate() -> String {
    "kbps128".to_string()
}

fn default_min_bpm() -> f32 {
    90.0
}

fn default_max_bpm() -> f32 {
    180.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            store: StoreConfig::default(),
            samples_per_frame: default_samples_per_frame(),
            bit_rate: default_bit_rate(),
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            log_level: default_log_level(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Paths::new(app_name).ok().map(|p| p.config_file())
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the config directory path.
    pub fn dir(&self) -> Option<&Path> {
        self.config_path.parent()
    }

    /// Resolves the store location.
    ///
    /// Without an explicit path the store lives next to the config file:
    /// `data/store` for the file backend, `data/store.redb` for redb.
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.store.path {
            return path.clone();
        }
        let data = self
            .dir()
            .map(|d| d.join("data"))
            .unwrap_or_else(|| PathBuf::from("data"));
        match self.store.backend {
            StoreBackend::Redb => data.join("store.redb"),
            StoreBackend::File | StoreBackend::Memory => data.join("store"),
        }
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Switches the store backend and location.
    pub fn set_store(&mut self, backend: StoreBackend, path: Option<PathBuf>) -> anyhow::Result<()> {
        self.store = StoreConfig { backend, path };
        self.save()
    }
}

/// Loads configuration for the specified app, creating a default file if none exists.
pub fn load_config(app_name: &str, custom_path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)?
    } else {
        let cfg = Config::default();
        let content = serde_yaml::to_string(&cfg)?;
        std::fs::write(&config_path, content)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}
