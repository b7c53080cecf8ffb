//! Utility functions for CLI commands.

use std::sync::Arc;

use beatvault_audio::EnergyAnalyzerFactory;
use beatvault_cli::{Config, Output, OutputFormat, StoreBackend, load_config};
use beatvault_kv::{FileStore, MemoryStore, RedbStore, SharedKVStore};
use beatvault_songs::{BitRate, CatalogHost, SongBuilder, SongCatalog};

use crate::Cli;

const APP_NAME: &str = "beatvault";

/// Whether this build can compress songs.
pub const HAS_ENCODER: bool = cfg!(feature = "opus");

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref().map(std::path::Path::new))
}

/// Opens the content store the configuration points at.
pub fn open_store(cfg: &Config) -> anyhow::Result<SharedKVStore> {
    let path = cfg.store_path();
    let store: SharedKVStore = match cfg.store.backend {
        StoreBackend::File => Arc::new(FileStore::open(&path)?),
        StoreBackend::Redb => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Arc::new(RedbStore::open(&path)?)
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(backend = ?cfg.store.backend, path = %path.display(), "store opened");
    Ok(store)
}

#[cfg(feature = "opus")]
fn song_builder(cfg: &Config) -> SongBuilder {
    use beatvault_audio::codec::opus::OpusEncoderFactory;

    SongBuilder::new(OpusEncoderFactory, EnergyAnalyzerFactory)
        .samples_per_frame(cfg.samples_per_frame)
}

#[cfg(not(feature = "opus"))]
fn song_builder(cfg: &Config) -> SongBuilder {
    use beatvault_audio::{AudioError, AudioResult, FrameEncoder};

    fn no_encoder(_: u32, _: usize, _: u16) -> AudioResult<Box<dyn FrameEncoder>> {
        Err(AudioError::Codec(
            "no frame encoder in this build, rebuild with --features opus".to_string(),
        ))
    }

    SongBuilder::new(no_encoder, EnergyAnalyzerFactory).samples_per_frame(cfg.samples_per_frame)
}

/// Opens the song catalog described by the configuration.
pub fn open_catalog(cli: &Cli) -> anyhow::Result<(Config, Arc<SongCatalog>)> {
    let cfg = get_config(cli)?;
    let store = open_store(&cfg)?;
    let host = CatalogHost::new(store, song_builder(&cfg));
    let catalog = host.get_or_create()?;
    Ok((cfg, catalog))
}

/// Parses a bitrate preset, falling back to the configured default.
pub fn resolve_bit_rate(cfg: &Config, flag: Option<&str>) -> anyhow::Result<BitRate> {
    let raw = flag.unwrap_or(&cfg.bit_rate);
    Ok(raw.parse::<BitRate>()?)
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(cli: &Cli, result: &T) -> anyhow::Result<()> {
    Output::new(OutputFormat::from_json_flag(cli.json)).write(result)
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
