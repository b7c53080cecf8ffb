//! Song ingestion and the song catalog.
//!
//! A waveform file is decoded, analyzed for beats and compressed in a single
//! pass by [`SongBuilder`]. The result is stored as three content store
//! records (song, sound, compressed data) and indexed by the [`SongCatalog`],
//! which also keeps the history of play attempts.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use beatvault_audio::EnergyAnalyzerFactory;
//! use beatvault_audio::{AudioResult, FrameEncoder};
//! use beatvault_kv::MemoryStore;
//! use beatvault_songs::{BitRate, CatalogHost, SongBuilder};
//!
//! # fn encoder(_: u32, _: usize, _: u16) -> AudioResult<Box<dyn FrameEncoder>> { unimplemented!() }
//! let builder = SongBuilder::new(encoder, EnergyAnalyzerFactory);
//! let host = CatalogHost::new(Arc::new(MemoryStore::new()), builder);
//!
//! let catalog = host.get_or_create()?;
//! let song = catalog.add_song("Night Drive", "night-drive.wav", BitRate::Kbps128, 90.0, 180.0)?;
//! println!("{} lasts {:?}", song.name, song.length());
//! # Ok::<(), beatvault_songs::SongError>(())
//! ```

pub mod builder;
pub mod catalog;
pub mod error;
pub mod keys;
pub mod library;
pub mod record;
pub mod types;

pub use builder::{DEFAULT_SAMPLES_PER_FRAME, SongBuilder, StreamStats, compress};
pub use catalog::{CatalogHost, SongCatalog};
pub use error::{SongError, SongResult};
pub use library::{CatalogIndex, SongLibrary};
pub use record::Lookup;
pub use types::{BEAT_THRESHOLD, Beat, BeatType, BitRate, Song, SongAttempt, Sound};
