use std::path::Path;
use std::sync::Arc;

use beatvault_audio::BpmRange;
use beatvault_kv::SharedKVStore;
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::builder::SongBuilder;
use crate::error::{SongError, SongResult};
use crate::library::SongLibrary;
use crate::record::{delete_song_data, rollback_song_data};
use crate::types::{BitRate, Song, SongAttempt};

/// The shared song catalog.
///
/// Readers take a snapshot with [`library`](Self::library) and never block
/// writers. Mutations are serialized and publish a new snapshot only after
/// the catalog has been persisted, so a failed mutation leaves both the
/// stored and the in-memory catalog unchanged.
pub struct SongCatalog {
    store: SharedKVStore,
    builder: SongBuilder,
    write_lock: Mutex<()>,
    library: RwLock<Arc<SongLibrary>>,
}

impl SongCatalog {
    /// Loads the stored catalog, or starts an empty one.
    pub fn open(store: SharedKVStore, builder: SongBuilder) -> SongResult<Self> {
        let library = SongLibrary::get_or_load(store.as_ref())?;
        info!(songs = library.len(), attempts = library.attempts().len(), "songs: catalog opened");
        Ok(Self {
            store,
            builder,
            write_lock: Mutex::new(()),
            library: RwLock::new(Arc::new(library)),
        })
    }

    /// Current catalog snapshot.
    pub fn library(&self) -> Arc<SongLibrary> {
        self.library.read().clone()
    }

    pub fn store(&self) -> &SharedKVStore {
        &self.store
    }

    /// Compresses `source` into a new song named `name` and catalogs it.
    ///
    /// If a song called `name` already exists it is returned as is and
    /// `source` is not read.
    pub fn add_song<P: AsRef<Path>>(
        &self,
        name: &str,
        source: P,
        bit_rate: BitRate,
        min_bpm: f32,
        max_bpm: f32,
    ) -> SongResult<Arc<Song>> {
        let bpm = BpmRange::new(min_bpm, max_bpm)?;
        let source = source.as_ref();

        let _guard = self.write_lock.lock();
        let current = self.library();
        if let Some(existing) = current.find_by_name(name) {
            warn!(name, song_id = %existing.id, "songs: song already in catalog");
            return Ok(Arc::clone(existing));
        }

        let id = Uuid::new_v4();
        match self.insert_new(&current, id, name, source, bit_rate, bpm) {
            Ok((song, next)) => {
                *self.library.write() = Arc::new(next);
                info!(name, song_id = %id, "songs: song added");
                Ok(song)
            }
            Err(e) => {
                rollback_song_data(self.store.as_ref(), &id);
                error!(name, source = %source.display(), error = %e, "songs: failed to add song");
                Err(e)
            }
        }
    }

    fn insert_new(
        &self,
        current: &SongLibrary,
        id: Uuid,
        name: &str,
        source: &Path,
        bit_rate: BitRate,
        bpm: BpmRange,
    ) -> SongResult<(Arc<Song>, SongLibrary)> {
        let song = Arc::new(
            self.builder
                .build(self.store.as_ref(), id, name, source, bit_rate, bpm)?,
        );
        let mut next = current.clone();
        next.insert_song(Arc::clone(&song));
        next.save(self.store.as_ref())?;
        Ok((song, next))
    }

    /// Records a play-through. The song must be in the catalog.
    pub fn record_attempt(&self, attempt: SongAttempt) -> SongResult<()> {
        let _guard = self.write_lock.lock();
        let mut next = (*self.library()).clone();
        next.push_attempt(attempt)?;
        next.save(self.store.as_ref())?;
        *self.library.write() = Arc::new(next);
        Ok(())
    }

    /// Removes a song, its attempts and its stored data.
    ///
    /// The catalog is persisted without the song before its data is deleted.
    /// Returns false if the song is not in the catalog.
    pub fn delete_song(&self, id: &Uuid) -> SongResult<bool> {
        let _guard = self.write_lock.lock();
        let mut next = (*self.library()).clone();
        let Some(song) = next.remove_song(id) else {
            return Ok(false);
        };
        next.save(self.store.as_ref())?;
        *self.library.write() = Arc::new(next);

        delete_song_data(self.store.as_ref(), id)?;
        info!(song_id = %id, name = %song.name, "songs: song deleted");
        Ok(true)
    }

    /// Reloads the catalog from the store.
    pub fn reload(&self) -> SongResult<Arc<SongLibrary>> {
        let _guard = self.write_lock.lock();
        let library = Arc::new(SongLibrary::get_or_load(self.store.as_ref())?);
        *self.library.write() = Arc::clone(&library);
        Ok(library)
    }

    /// Looks a song up by id, or by name if `key` is not an id.
    pub fn find(&self, key: &str) -> SongResult<Arc<Song>> {
        let library = self.library();
        let song = match Uuid::parse_str(key) {
            Ok(id) => library.get(&id),
            Err(_) => library.find_by_name(key),
        };
        song.cloned()
            .ok_or_else(|| SongError::NotFound(format!("song {key:?}")))
    }
}

/// Process-level owner of the shared [`SongCatalog`].
///
/// The catalog is opened on the first [`get_or_create`](Self::get_or_create)
/// and released by [`shutdown`](Self::shutdown). Safe for concurrent use.
pub struct CatalogHost {
    store: SharedKVStore,
    builder: SongBuilder,
    catalog: Mutex<Option<Arc<SongCatalog>>>,
}

impl CatalogHost {
    pub fn new(store: SharedKVStore, builder: SongBuilder) -> Self {
        Self {
            store,
            builder,
            catalog: Mutex::new(None),
        }
    }

    /// Returns the catalog, opening it if needed.
    pub fn get_or_create(&self) -> SongResult<Arc<SongCatalog>> {
        let mut slot = self.catalog.lock();
        if let Some(catalog) = slot.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(SongCatalog::open(
            Arc::clone(&self.store),
            self.builder.clone(),
        )?);
        *slot = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    pub fn is_open(&self) -> bool {
        self.catalog.lock().is_some()
    }

    /// Releases the catalog. Handles already given out stay usable.
    pub fn shutdown(&self) {
        if self.catalog.lock().take().is_some() {
            info!("songs: catalog host shut down");
        }
    }
}
