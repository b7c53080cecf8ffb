//! The song catalog index and its binary format.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! i32 song_count
//! song_count × [u8; 16]          song id
//! i32 attempt_count
//! attempt_count × {
//!     [u8; 16] song id
//!     i64      attempt time, µs since the Unix epoch
//!     i64      attempt length, µs
//!     i64      score
//!     i32      zombies killed
//!     u8       failed (0 or 1)
//! }
//! ```
//!
//! Only ids are stored; each song is resolved from its own record on load.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use beatvault_kv::KVStore;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::DateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{SongError, SongResult};
use crate::keys::LIBRARY_KEY;
use crate::record::{Lookup, load_song};
use crate::types::{Song, SongAttempt};

/// All known songs and the history of attempts at them.
///
/// Every attempt refers to a song present in the library.
#[derive(Debug, Clone, Default)]
pub struct SongLibrary {
    songs: BTreeMap<Uuid, Arc<Song>>,
    attempts: Vec<SongAttempt>,
}

/// The catalog as stored, before song resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogIndex {
    pub song_ids: Vec<Uuid>,
    pub attempts: Vec<SongAttempt>,
}

impl SongLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Songs ordered by id.
    pub fn songs(&self) -> impl Iterator<Item = &Arc<Song>> {
        self.songs.values()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Arc<Song>> {
        self.songs.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Song>> {
        self.songs.values().find(|song| song.name == name)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.songs.contains_key(id)
    }

    /// Attempts in the order they were recorded.
    pub fn attempts(&self) -> &[SongAttempt] {
        &self.attempts
    }

    pub fn attempts_for<'a>(&'a self, id: &'a Uuid) -> impl Iterator<Item = &'a SongAttempt> + 'a {
        self.attempts.iter().filter(move |a| a.song_id == *id)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub(crate) fn insert_song(&mut self, song: Arc<Song>) {
        self.songs.insert(song.id, song);
    }

    /// Removes a song together with its attempts.
    pub(crate) fn remove_song(&mut self, id: &Uuid) -> Option<Arc<Song>> {
        let song = self.songs.remove(id)?;
        self.attempts.retain(|a| a.song_id != *id);
        Some(song)
    }

    /// Appends an attempt. The song must be in the library.
    pub(crate) fn push_attempt(&mut self, attempt: SongAttempt) -> SongResult<()> {
        if !self.songs.contains_key(&attempt.song_id) {
            return Err(SongError::NotFound(format!("song {}", attempt.song_id)));
        }
        self.attempts.push(attempt);
        Ok(())
    }

    /// Encodes the catalog index.
    pub fn encode(&self) -> SongResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(8 + self.songs.len() * 16 + self.attempts.len() * 45);
        write_count(&mut buf, self.songs.len())?;
        for id in self.songs.keys() {
            buf.extend_from_slice(id.as_bytes());
        }
        write_count(&mut buf, self.attempts.len())?;
        for attempt in &self.attempts {
            write_attempt(&mut buf, attempt)?;
        }
        Ok(buf)
    }

    /// Persists the catalog index.
    pub fn save(&self, store: &dyn KVStore) -> SongResult<()> {
        store.set(LIBRARY_KEY, &self.encode()?)?;
        debug!(songs = self.songs.len(), attempts = self.attempts.len(), "songs: catalog saved");
        Ok(())
    }

    /// Loads the catalog, or an empty one if none is stored.
    ///
    /// Songs that cannot be resolved are skipped and their attempts dropped.
    /// A damaged attempts section loses the attempts but keeps the songs.
    /// Only an unreadable catalog key or song-id section is an error.
    pub fn get_or_load(store: &dyn KVStore) -> SongResult<Self> {
        let Some(data) = store.get(LIBRARY_KEY)? else {
            debug!("songs: no catalog stored, starting empty");
            return Ok(Self::new());
        };
        Self::resolve(store, decode_recovering(&data)?)
    }

    /// Resolves every song of `index` through the store.
    ///
    /// Songs whose records are missing, undecodable or unreadable are
    /// skipped with a warning.
    pub fn resolve(store: &dyn KVStore, index: CatalogIndex) -> SongResult<Self> {
        let mut library = Self::new();
        for id in index.song_ids {
            match load_song(store, &id) {
                Ok(Lookup::Found(song)) => library.insert_song(Arc::new(song)),
                Ok(Lookup::Missing) => warn!(song_id = %id, "songs: skipping unresolvable song"),
                Err(e) => warn!(song_id = %id, error = %e, "songs: skipping unreadable song"),
            }
        }
        for attempt in index.attempts {
            if library.contains(&attempt.song_id) {
                library.attempts.push(attempt);
            } else {
                warn!(song_id = %attempt.song_id, "songs: dropping attempt for unloaded song");
            }
        }
        Ok(library)
    }
}

fn write_count(buf: &mut Vec<u8>, n: usize) -> SongResult<()> {
    let n = i32::try_from(n)
        .map_err(|_| SongError::Serialization(format!("{n} entries exceed the catalog limit")))?;
    buf.write_i32::<LittleEndian>(n)?;
    Ok(())
}

fn write_attempt(buf: &mut Vec<u8>, attempt: &SongAttempt) -> SongResult<()> {
    let length = i64::try_from(attempt.attempt_length.as_micros()).map_err(|_| {
        SongError::Serialization(format!("attempt length {:?} out of range", attempt.attempt_length))
    })?;
    buf.extend_from_slice(attempt.song_id.as_bytes());
    buf.write_i64::<LittleEndian>(attempt.attempt_time.timestamp_micros())?;
    buf.write_i64::<LittleEndian>(length)?;
    buf.write_i64::<LittleEndian>(attempt.score)?;
    buf.write_i32::<LittleEndian>(attempt.zombies_killed)?;
    buf.write_u8(u8::from(attempt.failed))?;
    Ok(())
}

/// Decodes a catalog index without resolving songs.
pub fn decode(data: &[u8]) -> SongResult<CatalogIndex> {
    let mut r = Cursor::new(data);
    let song_ids = read_song_ids(&mut r)?;
    let attempts = read_attempts(&mut r)?;
    warn_trailing(&r);
    Ok(CatalogIndex { song_ids, attempts })
}

/// Like [`decode`], but a corrupt attempts section yields no attempts
/// instead of an error.
pub fn decode_recovering(data: &[u8]) -> SongResult<CatalogIndex> {
    let mut r = Cursor::new(data);
    let song_ids = read_song_ids(&mut r)?;
    let attempts = match read_attempts(&mut r) {
        Ok(attempts) => {
            warn_trailing(&r);
            attempts
        }
        Err(SongError::CorruptData(msg)) => {
            warn!(songs = song_ids.len(), error = %msg, "songs: attempt history corrupt, dropping it");
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    Ok(CatalogIndex { song_ids, attempts })
}

fn read_song_ids(r: &mut Cursor<&[u8]>) -> SongResult<Vec<Uuid>> {
    let count = read_count(r, "song")?;
    let mut song_ids = Vec::with_capacity(count.min(r.get_ref().len() / 16));
    for _ in 0..count {
        song_ids.push(read_uuid(r)?);
    }
    Ok(song_ids)
}

fn read_attempts(r: &mut Cursor<&[u8]>) -> SongResult<Vec<SongAttempt>> {
    let count = read_count(r, "attempt")?;
    let mut attempts = Vec::with_capacity(count.min(r.get_ref().len() / 45));
    for _ in 0..count {
        attempts.push(read_attempt(r)?);
    }
    Ok(attempts)
}

fn warn_trailing(r: &Cursor<&[u8]>) {
    let len = r.get_ref().len();
    if (r.position() as usize) < len {
        warn!(
            trailing = len - r.position() as usize,
            "songs: ignoring trailing bytes after catalog"
        );
    }
}

fn corrupt(e: io::Error) -> SongError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SongError::CorruptData("catalog truncated".to_string())
    } else {
        SongError::Io(e.to_string())
    }
}

fn read_count<R: Read>(r: &mut R, what: &str) -> SongResult<usize> {
    let n = r.read_i32::<LittleEndian>().map_err(corrupt)?;
    usize::try_from(n).map_err(|_| SongError::CorruptData(format!("negative {what} count {n}")))
}

fn read_uuid<R: Read>(r: &mut R) -> SongResult<Uuid> {
    let mut bytes = [0u8; 16];
    r.read_exact(&mut bytes).map_err(corrupt)?;
    Ok(Uuid::from_bytes(bytes))
}

fn read_attempt<R: Read>(r: &mut R) -> SongResult<SongAttempt> {
    let song_id = read_uuid(r)?;
    let time = r.read_i64::<LittleEndian>().map_err(corrupt)?;
    let length = r.read_i64::<LittleEndian>().map_err(corrupt)?;
    let score = r.read_i64::<LittleEndian>().map_err(corrupt)?;
    let zombies_killed = r.read_i32::<LittleEndian>().map_err(corrupt)?;
    let failed = match r.read_u8().map_err(corrupt)? {
        0 => false,
        1 => true,
        b => return Err(SongError::CorruptData(format!("invalid failed flag {b}"))),
    };

    let attempt_time = DateTime::from_timestamp_micros(time)
        .ok_or_else(|| SongError::CorruptData(format!("attempt time {time} out of range")))?;
    let length = u64::try_from(length)
        .map_err(|_| SongError::CorruptData(format!("negative attempt length {length}")))?;

    Ok(SongAttempt {
        song_id,
        attempt_time,
        attempt_length: Duration::from_micros(length),
        score,
        failed,
        zombies_killed,
    })
}
