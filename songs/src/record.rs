//! Per-song records in the content store.
//!
//! A song is persisted as three keys: the song record, its sound record and
//! the compressed sound data. The song record refers to its sound by key.

use beatvault_kv::KVStore;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{SongError, SongResult};
use crate::keys::{song_key, sound_data_key, sound_key};
use crate::types::{Beat, Song, Sound};

/// Outcome of resolving a record that may legitimately be absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

#[derive(Serialize, Deserialize)]
struct SongRecord {
    id: Uuid,
    name: String,
    sound_key: String,
    beats: Vec<Beat>,
}

fn encode<T: Serialize>(value: &T) -> SongResult<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| SongError::Serialization(e.to_string()))
}

/// Stores a sound record under `key`.
pub fn save_sound(store: &dyn KVStore, key: &str, sound: &Sound) -> SongResult<()> {
    store.set(key, &encode(sound)?)?;
    Ok(())
}

/// Stores the song record. The sound must already be stored under [`sound_key`].
pub fn save_song(store: &dyn KVStore, song: &Song) -> SongResult<()> {
    let record = SongRecord {
        id: song.id,
        name: song.name.clone(),
        sound_key: sound_key(&song.id),
        beats: song.beats.clone(),
    };
    store.set(&song_key(&song.id), &encode(&record)?)?;
    Ok(())
}

/// Resolves a song and its sound.
///
/// Absent or undecodable records, and sounds whose compressed data is gone,
/// resolve to [`Lookup::Missing`]. Store failures are errors.
pub fn load_song(store: &dyn KVStore, id: &Uuid) -> SongResult<Lookup<Song>> {
    let key = song_key(id);
    let Some(data) = store.get(&key)? else {
        return Ok(Lookup::Missing);
    };
    let record: SongRecord = match rmp_serde::from_slice(&data) {
        Ok(record) => record,
        Err(e) => {
            warn!(key = %key, error = %e, "songs: undecodable song record");
            return Ok(Lookup::Missing);
        }
    };
    if record.id != *id {
        warn!(key = %key, stored = %record.id, "songs: song record id mismatch");
        return Ok(Lookup::Missing);
    }

    let Some(data) = store.get(&record.sound_key)? else {
        warn!(song_id = %id, key = %record.sound_key, "songs: sound record missing");
        return Ok(Lookup::Missing);
    };
    let sound: Sound = match rmp_serde::from_slice(&data) {
        Ok(sound) => sound,
        Err(e) => {
            warn!(key = %record.sound_key, error = %e, "songs: undecodable sound record");
            return Ok(Lookup::Missing);
        }
    };
    if !store.exists(&sound.compressed_data_key)? {
        warn!(song_id = %id, key = %sound.compressed_data_key, "songs: sound data missing");
        return Ok(Lookup::Missing);
    }

    Ok(Lookup::Found(Song {
        id: record.id,
        name: record.name,
        sound,
        beats: record.beats,
    }))
}

/// Deletes all three keys of a song. Absent keys are ignored.
pub fn delete_song_data(store: &dyn KVStore, id: &Uuid) -> SongResult<()> {
    let keys = [song_key(id), sound_key(id), sound_data_key(id)];
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    store.batch_delete(&refs)?;
    Ok(())
}

/// Like [`delete_song_data`], but only logs failures.
pub(crate) fn rollback_song_data(store: &dyn KVStore, id: &Uuid) {
    if let Err(e) = delete_song_data(store, id) {
        warn!(song_id = %id, error = %e, "songs: rollback could not delete song data");
    }
}
