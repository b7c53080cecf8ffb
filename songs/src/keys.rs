//! Content store key layout.
//!
//! ```text
//! songs:{id}              → msgpack song record
//! songs:{id}:sound        → msgpack Sound
//! songs:{id}:sound-data   → packet bitstream
//! songs:library           → binary catalog
//! ```

use uuid::Uuid;

/// Key of the catalog index.
pub const LIBRARY_KEY: &str = "songs:library";

/// Key of a song record. Format: "songs:{id}"
pub fn song_key(id: &Uuid) -> String {
    format!("songs:{id}")
}

/// Key of a song's sound record. Format: "songs:{id}:sound"
pub fn sound_key(id: &Uuid) -> String {
    format!("songs:{id}:sound")
}

/// Key of a song's compressed sample data. Format: "songs:{id}:sound-data"
pub fn sound_data_key(id: &Uuid) -> String {
    format!("songs:{id}:sound-data")
}
