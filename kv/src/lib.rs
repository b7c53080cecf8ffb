//! Content store interface and implementations.
//!
//! Records are addressed by string keys. Small values go through
//! [`KVStore::get`] / [`KVStore::set`]; large payloads such as compressed
//! sound data are streamed with [`KVStore::open_writer`] and
//! [`KVStore::open_reader`].
//!
//! Backends:
//!
//! - [`MemoryStore`]: in-process map, used by tests and the `memory` backend
//! - [`FileStore`]: one file per key under a root directory
//! - [`RedbStore`]: single-file embedded database

pub mod file;
pub mod memory;
pub mod redb;

use std::fmt;
use std::io::{self, Cursor, Read, Write};

use thiserror::Error;

/// Errors that can occur in content store operations.
#[derive(Error, Debug)]
pub enum KVError {
    #[error("kv: storage error: {0}")]
    Storage(String),

    #[error("kv: io error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for content store operations.
pub type KVResult<T> = Result<T, KVError>;

/// A streaming sink for a single value.
///
/// Bytes written are not visible under the key until [`ValueWriter::commit`]
/// succeeds. Dropping a writer without committing discards everything written.
pub trait ValueWriter: Write + Send {
    /// Publishes the written bytes under the writer's key.
    fn commit(self: Box<Self>) -> KVResult<()>;
}

/// Key-value content store.
pub trait KVStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Set a key-value pair, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> KVResult<()>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> KVResult<()>;

    /// List keys starting with `prefix`, sorted.
    fn keys(&self, prefix: &str) -> KVResult<Vec<String>>;

    /// Opens a streaming writer for `key`.
    fn open_writer<'a>(&'a self, key: &str) -> KVResult<Box<dyn ValueWriter + 'a>>;

    /// Returns true if a value is stored under `key`.
    fn exists(&self, key: &str) -> KVResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Opens a streaming reader for `key`, or `None` if the key is absent.
    fn open_reader<'a>(&'a self, key: &str) -> KVResult<Option<Box<dyn Read + Send + 'a>>> {
        Ok(self
            .get(key)?
            .map(|value| Box::new(Cursor::new(value)) as Box<dyn Read + Send + 'a>))
    }

    /// Batch set multiple key-value pairs.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Batch delete multiple keys.
    fn batch_delete(&self, keys: &[&str]) -> KVResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}

impl fmt::Debug for dyn KVStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVStore {{ ... }}")
    }
}

/// A value writer that buffers in memory and stores the value on commit.
///
/// Used by backends without native streaming support.
pub struct BufferedWriter<'a, S: KVStore + ?Sized> {
    store: &'a S,
    key: String,
    buf: Vec<u8>,
}

impl<'a, S: KVStore + ?Sized> BufferedWriter<'a, S> {
    pub fn new(store: &'a S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
            buf: Vec::new(),
        }
    }
}

impl<S: KVStore + ?Sized> Write for BufferedWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: KVStore + ?Sized> ValueWriter for BufferedWriter<'_, S> {
    fn commit(self: Box<Self>) -> KVResult<()> {
        self.store.set(&self.key, &self.buf)
    }
}

/// A shared content store handle.
pub type SharedKVStore = std::sync::Arc<dyn KVStore>;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use redb::RedbStore;
