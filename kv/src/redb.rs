//! Redb-based persistent content store.

use std::fmt::Display;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{BufferedWriter, KVError, KVResult, KVStore, ValueWriter};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("content");

fn storage<E: Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

/// A persistent content store backed by a single redb file.
///
/// Streamed values are buffered in memory and written in one transaction on
/// commit.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> KVResult<Self> {
        let db = Database::create(path).map_err(storage)?;

        let tx = db.begin_write().map_err(storage)?;
        {
            let _ = tx.open_table(TABLE).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;

        Ok(Self { db })
    }

    fn write<F>(&self, f: F) -> KVResult<()>
    where
        F: FnOnce(&mut redb::Table<'_, &'static str, &'static [u8]>) -> Result<(), redb::StorageError>,
    {
        let tx = self.db.begin_write().map_err(storage)?;
        {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            f(&mut table).map_err(storage)?;
        }
        tx.commit().map_err(storage)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.write(|table| table.insert(key, value).map(|_| ()))
    }

    fn delete(&self, key: &str) -> KVResult<()> {
        self.write(|table| table.remove(key).map(|_| ()))
    }

    fn keys(&self, prefix: &str) -> KVResult<Vec<String>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;

        let mut keys = Vec::new();
        for item in table.iter().map_err(storage)? {
            let (key, _) = item.map_err(storage)?;
            let key = key.value();
            if key.starts_with(prefix) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn open_writer<'a>(&'a self, key: &str) -> KVResult<Box<dyn ValueWriter + 'a>> {
        Ok(Box::new(BufferedWriter::new(self, key)))
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        self.write(|table| {
            for (key, value) in entries {
                table.insert(*key, *value)?;
            }
            Ok(())
        })
    }

    fn batch_delete(&self, keys: &[&str]) -> KVResult<()> {
        self.write(|table| {
            for key in keys {
                table.remove(*key)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_redb_basic() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.set("key1", b"value1").unwrap();
        assert_eq!(store.get("key1").unwrap(), Some(b"value1".to_vec()));

        store.delete("key1").unwrap();
        assert_eq!(store.get("key1").unwrap(), None);
    }

    #[test]
    fn test_redb_keys() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.set("songs:a", b"1").unwrap();
        store.set("songs:b", b"2").unwrap();
        store.set("other:c", b"3").unwrap();

        assert_eq!(store.keys("songs:").unwrap(), vec!["songs:a", "songs:b"]);
    }

    #[test]
    fn test_redb_writer_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            let mut writer = store.open_writer("blob").unwrap();
            writer.write_all(&[7u8; 1000]).unwrap();
            writer.commit().unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("blob").unwrap().map(|v| v.len()), Some(1000));
    }
}
