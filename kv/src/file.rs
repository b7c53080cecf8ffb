//! Directory-backed content store.
//!
//! Each key maps to one file directly under the root directory. Key bytes
//! outside `[A-Za-z0-9_-]` are percent-escaped so that keys like
//! `songs:{id}:sound-data` form portable file names. Writes land in a
//! temporary file which is persisted over the key's file on commit, so
//! readers never observe a half-written value.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::{KVError, KVResult, KVStore, ValueWriter};

/// Temp file prefix. Escaped key names never contain '.'.
const TMP_PREFIX: &str = ".kv-";

/// A content store keeping one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> KVResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(escape_key(key))
    }
}

impl KVStore for FileStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        let mut writer = self.open_writer(key)?;
        writer.write_all(value)?;
        writer.commit()
    }

    fn delete(&self, key: &str) -> KVResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self, prefix: &str) -> KVResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(TMP_PREFIX) {
                continue;
            }
            match unescape_key(name) {
                Some(key) if key.starts_with(prefix) => keys.push(key),
                Some(_) => {}
                None => warn!(file = name, "kv: skipping file with malformed key name"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> KVResult<bool> {
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn open_writer<'a>(&'a self, key: &str) -> KVResult<Box<dyn ValueWriter + 'a>> {
        let tmp = tempfile::Builder::new()
            .prefix(TMP_PREFIX)
            .tempfile_in(&self.root)?;
        Ok(Box::new(FileWriter {
            file: BufWriter::new(tmp),
            dest: self.path_for(key),
        }))
    }

    fn open_reader<'a>(&'a self, key: &str) -> KVResult<Option<Box<dyn Read + Send + 'a>>> {
        match File::open(self.path_for(key)) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Streams into a temp file. Dropping it uncommitted deletes the temp file.
struct FileWriter {
    file: BufWriter<NamedTempFile>,
    dest: PathBuf,
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl ValueWriter for FileWriter {
    fn commit(self: Box<Self>) -> KVResult<()> {
        let FileWriter { file, dest } = *self;
        let tmp = file.into_inner().map_err(|e| KVError::Io(e.into_error()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| KVError::Io(e.error))?;
        Ok(())
    }
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn unescape_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
