//! Directory-backed [`Store`]: one file per key.
//!
//! Keys are escaped into file names: ASCII letters, digits, `-` and `_` are
//! kept; every other byte becomes `%XX`. Escaped names never contain `.`,
//! so staging files, `*.lock` files and foreign files are ignored when
//! listing.
//!
//! Writes are staged in a uniquely named temp file and renamed into place.
//! Named locks are `fs2` advisory locks on `{name}.lock`, so they hold
//! across processes sharing the directory.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::traits::{Store, StoreLock};

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(dir.display().to_string(), e))?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(escape_key(key))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".stage-")
            .tempfile_in(&self.dir)
            .map_err(|e| StoreError::io(key, e))?;
        write_staged(&mut tmp, value).map_err(|e| StoreError::io(key, e))?;
        tmp.persist(self.path_for(key))
            .map(|_| ())
            .map_err(|e| StoreError::io(key, e.error))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(self.dir.display().to_string(), e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(self.dir.display().to_string(), e))?;
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(unescape_key) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn lock_exclusive(&self, name: &str) -> Result<Option<StoreLock>, StoreError> {
        let path = self.dir.join(format!("{}.lock", escape_key(name)));
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(name, e))?;
        file.lock_exclusive().map_err(|e| StoreError::io(name, e))?;
        // Closing the file releases the lock.
        Ok(Some(StoreLock::new(file)))
    }
}

fn write_staged(tmp: &mut NamedTempFile, value: &str) -> std::io::Result<()> {
    tmp.write_all(value.as_bytes())?;
    tmp.as_file().sync_all()
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn unescape_key(name: &str) -> Option<String> {
    if name.is_empty() || name.contains('.') {
        return None;
    }
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
