//! Durable record store.
//!
//! Generic key→structured-value storage, one JSON file per record. Records
//! are read and replaced whole by a single thread; writes go through a
//! sibling temp file and rename so a crash never leaves a half-written
//! record behind.
//!
//! Store failures are the only fatal failure class in the engine: a cycle
//! that cannot read its ledger cannot safely decide anything.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use up_common::{Error, Result};

/// One directory of JSON records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

fn store_err(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Store {
        path: path.display().to_string(),
        detail: err.to_string(),
    }
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RecordStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read a record. A missing file is `None`, not an error; a present but
    /// unreadable or unparseable file is fatal.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(store_err(&path, err)),
        };
        let value = serde_json::from_str(&raw).map_err(|err| Error::RecordCorrupted {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;
        Ok(Some(value))
    }

    /// Write a record, replacing any existing one atomically.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|err| store_err(&self.root, err))?;
        let path = self.path(name);
        let tmp = self.root.join(format!("{name}.tmp"));
        let raw = serde_json::to_vec_pretty(value).map_err(|err| store_err(&path, err))?;
        fs::write(&tmp, raw).map_err(|err| store_err(&tmp, err))?;
        fs::rename(&tmp, &path).map_err(|err| store_err(&path, err))?;
        Ok(())
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(store_err(&path, err)),
        }
    }

    /// File names under the root matching a prefix/suffix pair.
    pub fn list_matching(&self, prefix: &str, suffix: &str) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(store_err(&self.root, err)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| store_err(&self.root, err))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(prefix) && name.ends_with(suffix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
