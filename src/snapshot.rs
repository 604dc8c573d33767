//! Snapshot codec
//!
//! A snapshot is one flat JSON object mapping key to value, both strings:
//!
//! ```text
//! {"/app/config/a": "1", "/app/config/b": "2"}
//! ```
//!
//! Nested values, non-string values and non-object documents are rejected.
//! Files are persisted through a temporary sibling and a rename, so a reader
//! never sees a partially written snapshot.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{KvportError, Result};

/// Key -> value mapping captured by one export or replayed by one import
///
/// Keys are unique; inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert a record read from the store, decoding bytes as lossy UTF-8
    pub fn insert_bytes(&mut self, key: &[u8], value: &[u8]) -> Option<String> {
        self.insert(
            String::from_utf8_lossy(key).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// Parse a snapshot document
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_from(bytes, Path::new(""))
    }

    /// Serialize to a JSON object
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.entries).map_err(|e| KvportError::Serialization(e.to_string()))
    }

    /// Read and decode the snapshot file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let not_found = || KvportError::SnapshotNotFound {
            path: path.to_path_buf(),
        };

        // Directories count as missing
        if !path.is_file() {
            return Err(not_found());
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(KvportError::Io(e)),
        };

        Self::decode_from(&bytes, path)
    }

    /// Encode and write the snapshot to `path`, replacing any existing file
    ///
    /// Returns the canonical path of the written file.
    pub fn persist(&self, path: &Path) -> Result<PathBuf> {
        let bytes = self.encode()?;
        let tmp = tmp_path(path);

        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(KvportError::Io(e));
        }

        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(KvportError::Io(e));
        }

        Ok(fs::canonicalize(path)?)
    }

    fn decode_from(bytes: &[u8], path: &Path) -> Result<Self> {
        let entries: BTreeMap<String, String> =
            serde_json::from_slice(bytes).map_err(|e| KvportError::MalformedSnapshot {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self { entries })
    }
}

impl FromIterator<(String, String)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Sibling of `path` used while writing
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
