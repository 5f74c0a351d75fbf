#![forbid(unsafe_code)]

//! Metadata persistence for a playlist/category directory.
//!
//! Each directory carries one JSON array of `{id, title, description}`
//! objects next to the downloaded `{id}.mp3` / `{id}.jpg` files. The store is
//! read once per run, extended in memory, and written back in one go.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{Result, SyncError};

pub const DEFAULT_METADATA_FILE: &str = "playlist_metadata.json";

/// One downloaded media item as persisted in the metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl VideoRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Builds a record from the loose JSON shape found on disk. Returns `None`
    /// when the value is not an object or lacks a usable id/title.
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = non_empty_str(object.get("id"))?;
        let title = non_empty_str(object.get("title"))?;
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(Self::new(id, title, description))
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Ordered, id-deduplicated collection of records bound to a file path.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
    records: Vec<VideoRecord>,
}

impl MetadataStore {
    /// Reads the store at `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            records: Vec::new(),
        };
        if !path.exists() {
            return Ok(store);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SyncError::io(format!("reading {}", path.display()), err))?;
        let payload: Value = serde_json::from_str(&raw).map_err(|err| SyncError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let Value::Array(items) = payload else {
            return Err(SyncError::Parse {
                path: path.to_path_buf(),
                message: "metadata must be a list of objects".to_string(),
            });
        };

        for item in &items {
            match VideoRecord::from_value(item) {
                Some(record) => {
                    if !store.insert(record) {
                        log::debug!("Ignoring duplicate entry in {}", path.display());
                    }
                }
                None => log::debug!("Ignoring malformed entry in {}: {item}", path.display()),
            }
        }
        Ok(store)
    }

    /// Writes every record as pretty-printed JSON, replacing the file
    /// atomically.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let context = || format!("writing {}", self.path.display());

        let mut payload = serde_json::to_string_pretty(&self.records).map_err(|err| {
            SyncError::io(context(), std::io::Error::other(err))
        })?;
        payload.push('\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| SyncError::io(context(), err))?;
        tmp.write_all(payload.as_bytes())
            .map_err(|err| SyncError::io(context(), err))?;
        tmp.persist(&self.path)
            .map_err(|err| SyncError::io(context(), err.error))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Appends a record unless one with the same id already exists. Existing
    /// records are never replaced.
    pub fn insert(&mut self, record: VideoRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.records.push(record);
        true
    }
}
