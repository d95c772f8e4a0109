//! The sidecar index: one JSON object keyed by stored name.
//!
//! The whole file is rewritten on every save. Nothing here is atomic or
//! locked; a reader that finds an unreadable or malformed file starts over
//! with an empty index.

use crate::models::FileRecord;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to write index {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode index: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Insertion-ordered map of stored name to record, bound to its file.
#[derive(Debug, Clone)]
pub struct Index {
    path: PathBuf,
    entries: Vec<FileRecord>,
}

impl Index {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::empty(path),
            Err(e) => {
                warn!(index = %path.display(), error = %e, "index unreadable, starting empty");
                return Self::empty(path);
            }
        };
        let map: Map<String, Value> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(index = %path.display(), error = %e, "index malformed, starting empty");
                return Self::empty(path);
            }
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            match serde_json::from_value::<FileRecord>(value) {
                Ok(mut record) => {
                    // The key wins over whatever the record claims.
                    record.stored_name = key;
                    entries.push(record);
                }
                Err(e) => warn!(entry = %key, error = %e, "skipping undecodable index entry"),
            }
        }
        debug!(index = %path.display(), entries = entries.len(), "index loaded");
        Self { path, entries }
    }

    pub fn save(&self) -> Result<(), IndexError> {
        let mut map = Map::new();
        for record in &self.entries {
            map.insert(record.stored_name.clone(), serde_json::to_value(record)?);
        }
        let body = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, body).map_err(|source| IndexError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(index = %self.path.display(), entries = self.entries.len(), "index saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.entries.iter().find(|r| r.stored_name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileRecord> {
        self.entries.iter_mut().find(|r| r.stored_name == name)
    }

    /// Replaces an entry with the same stored name in place, else appends.
    pub fn insert(&mut self, record: FileRecord) -> Option<FileRecord> {
        match self.position(&record.stored_name) {
            Some(pos) => Some(std::mem::replace(&mut self.entries[pos], record)),
            None => {
                self.entries.push(record);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FileRecord> {
        self.position(name).map(|pos| self.entries.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|r| r.stored_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            original_name: name.to_string(),
            stored_name: name.to_string(),
            size: 3,
            created: Utc::now(),
            modified: Utc::now(),
            path: format!("/srv/storage/{name}"),
            mimetype: "text/plain".to_string(),
            tags: Default::default(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let index = Index::load(temp.path().join("file_index.json"));
        assert!(index.is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("file_index.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Index::load(&path).is_empty());

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(Index::load(&path).is_empty());
    }

    #[test]
    fn save_keeps_insertion_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("file_index.json");
        let mut index = Index::empty(&path);
        for name in ["zeta.txt", "alpha.txt", "mid.txt"] {
            index.insert(record(name));
        }
        index.save().unwrap();

        let reloaded = Index::load(&path);
        let names: Vec<_> = reloaded.iter().map(|r| r.stored_name.as_str()).collect();
        assert_eq!(names, vec!["zeta.txt", "alpha.txt", "mid.txt"]);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("{\n  \"zeta.txt\""));
    }

    #[test]
    fn insert_replaces_in_place() {
        let temp = tempfile::tempdir().unwrap();
        let mut index = Index::empty(temp.path().join("i.json"));
        index.insert(record("a.txt"));
        index.insert(record("b.txt"));
        let mut updated = record("a.txt");
        updated.size = 99;
        assert!(index.insert(updated).is_some());
        assert_eq!(index.len(), 2);
        assert_eq!(index.iter().next().unwrap().size, 99);
        assert!(index.remove("a.txt").is_some());
        assert!(!index.contains("a.txt"));
    }

    #[test]
    fn undecodable_entries_are_skipped_and_key_wins() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("file_index.json");
        let good = serde_json::to_value(record("other-name.txt")).unwrap();
        let body = serde_json::json!({
            "broken.txt": { "size": "nope" },
            "good.txt": good,
        });
        fs::write(&path, body.to_string()).unwrap();

        let index = Index::load(&path);
        assert_eq!(index.len(), 1);
        assert!(index.get("good.txt").is_some());
    }
}
