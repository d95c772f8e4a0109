//! Tagged file store: copies files under a root directory and keeps their
//! metadata in a JSON sidecar index.
//!
//! Copy and index write are two separate steps. A crash in between leaves an
//! orphaned payload, which [`FileStorage::audit`] reports but never repairs.

use crate::config::{AppConfig, LimitsConfig, DEFAULT_INDEX_FILE};
use crate::error::{Result, StorageError};
use crate::search::SearchQuery;
use crate::{mime, validate};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use storage::{FileRecord, Index};
use tracing::{debug, info, warn};

/// Upper bound on `_N` suffixes tried for one name.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Checks that depend on configuration. Name sanitization and traversal
/// rejection are not part of the policy and always apply.
#[derive(Debug, Clone, Default)]
pub struct StorePolicy {
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
}

impl From<&LimitsConfig> for StorePolicy {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_file_size: limits.max_file_size,
            allowed_extensions: limits.allowed_extensions.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// Indexed, but the payload is gone.
    pub missing: Vec<String>,
    /// Present in the root, but not indexed.
    pub orphaned: Vec<String>,
    /// Payload size differs from the recorded size.
    pub size_mismatch: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.orphaned.is_empty() && self.size_mismatch.is_empty()
    }
}

pub struct FileStorage {
    root: PathBuf,
    index_name: String,
    index: Index,
    policy: StorePolicy,
}

impl FileStorage {
    /// Creates `root` if needed and loads its index. No restrictions beyond
    /// name sanitization; see [`FileStorage::with_policy`].
    pub fn open(root: impl AsRef<Path>, index_file: &str) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        let index = Index::load(root.join(index_file));
        info!(root = %root.display(), files = index.len(), "file storage opened");
        Ok(Self {
            root,
            index_name: index_file.to_string(),
            index,
            policy: StorePolicy::default(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let index_file = if cfg.storage.index_file.is_empty() {
            DEFAULT_INDEX_FILE
        } else {
            cfg.storage.index_file.as_str()
        };
        Ok(Self::open(cfg.storage.root_path(), index_file)?.with_policy((&cfg.limits).into()))
    }

    pub fn with_policy(mut self, policy: StorePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> &Path {
        self.index.path()
    }

    /// Copies `source` into the store and indexes it under a free name.
    pub fn store(
        &mut self,
        source: impl AsRef<Path>,
        filename: Option<&str>,
        tags: &[String],
    ) -> Result<PathBuf> {
        let source = source.as_ref();
        let meta = match fs::metadata(source) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::SourceNotFound(source.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(StorageError::NotAFile(source.to_path_buf()));
        }

        let original_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::NotAFile(source.to_path_buf()))?;
        let desired = validate::sanitize_filename(filename.unwrap_or(&original_name))?;
        validate::check_extension(&desired, &self.policy.allowed_extensions)?;
        validate::check_size(&desired, meta.len(), self.policy.max_file_size)?;

        let stored_name = self.free_name(&desired)?;
        let dest = self.root.join(&stored_name);
        fs::copy(source, &dest).map_err(|e| StorageError::Copy {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;
        let atime = FileTime::from_last_access_time(&meta);
        let mtime = FileTime::from_last_modification_time(&meta);
        if let Err(e) = filetime::set_file_times(&dest, atime, mtime) {
            warn!(file = %dest.display(), error = %e, "could not carry timestamps over");
        }

        let stored = fs::metadata(&dest)?;
        let modified: DateTime<Utc> = stored.modified()?.into();
        let created = stored.created().map(DateTime::<Utc>::from).unwrap_or(modified);
        let record = FileRecord {
            original_name,
            stored_name: stored_name.clone(),
            size: stored.len(),
            created,
            modified,
            path: dest.to_string_lossy().into_owned(),
            mimetype: mime::guess(&dest),
            tags: tags.iter().cloned().collect(),
        };
        self.index.insert(record);
        if let Err(e) = self.index.save() {
            self.index.remove(&stored_name);
            if let Err(rm) = fs::remove_file(&dest) {
                warn!(file = %dest.display(), error = %rm, "could not remove unindexed copy");
            }
            return Err(e.into());
        }

        info!(name = %stored_name, size = stored.len(), "stored file");
        Ok(dest)
    }

    pub fn search_files(&self, query: &SearchQuery) -> Vec<FileRecord> {
        self.index.iter().filter(|r| query.matches(r)).cloned().collect()
    }

    /// Indexed path, re-checked against the root. `None` when unknown or
    /// escaping the root.
    pub fn get_file_path(&self, filename: &str) -> Option<PathBuf> {
        match self.resolve(filename) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(name = filename, error = %e, "path lookup failed");
                None
            }
        }
    }

    pub fn get_record(&self, filename: &str) -> Option<&FileRecord> {
        self.index.get(filename)
    }

    /// Reads the whole payload into memory.
    pub fn load_file_content(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.resolve(filename)?;
        Ok(fs::read(path)?)
    }

    pub fn list_all_files(&self) -> Vec<FileRecord> {
        self.index.iter().cloned().collect()
    }

    /// Unlinks the payload and drops the entry. Nothing is rolled back if the
    /// second step fails.
    pub fn delete(&mut self, filename: &str) -> bool {
        let path = match self.resolve(filename) {
            Ok(path) => path,
            Err(e) => {
                warn!(name = filename, error = %e, "delete refused");
                return false;
            }
        };
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(name = filename, "payload already gone");
            }
            Err(e) => {
                warn!(name = filename, error = %e, "failed to remove payload");
                return false;
            }
        }
        self.index.remove(filename);
        if let Err(e) = self.index.save() {
            warn!(name = filename, error = %e, "payload removed but index not saved");
            return false;
        }
        info!(name = filename, "deleted file");
        true
    }

    /// Unions `tags` into the record. Exact, case-sensitive strings.
    pub fn add_tags(&mut self, filename: &str, tags: &[String]) -> bool {
        let Some(record) = self.index.get_mut(filename) else {
            return false;
        };
        let previous = record.tags.clone();
        let added = record.extend_tags(tags.iter().cloned());
        if let Err(e) = self.index.save() {
            warn!(name = filename, error = %e, "failed to persist tags");
            if let Some(record) = self.index.get_mut(filename) {
                record.tags = previous;
            }
            return false;
        }
        debug!(name = filename, added, "tags updated");
        true
    }

    pub fn get_all_tags(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self.index.iter().flat_map(|r| r.tags.iter()).collect();
        all.into_iter().cloned().collect()
    }

    /// Compares the index with the root directory without touching either.
    pub fn audit(&self) -> Result<AuditReport> {
        let mut report = AuditReport::default();
        for record in self.index.iter() {
            match fs::metadata(&record.path) {
                Ok(meta) if meta.len() != record.size => {
                    report.size_mismatch.push(record.stored_name.clone())
                }
                Ok(_) => {}
                Err(_) => report.missing.push(record.stored_name.clone()),
            }
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != self.index_name && !self.index.contains(&name) {
                report.orphaned.push(name);
            }
        }
        report.orphaned.sort();
        Ok(report)
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let record = self
            .index
            .get(filename)
            .ok_or_else(|| StorageError::NotIndexed(filename.to_string()))?;
        validate::ensure_within_root(&self.root, Path::new(&record.path))
    }

    fn is_taken(&self, name: &str) -> bool {
        name == self.index_name || self.index.contains(name) || self.root.join(name).exists()
    }

    fn free_name(&self, name: &str) -> Result<String> {
        self.free_name_within(name, MAX_NAME_ATTEMPTS)
    }

    /// `name`, or `stem_N.ext` with the smallest free N up to `attempts`.
    fn free_name_within(&self, name: &str, attempts: u32) -> Result<String> {
        if !self.is_taken(name) {
            return Ok(name.to_string());
        }
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        for counter in 1..=attempts {
            let candidate = if ext.is_empty() {
                format!("{}_{}", stem, counter)
            } else {
                format!("{}_{}.{}", stem, counter, ext)
            };
            if !self.is_taken(&candidate) {
                debug!(wanted = name, chosen = %candidate, "name collision resolved");
                return Ok(candidate);
            }
        }
        Err(StorageError::NamesExhausted(name.to_string()))
    }
}
