// File storage adapter - Durable mirror kept as a JSON object on disk

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use tempfile::NamedTempFile;

use crate::domain::errors::*;
use crate::ports::*;

/// Key-value mirror persisted to a single JSON file.
///
/// Every mutation (a single key or a whole batch) rewrites the file once through a temporary file in the same
/// directory, so a crash never leaves a half-written mirror behind.
pub struct FileStorageAdapter {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorageAdapter {
    /// Open the mirror at `path`, starting empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                DomainError::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    DomainError::Storage(format!("Corrupt mirror {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), DomainError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| {
            DomainError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let mut file = NamedTempFile::new_in(&dir)
            .map_err(|e| DomainError::Storage(format!("Failed to create temp file: {}", e)))?;
        serde_json::to_writer_pretty(&mut file, entries)
            .map_err(|e| DomainError::Storage(format!("Failed to encode mirror: {}", e)))?;
        file.flush()
            .map_err(|e| DomainError::Storage(format!("Failed to write mirror: {}", e)))?;
        file.persist(&self.path).map_err(|e| {
            DomainError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

fn poisoned() -> DomainError {
    DomainError::Storage("Storage lock poisoned".to_string())
}

impl StoragePort for FileStorageAdapter {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn write_batch(&self, changes: &[(String, Option<String>)]) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let mut dirty = false;
        for (key, value) in changes {
            dirty |= match value {
                Some(value) if entries.get(key) == Some(value) => false,
                Some(value) => {
                    entries.insert(key.clone(), value.clone());
                    true
                }
                None => entries.remove(key).is_some(),
            };
        }
        if dirty {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
