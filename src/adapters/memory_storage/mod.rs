// In-memory storage adapter - Mirror that lives for the lifetime of the process

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::errors::*;
use crate::ports::*;

/// Key-value mirror kept in memory
#[derive(Clone, Default)]
pub struct MemoryStorageAdapter {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> DomainError {
    DomainError::Storage("Storage lock poisoned".to_string())
}

impl StoragePort for MemoryStorageAdapter {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn write_batch(&self, changes: &[(String, Option<String>)]) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        for (key, value) in changes {
            match value {
                Some(value) => entries.insert(key.clone(), value.clone()),
                None => entries.remove(key),
            };
        }
        Ok(())
    }
}
