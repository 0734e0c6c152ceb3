// cartsync/src/storage/memory.rs

use super::KeyValueStore;
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process store. Lives as long as the `SharedStorage` that owns it.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.entries.read().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.entries.write().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.entries.write().remove(key);
    Ok(())
  }
}
