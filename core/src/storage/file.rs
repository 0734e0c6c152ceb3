// cartsync/src/storage/file.rs

use super::KeyValueStore;
use crate::error::StorageError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// One file per key under `root`.
///
/// Writes land in a temporary file in the same directory and are renamed over
/// the target, so another process reading the key sees the old or the new
/// value in full.
#[derive(Debug, Clone)]
pub struct FileStore {
  root: PathBuf,
}

impl FileStore {
  pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
    let root = root.into();
    fs::create_dir_all(&root).map_err(|source| StorageError::Io {
      key: root.display().to_string(),
      source,
    })?;
    debug!(root = %root.display(), "File store opened.");
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
    if key.is_empty() {
      return Err(StorageError::InvalidKey {
        key: key.to_string(),
        reason: "key is empty",
      });
    }
    if key.starts_with('.') {
      return Err(StorageError::InvalidKey {
        key: key.to_string(),
        reason: "key must not start with '.'",
      });
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
      return Err(StorageError::InvalidKey {
        key: key.to_string(),
        reason: "only ASCII letters, digits, '_', '-' and '.' are allowed",
      });
    }
    Ok(self.root.join(key))
  }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
  move |source| StorageError::Io {
    key: key.to_string(),
    source,
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let path = self.path_for(key)?;
    match fs::read_to_string(&path) {
      Ok(value) => Ok(Some(value)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(io_error(key)(e)),
    }
  }

  #[instrument(name = "FileStore::set", skip(self, value), fields(bytes = value.len()), err(Display))]
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let path = self.path_for(key)?;
    let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_error(key))?;
    tmp.write_all(value.as_bytes()).map_err(io_error(key))?;
    tmp.as_file().sync_all().map_err(io_error(key))?;
    tmp.persist(&path).map_err(|e| io_error(key)(e.error))?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let path = self.path_for(key)?;
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(io_error(key)(e)),
    }
  }
}
