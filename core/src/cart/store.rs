// cartsync/src/cart/store.rs

use super::entry::{decode_entries, encode_entries, CartEntry, ProductId};
use crate::error::StorageError;
use crate::storage::StorageHandle;
use tracing::{debug, info, warn};

/// Result of adding a product that may already be in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
  Added,
  /// Nothing was written; the existing quantity is unchanged.
  AlreadyInCart,
}

/// The durable `[{id, quantity}]` record under a single storage key.
///
/// This is the source of truth for which products are in the cart and in
/// what quantity. Clones share the same storage handle.
#[derive(Debug, Clone)]
pub struct PersistedCartStore {
  storage: StorageHandle,
  key: String,
}

impl PersistedCartStore {
  pub fn new(storage: StorageHandle, key: impl Into<String>) -> Self {
    Self {
      storage,
      key: key.into(),
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn storage(&self) -> &StorageHandle {
    &self.storage
  }

  /// Never fails: a missing, unreadable or corrupt record reads as an empty cart.
  pub fn read(&self) -> Vec<CartEntry> {
    let raw = match self.storage.get(&self.key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return Vec::new(),
      Err(e) => {
        warn!(key = %self.key, error = %e, "Cart record could not be read; treating cart as empty.");
        return Vec::new();
      }
    };
    match decode_entries(&raw) {
      Ok(entries) => entries,
      Err(e) => {
        warn!(key = %self.key, error = %e, "Cart record is corrupt; treating cart as empty.");
        Vec::new()
      }
    }
  }

  /// Overwrites the whole record in one storage write.
  pub fn write(&self, entries: &[CartEntry]) -> Result<(), StorageError> {
    let raw = encode_entries(entries).map_err(|e| StorageError::Encode {
      key: self.key.clone(),
      message: e.to_string(),
    })?;
    self.storage.set(&self.key, &raw)?;
    debug!(key = %self.key, entries = entries.len(), "Cart record written.");
    Ok(())
  }

  pub fn clear(&self) -> Result<(), StorageError> {
    self.storage.remove(&self.key)?;
    debug!(key = %self.key, "Cart record removed.");
    Ok(())
  }

  /// Appends `{product_id, 1}` unless the product is already present.
  pub fn add(&self, product_id: ProductId) -> Result<AddOutcome, StorageError> {
    let mut entries = self.read();
    if entries.iter().any(|e| e.product_id() == product_id) {
      info!(%product_id, "Product is already in the cart.");
      return Ok(AddOutcome::AlreadyInCart);
    }
    entries.push(CartEntry::single(product_id));
    self.write(&entries)?;
    info!(%product_id, "Product added to cart.");
    Ok(AddOutcome::Added)
  }

  pub fn len(&self) -> usize {
    self.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.read().is_empty()
  }
}
