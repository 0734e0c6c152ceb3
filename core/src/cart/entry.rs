// cartsync/src/cart/entry.rs

//! The persisted cart record and its strict parse-and-validate step.

use crate::error::CartParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u64> for ProductId {
  fn from(id: u64) -> Self {
    ProductId(id)
  }
}

/// `{ productId, quantity }` with `quantity >= 1`. Serialized as `{"id", "quantity"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CartEntry {
  #[serde(rename = "id")]
  product_id: ProductId,
  quantity: u32,
}

impl CartEntry {
  /// Returns `None` for a zero quantity.
  pub fn new(product_id: ProductId, quantity: u32) -> Option<Self> {
    (quantity >= 1).then_some(Self { product_id, quantity })
  }

  /// A freshly added product.
  pub fn single(product_id: ProductId) -> Self {
    Self { product_id, quantity: 1 }
  }

  pub fn product_id(&self) -> ProductId {
    self.product_id
  }

  pub fn quantity(&self) -> u32 {
    self.quantity
  }
}

// Wire shape of one element. Unknown fields are ignored.
#[derive(Deserialize)]
struct StoredEntry {
  id: u64,
  quantity: u32,
}

/// Parses a raw cart record.
///
/// Accepts only a JSON array whose every element has a non-negative integer
/// `id` and an integer `quantity >= 1`. If an id repeats, the first
/// occurrence wins.
pub fn decode_entries(raw: &str) -> Result<Vec<CartEntry>, CartParseError> {
  let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| CartParseError::Malformed(e.to_string()))?;
  let serde_json::Value::Array(items) = value else {
    return Err(CartParseError::NotAnArray);
  };

  let mut entries: Vec<CartEntry> = Vec::with_capacity(items.len());
  for (index, item) in items.into_iter().enumerate() {
    let stored: StoredEntry = serde_json::from_value(item).map_err(|e| CartParseError::InvalidEntry {
      index,
      reason: e.to_string(),
    })?;
    let entry = CartEntry::new(ProductId(stored.id), stored.quantity).ok_or(CartParseError::InvalidEntry {
      index,
      reason: "quantity must be at least 1".to_string(),
    })?;
    if entries.iter().any(|e| e.product_id == entry.product_id) {
      continue;
    }
    entries.push(entry);
  }
  Ok(entries)
}

pub fn encode_entries(entries: &[CartEntry]) -> Result<String, serde_json::Error> {
  serde_json::to_string(entries)
}
