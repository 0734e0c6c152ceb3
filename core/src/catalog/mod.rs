// cartsync/src/catalog/mod.rs

//! Product snapshots and the lookup seam the reconciler fetches them through.

pub mod carousel;
pub mod decode;

pub use carousel::ImageCarousel;

use crate::cart::ProductId;
use crate::error::CatalogError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
  #[serde(default)]
  pub id: Option<u64>,
  #[serde(default)]
  pub product_id: Option<u64>,
  pub image_url: String,
  #[serde(default, deserialize_with = "decode::lenient_flag")]
  pub is_main: bool,
}

/// Point-in-time product data as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  #[serde(default)]
  pub category_id: Option<u64>,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  /// `None` when the API sent no usable price. Counts as 0 in totals.
  #[serde(default, deserialize_with = "decode::lenient_price")]
  pub price: Option<f64>,
  #[serde(default)]
  pub stock_quantity: Option<i64>,
  #[serde(default, deserialize_with = "decode::lenient_opt_flag")]
  pub is_active: Option<bool>,
  #[serde(default, deserialize_with = "decode::null_as_empty")]
  pub images: Vec<ProductImage>,
}

impl Product {
  /// The image flagged as main, else the first image.
  pub fn main_image_url(&self) -> Option<&str> {
    self
      .images
      .iter()
      .find(|img| img.is_main && !img.image_url.is_empty())
      .or_else(|| self.images.first())
      .map(|img| img.image_url.as_str())
      .filter(|url| !url.is_empty())
  }

  /// Products without an explicit flag are treated as active.
  pub fn is_active(&self) -> bool {
    self.is_active.unwrap_or(true)
  }
}

/// Fetches one product by id.
///
/// Implementations make a single attempt with no retries; each call is
/// independent so a failure never affects sibling lookups.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
  async fn fetch_product(&self, product_id: ProductId) -> Result<Product, CatalogError>;
}
