// cartsync/src/catalog/carousel.rs

use super::{Product, ProductImage};

/// Wrap-around cursor over a product's images, as used by the product detail view.
#[derive(Debug, Clone, Default)]
pub struct ImageCarousel {
  images: Vec<ProductImage>,
  index: usize,
}

impl ImageCarousel {
  pub fn new(images: Vec<ProductImage>) -> Self {
    Self { images, index: 0 }
  }

  pub fn for_product(product: &Product) -> Self {
    Self::new(product.images.clone())
  }

  pub fn len(&self) -> usize {
    self.images.len()
  }

  pub fn is_empty(&self) -> bool {
    self.images.is_empty()
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn current(&self) -> Option<&ProductImage> {
    self.images.get(self.index)
  }

  pub fn current_url(&self) -> Option<&str> {
    self.current().map(|img| img.image_url.as_str()).filter(|url| !url.is_empty())
  }

  pub fn next(&mut self) {
    if !self.images.is_empty() {
      self.index = (self.index + 1) % self.images.len();
    }
  }

  pub fn previous(&mut self) {
    if !self.images.is_empty() {
      self.index = (self.index + self.images.len() - 1) % self.images.len();
    }
  }

  /// Jumps to `index`. Out-of-range indices are ignored and return `false`.
  pub fn select(&mut self, index: usize) -> bool {
    if index < self.images.len() {
      self.index = index;
      true
    } else {
      false
    }
  }

  /// Back to the first image, as when the detail view is reopened.
  pub fn reset(&mut self) {
    self.index = 0;
  }
}
