// cartsync/src/cart/reconciler.rs

//! Turns persisted `{id, quantity}` entries into displayable line items.
//!
//! Every product is fetched concurrently and the fetches are joined
//! all-settled: one failed lookup never hides the outcome of another. A
//! failed entry stays in the store untouched and is carried through later
//! mutations as an unresolved line.
//!
//! Mutations are read-modify-write against the store: only the targeted
//! entry changes, and entries written since the last `reconcile` (by this
//! context or another) survive. The view is rebuilt from what was written.

use super::entry::{CartEntry, ProductId};
use super::notifier::ChangeNotifier;
use super::store::PersistedCartStore;
use crate::catalog::{Product, ProductCatalog};
use crate::error::{CartError, CartResult, CatalogError};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A persisted entry joined with a point-in-time product snapshot.
#[derive(Debug, Clone, PartialEq)]
///
/// Keyed by the persisted id, whatever id the catalog echoes back.
pub struct HydratedLineItem {
  product_id: ProductId,
  pub product: Product,
  quantity: u32,
}

impl HydratedLineItem {
  pub fn new(product_id: ProductId, product: Product, quantity: u32) -> Self {
    Self {
      product_id,
      product,
      quantity: quantity.max(1),
    }
  }

  pub fn product_id(&self) -> ProductId {
    self.product_id
  }

  pub fn quantity(&self) -> u32 {
    self.quantity
  }

  pub fn name(&self) -> &str {
    &self.product.name
  }

  /// `None` when the catalog sent no usable price.
  pub fn unit_price(&self) -> Option<f64> {
    self.product.price
  }

  /// Unit price times quantity; a missing price counts as 0.
  pub fn line_total(&self) -> f64 {
    self.product.price.unwrap_or(0.0) * f64::from(self.quantity)
  }

  /// The `{id, quantity}` pair this line stands for.
  pub fn entry(&self) -> CartEntry {
    CartEntry::new(self.product_id, self.quantity).unwrap_or_else(|| CartEntry::single(self.product_id))
  }
}

#[derive(Debug, Clone, PartialEq)]
enum CartLine {
  Ready(HydratedLineItem),
  Unresolved(CartEntry),
}

/// A product whose lookup failed during `reconcile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
  pub product_id: ProductId,
  pub reason: String,
}

/// Outcome counts of one `reconcile` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
  pub hydrated: usize,
  pub failed: Vec<FetchFailure>,
}

impl ReconcileReport {
  pub fn is_complete(&self) -> bool {
    self.failed.is_empty()
  }
}

/// The cart view of one execution context.
pub struct CartReconciler {
  store: PersistedCartStore,
  catalog: Arc<dyn ProductCatalog>,
  notifier: ChangeNotifier,
  lines: Vec<CartLine>,
}

impl std::fmt::Debug for CartReconciler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CartReconciler")
      .field("store", &self.store)
      .field("lines", &self.lines)
      .finish_non_exhaustive()
  }
}

impl CartReconciler {
  pub fn new(store: PersistedCartStore, catalog: Arc<dyn ProductCatalog>, notifier: ChangeNotifier) -> Self {
    Self {
      store,
      catalog,
      notifier,
      lines: Vec::new(),
    }
  }

  /// Re-reads the store and hydrates every entry.
  ///
  /// An empty store makes no catalog calls. The view is replaced only after
  /// every fetch has settled.
  #[instrument(name = "CartReconciler::reconcile", skip(self), fields(key = %self.store.key()))]
  pub async fn reconcile(&mut self) -> ReconcileReport {
    let entries = self.store.read();
    if entries.is_empty() {
      debug!("Cart is empty; nothing to fetch.");
      self.lines.clear();
      return ReconcileReport::default();
    }

    let catalog = &self.catalog;
    let outcomes: Vec<Result<Product, CatalogError>> =
      join_all(entries.iter().map(|entry| catalog.fetch_product(entry.product_id()))).await;

    let mut report = ReconcileReport::default();
    let mut lines = Vec::with_capacity(entries.len());
    for (entry, outcome) in entries.into_iter().zip(outcomes) {
      match outcome {
        Ok(product) => {
          report.hydrated += 1;
          if product.id != entry.product_id() {
            warn!(requested = %entry.product_id(), returned = %product.id, "Catalog returned a different product id.");
          }
          lines.push(CartLine::Ready(HydratedLineItem::new(entry.product_id(), product, entry.quantity())));
        }
        Err(e) => {
          warn!(product_id = %entry.product_id(), error = %e, "Product lookup failed; entry kept in cart.");
          report.failed.push(FetchFailure {
            product_id: entry.product_id(),
            reason: e.to_string(),
          });
          lines.push(CartLine::Unresolved(entry));
        }
      }
    }
    self.lines = lines;

    info!(hydrated = report.hydrated, failed = report.failed.len(), "Cart reconciled.");
    report
  }

  /// Returns the new quantity.
  pub fn increase_quantity(&mut self, product_id: ProductId) -> CartResult<u32> {
    let quantity = self.update_quantity(product_id, |current| Some(current.saturating_add(1)))?;
    debug!(%product_id, quantity, "Quantity increased.");
    Ok(quantity)
  }

  /// Returns the new quantity. At 1 this is a no-op and nothing is written.
  pub fn decrease_quantity(&mut self, product_id: ProductId) -> CartResult<u32> {
    let quantity = self.update_quantity(product_id, |current| (current > 1).then(|| current - 1))?;
    debug!(%product_id, quantity, "Quantity decreased.");
    Ok(quantity)
  }

  /// Deletes the entry, hydrated or not.
  pub fn remove_item(&mut self, product_id: ProductId) -> CartResult<()> {
    self.modify_stored(product_id, |entries, at| {
      entries.remove(at);
      true
    })?;
    info!(%product_id, "Item removed from cart.");
    Ok(())
  }

  /// Empties the store, then the view, then notifies.
  pub fn clear_cart(&mut self) -> CartResult<()> {
    self.store.clear()?;
    self.lines.clear();
    self.notifier.notify_changed();
    info!("Cart cleared.");
    Ok(())
  }

  /// Hydrated lines in persisted order.
  pub fn items(&self) -> Vec<&HydratedLineItem> {
    self
      .lines
      .iter()
      .filter_map(|line| match line {
        CartLine::Ready(item) => Some(item),
        CartLine::Unresolved(_) => None,
      })
      .collect()
  }

  pub fn item(&self, product_id: ProductId) -> Option<&HydratedLineItem> {
    self.lines.iter().find_map(|line| match line {
      CartLine::Ready(item) if item.product_id() == product_id => Some(item),
      _ => None,
    })
  }

  /// Entries with no product snapshot: the lookup failed on the last
  /// `reconcile`, or the entry was added after it.
  pub fn unresolved(&self) -> Vec<CartEntry> {
    self
      .lines
      .iter()
      .filter_map(|line| match line {
        CartLine::Unresolved(entry) => Some(*entry),
        CartLine::Ready(_) => None,
      })
      .collect()
  }

  /// Number of displayed lines.
  pub fn item_count(&self) -> usize {
    self.items().len()
  }

  pub fn is_empty(&self) -> bool {
    self.item_count() == 0
  }

  pub fn total(&self) -> f64 {
    self.items().iter().map(|item| item.line_total()).sum()
  }

  pub fn store(&self) -> &PersistedCartStore {
    &self.store
  }

  pub fn notifier(&self) -> &ChangeNotifier {
    &self.notifier
  }

  // `next` maps the stored quantity to the new one; `None` leaves it as is.
  fn update_quantity(&mut self, product_id: ProductId, next: impl FnOnce(u32) -> Option<u32>) -> CartResult<u32> {
    let mut quantity = 0;
    self.modify_stored(product_id, |entries, at| {
      let current = entries[at].quantity();
      quantity = current;
      match next(current).and_then(|q| CartEntry::new(product_id, q)) {
        Some(updated) => {
          quantity = updated.quantity();
          entries[at] = updated;
          true
        }
        None => false,
      }
    })?;
    Ok(quantity)
  }

  // Read-modify-write of the target entry. `change` returns false when there
  // is nothing to write; then the store is not touched and nothing is
  // notified. On a failed write the view is rebuilt from the unchanged store.
  fn modify_stored(
    &mut self,
    product_id: ProductId,
    change: impl FnOnce(&mut Vec<CartEntry>, usize) -> bool,
  ) -> CartResult<()> {
    let stored = self.store.read();
    let Some(position) = stored.iter().position(|e| e.product_id() == product_id) else {
      self.rebuild_lines(stored);
      return Err(CartError::NotInCart { product_id });
    };

    let mut next = stored.clone();
    if !change(&mut next, position) {
      self.rebuild_lines(stored);
      return Ok(());
    }
    if let Err(e) = self.store.write(&next) {
      self.rebuild_lines(stored);
      return Err(e.into());
    }
    self.rebuild_lines(next);
    self.notifier.notify_changed();
    Ok(())
  }

  // Keeps the product snapshot of every entry still present; anything the
  // view has not fetched yet becomes unresolved.
  fn rebuild_lines(&mut self, entries: Vec<CartEntry>) {
    let mut snapshots: HashMap<ProductId, Product> = std::mem::take(&mut self.lines)
      .into_iter()
      .filter_map(|line| match line {
        CartLine::Ready(item) => Some((item.product_id, item.product)),
        CartLine::Unresolved(_) => None,
      })
      .collect();
    self.lines = entries
      .into_iter()
      .map(|entry| match snapshots.remove(&entry.product_id()) {
        Some(product) => CartLine::Ready(HydratedLineItem::new(entry.product_id(), product, entry.quantity())),
        None => CartLine::Unresolved(entry),
      })
      .collect();
  }
}
