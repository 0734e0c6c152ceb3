// cartsync/src/checkout/context.rs

use crate::orders::{OrderLine, OrderReceipt};
use crate::session::Credential;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, interior-mutable state handed to every pipeline handler.
///
/// Guards are blocking and must be dropped before any `.await`.
#[derive(Debug)]
pub struct ContextData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    ContextData(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }
}

impl<T: Send + Sync + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for ContextData<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}

/// State of one checkout run.
#[derive(Debug, Default)]
pub struct CheckoutCtxData {
  /// What will be submitted. Filled before the run from the hydrated cart.
  pub lines: Vec<OrderLine>,
  /// Set by `require_session`.
  pub credential: Option<Credential>,
  /// Set by `submit_order` on success.
  pub receipt: Option<OrderReceipt>,
}

impl CheckoutCtxData {
  pub fn new(lines: Vec<OrderLine>) -> Self {
    Self {
      lines,
      ..Self::default()
    }
  }
}
