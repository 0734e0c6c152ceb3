// cartsync/src/storefront.rs

use crate::api::{ApiClient, HttpCatalog, HttpOrderGateway};
use crate::cart::{AddOutcome, CartReconciler, ChangeNotifier, PersistedCartStore, ProductId};
use crate::catalog::ProductCatalog;
use crate::checkout::CheckoutInitiator;
use crate::config::ClientConfig;
use crate::error::{ApiError, CartError, OrderHistoryError, PipelineError};
use crate::orders::{Order, OrderGateway, Page};
use crate::session::SessionContext;
use crate::storage::StorageHandle;
use std::sync::Arc;
use tracing::info;

/// Everything one execution context (a tab, a window, a CLI run) needs to
/// drive the cart: a store on its own storage handle, a notifier bridged to
/// writes from other contexts, and the catalog/order seams.
pub struct Storefront {
  store: PersistedCartStore,
  notifier: ChangeNotifier,
  catalog: Arc<dyn ProductCatalog>,
  gateway: Arc<dyn OrderGateway>,
  session: SessionContext,
}

impl std::fmt::Debug for Storefront {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Storefront")
      .field("store", &self.store)
      .field("session", &self.session)
      .finish_non_exhaustive()
  }
}

impl Storefront {
  pub fn new(
    storage: StorageHandle,
    cart_key: &str,
    catalog: Arc<dyn ProductCatalog>,
    gateway: Arc<dyn OrderGateway>,
    session: SessionContext,
  ) -> Self {
    let notifier = ChangeNotifier::new(&storage, cart_key);
    Self {
      store: PersistedCartStore::new(storage, cart_key),
      notifier,
      catalog,
      gateway,
      session,
    }
  }

  /// Wires the HTTP catalog and order gateway from `config`.
  pub fn connect(config: &ClientConfig, storage: StorageHandle, session: SessionContext) -> Result<Self, ApiError> {
    let client = ApiClient::new(config, session.clone())?;
    Ok(Self::new(
      storage,
      &config.cart_storage_key,
      Arc::new(HttpCatalog::new(client.clone())),
      Arc::new(HttpOrderGateway::new(client)),
      session,
    ))
  }

  /// Adds one unit of `product_id` unless it is already in the cart.
  pub fn add_to_cart(&self, product_id: ProductId) -> Result<AddOutcome, CartError> {
    let outcome = self.store.add(product_id)?;
    if outcome == AddOutcome::Added {
      self.notifier.notify_changed();
    }
    Ok(outcome)
  }

  /// Number of distinct products in the persisted cart, as shown on the header badge.
  pub fn badge_count(&self) -> usize {
    self.store.len()
  }

  /// An unreconciled cart view for this context. Call `reconcile` on it.
  pub fn open_cart(&self) -> CartReconciler {
    CartReconciler::new(self.store.clone(), Arc::clone(&self.catalog), self.notifier.clone())
  }

  pub fn checkout(&self) -> Result<CheckoutInitiator, PipelineError> {
    CheckoutInitiator::new(self.session.clone(), Arc::clone(&self.gateway))
  }

  /// Page `page` of the signed-in user's orders.
  pub async fn my_orders(&self, page: u32) -> Result<Page<Order>, OrderHistoryError> {
    let credential = self.session.credential().ok_or(OrderHistoryError::Unauthenticated)?;
    let orders = self.gateway.my_orders(&credential, page).await.map_err(|e| match e {
      ApiError::Unauthorized => OrderHistoryError::Unauthenticated,
      e => OrderHistoryError::Api(e),
    })?;
    info!(page = orders.current_page, count = orders.data.len(), "Orders loaded.");
    Ok(orders)
  }

  pub fn notifier(&self) -> &ChangeNotifier {
    &self.notifier
  }

  pub fn session(&self) -> &SessionContext {
    &self.session
  }

  pub fn store(&self) -> &PersistedCartStore {
    &self.store
  }
}
