// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use cartsync::catalog::ProductImage;
use cartsync::error::{ApiError, CatalogError, StorageError};
use cartsync::orders::{Order, OrderGateway, OrderReceipt, OrderRequest, Page};
use cartsync::session::{Credential, Session};
use cartsync::{
  CartEntry, CartReconciler, ChangeNotifier, KeyValueStore, MemoryStore, PersistedCartStore, Product, ProductCatalog,
  ProductId, SharedStorage, StorageHandle,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

pub const CART_KEY: &str = "cart";

// --- Product fixtures ---
pub fn product(id: u64, name: &str, price: Option<f64>) -> Product {
  Product {
    id: ProductId(id),
    category_id: Some(1),
    name: name.to_string(),
    description: None,
    price,
    stock_quantity: Some(10),
    is_active: Some(true),
    images: vec![ProductImage {
      id: Some(id),
      product_id: Some(id),
      image_url: format!("/img/{id}.jpg"),
      is_main: true,
    }],
  }
}

pub fn entry(id: u64, quantity: u32) -> CartEntry {
  CartEntry::new(ProductId(id), quantity).expect("quantity must be >= 1")
}

pub fn ids(entries: &[CartEntry]) -> Vec<u64> {
  entries.iter().map(|e| e.product_id().0).collect()
}

// --- Fake catalog ---

/// In-memory `ProductCatalog` that counts calls and tracks how many lookups
/// are in flight at once.
#[derive(Default)]
pub struct FakeCatalog {
  products: HashMap<ProductId, Product>,
  failing: HashSet<ProductId>,
  delay: Option<Duration>,
  calls: AtomicUsize,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl FakeCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_product(mut self, product: Product) -> Self {
    self.products.insert(product.id, product);
    self
  }

  /// Answers lookups for `requested` with `product`, whatever its own id.
  pub fn with_product_at(mut self, requested: u64, product: Product) -> Self {
    self.products.insert(ProductId(requested), product);
    self
  }

  /// Lookups for `id` fail with a transport error.
  pub fn failing(mut self, id: u64) -> Self {
    self.failing.insert(ProductId(id));
    self
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
  async fn fetch_product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    if self.failing.contains(&product_id) {
      return Err(CatalogError::Network {
        product_id,
        source: ApiError::Request {
          message: "connection reset".to_string(),
        },
      });
    }
    self
      .products
      .get(&product_id)
      .cloned()
      .ok_or(CatalogError::NotFound { product_id })
  }
}

// --- Fake order gateway ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
  Accept,
  ServerError,
  Unauthorized,
}

/// Records every submission. Never touches the network.
pub struct FakeGateway {
  mode: GatewayMode,
  calls: AtomicUsize,
  requests: Mutex<Vec<serde_json::Value>>,
  tokens: Mutex<Vec<String>>,
}

impl FakeGateway {
  pub fn new(mode: GatewayMode) -> Self {
    Self {
      mode,
      calls: AtomicUsize::new(0),
      requests: Mutex::new(Vec::new()),
      tokens: Mutex::new(Vec::new()),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Request bodies as they would go over the wire.
  pub fn requests(&self) -> Vec<serde_json::Value> {
    self.requests.lock().clone()
  }

  pub fn tokens(&self) -> Vec<String> {
    self.tokens.lock().clone()
  }

  fn fail(&self) -> Option<ApiError> {
    match self.mode {
      GatewayMode::Accept => None,
      GatewayMode::ServerError => Some(ApiError::Http {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
      }),
      GatewayMode::Unauthorized => Some(ApiError::Unauthorized),
    }
  }
}

#[async_trait]
impl OrderGateway for FakeGateway {
  async fn create_order(&self, credential: &Credential, request: &OrderRequest) -> Result<OrderReceipt, ApiError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.tokens.lock().push(credential.token().to_string());
    self
      .requests
      .lock()
      .push(serde_json::to_value(request).expect("order request serializes"));
    if let Some(e) = self.fail() {
      return Err(e);
    }
    Ok(OrderReceipt::from_value(json!({
      "message": "Order placed successfully",
      "order": {"id": 77, "status": "pending", "items": []}
    })))
  }

  async fn my_orders(&self, credential: &Credential, page: u32) -> Result<Page<Order>, ApiError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.tokens.lock().push(credential.token().to_string());
    if let Some(e) = self.fail() {
      return Err(e);
    }
    Ok(Page {
      current_page: page,
      data: Vec::new(),
      per_page: 10,
      total: 0,
      last_page: 1,
    })
  }
}

// --- Storage whose writes can be switched off ---

#[derive(Default)]
pub struct FlakyStore {
  inner: MemoryStore,
  fail_writes: AtomicBool,
}

impl FlakyStore {
  pub fn set_failing(&self, failing: bool) {
    self.fail_writes.store(failing, Ordering::SeqCst);
  }

  fn check(&self, key: &str) -> Result<(), StorageError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StorageError::Io {
        key: key.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
      });
    }
    Ok(())
  }
}

impl KeyValueStore for FlakyStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    self.inner.get(key)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.check(key)?;
    self.inner.set(key, value)
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.check(key)?;
    self.inner.remove(key)
  }
}

// --- Wiring helpers ---

pub fn seed(storage: &StorageHandle, entries: &[CartEntry]) -> PersistedCartStore {
  let store = PersistedCartStore::new(storage.clone(), CART_KEY);
  store.write(entries).expect("seed write");
  store
}

pub fn reconciler(storage: &StorageHandle, catalog: Arc<FakeCatalog>) -> CartReconciler {
  CartReconciler::new(
    PersistedCartStore::new(storage.clone(), CART_KEY),
    catalog,
    ChangeNotifier::new(storage, CART_KEY),
  )
}

pub fn shared() -> (SharedStorage, StorageHandle) {
  let shared = SharedStorage::in_memory();
  let handle = shared.attach();
  (shared, handle)
}

pub fn session(token: &str) -> Session {
  Session::new(Credential::new(token).expect("non-blank token"))
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Counts invocations of a change handler.
pub fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
  let count = Arc::new(AtomicUsize::new(0));
  let handle = Arc::clone(&count);
  (count, move || {
    handle.fetch_add(1, Ordering::SeqCst);
  })
}
