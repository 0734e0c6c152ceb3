// src/lib.rs

//! cartsync: client-side cart state and checkout for a storefront API.
//!
//! The pieces, leaves first:
//!  - `PersistedCartStore`: the durable `[{id, quantity}]` record. Corrupt data reads as an empty cart.
//!  - `ProductCatalog`: per-product lookup (`HttpCatalog` over `GET /products/{id}`).
//!  - `CartReconciler`: fetches every product concurrently, tolerates individual failures,
//!    and writes each quantity change straight back to the store.
//!  - `ChangeNotifier`: cart-changed signal within a context and across contexts that
//!    share one `SharedStorage`.
//!  - `CheckoutInitiator`: a step pipeline that refuses empty carts and anonymous callers
//!    before submitting `{product_id, quantity}` pairs to `POST /orders`.
//!
//! `Storefront` wires these together for one execution context.

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod orders;
pub mod session;
pub mod storage;
pub mod storefront;

// --- Re-exports for the Public API ---

pub use crate::cart::{
  AddOutcome, CartEntry, CartReconciler, ChangeFeed, ChangeNotifier, HydratedLineItem, PersistedCartStore,
  ProductId, ReconcileReport, Subscription,
};
pub use crate::catalog::{Product, ProductCatalog, ProductImage};
pub use crate::checkout::{CheckoutInitiator, ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::config::ClientConfig;
pub use crate::error::{
  ApiError, CartError, CartResult, CatalogError, CheckoutError, ConfigError, OrderHistoryError, PipelineError,
  StorageError,
};
pub use crate::orders::{Order, OrderGateway, OrderReceipt, OrderRequest, Page};
pub use crate::session::{Credential, Session, SessionContext, User};
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore, SharedStorage, StorageHandle};
pub use crate::storefront::Storefront;
