// cartsync/src/error.rs
use crate::cart::ProductId;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a `KeyValueStore` backend.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("Storage I/O failed for key '{key}'. Source: {source}")]
  Io {
    key: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Storage key '{key}' is not usable: {reason}")]
  InvalidKey { key: String, reason: &'static str },

  #[error("Value for key '{key}' could not be encoded: {message}")]
  Encode { key: String, message: String },
}

/// Why a persisted cart record was rejected.
///
/// Never surfaced past `PersistedCartStore::read`, which collapses every
/// variant into an empty cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartParseError {
  #[error("Cart record is not valid JSON: {0}")]
  Malformed(String),

  #[error("Cart record is not a JSON array")]
  NotAnArray,

  #[error("Cart entry at index {index} is invalid: {reason}")]
  InvalidEntry { index: usize, reason: String },
}

/// Transport-level failure talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("API base URL is missing")]
  BaseUrlMissing,

  #[error("Request path is empty")]
  InvalidPath,

  #[error("HTTP request failed: {message}")]
  Request { message: String },

  #[error("Reading the response body failed: {message}")]
  Read { message: String },

  #[error("The API rejected the session credential (401)")]
  Unauthorized,

  #[error("API responded with HTTP {status}: {body}")]
  Http { status: StatusCode, body: String },

  #[error("Response JSON could not be decoded: {message}")]
  Decode { message: String },
}

/// Per-product lookup failure. Absorbed by the reconciler.
#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("Product {product_id} was not found")]
  NotFound { product_id: ProductId },

  #[error("Fetching product {product_id} failed. Source: {source}")]
  Network {
    product_id: ProductId,
    #[source]
    source: ApiError,
  },
}

impl CatalogError {
  pub fn product_id(&self) -> ProductId {
    match self {
      CatalogError::NotFound { product_id } | CatalogError::Network { product_id, .. } => *product_id,
    }
  }
}

/// Setup or dispatch failure of a step `Pipeline`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Step already exists: {step_name}")]
  DuplicateStep { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}

/// Everything `CheckoutInitiator::place_order` can fail with.
///
/// `EmptyCart` and `Unauthenticated` are raised before any network call.
/// In every case the cart is left untouched.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("Your cart is empty.")]
  EmptyCart,

  #[error("You must sign in to place an order.")]
  Unauthenticated,

  #[error("Failed to place order. Source: {source}")]
  Submission {
    #[source]
    source: ApiError,
  },

  #[error("Checkout was halted by step '{step_name}'")]
  Halted { step_name: String },

  #[error("Checkout pipeline error: {source}")]
  Pipeline {
    #[from]
    source: PipelineError,
  },
}

/// Failures loading the signed-in user's order history.
#[derive(Debug, Error)]
pub enum OrderHistoryError {
  #[error("You must sign in to view your orders.")]
  Unauthenticated,

  #[error("Loading orders failed. Source: {0}")]
  Api(#[from] ApiError),
}

/// Failures of cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
  #[error(transparent)]
  Storage(#[from] StorageError),

  #[error("Product {product_id} is not in the cart")]
  NotInCart { product_id: ProductId },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing environment variable '{var}'")]
  Missing { var: &'static str },

  #[error("Invalid value for '{var}': {message}")]
  Invalid { var: &'static str, message: String },
}

pub type CartResult<T, E = CartError> = std::result::Result<T, E>;
