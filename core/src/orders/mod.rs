// cartsync/src/orders/mod.rs

//! Order request/response types and the gateway seam used by checkout.

use crate::cart::{HydratedLineItem, ProductId};
use crate::catalog::decode::{lenient_price, null_as_empty};
use crate::catalog::Product;
use crate::error::ApiError;
use crate::session::Credential;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `{product_id, quantity}` pair of an order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLine {
  pub product_id: ProductId,
  pub quantity: u32,
}

/// Body of `POST /orders`. Prices are never sent; the server prices the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
  pub items: Vec<OrderLine>,
}

impl OrderRequest {
  pub fn from_items<'a>(items: impl IntoIterator<Item = &'a HydratedLineItem>) -> Self {
    Self {
      items: items
        .into_iter()
        .map(|item| OrderLine {
          product_id: item.product_id(),
          quantity: item.quantity(),
        })
        .collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Completed,
  Canceled,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  #[serde(default)]
  pub id: Option<u64>,
  #[serde(default)]
  pub order_id: Option<u64>,
  pub product_id: ProductId,
  pub quantity: u32,
  #[serde(default, deserialize_with = "lenient_price")]
  pub price: Option<f64>,
  #[serde(default)]
  pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  #[serde(default)]
  pub id: Option<u64>,
  #[serde(default)]
  pub order_number: Option<String>,
  #[serde(default)]
  pub user_id: Option<u64>,
  #[serde(default, deserialize_with = "lenient_price")]
  pub total: Option<f64>,
  #[serde(default)]
  pub status: Option<OrderStatus>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub items: Vec<OrderItem>,
}

/// What the server answered to a successful order submission.
///
/// The response shape is loosely defined, so only `message` and `order` are
/// picked out; the raw body is kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
  pub message: Option<String>,
  pub order: Option<Order>,
  pub raw: Value,
}

impl OrderReceipt {
  pub fn from_value(raw: Value) -> Self {
    let message = raw.get("message").and_then(Value::as_str).map(str::to_string);
    let order = raw
      .get("order")
      .cloned()
      .and_then(|order| serde_json::from_value::<Order>(order).ok());
    Self { message, order, raw }
  }
}

/// Laravel-style paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub current_page: u32,
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(default)]
  pub per_page: u32,
  #[serde(default)]
  pub total: u64,
  pub last_page: u32,
}

impl<T> Page<T> {
  /// Whether `page` is a valid page number for this listing.
  pub fn has_page(&self, page: u32) -> bool {
    (1..=self.last_page.max(1)).contains(&page)
  }

  pub fn next_page(&self) -> Option<u32> {
    let next = self.current_page.saturating_add(1);
    (next <= self.last_page).then_some(next)
  }
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
  async fn create_order(&self, credential: &Credential, request: &OrderRequest) -> Result<OrderReceipt, ApiError>;

  async fn my_orders(&self, credential: &Credential, page: u32) -> Result<Page<Order>, ApiError>;
}
