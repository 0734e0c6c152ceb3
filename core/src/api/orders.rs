// cartsync/src/api/orders.rs

use super::client::ApiClient;
use crate::error::ApiError;
use crate::orders::{Order, OrderGateway, OrderReceipt, OrderRequest, Page};
use crate::session::Credential;
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

/// `POST /orders` and `GET /orders/my` over an `ApiClient`.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
  client: ApiClient,
}

impl HttpOrderGateway {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
  #[instrument(name = "HttpOrderGateway::create_order", skip_all, fields(lines = request.items.len()))]
  async fn create_order(&self, credential: &Credential, request: &OrderRequest) -> Result<OrderReceipt, ApiError> {
    let raw: Value = self.client.post_json_as(credential, ApiClient::orders_path(), request).await?;
    Ok(OrderReceipt::from_value(raw))
  }

  #[instrument(name = "HttpOrderGateway::my_orders", skip(self, credential))]
  async fn my_orders(&self, credential: &Credential, page: u32) -> Result<Page<Order>, ApiError> {
    self.client.get_json_as(credential, &ApiClient::my_orders_path(page)).await
  }
}
