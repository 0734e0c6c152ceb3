// cartsync/src/api/catalog.rs

use super::client::ApiClient;
use crate::cart::ProductId;
use crate::catalog::{Product, ProductCatalog};
use crate::error::CatalogError;
use async_trait::async_trait;
use tracing::instrument;

/// `GET /products/{id}` over an `ApiClient`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
  client: ApiClient,
}

impl HttpCatalog {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }
}

#[async_trait]
impl ProductCatalog for HttpCatalog {
  #[instrument(name = "HttpCatalog::fetch_product", skip(self), fields(%product_id))]
  async fn fetch_product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
    self
      .client
      .get_optional_json::<Product>(&ApiClient::product_path(product_id.0))
      .await
      .map_err(|source| CatalogError::Network { product_id, source })?
      .ok_or(CatalogError::NotFound { product_id })
  }
}
