// cartsync/src/api/client.rs

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{Credential, SessionContext};
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// JSON-over-HTTP client for the storefront API.
///
/// Attaches `Accept: application/json` and, when the session holds one, the
/// bearer credential to every request. A 401 answer signs the session out
/// before the error is returned. There are no retries; the configured
/// transport timeout applies to every call.
#[derive(Debug, Clone)]
pub struct ApiClient {
  base_url: String,
  http: reqwest::Client,
  session: SessionContext,
}

impl ApiClient {
  pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, ApiError> {
    let base_url = normalize_base_url(&config.api_base_url)?;
    let http = reqwest::Client::builder()
      .timeout(config.timeout())
      .build()
      .map_err(|e| ApiError::Request { message: e.to_string() })?;
    Ok(Self { base_url, http, session })
  }

  pub fn session(&self) -> &SessionContext {
    &self.session
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  #[must_use]
  pub fn endpoint(&self, path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
      return None;
    }
    if trimmed.starts_with('/') {
      Some(format!("{}{}", self.base_url, trimmed))
    } else {
      Some(format!("{}/{}", self.base_url, trimmed))
    }
  }

  pub fn product_path(product_id: u64) -> String {
    format!("/products/{product_id}")
  }

  pub fn orders_path() -> &'static str {
    "/orders"
  }

  pub fn my_orders_path(page: u32) -> String {
    format!("/orders/my?page={}", page.max(1))
  }

  pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
  {
    let response = self.send(self.request(reqwest::Method::GET, path, None)?).await?;
    self.decode_json_response(response).await
  }

  /// `get_json` with an explicit credential instead of the session's.
  pub async fn get_json_as<T>(&self, credential: &Credential, path: &str) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
  {
    let response = self.send(self.request(reqwest::Method::GET, path, Some(credential))?).await?;
    self.decode_json_response(response).await
  }

  /// Like `get_json`, but a 404 is `Ok(None)`.
  pub async fn get_optional_json<T>(&self, path: &str) -> Result<Option<T>, ApiError>
  where
    T: DeserializeOwned,
  {
    let response = self.send(self.request(reqwest::Method::GET, path, None)?).await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    self.decode_json_response(response).await.map(Some)
  }

  pub async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiError>
  where
    Req: Serialize + ?Sized,
    Res: DeserializeOwned,
  {
    let request = self.request(reqwest::Method::POST, path, None)?.json(payload);
    let response = self.send(request).await?;
    self.decode_json_response(response).await
  }

  /// `post_json` with an explicit credential instead of the session's.
  pub async fn post_json_as<Req, Res>(&self, credential: &Credential, path: &str, payload: &Req) -> Result<Res, ApiError>
  where
    Req: Serialize + ?Sized,
    Res: DeserializeOwned,
  {
    let request = self.request(reqwest::Method::POST, path, Some(credential))?.json(payload);
    let response = self.send(request).await?;
    self.decode_json_response(response).await
  }

  fn request(
    &self,
    method: reqwest::Method,
    path: &str,
    credential: Option<&Credential>,
  ) -> Result<RequestBuilder, ApiError> {
    let url = self.endpoint(path).ok_or(ApiError::InvalidPath)?;
    let mut request = self.http.request(method, url).header(ACCEPT, "application/json");
    let credential = credential.cloned().or_else(|| self.session.credential());
    if let Some(credential) = credential {
      request = request.bearer_auth(credential.token());
    }
    Ok(request)
  }

  async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let response = request
      .send()
      .await
      .map_err(|e| ApiError::Request { message: e.to_string() })?;
    debug!(status = %response.status(), url = %response.url(), "API response received.");
    Ok(response)
  }

  async fn decode_json_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
  {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
      if self.session.sign_out() {
        warn!("API rejected the session credential; signed out.");
      }
      return Err(ApiError::Unauthorized);
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| ApiError::Read { message: e.to_string() })?;

    if !status.is_success() {
      return Err(format_http_error(status, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::Decode { message: e.to_string() })
  }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiError {
  let body = non_empty_string(String::from_utf8_lossy(body).to_string()).unwrap_or_else(|| "<empty>".to_string());
  ApiError::Http { status, body }
}

fn normalize_base_url(base_url: &str) -> Result<String, ApiError> {
  let trimmed = base_url.trim();
  if trimmed.is_empty() {
    return Err(ApiError::BaseUrlMissing);
  }
  Ok(trimmed.trim_end_matches('/').to_string())
}

fn non_empty_string(value: String) -> Option<String> {
  let trimmed = value.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}
