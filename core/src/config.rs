// cartsync/src/config.rs

use crate::error::ConfigError;
use std::env;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CART_STORAGE_KEY: &str = "cart";

/// Settings shared by the HTTP clients and the persisted cart store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
  pub api_base_url: String,
  /// Transport timeout for every API call. There is no per-operation override.
  pub timeout_ms: u64,
  pub cart_storage_key: String,
}

impl ClientConfig {
  pub fn new(api_base_url: impl Into<String>) -> Self {
    Self {
      api_base_url: api_base_url.into(),
      timeout_ms: DEFAULT_TIMEOUT_MS,
      cart_storage_key: DEFAULT_CART_STORAGE_KEY.to_string(),
    }
  }

  /// Loads `API_BASE_URL` (required), `API_TIMEOUT_MS` and `CART_STORAGE_KEY`,
  /// reading a `.env` file first if one is present.
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|var| env::var(var).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let api_base_url = lookup("API_BASE_URL")
      .filter(|v| !v.trim().is_empty())
      .ok_or(ConfigError::Missing { var: "API_BASE_URL" })?;

    let timeout_ms = match lookup("API_TIMEOUT_MS") {
      Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        var: "API_TIMEOUT_MS",
        message: e.to_string(),
      })?,
      None => DEFAULT_TIMEOUT_MS,
    };
    if timeout_ms == 0 {
      return Err(ConfigError::Invalid {
        var: "API_TIMEOUT_MS",
        message: "timeout must be greater than zero".to_string(),
      });
    }

    let cart_storage_key = lookup("CART_STORAGE_KEY")
      .map(|k| k.trim().to_string())
      .filter(|k| !k.is_empty())
      .unwrap_or_else(|| DEFAULT_CART_STORAGE_KEY.to_string());

    tracing::debug!(%api_base_url, timeout_ms, %cart_storage_key, "Client configuration loaded.");

    Ok(Self {
      api_base_url,
      timeout_ms,
      cart_storage_key,
    })
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}
