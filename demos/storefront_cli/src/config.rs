// demos/storefront_cli/src/config.rs

use anyhow::{Context, Result};
use cartsync::ClientConfig;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_STORAGE_DIR: &str = ".storefront";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub client: ClientConfig,
  /// Directory holding the cart and session records, one file per key.
  pub storage_dir: PathBuf,
}

impl AppConfig {
  /// `api_base_url`, when given, takes the place of `API_BASE_URL`.
  pub fn from_env(api_base_url: Option<String>) -> Result<Self> {
    dotenvy::dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var| match var {
      "API_BASE_URL" if api_base_url.is_some() => api_base_url.clone(),
      _ => env::var(var).ok(),
    })
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let client = ClientConfig::from_lookup(&lookup).context("Failed to load API client configuration")?;
    let storage_dir = lookup("CART_STORAGE_DIR")
      .filter(|dir| !dir.trim().is_empty())
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));

    tracing::info!(api = %client.api_base_url, storage_dir = %storage_dir.display(), "Application configuration loaded.");
    Ok(Self { client, storage_dir })
  }

  pub fn with_storage_dir(mut self, storage_dir: Option<PathBuf>) -> Self {
    if let Some(dir) = storage_dir {
      self.storage_dir = dir;
    }
    self
  }
}
