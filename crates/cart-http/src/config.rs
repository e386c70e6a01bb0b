//! # Backend Configuration
//!
//! Where the foodies REST backend lives and how long to wait for it.
//! Values come from environment variables (a `.env` file is honoured).

use cart_core::{CartError, CartResult};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CART_REMOVE_PATH: &str = "/api/cart/remove";

/// Foodies backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL without a trailing slash
    pub api_base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Path of the remove-one-unit endpoint
    pub cart_remove_path: String,
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `FOODIES_API_URL` (default `http://localhost:8080`)
    /// - `FOODIES_API_TIMEOUT_SECS` (default 30)
    /// - `FOODIES_CART_REMOVE_PATH` (default `/api/cart/remove`)
    pub fn from_env() -> CartResult<Self> {
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("FOODIES_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout_secs = match env::var("FOODIES_API_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CartError::Configuration(format!(
                    "FOODIES_API_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let cart_remove_path = env::var("FOODIES_CART_REMOVE_PATH")
            .unwrap_or_else(|_| DEFAULT_CART_REMOVE_PATH.to_string());

        Self::new(api_base_url)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_cart_remove_path(cart_remove_path)
            .validated()
    }

    /// Create config for an explicit base URL
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cart_remove_path: DEFAULT_CART_REMOVE_PATH.to_string(),
        }
    }

    /// Check the URL scheme and the remove path
    pub fn validated(self) -> CartResult<Self> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(CartError::Configuration(
                "FOODIES_API_URL must start with http:// or https://".to_string(),
            ));
        }
        if !self.cart_remove_path.starts_with('/') {
            return Err(CartError::Configuration(
                "FOODIES_CART_REMOVE_PATH must start with /".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(CartError::Configuration(
                "FOODIES_API_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Full URL for a backend path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cart_remove_path(mut self, path: impl Into<String>) -> Self {
        self.cart_remove_path = path.into();
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
