//! # cart-http
//!
//! reqwest client for the foodies REST backend.
//!
//! Implements [`cart_core::StorefrontBackend`] against:
//!
//! - `/api/cart` (fetch, add one, clear) and the remove-one endpoint
//! - `/api/orders` and `/api/orders/payment/status/{orderId}`
//! - `/api/payment/create` for payments not tied to a cart
//! - `/api/foods` for the catalog
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_http::HttpStorefrontBackend;
//! use cart_core::{BoxedBackend, CartStore};
//!
//! // Create backend from environment
//! let backend: BoxedBackend = Arc::new(HttpStorefrontBackend::from_env()?);
//!
//! let store = CartStore::new(backend.clone());
//! ```

pub mod client;
pub mod config;

pub use client::HttpStorefrontBackend;
pub use config::BackendConfig;
