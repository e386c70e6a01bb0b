//! # Storefront Backend Trait
//!
//! The seam between the cart core and the REST backend that owns carts,
//! orders and payment status. `cart-http` provides the reqwest
//! implementation; tests use in-memory fakes.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          StorefrontBackend (trait)           │
//! │  ├── fetch_cart / add_one / remove_one       │
//! │  ├── clear_cart                              │
//! │  ├── submit_order / payment_status           │
//! │  ├── create_payment                          │
//! │  └── list_foods / fetch_food                 │
//! └──────────────────────────────────────────────┘
//!                        ▲
//!          ┌─────────────┴─────────────┐
//!  ┌───────┴────────┐         ┌────────┴───────┐
//!  │ HttpStorefront │         │  test fakes    │
//!  │    Backend     │         │                │
//!  └────────────────┘         └────────────────┘
//! ```

use crate::cart::Cart;
use crate::catalog::{Food, Price};
use crate::error::CartResult;
use crate::order::{Order, OrderRequest};
use crate::payment::PaymentStatusResponse;
use async_trait::async_trait;
use std::sync::Arc;

/// Bearer token for an authenticated session.
///
/// `Debug` is redacted so tokens never reach the logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Backend operations the cart core depends on.
#[async_trait]
pub trait StorefrontBackend: Send + Sync {
    /// Authoritative cart for the token's user
    async fn fetch_cart(&self, token: &SessionToken) -> CartResult<Cart>;

    /// Add one unit of a food
    async fn add_one(&self, token: &SessionToken, food_id: &str) -> CartResult<()>;

    /// Remove one unit of a food
    async fn remove_one(&self, token: &SessionToken, food_id: &str) -> CartResult<()>;

    /// Delete the whole cart
    async fn clear_cart(&self, token: &SessionToken) -> CartResult<()>;

    /// Create the order and its provider payment; the response carries `approval_url`
    async fn submit_order(&self, token: &SessionToken, order: &OrderRequest) -> CartResult<Order>;

    /// Payment status of one of the token user's orders
    async fn payment_status(
        &self,
        token: &SessionToken,
        order_id: &str,
    ) -> CartResult<PaymentStatusResponse>;

    /// Start a payment not tied to an order; returns the provider URL
    async fn create_payment(&self, amount: Price) -> CartResult<String>;

    /// Catalog list
    async fn list_foods(&self) -> CartResult<Vec<Food>>;

    /// Catalog detail
    async fn fetch_food(&self, food_id: &str) -> CartResult<Food>;

    /// Backend name (for logging)
    fn backend_name(&self) -> &'static str {
        "foodies-api"
    }
}

/// Type alias for a shared backend (dynamic dispatch)
pub type BoxedBackend = Arc<dyn StorefrontBackend>;
