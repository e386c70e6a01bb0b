//! # cart-core
//!
//! Core types and services for the foodies storefront cart.
//!
//! This crate provides:
//! - `Cart` and `CartStore` for the session's optimistic cart
//! - `TotalsCalculator` and `PricingPolicy` for subtotal/shipping/tax
//! - `OrderSubmitter` for turning a cart into an order and payment hand-off
//! - `PaymentVerifier` for settling a returning payment
//! - `StorefrontBackend` trait for the REST backend behind it all
//! - `ViewScope` for cancelling requests when their view goes away
//! - `CartError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartStore, OrderSubmitter, ViewScope};
//!
//! let store = Arc::new(CartStore::new(backend.clone()));
//! let (_guard, scope) = ViewScope::new();
//!
//! store.hydrate(token, &scope).await?;
//! store.increase("food_123", &scope).await?;
//!
//! let submitter = OrderSubmitter::new(backend, store.clone(), calculator);
//! let placed = submitter.submit(&catalog, &details, &scope).await?;
//!
//! // Send the shopper to placed.approval_url
//! ```

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;
pub mod payment;
pub mod scope;
pub mod store;
pub mod submit;
pub mod totals;
pub mod verify;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use backend::{BoxedBackend, SessionToken, StorefrontBackend};
pub use cart::{Cart, CartLine};
pub use catalog::{Food, FoodCatalog, Price, CURRENCY_SYMBOL};
pub use error::{CartError, CartResult};
pub use order::{
    DeliveryDetails, Order, OrderLine, OrderRequest, OrderStatus, PlacedOrder, DEFAULT_COUNTRY,
};
pub use payment::{
    PaymentOutcome, PaymentState, PaymentStatus, PaymentStatusResponse, VerificationState,
};
pub use scope::{ViewGuard, ViewScope};
pub use store::{CartCommand, CartStore};
pub use submit::OrderSubmitter;
pub use totals::{priced_lines, PricedLine, PricingPolicy, Totals, TotalsCalculator};
pub use verify::PaymentVerifier;
