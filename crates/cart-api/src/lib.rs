//! # cart-api
//!
//! HTTP API layer for foodies-cart.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Per-session cart stores (bearer token or anonymous session id)
//! - Order placement and the payment return landing
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/session` | Issue anonymous session id |
//! | GET | `/api/v1/foods` | Food catalog |
//! | GET | `/api/v1/cart` | Cart lines and totals |
//! | POST | `/api/v1/cart/{food_id}/increase` | Add one unit |
//! | POST | `/api/v1/cart/{food_id}/decrease` | Remove one unit |
//! | DELETE | `/api/v1/cart/{food_id}` | Drop a food |
//! | GET | `/api/v1/cart/totals` | Totals |
//! | POST | `/api/v1/orders` | Place order |
//! | POST | `/api/v1/payment?amount=` | Standalone payment |
//! | GET | `/payment/verify?orderId=` | Verify returning payment |

pub mod handlers;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
