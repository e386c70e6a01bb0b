//! # Routes
//!
//! Axum router configuration for the storefront cart API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health, / - Health check
/// - POST /api/v1/session - Issue an anonymous session id
/// - GET  /api/v1/foods - Cached food catalog
/// - GET  /api/v1/cart - Cart lines and totals
/// - POST /api/v1/cart/{food_id}/increase - Add one unit
/// - POST /api/v1/cart/{food_id}/decrease - Remove one unit
/// - DELETE /api/v1/cart/{food_id} - Drop a food entirely
/// - GET  /api/v1/cart/totals - Totals with display strings
/// - POST /api/v1/orders - Place an order
/// - POST /api/v1/payment?amount= - Standalone payment
/// - GET  /payment/verify?orderId= - Payment return landing
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cart_routes = Router::new()
        .route("/", get(handlers::get_cart))
        .route("/totals", get(handlers::totals))
        .route("/{food_id}", delete(handlers::remove_all))
        .route("/{food_id}/increase", post(handlers::increase))
        .route("/{food_id}/decrease", post(handlers::decrease));

    let api_routes = Router::new()
        .route("/session", post(handlers::create_session))
        .route("/foods", get(handlers::list_foods))
        .nest("/cart", cart_routes)
        .route("/orders", post(handlers::place_order))
        .route("/payment", post(handlers::create_payment));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Return from the payment provider
        .route("/payment/verify", get(handlers::verify_payment))
        // API v1
        .nest("/api/v1", api_routes)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{CartView, PlaceOrderResponse, SessionResponse, TotalsView};
    use crate::state::AppConfig;
    use crate::testing::MemoryBackend;
    use axum::http::{header, HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use cart_core::{
        BoxedBackend, Cart, Food, PaymentOutcome, PaymentState, Price, PricingPolicy,
        TotalsCalculator,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn server(backend: Arc<MemoryBackend>) -> TestServer {
        let backend: BoxedBackend = backend;
        let state = AppState::with_backend(
            backend,
            TotalsCalculator::new(PricingPolicy::default()),
            AppConfig::default(),
        );
        TestServer::new(create_router(state)).unwrap()
    }

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
    }

    fn delivery() -> serde_json::Value {
        json!({
            "firstName": "Anong",
            "lastName": "Srisuk",
            "email": "anong@example.com",
            "phoneNumber": "0812345678",
            "address": "12 Nimman Rd",
            "province": "Chiang Mai",
            "zip": "50200"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let server = server(Arc::new(MemoryBackend::new()));
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_cart_requires_session() {
        let server = server(Arc::new(MemoryBackend::new()));
        server
            .get("/api/v1/cart")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .get("/api/v1/cart")
            .add_header(
                HeaderName::from_static("x-session-id"),
                HeaderValue::from_static("never-issued"),
            )
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_cart_round_trip() {
        let backend = Arc::new(MemoryBackend::new());
        let server = server(backend.clone());

        let session: SessionResponse = server.post("/api/v1/session").await.json();
        let session_header = HeaderValue::from_str(&session.session_id).unwrap();
        let name = HeaderName::from_static("x-session-id");

        server
            .post("/api/v1/cart/f1/increase")
            .add_header(name.clone(), session_header.clone())
            .await
            .assert_status_ok();
        let cart: CartView = server
            .post("/api/v1/cart/f1/increase")
            .add_header(name.clone(), session_header.clone())
            .await
            .json();

        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.lines[0].name, "Pad Thai");
        assert_eq!(cart.totals.total, Price::baht(490));
        assert_eq!(cart.totals.display.total, "฿490.00");

        let cart: CartView = server
            .post("/api/v1/cart/f1/decrease")
            .add_header(name.clone(), session_header.clone())
            .await
            .json();
        assert_eq!(cart.item_count, 1);

        // Anonymous sessions never touch the backend cart.
        assert!(backend.carts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_session_hydrates_and_syncs() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed("tok", Cart::from_items([("f2", 3u32)]));
        let server = server(backend.clone());
        let (name, value) = bearer("tok");

        let cart: CartView = server
            .get("/api/v1/cart")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(cart.item_count, 3);

        server
            .post("/api/v1/cart/f1/increase")
            .add_header(name, value)
            .await
            .assert_status_ok();
        assert_eq!(backend.cart("tok").quantity("f1"), 1);
    }

    #[tokio::test]
    async fn test_remove_all_is_idempotent() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed("tok", Cart::from_items([("f1", 2u32), ("f2", 1u32)]));
        let server = server(backend);
        let (name, value) = bearer("tok");

        let first: serde_json::Value = server
            .delete("/api/v1/cart/f1")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        let second: serde_json::Value = server
            .delete("/api/v1/cart/f1")
            .add_header(name, value)
            .await
            .json();

        assert_eq!(first["removed"], 2);
        assert_eq!(second["removed"], 0);
        assert_eq!(first["cart"], second["cart"]);
    }

    #[tokio::test]
    async fn test_empty_cart_order_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let server = server(backend.clone());
        let (name, value) = bearer("tok");

        let response = server
            .post("/api/v1/orders")
            .add_header(name, value)
            .json(&delivery())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(backend.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_form_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed("tok", Cart::from_items([("f1", 1u32)]));
        let server = server(backend);
        let (name, value) = bearer("tok");

        let mut form = delivery();
        form["zip"] = json!("  ");
        server
            .post("/api/v1/orders")
            .add_header(name, value)
            .json(&form)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_place_order_and_verify_payment() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed("tok", Cart::from_items([("f1", 2u32)]));
        let server = server(backend.clone());
        let (name, value) = bearer("tok");

        let response = server
            .post("/api/v1/orders")
            .add_header(name.clone(), value.clone())
            .json(&delivery())
            .await;
        response.assert_status(StatusCode::CREATED);
        let placed: PlaceOrderResponse = response.json();
        assert_eq!(placed.amount, Price::baht(490));
        assert!(placed.approval_url.starts_with("https://pay.example/approve/"));
        assert_eq!(backend.cart("tok").quantity("f1"), 2);

        let outcome: PaymentOutcome = server
            .get("/payment/verify")
            .add_query_param("orderId", &placed.order_id)
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(outcome.state, PaymentState::Success);

        let totals: TotalsView = server
            .get("/api/v1/cart/totals")
            .add_header(name, value)
            .await
            .json();
        assert!(totals.total.is_zero());
        assert!(backend.cart("tok").is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_payment_keeps_cart() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed("tok", Cart::from_items([("f1", 1u32)]));
        *backend.payment_status.lock().unwrap() = "CANCELLED".into();
        let server = server(backend.clone());
        let (name, value) = bearer("tok");

        let outcome: PaymentOutcome = server
            .get("/payment/verify")
            .add_query_param("orderId", "ord_1")
            .add_header(name, value)
            .await
            .json();

        assert_eq!(outcome.state, PaymentState::Cancelled);
        assert_eq!(outcome.message, "Payment Cancelled");
        assert_eq!(backend.cart("tok").quantity("f1"), 1);
    }

    #[tokio::test]
    async fn test_verify_without_order_id_redirects_home() {
        let server = server(Arc::new(MemoryBackend::new()));

        let response = server.get("/payment/verify").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
    }

    #[tokio::test]
    async fn test_standalone_payment() {
        let server = server(Arc::new(MemoryBackend::new()));

        let body: serde_json::Value = server
            .post("/api/v1/payment")
            .add_query_param("amount", "120.5")
            .await
            .json();
        assert!(body["approvalUrl"].as_str().unwrap().starts_with("https://"));

        server
            .post("/api/v1/payment")
            .add_query_param("amount", "-3")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/v1/payment")
            .add_query_param("amount", "abc")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_foods() {
        let server = server(Arc::new(MemoryBackend::new()));
        let foods: Vec<Food> = server.get("/api/v1/foods").await.json();
        assert_eq!(foods.len(), 2);
    }
}
