//! # Request Handlers
//!
//! Axum request handlers for the storefront cart API.
//!
//! Every handler owns a [`ViewGuard`](cart_core::ViewGuard). If the client
//! goes away, axum drops the handler future together with its guard. The
//! backend request in flight is abandoned and the cart store reverts the
//! optimistic change that was waiting on it.

use crate::state::{AppState, SessionKey};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use cart_core::{
    priced_lines, CartError, CartStore, DeliveryDetails, Food, OrderSubmitter, PaymentOutcome,
    PaymentVerifier, Price, SessionToken, Totals, ViewScope,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Header carrying an anonymous session id
pub const SESSION_HEADER: &str = "x-session-id";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Issued anonymous session
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
}

/// A cart line joined with the catalog
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub food_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Totals with display strings
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
    pub display: TotalsDisplay,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalsDisplay {
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl From<Totals> for TotalsView {
    fn from(totals: Totals) -> Self {
        Self {
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            tax: totals.tax,
            total: totals.total,
            display: TotalsDisplay {
                subtotal: totals.subtotal.display(),
                shipping: totals.shipping.display(),
                tax: totals.tax.display(),
                total: totals.total.display(),
            },
        }
    }
}

/// Cart contents and totals
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub totals: TotalsView,
}

/// Result of dropping a food from the cart
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResponse {
    pub removed: u32,
    pub cart: CartView,
}

/// Placed order
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: String,
    /// Send the shopper here
    pub approval_url: String,
    pub amount: Price,
}

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub amount: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub approval_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn cart_error_to_response(err: CartError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.user_message(), code);
    if err.is_validation() {
        response = response.with_details("validation");
    } else if err.is_retryable() {
        warn!("Retryable backend failure: {}", err);
        response = response.with_details("retryable");
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn unauthorized(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message, 401)),
    )
}

// =============================================================================
// Session helpers
// =============================================================================

/// Identify the session from `Authorization: Bearer` or `x-session-id`
pub fn session_key(headers: &HeaderMap) -> Result<SessionKey, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "null")
            .ok_or_else(|| unauthorized("Malformed Authorization header"))?;
        return Ok(SessionKey::Authenticated(SessionToken::new(token)));
    }

    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| SessionKey::Anonymous(id.to_string()))
        .ok_or_else(|| unauthorized("Missing session: send a bearer token or x-session-id"))
}

async fn session_store(
    state: &AppState,
    headers: &HeaderMap,
    scope: &ViewScope,
) -> Result<Arc<CartStore>, ApiError> {
    let key = session_key(headers)?;
    state
        .sessions
        .store_for(&key, scope)
        .await
        .map_err(cart_error_to_response)?
        .ok_or_else(|| unauthorized("Unknown session id"))
}

async fn cart_view(state: &AppState, store: &CartStore) -> Result<CartView, ApiError> {
    let catalog = state
        .catalog
        .get(&state.backend)
        .await
        .map_err(cart_error_to_response)?;
    let cart = store.snapshot();
    let priced = priced_lines(&cart, &catalog);
    let totals = state.calculator.compute(&priced);

    let lines = priced
        .iter()
        .map(|line| CartLineView {
            food_id: line.food_id.clone(),
            name: catalog
                .get(&line.food_id)
                .map(|f| f.name.clone())
                .unwrap_or_default(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        })
        .collect();

    Ok(CartView {
        lines,
        item_count: cart.item_count(),
        totals: totals.into(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "foodies-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Issue an anonymous session id
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.open_anonymous();
    info!(sessions = state.sessions.active(), "Issued anonymous session");
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// List the food catalog
pub async fn list_foods(State(state): State<AppState>) -> Result<Json<Vec<Food>>, ApiError> {
    let catalog = state
        .catalog
        .get(&state.backend)
        .await
        .map_err(cart_error_to_response)?;
    Ok(Json(catalog.foods.clone()))
}

/// Current cart with totals
#[instrument(skip(state, headers))]
pub async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CartView>, ApiError> {
    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;
    Ok(Json(cart_view(&state, &store).await?))
}

/// Add one unit of a food
#[instrument(skip(state, headers))]
pub async fn increase(
    State(state): State<AppState>,
    Path(food_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CartView>, ApiError> {
    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;
    store
        .increase(&food_id, &scope)
        .await
        .map_err(cart_error_to_response)?;
    Ok(Json(cart_view(&state, &store).await?))
}

/// Remove one unit of a food
#[instrument(skip(state, headers))]
pub async fn decrease(
    State(state): State<AppState>,
    Path(food_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CartView>, ApiError> {
    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;
    store
        .decrease(&food_id, &scope)
        .await
        .map_err(cart_error_to_response)?;
    Ok(Json(cart_view(&state, &store).await?))
}

/// Drop a food from the cart entirely
#[instrument(skip(state, headers))]
pub async fn remove_all(
    State(state): State<AppState>,
    Path(food_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RemoveResponse>, ApiError> {
    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;
    let removed = store.remove_all(&food_id);
    Ok(Json(RemoveResponse {
        removed,
        cart: cart_view(&state, &store).await?,
    }))
}

/// Totals only
pub async fn totals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TotalsView>, ApiError> {
    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;
    Ok(Json(cart_view(&state, &store).await?.totals))
}

/// Submit the cart as an order
#[instrument(skip(state, headers, details))]
pub async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(details): Json<DeliveryDetails>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError> {
    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;
    let catalog = state
        .catalog
        .get(&state.backend)
        .await
        .map_err(cart_error_to_response)?;

    let submitter = OrderSubmitter::new(state.backend.clone(), store, state.calculator);
    let placed = submitter
        .submit(&catalog, &details, &scope)
        .await
        .map_err(|e| {
            warn!("Order not placed: {}", e);
            cart_error_to_response(e)
        })?;

    info!(order_id = %placed.order_id, "Redirecting shopper to payment");

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            order_id: placed.order_id,
            approval_url: placed.approval_url,
            amount: placed.amount,
        }),
    ))
}

/// Start a payment for an arbitrary amount
#[instrument(skip(state))]
pub async fn create_payment(
    State(state): State<AppState>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let amount = query
        .amount
        .as_deref()
        .map(str::trim)
        .and_then(|raw| Decimal::from_str(raw).ok())
        .map(Price::new)
        .ok_or_else(|| cart_error_to_response(CartError::InvalidAmount))?;

    let (_guard, scope) = ViewScope::new();
    // Not tied to any cart, so an empty store will do.
    let store = Arc::new(CartStore::new(state.backend.clone()));
    let submitter = OrderSubmitter::new(state.backend.clone(), store, state.calculator);
    let approval_url = submitter
        .start_standalone_payment(amount, &scope)
        .await
        .map_err(cart_error_to_response)?;

    Ok(Json(PaymentResponse { approval_url }))
}

/// Landing page after the payment provider returns the shopper
#[instrument(skip(state, headers))]
pub async fn verify_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VerifyQuery>,
) -> Result<Response, ApiError> {
    let order_id = query.order_id.filter(|id| !id.trim().is_empty());
    let Some(order_id) = order_id else {
        return Ok(Redirect::to("/").into_response());
    };

    let (_guard, scope) = ViewScope::new();
    let store = session_store(&state, &headers, &scope).await?;

    let verifier = PaymentVerifier::enter(state.backend.clone(), store, Some(order_id));
    let settled = verifier.resolve(&scope).await;

    match settled.outcome() {
        Some(outcome) => Ok(Json::<PaymentOutcome>(outcome).into_response()),
        None => Ok(Redirect::to("/").into_response()),
    }
}
