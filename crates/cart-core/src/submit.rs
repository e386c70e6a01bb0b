//! # Order Submission
//!
//! Validates the cart and delivery form, snapshots the order and hands the
//! shopper off to the payment provider.

use crate::backend::BoxedBackend;
use crate::catalog::{FoodCatalog, Price};
use crate::error::{CartError, CartResult};
use crate::order::{DeliveryDetails, OrderLine, OrderRequest, OrderStatus, PlacedOrder};
use crate::scope::ViewScope;
use crate::store::CartStore;
use crate::totals::{priced_lines, TotalsCalculator};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Places orders for one cart store
pub struct OrderSubmitter {
    backend: BoxedBackend,
    store: Arc<CartStore>,
    calculator: TotalsCalculator,
}

impl OrderSubmitter {
    pub fn new(backend: BoxedBackend, store: Arc<CartStore>, calculator: TotalsCalculator) -> Self {
        Self {
            backend,
            store,
            calculator,
        }
    }

    /// Build the order request from the current cart without sending it.
    ///
    /// Checks, in order: cart not empty, form complete, token held.
    pub fn prepare(
        &self,
        catalog: &FoodCatalog,
        details: &DeliveryDetails,
    ) -> CartResult<OrderRequest> {
        let cart = self.store.snapshot();
        let lines = priced_lines(&cart, catalog);
        if lines.is_empty() {
            return Err(CartError::EmptyCart);
        }
        if !details.is_complete() {
            return Err(CartError::IncompleteForm);
        }
        if self.store.token().is_none() {
            return Err(CartError::MissingToken);
        }

        let totals = self.calculator.compute(&lines);
        let ordered_items = lines
            .iter()
            .filter_map(|line| {
                catalog
                    .get(&line.food_id)
                    .map(|food| OrderLine::from_food(food, line.quantity))
            })
            .collect();

        Ok(OrderRequest {
            ordered_items,
            user_address: details.composed_address(),
            phone_number: details.phone_number.trim().to_string(),
            email: details.email.trim().to_string(),
            amount: totals.total.rounded(),
            order_status: OrderStatus::Preparing,
        })
    }

    /// Submit the current cart as an order.
    ///
    /// The cart is left untouched whatever happens; it is cleared only once
    /// the payment is verified.
    #[instrument(skip(self, catalog, details, scope))]
    pub async fn submit(
        &self,
        catalog: &FoodCatalog,
        details: &DeliveryDetails,
        scope: &ViewScope,
    ) -> CartResult<PlacedOrder> {
        let request = self.prepare(catalog, details)?;
        let token = self.store.token().ok_or(CartError::MissingToken)?;

        let order = scope
            .run(self.backend.submit_order(&token, &request))
            .await
            .map_err(|e| match e {
                CartError::Cancelled => CartError::Cancelled,
                other => {
                    error!("Order submission failed: {}", other);
                    CartError::SubmissionFailed(other.user_message())
                }
            })?;

        let approval_url = order
            .approval_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                error!(order_id = %order.id, "Order created without an approval URL");
                CartError::SubmissionFailed("No approval URL returned".to_string())
            })?;

        info!(
            order_id = %order.id,
            amount = %request.amount,
            lines = request.ordered_items.len(),
            "Order placed"
        );

        Ok(PlacedOrder {
            order_id: order.id,
            approval_url,
            amount: request.amount,
            placed_at: Utc::now(),
        })
    }

    /// Start a payment that is not tied to a cart; returns the provider URL
    #[instrument(skip(self, scope))]
    pub async fn start_standalone_payment(
        &self,
        amount: Price,
        scope: &ViewScope,
    ) -> CartResult<String> {
        if amount.amount() <= rust_decimal::Decimal::ZERO {
            return Err(CartError::InvalidAmount);
        }

        let url = scope
            .run(self.backend.create_payment(amount.rounded()))
            .await
            .map_err(|e| match e {
                CartError::Cancelled => CartError::Cancelled,
                other => {
                    error!("Payment creation failed: {}", other);
                    CartError::SubmissionFailed(other.user_message())
                }
            })?;

        let url = url.trim().to_string();
        if !url.starts_with("http") {
            error!("Payment service returned an invalid URL");
            return Err(CartError::SubmissionFailed(
                "Invalid payment URL returned".to_string(),
            ));
        }

        info!(amount = %amount, "Standalone payment created");
        Ok(url)
    }
}
