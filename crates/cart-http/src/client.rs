//! # Foodies REST Client
//!
//! [`StorefrontBackend`] over the foodies REST API using reqwest.

use crate::config::BackendConfig;
use async_trait::async_trait;
use cart_core::{
    Cart, CartError, CartResult, Food, Order, OrderRequest, PaymentStatusResponse, Price,
    SessionToken, StorefrontBackend,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

/// HTTP implementation of the storefront backend
#[derive(Debug, Clone)]
pub struct HttpStorefrontBackend {
    config: BackendConfig,
    client: Client,
}

impl HttpStorefrontBackend {
    /// Create a backend client with the configured timeout
    pub fn new(config: BackendConfig) -> CartResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CartError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CartResult<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, request: RequestBuilder) -> CartResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Foodies API error: status={}, body={}", status, body);

            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or(body);

            return Err(CartError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> CartResult<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            CartError::Serialization(format!("Failed to parse Foodies API response: {}", e))
        })
    }
}

#[async_trait]
impl StorefrontBackend for HttpStorefrontBackend {
    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &SessionToken) -> CartResult<Cart> {
        let request = self
            .client
            .get(self.config.url("/api/cart"))
            .header("Authorization", token.bearer());

        let cart: CartResponse = self.send_json(request).await?;
        debug!(cart_id = ?cart.id, lines = cart.items.len(), "Fetched cart");

        Ok(Cart::from_items(cart.items.into_iter().filter_map(
            |(food_id, qty)| u32::try_from(qty).ok().map(|qty| (food_id, qty)),
        )))
    }

    #[instrument(skip(self, token))]
    async fn add_one(&self, token: &SessionToken, food_id: &str) -> CartResult<()> {
        let request = self
            .client
            .post(self.config.url("/api/cart"))
            .header("Authorization", token.bearer())
            .json(&CartItemRequest { food_id });

        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn remove_one(&self, token: &SessionToken, food_id: &str) -> CartResult<()> {
        let request = self
            .client
            .post(self.config.url(&self.config.cart_remove_path))
            .header("Authorization", token.bearer())
            .json(&CartItemRequest { food_id });

        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn clear_cart(&self, token: &SessionToken) -> CartResult<()> {
        let request = self
            .client
            .delete(self.config.url("/api/cart"))
            .header("Authorization", token.bearer());

        self.send(request).await?;
        info!("Cleared backend cart");
        Ok(())
    }

    #[instrument(skip(self, token, order), fields(amount = %order.amount))]
    async fn submit_order(&self, token: &SessionToken, order: &OrderRequest) -> CartResult<Order> {
        let request = self
            .client
            .post(self.config.url("/api/orders"))
            .header("Authorization", token.bearer())
            .json(order);

        let created: Order = self.send_json(request).await?;
        info!(order_id = %created.id, "Created order");
        Ok(created)
    }

    #[instrument(skip(self, token))]
    async fn payment_status(
        &self,
        token: &SessionToken,
        order_id: &str,
    ) -> CartResult<PaymentStatusResponse> {
        let request = self
            .client
            .get(self.config.url(&format!("/api/orders/payment/status/{order_id}")))
            .header("Authorization", token.bearer());

        self.send_json(request).await
    }

    #[instrument(skip(self))]
    async fn create_payment(&self, amount: Price) -> CartResult<String> {
        let request = self
            .client
            .post(self.config.url("/api/payment/create"))
            .query(&[("amount", format!("{:.2}", amount.amount()))]);

        let url = self.send(request).await?;
        Ok(url.trim().to_string())
    }

    #[instrument(skip(self))]
    async fn list_foods(&self) -> CartResult<Vec<Food>> {
        let foods: Vec<Food> = self
            .send_json(self.client.get(self.config.url("/api/foods")))
            .await?;
        debug!(count = foods.len(), "Fetched catalog");
        Ok(foods)
    }

    #[instrument(skip(self))]
    async fn fetch_food(&self, food_id: &str) -> CartResult<Food> {
        let request = self
            .client
            .get(self.config.url(&format!("/api/foods/{food_id}")));

        self.send_json(request).await.map_err(|e| match e {
            CartError::Backend { status: 404, .. } => CartError::FoodNotFound {
                food_id: food_id.to_string(),
            },
            other => other,
        })
    }
}

// =============================================================================
// Foodies API Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartItemRequest<'a> {
    food_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    items: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}
