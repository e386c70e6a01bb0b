//! In-memory backend shared by the API tests.

use async_trait::async_trait;
use cart_core::{
    Cart, CartError, CartResult, Food, Order, OrderRequest, PaymentStatusResponse, Price,
    SessionToken, StorefrontBackend,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Backend that keeps carts and orders in memory, keyed by token
#[derive(Default)]
pub struct MemoryBackend {
    pub carts: Mutex<HashMap<String, Cart>>,
    pub orders: Mutex<Vec<OrderRequest>>,
    pub payment_status: Mutex<String>,
    rejected: Mutex<HashSet<String>>,
    cart_fetches: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        *backend.payment_status.lock().unwrap() = "COMPLETED".into();
        backend
    }

    pub fn seed(&self, token: &str, cart: Cart) {
        self.carts.lock().unwrap().insert(token.to_string(), cart);
    }

    /// Cart reads for this token answer 401
    pub fn reject(&self, token: &str) {
        self.rejected.lock().unwrap().insert(token.to_string());
    }

    pub fn accept(&self, token: &str) {
        self.rejected.lock().unwrap().remove(token);
    }

    pub fn cart_fetches(&self) -> usize {
        self.cart_fetches.load(Ordering::SeqCst)
    }

    pub fn cart(&self, token: &str) -> Cart {
        self.carts.lock().unwrap().get(token).cloned().unwrap_or_default()
    }

    fn mutate(&self, token: &SessionToken, food_id: &str, delta: i64) {
        self.carts
            .lock()
            .unwrap()
            .entry(token.as_str().to_string())
            .or_default()
            .apply_delta(food_id, delta);
    }
}

#[async_trait]
impl StorefrontBackend for MemoryBackend {
    async fn fetch_cart(&self, token: &SessionToken) -> CartResult<Cart> {
        self.cart_fetches.fetch_add(1, Ordering::SeqCst);
        if self.rejected.lock().unwrap().contains(token.as_str()) {
            return Err(CartError::Backend {
                status: 401,
                message: "Invalid token".into(),
            });
        }
        Ok(self.cart(token.as_str()))
    }

    async fn add_one(&self, token: &SessionToken, food_id: &str) -> CartResult<()> {
        self.mutate(token, food_id, 1);
        Ok(())
    }

    async fn remove_one(&self, token: &SessionToken, food_id: &str) -> CartResult<()> {
        self.mutate(token, food_id, -1);
        Ok(())
    }

    async fn clear_cart(&self, token: &SessionToken) -> CartResult<()> {
        self.carts.lock().unwrap().remove(token.as_str());
        Ok(())
    }

    async fn submit_order(
        &self,
        _token: &SessionToken,
        order: &OrderRequest,
    ) -> CartResult<Order> {
        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        Ok(Order {
            id: format!("ord_{}", orders.len()),
            ordered_items: order.ordered_items.clone(),
            amount: order.amount,
            user_address: order.user_address.clone(),
            phone_number: order.phone_number.clone(),
            email: order.email.clone(),
            order_status: order.order_status,
            payment_status: Some("PENDING".into()),
            approval_url: Some(format!("https://pay.example/approve/{}", orders.len())),
        })
    }

    async fn payment_status(
        &self,
        _token: &SessionToken,
        order_id: &str,
    ) -> CartResult<PaymentStatusResponse> {
        Ok(PaymentStatusResponse {
            id: order_id.to_string(),
            payment_status: Some(self.payment_status.lock().unwrap().clone()),
        })
    }

    async fn create_payment(&self, amount: Price) -> CartResult<String> {
        Ok(format!("https://pay.example/standalone?amount={}", amount.amount()))
    }

    async fn list_foods(&self) -> CartResult<Vec<Food>> {
        Ok(vec![
            Food::new("f1", "Pad Thai", Price::baht(200)),
            Food::new("f2", "Som Tam", Price::baht(80)),
        ])
    }

    async fn fetch_food(&self, food_id: &str) -> CartResult<Food> {
        Err(CartError::FoodNotFound {
            food_id: food_id.to_string(),
        })
    }
}
