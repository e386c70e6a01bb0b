//! In-memory backend shared by the core unit tests.

use crate::backend::{SessionToken, StorefrontBackend};
use crate::cart::Cart;
use crate::catalog::{Food, Price};
use crate::error::{CartError, CartResult};
use crate::order::{Order, OrderRequest};
use crate::payment::PaymentStatusResponse;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct Inner {
    cart: Cart,
    foods: Vec<Food>,
    failures: VecDeque<String>,
    failing_calls: HashSet<String>,
    log: Vec<String>,
    in_flight: HashMap<String, usize>,
    max_in_flight: HashMap<String, usize>,
    submitted: Vec<OrderRequest>,
    approval_url: Option<String>,
    payment_status: Option<String>,
    payment_url: String,
}

pub struct FakeBackend {
    inner: Mutex<Inner>,
    delay: Option<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                approval_url: Some("https://pay.example/approve?token=EC-1".into()),
                payment_status: Some("COMPLETED".into()),
                payment_url: "https://pay.example/checkout/abc".into(),
                ..Inner::default()
            }),
            delay: None,
        }
    }

    pub fn with_cart<const N: usize>(self, items: [(&str, u32); N]) -> Self {
        self.inner.lock().unwrap().cart = Cart::from_items(items);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_approval_url(self, url: Option<&str>) -> Self {
        self.inner.lock().unwrap().approval_url = url.map(str::to_string);
        self
    }

    pub fn with_payment_status(self, status: Option<&str>) -> Self {
        self.inner.lock().unwrap().payment_status = status.map(str::to_string);
        self
    }

    pub fn with_payment_url(self, url: &str) -> Self {
        self.inner.lock().unwrap().payment_url = url.to_string();
        self
    }

    /// The next backend call fails with a network error
    pub fn fail_next(&self, message: &str) {
        self.inner.lock().unwrap().failures.push_back(message.to_string());
    }

    /// Every call with this name fails with a backend error
    pub fn fail_calls(&self, call: &str) {
        self.inner.lock().unwrap().failing_calls.insert(call.to_string());
    }

    pub fn cart(&self) -> Cart {
        self.inner.lock().unwrap().cart.clone()
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().log.len()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.inner.lock().unwrap().log.clone()
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.inner.lock().unwrap().submitted.clone()
    }

    pub fn max_in_flight(&self, food_id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .max_in_flight
            .get(food_id)
            .copied()
            .unwrap_or(0)
    }

    fn begin(&self, call: &str) -> CartResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(call.to_string());
        if inner.failing_calls.contains(call) {
            return Err(CartError::Backend {
                status: 500,
                message: format!("{call} failed"),
            });
        }
        match inner.failures.pop_front() {
            Some(message) => Err(CartError::Network(message)),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn mutate(&self, call: &str, food_id: &str, delta: i64) -> CartResult<()> {
        self.begin(call)?;
        {
            let mut inner = self.inner.lock().unwrap();
            let now = {
                let count = inner.in_flight.entry(food_id.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            let max = inner.max_in_flight.entry(food_id.to_string()).or_insert(0);
            *max = (*max).max(now);
        }
        self.pause().await;
        let mut inner = self.inner.lock().unwrap();
        if let Some(count) = inner.in_flight.get_mut(food_id) {
            *count -= 1;
        }
        inner.cart.apply_delta(food_id, delta);
        Ok(())
    }
}

#[async_trait]
impl StorefrontBackend for FakeBackend {
    async fn fetch_cart(&self, _token: &SessionToken) -> CartResult<Cart> {
        self.begin("fetch_cart")?;
        self.pause().await;
        Ok(self.cart())
    }

    async fn add_one(&self, _token: &SessionToken, food_id: &str) -> CartResult<()> {
        self.mutate("add_one", food_id, 1).await
    }

    async fn remove_one(&self, _token: &SessionToken, food_id: &str) -> CartResult<()> {
        self.mutate("remove_one", food_id, -1).await
    }

    async fn clear_cart(&self, _token: &SessionToken) -> CartResult<()> {
        self.begin("clear_cart")?;
        self.pause().await;
        self.inner.lock().unwrap().cart = Cart::new();
        Ok(())
    }

    async fn submit_order(&self, _token: &SessionToken, order: &OrderRequest) -> CartResult<Order> {
        self.begin("submit_order")?;
        self.pause().await;
        let mut inner = self.inner.lock().unwrap();
        inner.submitted.push(order.clone());
        Ok(Order {
            id: format!("ord_{}", inner.submitted.len()),
            ordered_items: order.ordered_items.clone(),
            amount: order.amount,
            user_address: order.user_address.clone(),
            phone_number: order.phone_number.clone(),
            email: order.email.clone(),
            order_status: order.order_status,
            payment_status: Some("PENDING".into()),
            approval_url: inner.approval_url.clone(),
        })
    }

    async fn payment_status(
        &self,
        _token: &SessionToken,
        order_id: &str,
    ) -> CartResult<PaymentStatusResponse> {
        self.begin("payment_status")?;
        self.pause().await;
        Ok(PaymentStatusResponse {
            id: order_id.to_string(),
            payment_status: self.inner.lock().unwrap().payment_status.clone(),
        })
    }

    async fn create_payment(&self, _amount: Price) -> CartResult<String> {
        self.begin("create_payment")?;
        self.pause().await;
        Ok(self.inner.lock().unwrap().payment_url.clone())
    }

    async fn list_foods(&self) -> CartResult<Vec<Food>> {
        self.begin("list_foods")?;
        Ok(self.inner.lock().unwrap().foods.clone())
    }

    async fn fetch_food(&self, food_id: &str) -> CartResult<Food> {
        self.begin("fetch_food")?;
        self.inner
            .lock()
            .unwrap()
            .foods
            .iter()
            .find(|f| f.id == food_id)
            .cloned()
            .ok_or_else(|| CartError::FoodNotFound {
                food_id: food_id.to_string(),
            })
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}
