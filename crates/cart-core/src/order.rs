//! # Order Types
//!
//! Order snapshot, delivery form and placed-order types for foodies-cart.

use crate::catalog::{Food, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Country pre-selected on the delivery form
pub const DEFAULT_COUNTRY: &str = "ประเทศไทย";

/// Fulfilment status, changed only by the store operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Preparing,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line in the order snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub food_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    /// Line total (unit price × quantity) frozen at submission
    pub price: Price,
}

impl OrderLine {
    /// Snapshot a catalog entry at the given quantity
    pub fn from_food(food: &Food, quantity: u32) -> Self {
        Self {
            food_id: food.id.clone(),
            name: food.name.clone(),
            category: food.category.clone(),
            image_url: food.image_url.clone(),
            description: food.description.clone(),
            quantity,
            price: food.price.times(quantity),
        }
    }
}

/// Delivery form filled in by the shopper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub zip: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Default for DeliveryDetails {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone_number: String::new(),
            address: String::new(),
            country: default_country(),
            province: String::new(),
            zip: String::new(),
        }
    }
}

impl DeliveryDetails {
    /// True when every required field has non-whitespace content
    pub fn is_complete(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.phone_number,
            &self.address,
            &self.country,
            &self.province,
            &self.zip,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    /// Single-line address stored on the order
    pub fn composed_address(&self) -> String {
        format!(
            "{} {}, {}, {}, {}, {}",
            self.first_name.trim(),
            self.last_name.trim(),
            self.address.trim(),
            self.country.trim(),
            self.province.trim(),
            self.zip.trim()
        )
    }
}

/// Body of `POST /api/orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub ordered_items: Vec<OrderLine>,
    pub user_address: String,
    pub phone_number: String,
    pub email: String,
    pub amount: Price,
    pub order_status: OrderStatus,
}

/// An order as the backend reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub ordered_items: Vec<OrderLine>,
    pub amount: Price,
    #[serde(default)]
    pub user_address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    /// Provider page to send the shopper to (only on creation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: String,
    /// Where the caller must navigate next (leaves the application)
    pub approval_url: String,
    pub amount: Price,
    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> DeliveryDetails {
        DeliveryDetails {
            first_name: "Somchai".into(),
            last_name: "Jaidee".into(),
            email: "somchai@example.com".into(),
            phone_number: "+66812345678".into(),
            address: "99 Sukhumvit Rd".into(),
            country: DEFAULT_COUNTRY.into(),
            province: "กรุงเทพมหานคร".into(),
            zip: "10110".into(),
        }
    }

    #[test]
    fn test_delivery_completeness() {
        assert!(filled().is_complete());
        assert!(!DeliveryDetails::default().is_complete());

        let mut blank_zip = filled();
        blank_zip.zip = "   ".into();
        assert!(!blank_zip.is_complete());
    }

    #[test]
    fn test_composed_address() {
        assert_eq!(
            filled().composed_address(),
            "Somchai Jaidee, 99 Sukhumvit Rd, ประเทศไทย, กรุงเทพมหานคร, 10110"
        );
    }

    #[test]
    fn test_order_line_freezes_line_total() {
        let food = Food::new("f1", "Tom Yum", Price::baht(150)).with_category("Soup");
        let line = OrderLine::from_food(&food, 3);

        assert_eq!(line.price, Price::baht(450));
        assert_eq!(line.category, "Soup");
    }

    #[test]
    fn test_order_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"Out for delivery\""
        );
        let status: OrderStatus = serde_json::from_str("\"Preparing\"").unwrap();
        assert_eq!(status, OrderStatus::Preparing);
    }

    #[test]
    fn test_order_response_with_approval_url() {
        let json = r#"{
            "id": "ord_1",
            "userId": "u1",
            "amount": 490.0,
            "paymentStatus": "PENDING",
            "orderStatus": "Preparing",
            "approvalUrl": "https://www.sandbox.paypal.com/checkoutnow?token=EC-1"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();

        assert_eq!(order.id, "ord_1");
        assert_eq!(order.amount, Price::baht(490));
        assert!(order.ordered_items.is_empty());
        assert_eq!(order.payment_status.as_deref(), Some("PENDING"));
        assert!(order.approval_url.is_some());
    }
}
