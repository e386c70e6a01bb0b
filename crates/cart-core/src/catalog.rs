//! # Catalog Types
//!
//! Food catalog types for foodies-cart.
//! The catalog is owned by the backend (`GET /api/foods`); the core only
//! reads names and unit prices from it.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Display symbol for Thai baht, the only currency the storefront prices in
pub const CURRENCY_SYMBOL: &str = "฿";

/// A monetary amount in baht.
///
/// Amounts are exact decimals; rounding to 2 places happens only in
/// [`Price::rounded`] and [`Price::display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero baht
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Create a price from a decimal amount
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole baht
    pub fn baht(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Create a price from satang (1/100 baht)
    pub fn from_satang(amount: i64) -> Self {
        Self(Decimal::new(amount, 2))
    }

    /// Get the exact decimal amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Is this exactly zero?
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a quantity
    pub fn times(&self, quantity: u32) -> Price {
        Price(self.0 * Decimal::from(quantity))
    }

    /// Round half away from zero to 2 decimal places
    pub fn rounded(&self) -> Price {
        Price(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Format for display (e.g., "฿490.00")
    pub fn display(&self) -> String {
        format!("{}{:.2}", CURRENCY_SYMBOL, self.rounded().0)
    }
}

impl std::ops::Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, |acc, p| acc + p)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// A food item in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    /// Backend identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Image reference
    #[serde(default)]
    pub image_url: String,

    /// Unit price
    pub price: Price,

    /// Category label (e.g. "Pizza", "Dessert")
    #[serde(default)]
    pub category: String,
}

impl Food {
    /// Create a food item with the required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image_url: String::new(),
            price,
            category: String::new(),
        }
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

}

/// Read-only view of the backend's food list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodCatalog {
    pub foods: Vec<Food>,
}

impl FoodCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self { foods: Vec::new() }
    }

    /// Add a food to the catalog
    pub fn add(&mut self, food: Food) {
        self.foods.push(food);
    }

    /// Builder: add a food
    pub fn with_food(mut self, food: Food) -> Self {
        self.add(food);
        self
    }

    /// Find a food by ID
    pub fn get(&self, id: &str) -> Option<&Food> {
        self.foods.iter().find(|f| f.id == id)
    }

    /// Unit price for a food, if it is in the catalog
    pub fn unit_price(&self, id: &str) -> Option<Price> {
        self.get(id).map(|f| f.price)
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }
}

impl From<Vec<Food>> for FoodCatalog {
    fn from(foods: Vec<Food>) -> Self {
        Self { foods }
    }
}
