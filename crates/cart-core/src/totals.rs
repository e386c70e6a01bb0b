//! # Totals
//!
//! Pure order-total arithmetic: subtotal, flat shipping, tax and total.
//! Nothing here is rounded; callers round via [`Price::display`] or
//! [`Price::rounded`] at the edge.

use crate::cart::Cart;
use crate::catalog::{FoodCatalog, Price};
use crate::error::{CartError, CartResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shipping fee and tax rate applied to every non-empty order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Flat delivery fee
    #[serde(default = "default_shipping_fee")]
    pub shipping_fee: Price,

    /// Tax as a fraction of the subtotal (0.10 = 10%)
    #[serde(default = "default_tax_rate", with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
}

fn default_shipping_fee() -> Price {
    Price::baht(50)
}

fn default_tax_rate() -> Decimal {
    Decimal::new(10, 2)
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: default_shipping_fee(),
            tax_rate: default_tax_rate(),
        }
    }
}

impl PricingPolicy {
    /// Load a policy from TOML, falling back to defaults for missing keys
    pub fn from_toml(toml_str: &str) -> CartResult<Self> {
        toml::from_str(toml_str).map_err(|e| CartError::Configuration(e.to_string()))
    }
}

/// A cart line joined with its catalog unit price
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub food_id: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl PricedLine {
    pub fn new(food_id: impl Into<String>, unit_price: Price, quantity: u32) -> Self {
        Self {
            food_id: food_id.into(),
            unit_price,
            quantity,
        }
    }

    /// Unit price times quantity
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Join a cart with catalog prices.
///
/// Foods missing from the catalog are skipped, matching what the shopper sees.
pub fn priced_lines(cart: &Cart, catalog: &FoodCatalog) -> Vec<PricedLine> {
    cart.iter()
        .filter_map(|(food_id, quantity)| {
            catalog
                .unit_price(food_id)
                .map(|price| PricedLine::new(food_id, price, quantity))
        })
        .collect()
}

/// Derived order totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl Totals {
    pub fn is_zero(&self) -> bool {
        self.total.is_zero()
    }
}

/// Computes [`Totals`] under a [`PricingPolicy`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TotalsCalculator {
    policy: PricingPolicy,
}

impl TotalsCalculator {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Compute totals for a set of priced lines
    pub fn compute(&self, lines: &[PricedLine]) -> Totals {
        let subtotal: Price = lines
            .iter()
            .filter(|line| line.quantity > 0)
            .map(PricedLine::line_total)
            .sum();

        if subtotal.is_zero() {
            return Totals::default();
        }

        let shipping = self.policy.shipping_fee;
        let tax = Price::new(subtotal.amount() * self.policy.tax_rate);

        Totals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Price a cart against the catalog and compute its totals
    pub fn compute_for_cart(&self, cart: &Cart, catalog: &FoodCatalog) -> Totals {
        self.compute(&priced_lines(cart, catalog))
    }
}
