//! # Cart Types
//!
//! The quantity mapping a shopper builds while browsing.
//! A `Cart` never stores a zero quantity: an absent key means zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (food id, quantity) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub food_id: String,
    pub quantity: u32,
}

/// Food id to quantity mapping for a single session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: BTreeMap<String, u32>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from backend items, dropping zero quantities.
    ///
    /// The backend's decrement leaves `foodId: 0` entries behind.
    pub fn from_items<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        Self {
            items: items
                .into_iter()
                .filter(|(_, qty)| *qty > 0)
                .map(|(id, qty)| (id.into(), qty))
                .collect(),
        }
    }

    /// Quantity for a food id (0 when absent)
    pub fn quantity(&self, food_id: &str) -> u32 {
        self.items.get(food_id).copied().unwrap_or(0)
    }

    /// Apply a signed delta, flooring at zero and removing emptied keys.
    ///
    /// Returns true if the stored quantity changed.
    pub fn apply_delta(&mut self, food_id: &str, delta: i64) -> bool {
        let current = i64::from(self.quantity(food_id));
        let next = (current + delta).clamp(0, i64::from(u32::MAX));
        if next == current {
            return false;
        }
        if next == 0 {
            self.items.remove(food_id);
        } else {
            // next is within u32 range after the clamp
            self.items.insert(food_id.to_string(), next as u32);
        }
        true
    }

    /// Remove a food entirely, returning the quantity it had
    pub fn remove(&mut self, food_id: &str) -> u32 {
        self.items.remove(food_id).unwrap_or(0)
    }

    /// Lines in food id order
    pub fn lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|(food_id, quantity)| CartLine {
                food_id: food_id.clone(),
                quantity: *quantity,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    /// Total units across all lines
    pub fn item_count(&self) -> u32 {
        self.items.values().sum()
    }

    /// Number of distinct foods
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
