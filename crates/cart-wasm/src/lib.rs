//! # cart-wasm
//!
//! WebAssembly bindings for foodies-cart.
//!
//! Lets a browser preview totals and check the delivery form with exactly the
//! arithmetic the server uses:
//! - Subtotal, shipping, tax and total for a list of cart lines
//! - Baht formatting
//! - Delivery form completeness and address composition
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { calculate_totals, format_price } from 'foodies-cart-wasm';
//!
//! await init();
//!
//! const totals = calculate_totals([
//!   { foodId: 'f1', unitPrice: 200, quantity: 2 }
//! ]);
//!
//! console.log('Total:', format_price(totals.total)); // ฿490.00
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use cart_core::{
    DeliveryDetails, PricedLine, PricingPolicy, Price, Totals, TotalsCalculator,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Cart line as sent from JavaScript
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasmCartLine {
    pub food_id: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl From<&WasmCartLine> for PricedLine {
    fn from(line: &WasmCartLine) -> Self {
        PricedLine::new(line.food_id.clone(), line.unit_price, line.quantity)
    }
}

/// Totals under a policy (pure, usable natively)
pub fn totals_for(lines: &[WasmCartLine], policy: PricingPolicy) -> Totals {
    let priced: Vec<PricedLine> = lines.iter().map(PricedLine::from).collect();
    TotalsCalculator::new(policy).compute(&priced)
}

/// Policy from JS numbers; `None` when either value is not a finite, non-negative number
pub fn policy_from(shipping_fee: f64, tax_rate: f64) -> Option<PricingPolicy> {
    let shipping = Decimal::try_from(shipping_fee).ok()?;
    let tax_rate = Decimal::try_from(tax_rate).ok()?;
    if shipping.is_sign_negative() || tax_rate.is_sign_negative() {
        return None;
    }
    Some(PricingPolicy {
        shipping_fee: Price::new(shipping),
        tax_rate,
    })
}

/// Price as shown to the shopper, e.g. `฿490.00`
pub fn display_price(amount: f64) -> String {
    Decimal::try_from(amount)
        .map(|d| Price::new(d).display())
        .unwrap_or_else(|_| Price::ZERO.display())
}

/// Calculate totals with the default policy
#[wasm_bindgen]
pub fn calculate_totals(lines: JsValue) -> Result<JsValue, JsValue> {
    totals_js(lines, PricingPolicy::default())
}

/// Calculate totals with an explicit shipping fee and tax rate
#[wasm_bindgen]
pub fn calculate_totals_with(
    lines: JsValue,
    shipping_fee: f64,
    tax_rate: f64,
) -> Result<JsValue, JsValue> {
    let policy = policy_from(shipping_fee, tax_rate)
        .ok_or_else(|| JsValue::from_str("Invalid pricing policy"))?;
    totals_js(lines, policy)
}

fn totals_js(lines: JsValue, policy: PricingPolicy) -> Result<JsValue, JsValue> {
    let lines: Vec<WasmCartLine> = serde_wasm_bindgen::from_value(lines)
        .map_err(|e| JsValue::from_str(&format!("Invalid cart lines: {}", e)))?;

    serde_wasm_bindgen::to_value(&totals_for(&lines, policy))
        .map_err(|e| JsValue::from_str(&format!("Failed to encode totals: {}", e)))
}

/// Format an amount in baht for display
#[wasm_bindgen]
pub fn format_price(amount: f64) -> String {
    display_price(amount)
}

/// True when every delivery field has content
#[wasm_bindgen]
pub fn is_delivery_complete(details: JsValue) -> Result<bool, JsValue> {
    let details: DeliveryDetails = serde_wasm_bindgen::from_value(details)
        .map_err(|e| JsValue::from_str(&format!("Invalid delivery details: {}", e)))?;
    Ok(details.is_complete())
}

/// Single-line address as it will be stored on the order
#[wasm_bindgen]
pub fn compose_address(details: JsValue) -> Result<String, JsValue> {
    let details: DeliveryDetails = serde_wasm_bindgen::from_value(details)
        .map_err(|e| JsValue::from_str(&format!("Invalid delivery details: {}", e)))?;
    Ok(details.composed_address())
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
