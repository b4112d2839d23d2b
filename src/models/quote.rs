use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Amounts travel as strings on the wire ("50.00"), never JSON floats.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub delivery_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub restaurant: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub platform_net: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub driver_base: Decimal,
}

/// Immutable pricing snapshot, computed once at order creation and never
/// recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(with = "rust_decimal::serde::str")]
    pub food_subtotal: Decimal,
    pub fees: FeeBreakdown,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_pool: Decimal,
    pub payouts: PayoutBreakdown,
    #[serde(with = "rust_decimal::serde::str")]
    pub customer_total: Decimal,
}
