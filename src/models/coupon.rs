//! Coupon model. Coupons are read-only to the checkout flow.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a coupon's discount_value is applied to an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// discount_value is a percentage of the total.
    Percentage,
    /// discount_value is a flat amount.
    Fixed,
}

/// A discount code valid until its expiry timestamp.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Coupon {
    pub coupon_code: String,
    pub discount_value: Decimal,
    pub discount_type: String,
    pub expiry_date: DateTime<Utc>,
}

impl Coupon {
    /// Get parsed discount type.
    pub fn parsed_type(&self) -> Option<DiscountType> {
        match self.discount_type.as_str() {
            "percentage" => Some(DiscountType::Percentage),
            "fixed" => Some(DiscountType::Fixed),
            _ => None,
        }
    }
}
