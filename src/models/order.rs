//! Order model and checkout line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single checkout line item as submitted by the client. Prices and
/// quantities are trusted as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub quantity: i32,
    pub price: Decimal,
}

/// An order in the checkout lifecycle.
///
/// paypal_order_id is absent until the provider-side order has been created;
/// payment_status stays absent until capture sets it to "paid".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub billing_id: Uuid,
    pub paypal_order_id: Option<String>,
    pub payment_status: Option<String>,
    pub created_utc: DateTime<Utc>,
}
