//! Payment model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A captured payment. Exactly one row exists per successfully captured
/// order; the transaction_id is the provider's capture id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub transaction_id: String,
    pub payment_status: String,
    pub paypal_order_id: String,
    pub created_utc: DateTime<Utc>,
}
