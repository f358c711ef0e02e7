//! Refund model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A refund issued against a captured payment. A payment may accumulate
/// several refunds; each one is individually bounded by the payment amount.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Refund {
    pub refund_id: Uuid,
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub refund_amount: Decimal,
    pub refund_status: String,
    pub refund_transaction_id: String,
    pub created_utc: DateTime<Utc>,
}
