//! Request DTOs for the checkout HTTP surface.
//!
//! Field names match the original form/query contract: camelCase at the
//! top level, with items and billingDetails arriving JSON-encoded inside
//! the form body.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Form body of POST /pay.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub user_id: Uuid,
    /// JSON-encoded array of {quantity, price}.
    pub items: String,
    pub coupon_code: Option<String>,
    /// JSON-encoded billing details object.
    pub billing_details: String,
}

/// Query string of GET /complete-order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderParams {
    /// The provider order id, handed back by the approval redirect.
    pub token: String,
    pub user_id: Uuid,
}

/// JSON body of POST /refund.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub payment_id: Uuid,
    pub refund_amount: Decimal,
    pub user_id: Uuid,
}
