//! Checkout order handlers: payment creation, capture after approval, and
//! buyer cancellation.

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect},
};
use validator::Validate;

use crate::dtos::{CompleteOrderParams, PayRequest};
use crate::error::AppError;
use crate::models::{BillingDetails, OrderItem};
use crate::services::checkout::CreateOrder;
use crate::startup::AppState;

/// Landing route; also the target of the cancel redirect. The buyer-facing
/// storefront lives elsewhere.
pub async fn index() -> impl IntoResponse {
    "checkout-service"
}

/// Create an order and redirect the buyer to the provider approval URL.
pub async fn pay(
    State(state): State<AppState>,
    Form(payload): Form<PayRequest>,
) -> Result<Redirect, AppError> {
    let items: Vec<OrderItem> = serde_json::from_str(&payload.items)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Malformed items payload: {}", e)))?;

    let billing: BillingDetails = serde_json::from_str(&payload.billing_details).map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Malformed billing details payload: {}", e))
    })?;
    billing.validate()?;

    // A blank form field means no coupon.
    let coupon_code = payload.coupon_code.filter(|code| !code.is_empty());

    tracing::info!(
        user_id = %payload.user_id,
        item_count = items.len(),
        coupon = coupon_code.as_deref().unwrap_or("-"),
        "Starting checkout"
    );

    let redirect = state
        .checkout
        .create_order(CreateOrder {
            user_id: payload.user_id,
            items,
            coupon_code,
            billing,
        })
        .await?;

    Ok(Redirect::to(&redirect.approval_url))
}

/// Capture a payment after the buyer approved it at the provider.
pub async fn complete_order(
    State(state): State<AppState>,
    Query(params): Query<CompleteOrderParams>,
) -> Result<String, AppError> {
    let outcome = state
        .checkout
        .capture_payment(&params.token, params.user_id)
        .await?;

    Ok(outcome.message)
}

/// The buyer backed out at the provider; send them home.
pub async fn cancel_order() -> Redirect {
    Redirect::to("/")
}
