//! Refund handler.

use axum::{extract::State, Json};

use crate::dtos::RefundRequest;
use crate::error::AppError;
use crate::services::checkout::RefundOutcome;
use crate::startup::AppState;

/// Refund part or all of a captured payment.
pub async fn refund(
    State(state): State<AppState>,
    Json(payload): Json<RefundRequest>,
) -> Result<Json<RefundOutcome>, AppError> {
    tracing::info!(
        payment_id = %payload.payment_id,
        user_id = %payload.user_id,
        refund_amount = %payload.refund_amount,
        "Refund requested"
    );

    let outcome = state
        .checkout
        .refund_payment(payload.payment_id, payload.refund_amount, payload.user_id)
        .await?;

    Ok(Json(outcome))
}
