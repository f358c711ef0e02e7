//! Order lifecycle service.
//!
//! The three checkout operations (create, capture, refund) each wrap their
//! local writes and one remote provider call in a single database
//! transaction. Local writes roll back on any failure; the provider-side
//! effect of an already-issued remote call is not compensated.

use crate::error::AppError;
use crate::models::{BillingDetails, Coupon, DiscountType, Order, OrderItem, Payment, Refund};
use crate::services::database::Database;
use crate::services::metrics::{
    DB_QUERY_DURATION, ORDERS_CREATED_TOTAL, PAYMENTS_CAPTURED_TOTAL, REFUNDS_TOTAL,
};
use crate::services::paypal::PayPalClient;
use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// Input for creating a checkout order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub coupon_code: Option<String>,
    pub billing: BillingDetails,
}

/// Result of order creation: where to send the buyer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
    pub order_id: Uuid,
    pub paypal_order_id: String,
    pub approval_url: String,
}

/// Result of a capture.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub success: bool,
    pub message: String,
}

/// Result of a refund.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    pub success: bool,
    pub message: String,
    pub refund_transaction_id: String,
}

/// Sum of quantity × price over all items, before any discount.
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| Decimal::from(item.quantity) * item.price)
        .sum()
}

/// Apply a single coupon to a total. Percentage coupons take a fraction of
/// the total, fixed coupons a flat amount. The result is not floored at
/// zero.
pub fn apply_coupon(total: Decimal, coupon: &Coupon) -> Decimal {
    match coupon.parsed_type() {
        Some(DiscountType::Percentage) => {
            total - total * coupon.discount_value / Decimal::ONE_HUNDRED
        }
        Some(DiscountType::Fixed) => total - coupon.discount_value,
        None => total,
    }
}

/// Orchestrates the order-payment lifecycle against the database and the
/// payment provider. Both collaborators are injected at construction.
#[derive(Clone)]
pub struct CheckoutService {
    db: Database,
    paypal: PayPalClient,
    return_url: String,
    cancel_url: String,
}

impl CheckoutService {
    pub fn new(db: Database, paypal: PayPalClient, public_base_url: &str) -> Self {
        Self {
            db,
            paypal,
            return_url: format!("{}/complete-order", public_base_url),
            cancel_url: format!("{}/cancel-order", public_base_url),
        }
    }

    /// Create an order in one transaction: compute the total, snapshot
    /// billing, create the provider-side order, and record its id.
    ///
    /// The provider order is created mid-transaction; if the final local
    /// write fails, the local rows roll back but the provider order
    /// remains (accepted inconsistency window).
    #[instrument(skip(self, input), fields(user_id = %input.user_id, item_count = input.items.len()))]
    pub async fn create_order(&self, input: CreateOrder) -> Result<CheckoutRedirect, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::Database(anyhow!("Failed to begin transaction: {}", e))
        })?;

        let user: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM users WHERE user_id = $1")
            .bind(input.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to look up user: {}", e)))?;

        if user.is_none() {
            return Err(AppError::NotFound(anyhow!(
                "User {} does not exist",
                input.user_id
            )));
        }

        let mut total = order_total(&input.items);

        // At most one coupon applies; an unknown or expired code is ignored.
        if let Some(code) = input.coupon_code.as_deref() {
            let coupon: Option<Coupon> = sqlx::query_as(
                r#"
                SELECT coupon_code, discount_value, discount_type, expiry_date
                FROM coupons
                WHERE coupon_code = $1 AND expiry_date > NOW()
                "#,
            )
            .bind(code)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to look up coupon: {}", e)))?;

            if let Some(coupon) = coupon {
                total = apply_coupon(total, &coupon);
                tracing::debug!(coupon_code = %coupon.coupon_code, total = %total, "Coupon applied");
            }
        }

        let billing_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO billing (billing_id, user_id, full_name, email, phone,
                address_line_1, address_line_2, city, state, postal_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING billing_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(&input.billing.full_name)
        .bind(&input.billing.email)
        .bind(&input.billing.phone)
        .bind(&input.billing.address_line_1)
        .bind(&input.billing.address_line_2)
        .bind(&input.billing.city)
        .bind(&input.billing.state)
        .bind(&input.billing.postal_code)
        .bind(&input.billing.country)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to insert billing: {}", e)))?;

        let order_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO orders (order_id, user_id, total_amount, coupon_code, billing_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING order_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(total)
        .bind(&input.coupon_code)
        .bind(billing_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to insert order: {}", e)))?;

        let created = self
            .paypal
            .create_order(total, &self.return_url, &self.cancel_url)
            .await?;

        sqlx::query("UPDATE orders SET paypal_order_id = $1 WHERE order_id = $2")
            .bind(&created.id)
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::Database(anyhow!("Failed to record provider order id: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::Database(anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        ORDERS_CREATED_TOTAL.with_label_values(&["ok"]).inc();

        info!(
            order_id = %order_id,
            paypal_order_id = %created.id,
            total_amount = %total,
            "Order created"
        );

        Ok(CheckoutRedirect {
            order_id,
            paypal_order_id: created.id,
            approval_url: created.approval_url,
        })
    }

    /// Capture an approved provider order and mark the local order paid.
    ///
    /// The remote capture has already happened by the time local writes
    /// run; a local failure afterwards leaves the same inconsistency
    /// window as create.
    #[instrument(skip(self), fields(paypal_order_id = %paypal_order_id, user_id = %user_id))]
    pub async fn capture_payment(
        &self,
        paypal_order_id: &str,
        user_id: Uuid,
    ) -> Result<CaptureOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["capture_payment"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::Database(anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order: Option<Order> = sqlx::query_as(
            r#"
            SELECT order_id, user_id, total_amount, coupon_code, billing_id,
                   paypal_order_id, payment_status, created_utc
            FROM orders
            WHERE paypal_order_id = $1
            "#,
        )
        .bind(paypal_order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to look up order: {}", e)))?;

        let order = order.ok_or_else(|| {
            AppError::NotFound(anyhow!(
                "Order not found for PayPal order {}",
                paypal_order_id
            ))
        })?;

        let captured = self.paypal.capture_order(paypal_order_id).await?;

        sqlx::query("UPDATE orders SET payment_status = $1 WHERE order_id = $2")
            .bind("paid")
            .bind(order.order_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to mark order paid: {}", e)))?;

        let payment: Payment = sqlx::query_as(
            r#"
            INSERT INTO payments (payment_id, user_id, order_id, amount,
                transaction_id, payment_status, paypal_order_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING payment_id, user_id, order_id, amount, transaction_id,
                      payment_status, paypal_order_id, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(order.order_id)
        .bind(captured.amount)
        .bind(&captured.transaction_id)
        .bind("paid")
        .bind(paypal_order_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to insert payment: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::Database(anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        PAYMENTS_CAPTURED_TOTAL.with_label_values(&["ok"]).inc();

        info!(
            order_id = %order.order_id,
            payment_id = %payment.payment_id,
            transaction_id = %payment.transaction_id,
            amount = %payment.amount,
            "Payment captured"
        );

        Ok(CaptureOutcome {
            success: true,
            message: "Payment captured successfully".to_string(),
        })
    }

    /// Refund part or all of a captured payment.
    #[instrument(skip(self), fields(payment_id = %payment_id, user_id = %user_id, refund_amount = %refund_amount))]
    pub async fn refund_payment(
        &self,
        payment_id: Uuid,
        refund_amount: Decimal,
        user_id: Uuid,
    ) -> Result<RefundOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["refund_payment"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::Database(anyhow!("Failed to begin transaction: {}", e))
        })?;

        let payment: Option<Payment> = sqlx::query_as(
            r#"
            SELECT payment_id, user_id, order_id, amount, transaction_id,
                   payment_status, paypal_order_id, created_utc
            FROM payments
            WHERE payment_id = $1 AND user_id = $2
            "#,
        )
        .bind(payment_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to look up payment: {}", e)))?;

        let payment = payment.ok_or_else(|| {
            AppError::NotFound(anyhow!("Payment not found or does not belong to the user"))
        })?;

        if refund_amount > payment.amount {
            return Err(AppError::InvalidAmount(anyhow!(
                "Refund amount {} exceeds the original payment amount {}",
                refund_amount,
                payment.amount
            )));
        }

        let refunded = self
            .paypal
            .refund_capture(&payment.transaction_id, refund_amount)
            .await?;

        let refund: Refund = sqlx::query_as(
            r#"
            INSERT INTO refunds (refund_id, payment_id, user_id, refund_amount,
                refund_status, refund_transaction_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING refund_id, payment_id, user_id, refund_amount,
                      refund_status, refund_transaction_id, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payment.payment_id)
        .bind(user_id)
        .bind(refund_amount)
        .bind(&refunded.status)
        .bind(&refunded.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to insert refund: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::Database(anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        REFUNDS_TOTAL.with_label_values(&["ok"]).inc();

        info!(
            payment_id = %payment.payment_id,
            refund_id = %refund.refund_id,
            refund_transaction_id = %refund.refund_transaction_id,
            refund_amount = %refund.refund_amount,
            refund_status = %refund.refund_status,
            "Refund processed"
        );

        Ok(RefundOutcome {
            success: true,
            message: "Refund processed successfully".to_string(),
            refund_transaction_id: refund.refund_transaction_id,
        })
    }
}
