//! PayPal payment provider client.
//!
//! Implements the Orders API (create/capture) and the Payments API refund
//! endpoint, authenticating each call with a fresh client-credentials
//! bearer token.

use crate::config::PayPalConfig;
use crate::error::AppError;
use crate::services::metrics::PROVIDER_REQUEST_DURATION;
use anyhow::anyhow;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// PayPal client for interacting with the PayPal REST API.
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    config: PayPalConfig,
}

/// Bearer token returned by the client-credentials exchange.
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry. Unused: every operation re-authenticates.
    pub expires_in: u64,
}

/// Two-decimal currency value as PayPal represents it on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency_code: String,
    pub value: String,
}

impl CurrencyAmount {
    fn usd(amount: Decimal) -> Self {
        Self {
            currency_code: "USD".to_string(),
            value: format!("{:.2}", amount.round_dp(2)),
        }
    }
}

/// Request to create a PayPal order with capture intent.
#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    intent: String,
    purchase_units: Vec<PurchaseUnitRequest>,
    application_context: ApplicationContext,
}

#[derive(Debug, Serialize)]
struct PurchaseUnitRequest {
    amount: CurrencyAmount,
}

#[derive(Debug, Serialize)]
struct ApplicationContext {
    return_url: String,
    cancel_url: String,
    user_action: String,
    brand_name: String,
}

/// HATEOAS link from a PayPal response.
#[derive(Debug, Deserialize)]
pub struct PayPalLink {
    pub href: String,
    pub rel: String,
}

/// Response from PayPal order creation.
#[derive(Debug, Deserialize)]
pub struct PayPalOrder {
    /// PayPal order ID.
    pub id: String,
    /// Order status (CREATED, APPROVED, COMPLETED, ...).
    pub status: String,
    /// Link collection; the "approve" link is where the buyer is sent.
    #[serde(default)]
    pub links: Vec<PayPalLink>,
}

/// A freshly created provider order plus the buyer approval URL.
#[derive(Debug)]
pub struct CreatedOrder {
    pub id: String,
    pub approval_url: String,
}

/// Response from capturing an approved order.
#[derive(Debug, Deserialize)]
struct OrderCaptureResponse {
    status: Option<String>,
    #[serde(default)]
    purchase_units: Vec<CapturedPurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct CapturedPurchaseUnit {
    payments: Option<UnitPayments>,
}

#[derive(Debug, Deserialize)]
struct UnitPayments {
    #[serde(default)]
    captures: Vec<CaptureRecord>,
}

#[derive(Debug, Deserialize)]
struct CaptureRecord {
    id: String,
    status: Option<String>,
    amount: CurrencyAmount,
}

/// The capture record extracted from a successful capture call.
#[derive(Debug)]
pub struct CapturedPayment {
    /// Provider transaction id of the capture.
    pub transaction_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
struct RefundRequest {
    amount: CurrencyAmount,
}

/// Response from refunding a capture.
#[derive(Debug, Deserialize)]
pub struct RefundResult {
    /// Provider refund transaction id.
    pub id: String,
    /// Refund status (COMPLETED, PENDING, ...).
    pub status: String,
}

/// PayPal API error response.
#[derive(Debug, Deserialize)]
struct PayPalError {
    name: String,
    message: String,
}

impl PayPalClient {
    /// Create a new PayPal client.
    pub fn new(config: PayPalConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if PayPal is configured (credentials are set).
    pub fn is_configured(&self) -> bool {
        !self.config.client_id.is_empty() && !self.config.client_secret.expose_secret().is_empty()
    }

    /// Exchange client credentials for a short-lived bearer token.
    ///
    /// Tokens are not cached: each lifecycle operation authenticates anew.
    pub async fn authenticate(&self) -> Result<AccessToken, AppError> {
        if !self.is_configured() {
            return Err(AppError::Auth(anyhow!("PayPal credentials not configured")));
        }

        let timer = PROVIDER_REQUEST_DURATION
            .with_label_values(&["token"])
            .start_timer();

        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::Auth(anyhow!("Token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Auth(anyhow!("Failed to read token response: {}", e)))?;

        timer.observe_duration();

        if !status.is_success() {
            tracing::error!(status = %status, "PayPal token request rejected");
            return Err(AppError::Auth(self.provider_error(&status, &body)));
        }

        let token: AccessToken = serde_json::from_str(&body)
            .map_err(|e| AppError::Auth(anyhow!("Malformed token response: {}", e)))?;

        tracing::debug!(token_type = %token.token_type, expires_in = token.expires_in, "PayPal access token issued");

        Ok(token)
    }

    /// Create a capture-intent order for the given two-decimal amount.
    ///
    /// Returns the provider order id and the approval URL the buyer must be
    /// redirected to.
    pub async fn create_order(
        &self,
        amount: Decimal,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<CreatedOrder, AppError> {
        let token = self.authenticate().await?;

        let request = CreateOrderRequest {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![PurchaseUnitRequest {
                amount: CurrencyAmount::usd(amount),
            }],
            application_context: ApplicationContext {
                return_url: return_url.to_string(),
                cancel_url: cancel_url.to_string(),
                user_action: "PAY_NOW".to_string(),
                brand_name: "Checkout".to_string(),
            },
        };

        let timer = PROVIDER_REQUEST_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let url = format!("{}/v2/checkout/orders", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::RemoteOrder(anyhow!("Order request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::RemoteOrder(anyhow!("Failed to read order response: {}", e)))?;

        timer.observe_duration();

        tracing::debug!(status = %status, body = %body, "PayPal create_order response");

        if !status.is_success() {
            tracing::error!(status = %status, "PayPal order creation failed");
            return Err(AppError::RemoteOrder(self.provider_error(&status, &body)));
        }

        let order: PayPalOrder = serde_json::from_str(&body)
            .map_err(|e| AppError::RemoteOrder(anyhow!("Malformed order response: {}", e)))?;

        let approval_url = order
            .links
            .iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href.clone())
            .ok_or_else(|| {
                AppError::RemoteOrder(anyhow!("Order response contains no approval link"))
            })?;

        tracing::info!(
            paypal_order_id = %order.id,
            order_status = %order.status,
            "PayPal order created"
        );

        Ok(CreatedOrder {
            id: order.id,
            approval_url,
        })
    }

    /// Capture a previously approved order.
    ///
    /// The capture record is the first capture of the first purchase unit;
    /// a response without one is treated as a capture failure.
    pub async fn capture_order(&self, paypal_order_id: &str) -> Result<CapturedPayment, AppError> {
        let token = self.authenticate().await?;

        let timer = PROVIDER_REQUEST_DURATION
            .with_label_values(&["capture"])
            .start_timer();

        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.api_base_url, paypal_order_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AppError::Capture(anyhow!("Capture request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Capture(anyhow!("Failed to read capture response: {}", e))
        })?;

        timer.observe_duration();

        tracing::debug!(status = %status, body = %body, "PayPal capture response");

        if !status.is_success() {
            tracing::error!(status = %status, paypal_order_id = %paypal_order_id, "PayPal capture failed");
            return Err(AppError::Capture(self.provider_error(&status, &body)));
        }

        let captured: OrderCaptureResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Capture(anyhow!("Malformed capture response: {}", e)))?;

        let record = captured
            .purchase_units
            .first()
            .and_then(|unit| unit.payments.as_ref())
            .and_then(|payments| payments.captures.first())
            .ok_or_else(|| {
                AppError::Capture(anyhow!("Capture response contains no capture record"))
            })?;

        let amount = Decimal::from_str(&record.amount.value).map_err(|e| {
            AppError::Capture(anyhow!(
                "Unparseable capture amount '{}': {}",
                record.amount.value,
                e
            ))
        })?;

        tracing::info!(
            paypal_order_id = %paypal_order_id,
            transaction_id = %record.id,
            amount = %amount,
            capture_status = record.status.as_deref().unwrap_or("unknown"),
            order_status = captured.status.as_deref().unwrap_or("unknown"),
            "PayPal payment captured"
        );

        Ok(CapturedPayment {
            transaction_id: record.id.clone(),
            amount,
        })
    }

    /// Refund a captured transaction, partially or in full.
    pub async fn refund_capture(
        &self,
        transaction_id: &str,
        amount: Decimal,
    ) -> Result<RefundResult, AppError> {
        let token = self.authenticate().await?;

        let request = RefundRequest {
            amount: CurrencyAmount::usd(amount),
        };

        let timer = PROVIDER_REQUEST_DURATION
            .with_label_values(&["refund"])
            .start_timer();

        let url = format!(
            "{}/v2/payments/captures/{}/refund",
            self.config.api_base_url, transaction_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Refund(anyhow!("Refund request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Refund(anyhow!("Failed to read refund response: {}", e)))?;

        timer.observe_duration();

        tracing::debug!(status = %status, body = %body, "PayPal refund response");

        if !status.is_success() {
            tracing::error!(status = %status, transaction_id = %transaction_id, "PayPal refund failed");
            return Err(AppError::Refund(self.provider_error(&status, &body)));
        }

        let refund: RefundResult = serde_json::from_str(&body)
            .map_err(|e| AppError::Refund(anyhow!("Malformed refund response: {}", e)))?;

        tracing::info!(
            transaction_id = %transaction_id,
            refund_transaction_id = %refund.id,
            refund_status = %refund.status,
            "PayPal refund processed"
        );

        Ok(refund)
    }

    fn provider_error(&self, status: &reqwest::StatusCode, body: &str) -> anyhow::Error {
        match serde_json::from_str::<PayPalError>(body) {
            Ok(err) => anyhow!("PayPal error {}: {} - {}", status, err.name, err.message),
            Err(_) => anyhow!("PayPal error {}: {}", status, body),
        }
    }
}
