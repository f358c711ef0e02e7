//! Common test utilities for checkout-service integration tests.
#![allow(dead_code)]

use checkout_service::config::{Config, DatabaseConfig, PayPalConfig, ServerConfig};
use checkout_service::startup::Application;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Once;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,checkout_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub pool: PgPool,
    pub paypal: MockServer,
    /// Client with redirects disabled so approval redirects can be asserted.
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a test application on a random port, backed by a wiremock
    /// stand-in for the payment provider.
    pub async fn spawn() -> Self {
        init_tracing();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set to run integration tests");

        let paypal = MockServer::start().await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(database_url.clone()),
                max_connections: 2,
                min_connections: 1,
            },
            paypal: PayPalConfig {
                client_id: "test_client_id".to_string(),
                client_secret: Secret::new("test_client_secret".to_string()),
                api_base_url: paypal.uri(),
            },
            public_base_url: "http://localhost:3000".to_string(),
            service_name: "checkout-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint.
        let probe = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if probe.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("Failed to connect assertion pool");

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build test client");

        TestApp {
            address,
            port,
            pool,
            paypal,
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Insert a user and return its id.
    pub async fn seed_user(&self) -> Uuid {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (user_id, email, full_name) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(format!("{}@example.com", user_id))
            .bind("Test Buyer")
            .execute(&self.pool)
            .await
            .expect("Failed to seed user");
        user_id
    }

    /// Insert a coupon expiring the given number of days from now
    /// (negative for an already-expired coupon).
    pub async fn seed_coupon(
        &self,
        code: &str,
        discount_value: Decimal,
        discount_type: &str,
        expires_in_days: i64,
    ) {
        sqlx::query(
            r#"
            INSERT INTO coupons (coupon_code, discount_value, discount_type, expiry_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (coupon_code) DO UPDATE
            SET discount_value = $2, discount_type = $3, expiry_date = $4
            "#,
        )
        .bind(code)
        .bind(discount_value)
        .bind(discount_type)
        .bind(Utc::now() + Duration::days(expires_in_days))
        .execute(&self.pool)
        .await
        .expect("Failed to seed coupon");
    }

    /// Insert a full user→billing→order→payment chain and return
    /// (user_id, payment_id, transaction_id).
    pub async fn seed_paid_payment(&self, amount: Decimal) -> (Uuid, Uuid, String) {
        let user_id = self.seed_user().await;
        let billing_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let payment_id = Uuid::new_v4();
        let paypal_order_id = format!("PAYPAL-{}", Uuid::new_v4());
        let transaction_id = format!("TXN-{}", Uuid::new_v4());

        sqlx::query(
            r#"
            INSERT INTO billing (billing_id, user_id, full_name, email, phone,
                address_line_1, address_line_2, city, state, postal_code, country)
            VALUES ($1, $2, 'Test Buyer', 'buyer@example.com', '555-0100',
                '1 Main St', NULL, 'Springfield', 'IL', '62701', 'US')
            "#,
        )
        .bind(billing_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .expect("Failed to seed billing");

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, total_amount, billing_id,
                paypal_order_id, payment_status)
            VALUES ($1, $2, $3, $4, $5, 'paid')
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .bind(amount)
        .bind(billing_id)
        .bind(&paypal_order_id)
        .execute(&self.pool)
        .await
        .expect("Failed to seed order");

        sqlx::query(
            r#"
            INSERT INTO payments (payment_id, user_id, order_id, amount,
                transaction_id, payment_status, paypal_order_id)
            VALUES ($1, $2, $3, $4, $5, 'paid', $6)
            "#,
        )
        .bind(payment_id)
        .bind(user_id)
        .bind(order_id)
        .bind(amount)
        .bind(&transaction_id)
        .bind(&paypal_order_id)
        .execute(&self.pool)
        .await
        .expect("Failed to seed payment");

        (user_id, payment_id, transaction_id)
    }

    // -------------------------------------------------------------------------
    // Provider mocks
    // -------------------------------------------------------------------------

    /// Mount the client-credentials token exchange.
    pub async fn mock_token(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "test-access-token",
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .mount(&self.paypal)
            .await;
    }

    /// Mount order creation returning the given id, with an approval link.
    /// `expected_value` additionally pins the two-decimal amount the
    /// provider must receive.
    pub async fn mock_create_order(&self, paypal_order_id: &str, expected_value: &str) {
        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .and(body_string_contains(format!(
                "\"value\":\"{}\"",
                expected_value
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": paypal_order_id,
                "status": "CREATED",
                "links": [
                    {
                        "href": format!("https://www.sandbox.paypal.com/checkoutnow?token={}", paypal_order_id),
                        "rel": "approve"
                    },
                    {
                        "href": format!("https://api.sandbox.paypal.com/v2/checkout/orders/{}", paypal_order_id),
                        "rel": "self"
                    }
                ]
            })))
            .mount(&self.paypal)
            .await;
    }

    /// Mount a failing order creation.
    pub async fn mock_create_order_failure(&self) {
        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "name": "INTERNAL_SERVICE_ERROR",
                "message": "An internal service error has occurred"
            })))
            .mount(&self.paypal)
            .await;
    }

    /// Mount a capture for the given order returning one capture record.
    pub async fn mock_capture(&self, paypal_order_id: &str, transaction_id: &str, value: &str) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/v2/checkout/orders/{}/capture",
                paypal_order_id
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": paypal_order_id,
                "status": "COMPLETED",
                "purchase_units": [
                    {
                        "payments": {
                            "captures": [
                                {
                                    "id": transaction_id,
                                    "status": "COMPLETED",
                                    "amount": { "currency_code": "USD", "value": value }
                                }
                            ]
                        }
                    }
                ]
            })))
            .mount(&self.paypal)
            .await;
    }

    /// Mount a refund for the given capture transaction.
    pub async fn mock_refund(&self, transaction_id: &str, refund_transaction_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/v2/payments/captures/{}/refund",
                transaction_id
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": refund_transaction_id,
                "status": "COMPLETED"
            })))
            .mount(&self.paypal)
            .await;
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// POST the /pay form and return the raw response (redirects disabled).
    pub async fn post_pay(
        &self,
        user_id: Uuid,
        items: &str,
        coupon_code: Option<&str>,
        billing_details: &str,
    ) -> reqwest::Response {
        let mut form = vec![
            ("userId".to_string(), user_id.to_string()),
            ("items".to_string(), items.to_string()),
            ("billingDetails".to_string(), billing_details.to_string()),
        ];
        if let Some(code) = coupon_code {
            form.push(("couponCode".to_string(), code.to_string()));
        }

        self.client
            .post(format!("{}/pay", self.address))
            .form(&form)
            .send()
            .await
            .expect("Failed to execute /pay request")
    }

    /// A valid billing details payload as the form would submit it.
    pub fn billing_details_json() -> &'static str {
        r#"{
            "full_name": "Test Buyer",
            "email": "buyer@example.com",
            "phone": "555-0100",
            "address_line_1": "1 Main St",
            "address_line_2": null,
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62701",
            "country": "US"
        }"#
    }

    // -------------------------------------------------------------------------
    // Assertions
    // -------------------------------------------------------------------------

    pub async fn orders_for_user(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count orders")
    }

    pub async fn billing_for_user(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM billing WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count billing rows")
    }

    pub async fn payments_for_user(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count payments")
    }

    pub async fn refunds_for_payment(&self, payment_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM refunds WHERE payment_id = $1")
            .bind(payment_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count refunds")
    }
}
