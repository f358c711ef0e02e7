//! Billing snapshot taken at order creation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Billing details submitted with a checkout. Persisted once per order and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BillingDetails {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: String,
    #[validate(length(min = 1))]
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
