//! HTTP handlers for checkout-service.

pub mod orders;
pub mod refunds;
