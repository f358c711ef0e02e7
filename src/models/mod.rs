//! Domain models for checkout-service.

mod billing;
mod coupon;
mod order;
mod payment;
mod refund;

pub use billing::BillingDetails;
pub use coupon::{Coupon, DiscountType};
pub use order::{Order, OrderItem};
pub use payment::Payment;
pub use refund::Refund;
