pub mod checkout;
pub mod database;
pub mod metrics;
pub mod paypal;

pub use checkout::CheckoutService;
pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use paypal::PayPalClient;
