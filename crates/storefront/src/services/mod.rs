//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login
//! - `catalog` - Cached catalog reads
//! - `checkout` - Order placement, payment and compensation
//! - `payment` - Payment gateway client and webhook signatures
//! - `session_refresh` - Debounced, single-flight session recovery
//! - `wallet` - Credit purchases

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod session_refresh;
pub mod wallet;

pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use payment::{PaymentError, PaymentGateway};
pub use session_refresh::SessionRefresher;
