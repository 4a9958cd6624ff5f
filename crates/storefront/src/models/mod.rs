//! Domain models for the storefront.
//!
//! Repository row types live next to their queries in `crate::db`; these are
//! the validated shapes handlers work with and serialize to clients.

pub mod creator;
pub mod order;
pub mod product;
pub mod session;
pub mod user;
pub mod wallet;

pub use creator::{CreatorInvite, CreatorOrder, CreatorStats, SocialVerification};
pub use order::{Order, OrderItem, OrderSummary, ShippingAddress};
pub use product::{Product, ProductFilter, ProductPage, ProductSort};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Profile, User};
pub use wallet::WalletTransaction;
