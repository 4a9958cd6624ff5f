//! Domain models for the back office.
//!
//! Most admin views are read straight from joined rows, so the types here
//! derive `sqlx::FromRow` and `Serialize` together.

pub mod analytics;
pub mod creator;
pub mod order;
pub mod page;
pub mod product;
pub mod session;
pub mod user;

pub use analytics::{Dashboard, LowStockProduct, RevenueDay, StatusCount, TopProduct};
pub use creator::{CreatorInvite, CreatorSummary, Payout, SocialVerification};
pub use order::{OrderDetail, OrderItem, OrderQuery, OrderSummary};
pub use page::{Page, PageQuery, Paging};
pub use product::{Product, ProductInput, SyncReport};
pub use session::{CurrentAdmin, keys as session_keys};
pub use user::{Profile, UserFilter, UserSummary};
