//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login restricted to the admin role
//! - `email` - Email delivery via SMTP
//! - `invites` - Creator invitations with coupon suggestion and email

pub mod auth;
pub mod email;
pub mod invites;

pub use auth::{AdminAuthError, AdminAuthService};
pub use email::{EmailError, EmailService};
pub use invites::{InviteCreated, InviteError, InviteService};
