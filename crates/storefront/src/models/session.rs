//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use solewave_core::{Email, Role, UserId};

use super::user::{Profile, User};

/// Session-stored user identity.
///
/// A snapshot of the profile taken at login or at the last session refresh.
/// Authorization decisions that matter (checkout, creator routes) re-read the
/// profile from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Name shown in the header.
    pub display_name: String,
    /// Account role.
    pub role: Role,
    /// Whether the creator program is active for this user.
    pub is_creator: bool,
}

impl CurrentUser {
    /// Build the session identity from a user and their profile.
    #[must_use]
    pub fn from_parts(user: &User, profile: &Profile) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: profile.display_name.clone(),
            role: profile.role,
            is_creator: profile.is_creator,
        }
    }

    /// Whether this user may use the creator dashboard.
    #[must_use]
    pub const fn is_creator(&self) -> bool {
        self.is_creator || matches!(self.role, Role::Admin)
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Unix timestamp (seconds) of the last successful session refresh.
    pub const LAST_REFRESH: &str = "last_refresh";
}
