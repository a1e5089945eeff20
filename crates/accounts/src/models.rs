//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use blog_accounts_core::{AccountId, ProfileId, ProfileRole, Username};

/// A login account in the blog's account store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Unique login name.
    pub username: Username,
    /// Contact email. Not validated; the store accepts any string.
    pub email: String,
    /// Encoded password hash as stored (`<algorithm>$...`).
    pub password_hash: String,
    /// Full administrative access.
    pub is_superuser: bool,
    /// May sign in to the administration pages.
    pub is_staff: bool,
    /// May sign in at all.
    pub is_active: bool,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
}

/// Fields for inserting a superuser account.
#[derive(Debug, Clone)]
pub struct NewSuperuser {
    /// Login name.
    pub username: Username,
    /// Contact email.
    pub email: String,
    /// Already-encoded password hash.
    pub password_hash: String,
}

/// The one-to-one profile attached to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Unique profile ID.
    pub id: ProfileId,
    /// Account that owns this profile.
    pub account_id: AccountId,
    /// Role used by the blog for authorization.
    pub role: ProfileRole,
    /// Free-text biography.
    pub bio: String,
}

/// Changes applied to an existing profile.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    /// New role.
    pub role: ProfileRole,
    /// New bio, or `None` to keep the current one.
    pub bio: Option<String>,
}
