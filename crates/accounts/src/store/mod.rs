//! Account store abstraction.
//!
//! The provisioner only needs five primitive operations from whatever holds
//! accounts and profiles. [`AccountRepository`](crate::db::AccountRepository)
//! implements them against `PostgreSQL`; [`memory::MemoryStore`] keeps
//! everything in process.

pub mod memory;

use std::future::Future;

use blog_accounts_core::{AccountId, ProfileId, ProfileRole, Username};

use crate::db::RepositoryError;
use crate::models::{Account, NewSuperuser, Profile, ProfileUpdate};

/// Storage operations used by the provisioner.
///
/// Implementations must enforce the two uniqueness rules of the data model:
/// usernames are unique across accounts, and an account has at most one
/// profile. Violations are reported as [`RepositoryError::Conflict`].
pub trait AccountStore {
    /// Find an account by its username.
    fn find_account(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Insert a new account with superuser, staff and active flags set.
    fn create_superuser(
        &self,
        account: &NewSuperuser,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Find the profile attached to an account.
    fn find_profile(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Insert a profile for an account.
    fn create_profile(
        &self,
        account_id: AccountId,
        role: &ProfileRole,
        bio: &str,
    ) -> impl Future<Output = Result<Profile, RepositoryError>> + Send;

    /// Apply an update to an existing profile.
    ///
    /// Returns [`RepositoryError::NotFound`] if the profile no longer exists.
    fn update_profile(
        &self,
        profile_id: ProfileId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<Profile, RepositoryError>> + Send;
}
