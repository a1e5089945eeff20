//! In-process account store.
//!
//! Holds accounts and profiles in memory with the same uniqueness rules as
//! the database. Used for tests and for rehearsing a provisioning run
//! without touching a real store. Individual operations can be made to fail
//! to exercise the provisioner's error paths.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use blog_accounts_core::{AccountId, ProfileId, ProfileRole, Username};

use super::AccountStore;
use crate::db::RepositoryError;
use crate::models::{Account, NewSuperuser, Profile, ProfileUpdate};

/// An [`AccountStore`] operation, used to select which calls fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// [`AccountStore::find_account`]
    FindAccount,
    /// [`AccountStore::create_superuser`]
    CreateSuperuser,
    /// [`AccountStore::find_profile`]
    FindProfile,
    /// [`AccountStore::create_profile`]
    CreateProfile,
    /// [`AccountStore::update_profile`]
    UpdateProfile,
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    profiles: Vec<Profile>,
    next_account_id: i64,
    next_profile_id: i64,
    failing: HashSet<StoreOperation>,
}

impl State {
    fn check(&self, op: StoreOperation) -> Result<(), RepositoryError> {
        if self.failing.contains(&op) {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "injected failure in {op:?}"
            ))));
        }
        Ok(())
    }

    fn insert_account(
        &mut self,
        username: Username,
        email: String,
        password_hash: String,
        is_superuser: bool,
    ) -> Result<Account, RepositoryError> {
        if self.accounts.iter().any(|a| a.username == username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        self.next_account_id += 1;
        let account = Account {
            id: AccountId::new(self.next_account_id),
            username,
            email,
            password_hash,
            is_superuser,
            is_staff: is_superuser,
            is_active: true,
            date_joined: Utc::now(),
        };
        self.accounts.push(account.clone());
        Ok(account)
    }

    fn insert_profile(
        &mut self,
        account_id: AccountId,
        role: ProfileRole,
        bio: String,
    ) -> Result<Profile, RepositoryError> {
        if !self.accounts.iter().any(|a| a.id == account_id) {
            return Err(RepositoryError::Conflict(format!(
                "account {account_id} does not exist"
            )));
        }
        if self.profiles.iter().any(|p| p.account_id == account_id) {
            return Err(RepositoryError::Conflict(
                "profile already exists for account".to_owned(),
            ));
        }

        self.next_profile_id += 1;
        let profile = Profile {
            id: ProfileId::new(self.next_profile_id),
            account_id,
            role,
            bio,
        };
        self.profiles.push(profile.clone());
        Ok(profile)
    }
}

/// When the simulated application hook attaches its profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileHook {
    /// Together with the account insert.
    OnCreate,
    /// Just before the first profile insert for the account, which then
    /// conflicts.
    Late,
}

/// An [`AccountStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    profile_hook: Option<ProfileHook>,
    hook_role: ProfileRole,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that attaches a `member` profile to every new
    /// account, the way the web application does on account creation.
    #[must_use]
    pub fn with_profile_hook() -> Self {
        Self::with_profile_hook_as(ProfileRole::Member)
    }

    /// Like [`MemoryStore::with_profile_hook`], attaching profiles with `role`.
    #[must_use]
    pub fn with_profile_hook_as(role: ProfileRole) -> Self {
        Self {
            profile_hook: Some(ProfileHook::OnCreate),
            hook_role: role,
            ..Self::default()
        }
    }

    /// Create an empty store whose `member` profile shows up only after the
    /// caller looked for one, so the caller's own profile insert conflicts.
    #[must_use]
    pub fn with_late_profile_hook() -> Self {
        Self {
            profile_hook: Some(ProfileHook::Late),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later call of `op` fail with a database error.
    pub fn fail_on(&self, op: StoreOperation) {
        self.lock().failing.insert(op);
    }

    /// Stop injecting failures for `op`.
    pub fn recover(&self, op: StoreOperation) {
        self.lock().failing.remove(&op);
    }

    /// Insert an account directly, bypassing the provisioner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub fn seed_account(
        &self,
        username: Username,
        email: &str,
        password_hash: &str,
        is_superuser: bool,
    ) -> Result<Account, RepositoryError> {
        self.lock().insert_account(
            username,
            email.to_owned(),
            password_hash.to_owned(),
            is_superuser,
        )
    }

    /// Insert a profile directly, bypassing the provisioner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account is unknown or
    /// already has a profile.
    pub fn seed_profile(
        &self,
        account_id: AccountId,
        role: ProfileRole,
        bio: &str,
    ) -> Result<Profile, RepositoryError> {
        self.lock().insert_profile(account_id, role, bio.to_owned())
    }

    /// Current state of an account, if present.
    #[must_use]
    pub fn account(&self, username: &Username) -> Option<Account> {
        self.lock()
            .accounts
            .iter()
            .find(|a| &a.username == username)
            .cloned()
    }

    /// Current state of an account's profile, if present.
    #[must_use]
    pub fn profile_for(&self, account_id: AccountId) -> Option<Profile> {
        self.lock()
            .profiles
            .iter()
            .find(|p| p.account_id == account_id)
            .cloned()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    /// Number of stored profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.lock().profiles.len()
    }
}

impl AccountStore for MemoryStore {
    async fn find_account(&self, username: &Username) -> Result<Option<Account>, RepositoryError> {
        let state = self.lock();
        state.check(StoreOperation::FindAccount)?;
        Ok(state
            .accounts
            .iter()
            .find(|a| &a.username == username)
            .cloned())
    }

    async fn create_superuser(&self, account: &NewSuperuser) -> Result<Account, RepositoryError> {
        let mut state = self.lock();
        state.check(StoreOperation::CreateSuperuser)?;
        let created = state.insert_account(
            account.username.clone(),
            account.email.clone(),
            account.password_hash.clone(),
            true,
        )?;
        if self.profile_hook == Some(ProfileHook::OnCreate) {
            state.insert_profile(created.id, self.hook_role.clone(), String::new())?;
        }
        Ok(created)
    }

    async fn find_profile(&self, account_id: AccountId) -> Result<Option<Profile>, RepositoryError> {
        let state = self.lock();
        state.check(StoreOperation::FindProfile)?;
        Ok(state
            .profiles
            .iter()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn create_profile(
        &self,
        account_id: AccountId,
        role: &ProfileRole,
        bio: &str,
    ) -> Result<Profile, RepositoryError> {
        let mut state = self.lock();
        state.check(StoreOperation::CreateProfile)?;
        if self.profile_hook == Some(ProfileHook::Late)
            && !state.profiles.iter().any(|p| p.account_id == account_id)
        {
            state.insert_profile(account_id, self.hook_role.clone(), String::new())?;
        }
        state.insert_profile(account_id, role.clone(), bio.to_owned())
    }

    async fn update_profile(
        &self,
        profile_id: ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let mut state = self.lock();
        state.check(StoreOperation::UpdateProfile)?;
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or(RepositoryError::NotFound)?;
        profile.role = update.role.clone();
        if let Some(bio) = &update.bio {
            profile.bio.clone_from(bio);
        }
        Ok(profile.clone())
    }
}
