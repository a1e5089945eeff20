//! Account repository for `PostgreSQL`.
//!
//! Queries are built at runtime rather than with the `query!` macros: the
//! schema is owned by the web application, so there is no local migration
//! set to check against at compile time. Key columns are cast to `int8` so
//! both `serial` and `bigserial` schemas decode into the same id types.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use blog_accounts_core::{AccountId, ProfileId, ProfileRole, Username};

use super::RepositoryError;
use crate::models::{Account, NewSuperuser, Profile, ProfileUpdate};
use crate::store::AccountStore;

const ACCOUNT_COLUMNS: &str = "id::int8 AS id, username, email, password, \
     is_superuser, is_staff, is_active, date_joined";

const PROFILE_COLUMNS: &str = "id::int8 AS id, user_id::int8 AS account_id, role, bio";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    is_superuser: bool,
    is_staff: bool,
    is_active: bool,
    date_joined: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            username,
            email: row.email,
            password_hash: row.password,
            is_superuser: row.is_superuser,
            is_staff: row.is_staff,
            is_active: row.is_active,
            date_joined: row.date_joined,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    account_id: i64,
    role: String,
    bio: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ProfileId::new(row.id),
            account_id: AccountId::new(row.account_id),
            role: ProfileRole::from(row.role),
            bio: row.bio,
        }
    }
}

/// Repository for account and profile rows.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl AccountStore for AccountRepository<'_> {
    /// Get an account by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    async fn find_account(&self, username: &Username) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM auth_user WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    /// Insert a superuser account.
    ///
    /// Mirrors what the web application's own `create_superuser` writes:
    /// superuser, staff and active flags set, empty first and last names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn create_superuser(&self, account: &NewSuperuser) -> Result<Account, RepositoryError> {
        let row: AccountRow = sqlx::query_as(&format!(
            r"
            INSERT INTO auth_user
                (username, email, password, is_superuser, is_staff, is_active,
                 first_name, last_name, date_joined)
            VALUES ($1, $2, $3, TRUE, TRUE, TRUE, '', '', NOW())
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(account.username.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "username already exists"))?;

        Account::try_from(row)
    }

    /// Get the profile attached to an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn find_profile(&self, account_id: AccountId) -> Result<Option<Profile>, RepositoryError> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM accounts_profile WHERE user_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    /// Insert a profile for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account already has a profile.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn create_profile(
        &self,
        account_id: AccountId,
        role: &ProfileRole,
        bio: &str,
    ) -> Result<Profile, RepositoryError> {
        let row: ProfileRow = sqlx::query_as(&format!(
            r"
            INSERT INTO accounts_profile (user_id, role, bio)
            VALUES ($1, $2, $3)
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(account_id)
        .bind(role.as_str())
        .bind(bio)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "profile already exists for account"))?;

        Ok(Profile::from(row))
    }

    /// Update a profile's role and, optionally, its bio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn update_profile(
        &self,
        profile_id: ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            r"
            UPDATE accounts_profile
            SET role = $2, bio = COALESCE($3, bio)
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(profile_id)
        .bind(update.role.as_str())
        .bind(update.bio.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::from).ok_or(RepositoryError::NotFound)
    }
}
