//! Idempotent admin account provisioning.
//!
//! [`Provisioner::ensure_admin`] converges the store on one state: an account
//! with the given username exists, and its profile has the `admin` role.
//!
//! - A missing account is created as a superuser with the given email and a
//!   freshly hashed password.
//! - An existing account is left as it is. Its password, email and flags are
//!   never touched, so rerunning after an operator changed the password does
//!   not reset it.
//! - The profile is fetched or created. A profile that appears between the
//!   lookup and the insert (the web application attaches one to new accounts
//!   on its own) is picked up from the resulting conflict instead of waiting
//!   for it.
//!
//! Nothing runs inside a transaction. If the profile step fails after the
//! account was inserted, the account stays and the next run completes it.

mod result;

pub use result::{
    ProfileOutcome, ProvisionError, ProvisionFailure, ProvisionReport, ProvisionResult,
    ProvisionStage, ProvisionStatus,
};

use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info, warn};

use blog_accounts_core::{ProfileRole, Username};

use crate::db::RepositoryError;
use crate::models::{Account, NewSuperuser, ProfileUpdate};
use crate::password::PasswordScheme;
use crate::store::AccountStore;

/// Bio written to profiles the provisioner creates.
pub const DEFAULT_ADMIN_BIO: &str = "Administrator of the blog";

type StageError = (ProvisionStage, ProvisionError);

fn at<E: Into<ProvisionError>>(stage: ProvisionStage) -> impl FnOnce(E) -> StageError {
    move |e| (stage, e.into())
}

/// Ensures an admin account exists in an [`AccountStore`].
pub struct Provisioner<'a, S> {
    store: &'a S,
    scheme: PasswordScheme,
}

impl<'a, S: AccountStore> Provisioner<'a, S> {
    /// Create a provisioner over a store, hashing with the default scheme.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            scheme: PasswordScheme::default(),
        }
    }

    /// Hash the password of a newly created account with `scheme`.
    #[must_use]
    pub const fn with_password_scheme(mut self, scheme: PasswordScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Ensure `username` exists as an admin with an admin-role profile.
    ///
    /// Always returns a result; errors are reported as
    /// [`ProvisionResult::Failure`] and logged.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
    ) -> ProvisionResult {
        let mut account_created = false;

        match self
            .provision(username, email, password, &mut account_created)
            .await
        {
            Ok(report) => {
                info!(
                    username = %report.username,
                    account_id = %report.account_id,
                    status = %report.status,
                    "Admin account provisioned"
                );
                ProvisionResult::Success(report)
            }
            Err((stage, error)) => {
                error!(
                    username,
                    %stage,
                    account_created,
                    error = %error,
                    "Admin provisioning failed"
                );
                ProvisionResult::Failure(ProvisionFailure {
                    stage,
                    username: username.to_owned(),
                    account_created,
                    error,
                })
            }
        }
    }

    async fn provision(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
        account_created: &mut bool,
    ) -> Result<ProvisionReport, StageError> {
        let username = Username::parse(username).map_err(at(ProvisionStage::Validate))?;
        if password.expose_secret().is_empty() {
            return Err((ProvisionStage::Validate, ProvisionError::EmptyPassword));
        }

        info!(%username, "Looking up admin account");
        let existing = self
            .store
            .find_account(&username)
            .await
            .map_err(at(ProvisionStage::Lookup))?;

        let account = if let Some(account) = existing {
            info!(
                %username,
                account_id = %account.id,
                "Account already exists, leaving it as is"
            );
            if !account.is_superuser {
                warn!(
                    %username,
                    "Existing account is not a superuser; only its profile role will be changed"
                );
            }
            account
        } else {
            let account = self.create_superuser(username, email, password).await?;
            *account_created = true;
            account
        };

        let profile = self
            .ensure_admin_profile(&account, *account_created)
            .await
            .map_err(at(ProvisionStage::Profile))?;

        let status = match (*account_created, &profile) {
            (true, _) => ProvisionStatus::Created,
            (false, ProfileOutcome::AlreadyAdmin) => ProvisionStatus::Unchanged,
            (false, _) => ProvisionStatus::Updated,
        };

        Ok(ProvisionReport {
            status,
            account_id: account.id,
            username: account.username.into_inner(),
            email: account.email,
            is_superuser: account.is_superuser,
            profile,
        })
    }

    async fn create_superuser(
        &self,
        username: Username,
        email: &str,
        password: &SecretString,
    ) -> Result<Account, StageError> {
        let password_hash = self
            .scheme
            .hash(password)
            .map_err(at(ProvisionStage::HashPassword))?;

        let account = self
            .store
            .create_superuser(&NewSuperuser {
                username,
                email: email.to_owned(),
                password_hash,
            })
            .await
            .map_err(at(ProvisionStage::CreateAccount))?;

        info!(
            username = %account.username,
            account_id = %account.id,
            "Created superuser"
        );
        Ok(account)
    }

    /// Get or create the account's profile and make sure its role is admin.
    ///
    /// `fresh` is set when the account was created in this run; a profile
    /// attached to it by the application then always gets the admin bio.
    async fn ensure_admin_profile(
        &self,
        account: &Account,
        fresh: bool,
    ) -> Result<ProfileOutcome, RepositoryError> {
        let existing = match self.store.find_profile(account.id).await? {
            Some(profile) => profile,
            None => {
                match self
                    .store
                    .create_profile(account.id, &ProfileRole::Admin, DEFAULT_ADMIN_BIO)
                    .await
                {
                    Ok(profile) => {
                        info!(
                            account_id = %account.id,
                            profile_id = %profile.id,
                            "Created admin profile"
                        );
                        return Ok(ProfileOutcome::Created);
                    }
                    Err(RepositoryError::Conflict(_)) => {
                        info!(
                            account_id = %account.id,
                            "Profile was attached concurrently, fetching it"
                        );
                        self.store
                            .find_profile(account.id)
                            .await?
                            .ok_or(RepositoryError::NotFound)?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        if existing.role.is_admin() {
            if fresh && existing.bio != DEFAULT_ADMIN_BIO {
                let update = ProfileUpdate {
                    role: ProfileRole::Admin,
                    bio: Some(DEFAULT_ADMIN_BIO.to_owned()),
                };
                self.store.update_profile(existing.id, &update).await?;
            }
            return Ok(ProfileOutcome::AlreadyAdmin);
        }

        let previous = existing.role.clone();
        let update = ProfileUpdate {
            role: ProfileRole::Admin,
            bio: fresh.then(|| DEFAULT_ADMIN_BIO.to_owned()),
        };
        let profile = self.store.update_profile(existing.id, &update).await?;
        info!(
            account_id = %account.id,
            profile_id = %profile.id,
            previous_role = %previous,
            "Set profile role to admin"
        );

        Ok(ProfileOutcome::Promoted { previous })
    }
}
