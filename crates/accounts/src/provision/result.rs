//! Outcome types for a provisioning run.

use core::fmt;

use thiserror::Error;

use blog_accounts_core::{AccountId, ProfileRole, UsernameError};

use crate::db::RepositoryError;
use crate::password::PasswordError;

/// Errors that stop a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The configured username is not acceptable to the store.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// The configured password is empty.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// The password could not be hashed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// The store rejected or failed an operation.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Step of the run an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    /// Checking the supplied credentials.
    Validate,
    /// Looking up the account by username.
    Lookup,
    /// Hashing the password.
    HashPassword,
    /// Inserting the account.
    CreateAccount,
    /// Fetching, creating or updating the profile.
    Profile,
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validate => "validating credentials",
            Self::Lookup => "looking up account",
            Self::HashPassword => "hashing password",
            Self::CreateAccount => "creating account",
            Self::Profile => "setting admin profile",
        })
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStatus {
    /// The account did not exist and was created.
    Created,
    /// The account existed and its profile was created or promoted.
    Updated,
    /// Nothing needed to change.
    Unchanged,
    /// The run stopped on an error.
    Failed,
}

impl fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
        })
    }
}

/// What happened to the account's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// No profile existed; one was created with the admin role.
    Created,
    /// A profile existed with another role and was switched to admin.
    Promoted {
        /// Role the profile had before.
        previous: ProfileRole,
    },
    /// The profile already had the admin role.
    AlreadyAdmin,
}

/// A successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Overall status, never [`ProvisionStatus::Failed`].
    pub status: ProvisionStatus,
    /// Id of the admin account.
    pub account_id: AccountId,
    /// Username of the admin account.
    pub username: String,
    /// Email stored on the admin account.
    pub email: String,
    /// Whether the account carries the superuser flag.
    pub is_superuser: bool,
    /// What happened to the profile.
    pub profile: ProfileOutcome,
}

/// A run that stopped on an error.
#[derive(Debug)]
pub struct ProvisionFailure {
    /// Step that failed.
    pub stage: ProvisionStage,
    /// Username the run was for.
    pub username: String,
    /// Whether this run inserted the account before failing. Nothing is
    /// rolled back, so such an account remains in the store.
    pub account_created: bool,
    /// The underlying error.
    pub error: ProvisionError,
}

/// Result of [`Provisioner::ensure_admin`](super::Provisioner::ensure_admin).
///
/// Provisioning never returns `Err`: failures are values, and the caller
/// decides what they mean for the process exit code.
#[derive(Debug)]
pub enum ProvisionResult {
    /// The account and its admin profile are in place.
    Success(ProvisionReport),
    /// The run stopped on an error.
    Failure(ProvisionFailure),
}

impl ProvisionResult {
    /// Overall status, including [`ProvisionStatus::Failed`].
    #[must_use]
    pub const fn status(&self) -> ProvisionStatus {
        match self {
            Self::Success(report) => report.status,
            Self::Failure(_) => ProvisionStatus::Failed,
        }
    }

    /// Whether the run succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Username the run was for.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Success(report) => &report.username,
            Self::Failure(failure) => &failure.username,
        }
    }
}

impl fmt::Display for ProvisionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(report) => match (&report.status, &report.profile) {
                (ProvisionStatus::Created, _) => write!(
                    f,
                    "Superuser \"{}\" created with admin role!",
                    report.username
                ),
                (_, ProfileOutcome::Created) => {
                    write!(f, "Created admin profile for \"{}\".", report.username)
                }
                (_, ProfileOutcome::Promoted { previous }) => write!(
                    f,
                    "Updated \"{}\" profile to admin role (was {previous}).",
                    report.username
                ),
                (_, ProfileOutcome::AlreadyAdmin) => write!(
                    f,
                    "Superuser \"{}\" already exists with admin role.",
                    report.username
                ),
            },
            Self::Failure(failure) => {
                write!(f, "Error {}: {}", failure.stage, failure.error)?;
                if failure.account_created {
                    write!(f, " (account \"{}\" was created)", failure.username)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: ProvisionStatus, profile: ProfileOutcome) -> ProvisionResult {
        ProvisionResult::Success(ProvisionReport {
            status,
            account_id: AccountId::new(1),
            username: "admin".to_owned(),
            email: "admin@example.com".to_owned(),
            is_superuser: true,
            profile,
        })
    }

    #[test]
    fn test_created_message() {
        let result = report(ProvisionStatus::Created, ProfileOutcome::Created);
        assert_eq!(result.to_string(), "Superuser \"admin\" created with admin role!");
    }

    #[test]
    fn test_promoted_message_names_previous_role() {
        let result = report(
            ProvisionStatus::Updated,
            ProfileOutcome::Promoted {
                previous: ProfileRole::Member,
            },
        );
        assert_eq!(
            result.to_string(),
            "Updated \"admin\" profile to admin role (was member)."
        );
    }

    #[test]
    fn test_unchanged_message() {
        let result = report(ProvisionStatus::Unchanged, ProfileOutcome::AlreadyAdmin);
        assert_eq!(
            result.to_string(),
            "Superuser \"admin\" already exists with admin role."
        );
    }

    #[test]
    fn test_failure_status_and_message() {
        let result = ProvisionResult::Failure(ProvisionFailure {
            stage: ProvisionStage::Profile,
            username: "admin".to_owned(),
            account_created: true,
            error: ProvisionError::Repository(RepositoryError::NotFound),
        });

        assert_eq!(result.status(), ProvisionStatus::Failed);
        assert!(!result.is_success());
        assert_eq!(
            result.to_string(),
            "Error setting admin profile: not found (account \"admin\" was created)"
        );
    }
}
