//! Row ids for accounts and profiles.
//!
//! Older schemas declare the keys as `serial` (INT4), so queries cast them to
//! `int8` and both ids wrap `i64`. They are separate types so an account id
//! cannot be passed where a profile id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of an `auth_user` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
pub struct AccountId(i64);

/// Primary key of an `accounts_profile` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
pub struct ProfileId(i64);

impl AccountId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl ProfileId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
