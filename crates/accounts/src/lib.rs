//! Blog accounts - admin account provisioning.
//!
//! Ensures a named superuser exists in the blog's account store with an
//! attached profile whose role is `admin`. Running it repeatedly converges on
//! the same state, which makes it safe to call on every deployment.
//!
//! # Modules
//!
//! - [`config`] - Credentials and database settings loaded from the environment
//! - [`db`] - `PostgreSQL` pool and the account store backed by it
//! - [`models`] - Account and profile domain types
//! - [`password`] - PBKDF2 and Argon2 password hashing in the store's hash format
//! - [`provision`] - The idempotent [`Provisioner`]
//! - [`store`] - The [`AccountStore`] seam and an in-memory implementation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod models;
pub mod password;
pub mod provision;
pub mod store;

pub use config::{AccountsConfig, AdminCredentials, ConfigError};
pub use db::{AccountRepository, RepositoryError};
pub use password::PasswordScheme;
pub use provision::{
    DEFAULT_ADMIN_BIO, ProfileOutcome, ProvisionError, ProvisionFailure, ProvisionReport,
    ProvisionResult, ProvisionStage, ProvisionStatus, Provisioner,
};
pub use store::AccountStore;
pub use store::memory::MemoryStore;
