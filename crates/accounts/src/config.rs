//! Provisioning configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `DJANGO_SUPERUSER_USERNAME` - Admin username (default: `admin`)
//! - `DJANGO_SUPERUSER_EMAIL` - Admin email (default: `admin@example.com`)
//! - `DJANGO_SUPERUSER_PASSWORD` - Admin password (default: `admin123`)

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Default admin username.
pub const DEFAULT_USERNAME: &str = "admin";
/// Default admin email.
pub const DEFAULT_EMAIL: &str = "admin@example.com";
/// Default admin password.
pub const DEFAULT_PASSWORD: &str = "admin123";

const MIN_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const WEAK_PASSWORD_PATTERNS: &[&str] = &[
    "admin",
    "password",
    "changeme",
    "123456",
    "qwerty",
    "letmein",
    "welcome",
    "secret",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Credentials for the admin account to provision.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    /// Login name of the admin account
    pub username: String,
    /// Email stored on the account when it is created
    pub email: String,
    /// Plain-text password, hashed before it reaches the store
    pub password: SecretString,
}

impl AdminCredentials {
    /// Build credentials from a variable lookup, falling back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Self {
            username: or_default("DJANGO_SUPERUSER_USERNAME", DEFAULT_USERNAME),
            email: or_default("DJANGO_SUPERUSER_EMAIL", DEFAULT_EMAIL),
            password: SecretString::from(or_default("DJANGO_SUPERUSER_PASSWORD", DEFAULT_PASSWORD)),
        }
    }

    /// Replace the username and email with explicitly supplied values.
    ///
    /// The password has no override; it only comes from the environment.
    #[must_use]
    pub fn with_overrides(mut self, username: Option<String>, email: Option<String>) -> Self {
        if let Some(username) = username {
            self.username = username;
        }
        if let Some(email) = email {
            self.email = email;
        }
        self
    }

    /// Describe why the configured password is weak, if it is.
    ///
    /// The defaults are meant for first boot only; a deployment that keeps
    /// them should hear about it without failing.
    #[must_use]
    pub fn password_warning(&self) -> Option<String> {
        weak_password_reason(self.password.expose_secret())
    }
}

/// Full configuration for a provisioning run.
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Admin account to provision
    pub admin: AdminCredentials,
}

impl AccountsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no database URL is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no database URL is configured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(&lookup, "ACCOUNTS_DATABASE_URL")?;
        let admin = AdminCredentials::from_lookup(&lookup);

        Ok(Self {
            database_url,
            admin,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(
    lookup: &impl Fn(&str) -> Option<String>,
    primary_key: &str,
) -> Result<SecretString, ConfigError> {
    lookup(primary_key)
        .or_else(|| lookup("DATABASE_URL"))
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Check a password against the blocklist, length and entropy thresholds.
fn weak_password_reason(password: &str) -> Option<String> {
    let lower = password.to_lowercase();

    if let Some(pattern) = WEAK_PASSWORD_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Some(format!("contains the common pattern '{pattern}'"));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Some(format!(
            "shorter than {MIN_PASSWORD_LENGTH} characters (got {length})"
        ));
    }

    let entropy = shannon_entropy(password);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Some(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }

    None
}
