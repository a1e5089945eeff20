//! Password hashing in the account store's encoding.
//!
//! The web application stores hashes as `<algorithm>$<rest>` and picks the
//! verifier from the algorithm tag. Two schemes are written here:
//!
//! - `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>`, the application's
//!   default hasher. It needs nothing beyond the standard install, so it is
//!   the default.
//! - `argon2$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`, the Argon2 tag
//!   followed by the PHC string. The application only verifies it when its
//!   optional Argon2 backend is installed.

use std::fmt;
use std::str::FromStr;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

/// Algorithm tag for PBKDF2-HMAC-SHA256 hashes.
pub const PBKDF2_ALGORITHM: &str = "pbkdf2_sha256";
/// Algorithm tag prefixed to Argon2 PHC strings.
pub const ARGON2_ALGORITHM: &str = "argon2";
/// Iteration count the application currently uses for new PBKDF2 hashes.
pub const PBKDF2_ITERATIONS: u32 = 1_000_000;

const SALT_LENGTH: usize = 22;

/// Errors that can occur while hashing or verifying a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("password hashing error")]
    Hash,

    /// The stored hash uses an unknown algorithm or is malformed.
    #[error("unsupported password hash format")]
    UnsupportedFormat,

    /// The password does not match the stored hash.
    #[error("password does not match")]
    Mismatch,
}

/// How new password hashes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    /// PBKDF2-HMAC-SHA256 with the given iteration count.
    Pbkdf2Sha256 { iterations: u32 },
    /// Argon2id with the crate's default parameters.
    Argon2,
}

impl Default for PasswordScheme {
    fn default() -> Self {
        Self::Pbkdf2Sha256 {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

impl PasswordScheme {
    /// Hash a password and encode it for the account store.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Hash` if hashing fails.
    pub fn hash(&self, password: &SecretString) -> Result<String, PasswordError> {
        match *self {
            Self::Pbkdf2Sha256 { iterations } => {
                if iterations == 0 {
                    return Err(PasswordError::Hash);
                }
                let salt: String = rand::rng()
                    .sample_iter(Alphanumeric)
                    .take(SALT_LENGTH)
                    .map(char::from)
                    .collect();
                Ok(encode_pbkdf2(password.expose_secret(), &salt, iterations))
            }
            Self::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(password.expose_secret().as_bytes(), &salt)
                    .map(|hash| format!("{ARGON2_ALGORITHM}{hash}"))
                    .map_err(|_| PasswordError::Hash)
            }
        }
    }
}

impl fmt::Display for PasswordScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pbkdf2Sha256 { .. } => f.write_str(PBKDF2_ALGORITHM),
            Self::Argon2 => f.write_str(ARGON2_ALGORITHM),
        }
    }
}

impl FromStr for PasswordScheme {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PBKDF2_ALGORITHM | "pbkdf2" => Ok(Self::default()),
            ARGON2_ALGORITHM => Ok(Self::Argon2),
            _ => Err(PasswordError::UnsupportedFormat),
        }
    }
}

/// Verify a password against an encoded hash from the account store.
///
/// # Errors
///
/// Returns `PasswordError::UnsupportedFormat` if the algorithm tag is unknown
/// or the hash is malformed, and `PasswordError::Mismatch` if the password is
/// wrong.
pub fn verify_password(password: &SecretString, encoded: &str) -> Result<(), PasswordError> {
    let (algorithm, rest) = encoded
        .split_once('$')
        .ok_or(PasswordError::UnsupportedFormat)?;

    match algorithm {
        PBKDF2_ALGORITHM => verify_pbkdf2(password.expose_secret(), encoded, rest),
        ARGON2_ALGORITHM => {
            let phc = format!("${rest}");
            let parsed_hash = PasswordHash::new(&phc)
                .map_err(|_| PasswordError::UnsupportedFormat)?;
            Argon2::default()
                .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
                .map_err(|_| PasswordError::Mismatch)
        }
        _ => Err(PasswordError::UnsupportedFormat),
    }
}

fn encode_pbkdf2(password: &str, salt: &str, iterations: u32) -> String {
    let derived =
        pbkdf2::pbkdf2_hmac_array::<Sha256, 32>(password.as_bytes(), salt.as_bytes(), iterations);
    format!(
        "{PBKDF2_ALGORITHM}${iterations}${salt}${}",
        STANDARD.encode(derived)
    )
}

fn verify_pbkdf2(password: &str, encoded: &str, rest: &str) -> Result<(), PasswordError> {
    let mut parts = rest.splitn(3, '$');
    let (Some(iterations), Some(salt), Some(_hash)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(PasswordError::UnsupportedFormat);
    };
    let iterations: u32 = iterations
        .parse()
        .ok()
        .filter(|&n| n > 0)
        .ok_or(PasswordError::UnsupportedFormat)?;

    let candidate = encode_pbkdf2(password, salt, iterations);
    if constant_time_eq(candidate.as_bytes(), encoded.as_bytes()) {
        Ok(())
    } else {
        Err(PasswordError::Mismatch)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    const FAST: PasswordScheme = PasswordScheme::Pbkdf2Sha256 { iterations: 1_000 };

    #[test]
    fn test_default_scheme_is_pbkdf2() {
        assert_eq!(
            PasswordScheme::default(),
            PasswordScheme::Pbkdf2Sha256 {
                iterations: PBKDF2_ITERATIONS
            }
        );
    }

    #[test]
    fn test_pbkdf2_matches_reference_encoding() {
        assert_eq!(
            encode_pbkdf2("admin123", "seasalt", 1_000),
            "pbkdf2_sha256$1000$seasalt$ck0ylRUSHFvtngJcVMb4NRg1HHvxGQid+vCwtV6pWgw="
        );
    }

    #[test]
    fn test_verifies_hash_written_by_web_application() {
        // Produced by the application's own PBKDF2 hasher
        let encoded = "pbkdf2_sha256$1000000$seasalt$r1uLUxoxpP2Ued/qxvmje7UH9PUJBkRrvf9gGPL7Cps=";
        assert!(verify_password(&secret("lètmein"), encoded).is_ok());
        assert!(matches!(
            verify_password(&secret("letmein"), encoded),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_pbkdf2_hash_uses_store_encoding() {
        let encoded = FAST.hash(&secret("admin123")).unwrap();
        let parts: Vec<&str> = encoded.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2_sha256");
        assert_eq!(parts[1], "1000");
        assert_eq!(parts[2].len(), SALT_LENGTH);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!encoded.contains("admin123"));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = FAST.hash(&secret("admin123")).unwrap();
        let b = FAST.hash(&secret("admin123")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_roundtrip_for_each_scheme() {
        for scheme in [FAST, PasswordScheme::Argon2] {
            let encoded = scheme.hash(&secret("correct horse")).unwrap();
            assert!(verify_password(&secret("correct horse"), &encoded).is_ok());
            assert!(matches!(
                verify_password(&secret("wrong horse"), &encoded),
                Err(PasswordError::Mismatch)
            ));
        }
    }

    #[test]
    fn test_argon2_hash_uses_store_encoding() {
        let encoded = PasswordScheme::Argon2.hash(&secret("admin123")).unwrap();
        assert!(encoded.starts_with("argon2$argon2id$v=19$"));
    }

    #[test]
    fn test_verify_rejects_unknown_or_malformed_hashes() {
        for encoded in [
            "bcrypt_sha256$$2b$12$abc",
            "pbkdf2_sha256$0$salt$hash",
            "pbkdf2_sha256$many$salt$hash",
            "pbkdf2_sha256$1000$salt",
            "argon2garbage",
            "!unusable",
        ] {
            assert!(
                matches!(
                    verify_password(&secret("x"), encoded),
                    Err(PasswordError::UnsupportedFormat)
                ),
                "{encoded}"
            );
        }
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!(
            "pbkdf2_sha256".parse::<PasswordScheme>().unwrap(),
            PasswordScheme::default()
        );
        assert_eq!(
            "argon2".parse::<PasswordScheme>().unwrap(),
            PasswordScheme::Argon2
        );
        assert!("md5".parse::<PasswordScheme>().is_err());
    }
}
