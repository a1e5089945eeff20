//! Core types for blog accounts.
//!
//! This module provides type-safe wrappers for account domain concepts.

pub mod id;
pub mod role;
pub mod username;

pub use id::*;
pub use role::ProfileRole;
pub use username::{Username, UsernameError};
