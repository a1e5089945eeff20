//! Blog accounts core - shared types for account provisioning.
//!
//! This crate provides the types used by the account tooling:
//! - `accounts` - Account store access, password hashing and the provisioner
//! - `cli` - The `blog-admin` command-line tool
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. The
//! optional `postgres` feature adds `sqlx` encoding for the newtypes.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, validated usernames and profile roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
