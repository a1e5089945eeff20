//! Subcommand implementations.

pub mod admin;
