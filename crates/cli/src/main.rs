//! Blog admin CLI - deployment-time account management.
//!
//! # Usage
//!
//! ```bash
//! # Ensure the admin account exists (credentials from the environment)
//! blog-admin ensure-admin
//!
//! # Same, with explicit credentials, failing the pipeline on error
//! blog-admin ensure-admin -u zohaib -e zohaib@admin.com --strict
//! ```
//!
//! # Commands
//!
//! - `ensure-admin` - Create the admin account if missing and force its profile role to admin
//!
//! Status lines go to stdout. Logs go to stderr and follow `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "blog-admin")]
#[command(author, version, about = "Blog deployment tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure the admin account exists with an admin-role profile
    EnsureAdmin(commands::admin::EnsureAdminArgs),
}

fn init_tracing(json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_accounts=info,blog_admin=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::EnsureAdmin(args) => commands::admin::ensure(args).await,
    }
}
