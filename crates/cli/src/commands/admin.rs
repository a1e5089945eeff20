//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Ensure the admin from DJANGO_SUPERUSER_* (or the defaults) exists
//! blog-admin ensure-admin
//!
//! # Override individual fields and print the login block on creation
//! blog-admin ensure-admin -u zohaib -e zohaib@admin.com --show-credentials
//! ```
//!
//! # Environment Variables
//!
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `DJANGO_SUPERUSER_USERNAME` - Admin username (default: `admin`)
//! - `DJANGO_SUPERUSER_EMAIL` - Admin email (default: `admin@example.com`)
//! - `DJANGO_SUPERUSER_PASSWORD` - Admin password (default: `admin123`)
//!
//! The password is only read from the environment. There is no flag for it,
//! since command lines are visible in process listings and shell history.
//!
//! # Exit Status
//!
//! The command exits 0 even when provisioning fails, so a deployment is not
//! blocked by it; the failure is still printed. Pass `--strict` to exit 1
//! instead.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Args;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{error, info, warn};

use blog_accounts::db::{self, AccountRepository};
use blog_accounts::{
    AccountsConfig, AdminCredentials, ConfigError, PasswordScheme, ProvisionResult,
    ProvisionStatus, Provisioner,
};

/// Arguments for `ensure-admin`.
#[derive(Debug, Args)]
pub struct EnsureAdminArgs {
    /// Admin username (overrides `DJANGO_SUPERUSER_USERNAME`)
    #[arg(short, long)]
    username: Option<String>,

    /// Admin email (overrides `DJANGO_SUPERUSER_EMAIL`)
    #[arg(short, long)]
    email: Option<String>,

    /// Hash format for a newly created account's password
    /// (`pbkdf2_sha256` or `argon2`)
    #[arg(long, default_value = "pbkdf2_sha256")]
    hasher: PasswordScheme,

    /// Print the login credentials when the account is created
    #[arg(long)]
    show_credentials: bool,

    /// Exit with a failure status if provisioning fails
    #[arg(long)]
    strict: bool,
}

/// Errors that stop the command before provisioning starts.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

type Outcome = Result<(ProvisionResult, AdminCredentials), AdminError>;

/// Run `ensure-admin` and report the outcome.
pub async fn ensure(args: EnsureAdminArgs) -> ExitCode {
    let outcome = run(&args).await;

    if let Err(e) = &outcome {
        error!(error = %error_chain(e), "Admin provisioning could not start");
    }
    if let Ok((ProvisionResult::Failure(failure), _)) = &outcome {
        error!(error = %error_chain(&failure.error), "Admin provisioning error detail");
    }

    if let Err(e) = write_lines(&render(&outcome, args.show_credentials)) {
        error!("Failed to write status output: {e}");
    }

    if should_fail(&outcome, args.strict) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(args: &EnsureAdminArgs) -> Outcome {
    let config = AccountsConfig::from_env()?;
    let admin = config
        .admin
        .with_overrides(args.username.clone(), args.email.clone());

    if let Some(reason) = admin.password_warning() {
        warn!(
            username = %admin.username,
            "Admin password is weak ({reason}); change it after first login"
        );
    }

    info!("Connecting to accounts database...");
    let pool = db::create_pool(&config.database_url).await?;
    let repository = AccountRepository::new(&pool);

    let result = Provisioner::new(&repository)
        .with_password_scheme(args.hasher)
        .ensure_admin(&admin.username, &admin.email, &admin.password)
        .await;

    pool.close().await;
    Ok((result, admin))
}

/// Decide the exit status: failures only count in strict mode.
fn should_fail(outcome: &Outcome, strict: bool) -> bool {
    let succeeded = matches!(outcome, Ok((result, _)) if result.is_success());
    strict && !succeeded
}

/// Status lines for stdout.
fn render(outcome: &Outcome, show_credentials: bool) -> Vec<String> {
    let (result, admin) = match outcome {
        Ok(pair) => pair,
        Err(e) => return vec![format!("Error: {e}")],
    };

    let mut lines = vec![result.to_string()];
    if !show_credentials || !result.is_success() {
        return lines;
    }

    if result.status() == ProvisionStatus::Created {
        lines.extend([
            String::new(),
            "=== LOGIN CREDENTIALS ===".to_owned(),
            format!("Username: {}", admin.username),
            format!("Password: {}", admin.password.expose_secret()),
            "=========================".to_owned(),
        ]);
    } else {
        lines.push(format!(
            "Existing account \"{}\" kept its current password.",
            admin.username
        ));
    }
    lines
}

fn write_lines(lines: &[String]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Render an error and all of its sources on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use blog_accounts::{
        ProfileOutcome, ProvisionError, ProvisionFailure, ProvisionReport, ProvisionStage,
        RepositoryError,
    };
    use blog_accounts_core::AccountId;

    fn creds() -> AdminCredentials {
        AdminCredentials::from_lookup(|_| None)
    }

    fn success(status: ProvisionStatus, profile: ProfileOutcome) -> Outcome {
        Ok((
            ProvisionResult::Success(ProvisionReport {
                status,
                account_id: AccountId::new(1),
                username: "admin".to_owned(),
                email: "admin@example.com".to_owned(),
                is_superuser: true,
                profile,
            }),
            creds(),
        ))
    }

    fn failure() -> Outcome {
        Ok((
            ProvisionResult::Failure(ProvisionFailure {
                stage: ProvisionStage::Lookup,
                username: "admin".to_owned(),
                account_created: false,
                error: ProvisionError::Repository(RepositoryError::NotFound),
            }),
            creds(),
        ))
    }

    #[test]
    fn test_render_created_without_credentials() {
        let lines = render(
            &success(ProvisionStatus::Created, ProfileOutcome::Created),
            false,
        );
        assert_eq!(lines, vec!["Superuser \"admin\" created with admin role!"]);
    }

    #[test]
    fn test_render_created_with_credentials() {
        let lines = render(
            &success(ProvisionStatus::Created, ProfileOutcome::Created),
            true,
        );
        assert!(lines.contains(&"=== LOGIN CREDENTIALS ===".to_owned()));
        assert!(lines.contains(&"Username: admin".to_owned()));
        assert!(lines.contains(&"Password: admin123".to_owned()));
    }

    #[test]
    fn test_render_existing_account_hides_password() {
        let lines = render(
            &success(ProvisionStatus::Unchanged, ProfileOutcome::AlreadyAdmin),
            true,
        );
        assert!(!lines.iter().any(|l| l.contains("admin123")));
        assert_eq!(
            lines.last().unwrap(),
            "Existing account \"admin\" kept its current password."
        );
    }

    #[test]
    fn test_render_config_error() {
        let outcome: Outcome = Err(AdminError::Config(ConfigError::MissingEnvVar(
            "ACCOUNTS_DATABASE_URL".to_owned(),
        )));
        assert_eq!(
            render(&outcome, true),
            vec!["Error: Missing environment variable: ACCOUNTS_DATABASE_URL"]
        );
    }

    #[test]
    fn test_failures_only_fail_in_strict_mode() {
        assert!(!should_fail(&failure(), false));
        assert!(should_fail(&failure(), true));

        let ok = success(ProvisionStatus::Unchanged, ProfileOutcome::AlreadyAdmin);
        assert!(!should_fail(&ok, true));

        let config_error: Outcome = Err(AdminError::Config(ConfigError::MissingEnvVar(
            "ACCOUNTS_DATABASE_URL".to_owned(),
        )));
        assert!(!should_fail(&config_error, false));
        assert!(should_fail(&config_error, true));
    }

    #[test]
    fn test_password_has_no_flag() {
        use clap::Parser;

        #[derive(Parser)]
        struct Cmd {
            #[command(flatten)]
            args: EnsureAdminArgs,
        }

        assert!(Cmd::try_parse_from(["ensure-admin", "--password", "hunter2"]).is_err());
        assert!(Cmd::try_parse_from(["ensure-admin", "-p", "hunter2"]).is_err());

        let cmd = Cmd::try_parse_from(["ensure-admin", "-u", "ops"]).unwrap();
        assert_eq!(cmd.args.username.as_deref(), Some("ops"));
        assert_eq!(cmd.args.hasher, PasswordScheme::default());
    }

    #[test]
    fn test_hasher_flag() {
        use clap::Parser;

        #[derive(Parser)]
        struct Cmd {
            #[command(flatten)]
            args: EnsureAdminArgs,
        }

        let cmd = Cmd::try_parse_from(["ensure-admin", "--hasher", "argon2"]).unwrap();
        assert_eq!(cmd.args.hasher, PasswordScheme::Argon2);
        assert!(Cmd::try_parse_from(["ensure-admin", "--hasher", "md5"]).is_err());
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = ProvisionError::Repository(RepositoryError::Database(sqlx::Error::Protocol(
            "connection reset".to_owned(),
        )));
        let chain = error_chain(&err);
        assert!(chain.starts_with("database error: "));
        assert!(chain.contains("connection reset"));
    }
}
