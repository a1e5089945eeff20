//! End-to-end provisioning runs against the in-memory store.

use secrecy::SecretString;

use blog_accounts::config::AdminCredentials;
use blog_accounts::password::{PasswordScheme, verify_password};
use blog_accounts::store::memory::StoreOperation;
use blog_accounts::{MemoryStore, ProvisionResult, ProvisionStatus, Provisioner};
use blog_accounts_core::{ProfileRole, Username};

fn username(s: &str) -> Username {
    Username::parse(s).expect("valid username")
}

const FAST_HASH: PasswordScheme = PasswordScheme::Pbkdf2Sha256 { iterations: 1_000 };

async fn run(store: &MemoryStore, creds: &AdminCredentials) -> ProvisionResult {
    Provisioner::new(store)
        .with_password_scheme(FAST_HASH)
        .ensure_admin(&creds.username, &creds.email, &creds.password)
        .await
}

#[tokio::test]
async fn fresh_store_with_unset_environment_gets_default_admin() {
    let store = MemoryStore::new();
    let creds = AdminCredentials::from_lookup(|_| None);

    let result = run(&store, &creds).await;
    assert_eq!(result.status(), ProvisionStatus::Created);

    let account = store.account(&username("admin")).expect("account created");
    assert_eq!(account.email, "admin@example.com");
    assert!(account.is_superuser);
    assert!(verify_password(&SecretString::from("admin123".to_owned()), &account.password_hash).is_ok());

    let profile = store.profile_for(account.id).expect("profile created");
    assert_eq!(profile.role, ProfileRole::Admin);
}

#[tokio::test]
async fn default_provisioner_writes_pbkdf2_hash() {
    let store = MemoryStore::new();
    let creds = AdminCredentials::from_lookup(|_| None);

    let result = Provisioner::new(&store)
        .ensure_admin(&creds.username, &creds.email, &creds.password)
        .await;
    assert_eq!(result.status(), ProvisionStatus::Created);

    let account = store.account(&username("admin")).expect("account created");
    assert!(account.password_hash.starts_with("pbkdf2_sha256$1000000$"));
    assert!(verify_password(&creds.password, &account.password_hash).is_ok());
}

#[tokio::test]
async fn member_profile_is_promoted_and_account_left_alone() {
    let store = MemoryStore::new();
    let account = store
        .seed_account(
            username("admin"),
            "admin@example.com",
            "pbkdf2_sha256$1000$salt$operator-set",
            true,
        )
        .expect("seed account");
    store
        .seed_profile(account.id, ProfileRole::Member, "")
        .expect("seed profile");

    let creds = AdminCredentials::from_lookup(|_| None);
    let result = run(&store, &creds).await;
    assert_eq!(result.status(), ProvisionStatus::Updated);

    assert_eq!(store.account(&username("admin")), Some(account.clone()));
    assert_eq!(
        store.profile_for(account.id).map(|p| p.role),
        Some(ProfileRole::Admin)
    );
}

#[tokio::test]
async fn repeated_runs_converge() {
    let store = MemoryStore::with_profile_hook();
    let creds = AdminCredentials::from_lookup(|key| match key {
        "DJANGO_SUPERUSER_USERNAME" => Some("zohaib".to_owned()),
        "DJANGO_SUPERUSER_EMAIL" => Some("zohaib@admin.com".to_owned()),
        _ => None,
    });

    let first = run(&store, &creds).await;
    assert_eq!(first.status(), ProvisionStatus::Created);
    let account = store.account(&username("zohaib")).expect("account created");
    let profile = store.profile_for(account.id).expect("profile attached");

    for _ in 0..3 {
        let again = run(&store, &creds).await;
        assert_eq!(again.status(), ProvisionStatus::Unchanged);
    }

    assert_eq!(store.account(&username("zohaib")), Some(account.clone()));
    assert_eq!(store.profile_for(account.id), Some(profile));
    assert_eq!(store.account_count(), 1);
    assert_eq!(store.profile_count(), 1);
}

#[tokio::test]
async fn profile_write_failure_reports_failed_and_keeps_account() {
    let store = MemoryStore::with_profile_hook();
    store.fail_on(StoreOperation::UpdateProfile);

    let creds = AdminCredentials::from_lookup(|_| None);
    let result = run(&store, &creds).await;

    assert_eq!(result.status(), ProvisionStatus::Failed);
    assert!(store.account(&username("admin")).is_some());
    assert!(result.to_string().starts_with("Error setting admin profile:"));
}

#[tokio::test]
async fn different_username_creates_separate_account() {
    let store = MemoryStore::new();
    let default_creds = AdminCredentials::from_lookup(|_| None);
    run(&store, &default_creds).await;

    let ops = default_creds.with_overrides(
        Some("ops".to_owned()),
        Some("ops@example.com".to_owned()),
    );
    let result = run(&store, &ops).await;

    assert_eq!(result.status(), ProvisionStatus::Created);
    assert_eq!(result.username(), "ops");
    assert_eq!(store.account_count(), 2);
}
