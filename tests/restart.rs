//! Accounts survive a process restart: a fresh service over the same file
//! sees earlier signups and accepts tokens signed with the same key.

use accountd::auth::password::MIN_PASSWORD_COST;
use accountd::auth::{
    AccountError, AccountService, PasswordHasher, ProfileUpdate, SignupRequest, TokenService,
    UserStore,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const SECRET: &str = "restart-test-secret";

fn service_at(path: &Path, secret: &str) -> AccountService {
    AccountService::new(
        Arc::new(UserStore::open(path).unwrap()),
        PasswordHasher::with_cost(MIN_PASSWORD_COST),
        TokenService::new(secret).unwrap(),
    )
}

fn signup(username: &str) -> SignupRequest {
    SignupRequest {
        username: username.into(),
        password: "pw123".into(),
        email: format!("{username}@x.com"),
        phone_number: "555".into(),
        address: "A St".into(),
    }
}

#[tokio::test]
async fn state_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("db.json");

    let token = {
        let first = service_at(&path, SECRET);
        first.signup(signup("carol")).await.unwrap();
        let token = first.signin("carol", "pw123").await.unwrap();
        first
            .update_profile(
                &token,
                ProfileUpdate {
                    address: Some("C Rd".into()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        token
    };

    let second = service_at(&path, SECRET);
    let profile = second.get_profile(&token).unwrap();
    assert_eq!(profile.username, "carol");
    assert_eq!(profile.address, "C Rd");

    assert!(second.signin("carol", "pw123").await.is_ok());
    assert!(matches!(
        second.signup(signup("carol")).await,
        Err(AccountError::Conflict(_))
    ));
}

#[tokio::test]
async fn rotated_key_invalidates_old_tokens() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("db.json");

    let first = service_at(&path, SECRET);
    first.signup(signup("dave")).await.unwrap();
    let token = first.signin("dave", "pw123").await.unwrap();
    drop(first);

    let rotated = service_at(&path, "a-new-secret");
    assert!(matches!(
        rotated.get_profile(&token),
        Err(AccountError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn concurrent_signups_admit_one() {
    let tmp = TempDir::new().unwrap();
    let service = Arc::new(service_at(&tmp.path().join("db.json"), SECRET));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move { service.signup(signup("erin")).await }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AccountError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(service.store().user_count(), 1);
}
