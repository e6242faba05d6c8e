//! Session survival across restarts with the on-disk store.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;

use stagedoor_client::api::{AuthKind, AuthMode};
use stagedoor_client::services::AuthService;
use stagedoor_client::storage::FileStore;
use stagedoor_client::{SessionError, SessionStore};
use stagedoor_core::{Role, UserId};
use stagedoor_integration_tests::{ADMIN_SUFFIX, MockBackend, MockResponse, api_client};

struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("stagedoor-it-{}", uuid::Uuid::new_v4())))
    }

    fn session_file(&self) -> PathBuf {
        self.0.join("session.json")
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn open(path: &Path) -> SessionStore {
    SessionStore::new(Arc::new(FileStore::new(path)), ADMIN_SUFFIX)
}

#[tokio::test]
async fn test_sign_in_survives_restart() {
    let backend = MockBackend::start(|_| {
        MockResponse::ok(json!({"message": "Login successful", "token": "tok-1", "admin": {"id": 2}}))
    })
    .await;
    let dir = ScratchDir::new();

    let first = open(&dir.session_file());
    first.initialize().await.unwrap();
    let auth = AuthService::new(api_client(&backend.base_url(), first.clone()), first.clone());
    let signed_in = auth
        .sign_in(
            AuthKind::Admin,
            AuthMode::Login,
            "boss@example.com",
            &SecretString::from("pw"),
        )
        .await
        .unwrap();

    let restarted = open(&dir.session_file());
    let restored = restarted.initialize().await.unwrap().unwrap();

    assert_eq!(restored, signed_in);
    assert_eq!(restored.role, Role::Admin);
    assert_eq!(restored.id, Some(UserId::new(2)));
    assert!(restarted.is_admin().await.unwrap());
}

#[tokio::test]
async fn test_logout_survives_restart() {
    let dir = ScratchDir::new();
    let first = open(&dir.session_file());
    first.initialize().await.unwrap();
    first
        .login(
            "fan@example.com".parse().unwrap(),
            stagedoor_client::Credential::new("tok"),
            Role::User,
            None,
        )
        .await
        .unwrap();
    first.logout().await.unwrap();

    let restarted = open(&dir.session_file());
    assert_eq!(restarted.initialize().await.unwrap(), None);
}

#[tokio::test]
async fn test_not_initialized_is_loud() {
    let dir = ScratchDir::new();
    let session = open(&dir.session_file());

    assert!(matches!(
        session.current().await,
        Err(SessionError::NotInitialized)
    ));
}

#[tokio::test]
async fn test_corrupt_session_file_fails_initialize() {
    let dir = ScratchDir::new();
    std::fs::create_dir_all(&dir.0).unwrap();
    std::fs::write(dir.session_file(), "{ not json").unwrap();

    let session = open(&dir.session_file());
    assert!(matches!(
        session.initialize().await,
        Err(SessionError::Storage(_))
    ));
    assert!(!session.is_ready().await);
}
