//! Integration tests for login, registration and session persistence.
//!
//! Run with: cargo test -p smartsales-integration-tests --test session

use std::sync::Arc;

use secrecy::SecretString;
use smartsales_client::api::{ApiError, RegistrationForm};
use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_client::storage::{FileStorage, MemoryStorage, Storage, keys};
use smartsales_core::{UserId, UserRole};
use smartsales_integration_tests::{MockBackend, PASSWORD, TOKEN, USERNAME};

fn registration(username: &str, password: &str, confirm: &str) -> RegistrationForm {
    RegistrationForm {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: SecretString::from(password),
        password_confirm: SecretString::from(confirm),
        first_name: "Luis".to_string(),
        last_name: "Paz".to_string(),
        phone: String::new(),
        city: "La Paz".to_string(),
        role: UserRole::Customer,
    }
}

#[tokio::test]
async fn test_login_persists_session_across_restart() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("storage.json");

    let storage = Arc::new(FileStorage::open(&path).expect("Failed to open storage"));
    let mut state = AppState::with_storage(&backend.api_config(), storage).expect("State");
    let user = state
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .expect("Login failed");
    assert_eq!(user.id, UserId::new(7));
    assert_eq!(user.role, UserRole::Seller);
    assert_eq!(user.city, "Santa Cruz");
    drop(state);

    let storage = Arc::new(FileStorage::open(&path).expect("Failed to open storage"));
    let state = AppState::with_storage(&backend.api_config(), storage).expect("State");
    assert!(state.session().is_authenticated());
    assert_eq!(state.require_credential().expect("Credential").expose(), TOKEN);
}

#[tokio::test]
async fn test_wrong_password_keeps_logged_out() {
    let backend = MockBackend::start().await;
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let mut state =
        AppState::with_storage(&backend.api_config(), Arc::clone(&storage)).expect("State");

    let err = state
        .login(USERNAME, &SecretString::from("wrong"))
        .await
        .expect_err("Login should fail");

    assert_eq!(err.user_message(), "Credenciales invalidas");
    assert!(!state.session().is_authenticated());
    assert_eq!(storage.get(keys::AUTH_TOKEN).expect("Read storage"), None);
}

#[tokio::test]
async fn test_register_logs_in_with_flat_response() {
    let backend = MockBackend::start().await;
    let mut state =
        AppState::with_storage(&backend.api_config(), Arc::new(MemoryStorage::new())).expect("State");

    let user = state
        .register(&registration("luis", "pw-123", "pw-123"))
        .await
        .expect("Registration failed");
    assert_eq!(user.username, "luis");

    let requests = backend.requests_to("/api/users/users/");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["ciudad"], "La Paz");
    assert_eq!(requests[0].body["role"], "customer");
    assert!(state.session().is_authenticated());
}

#[tokio::test]
async fn test_register_mismatched_passwords_sends_nothing() {
    let backend = MockBackend::start().await;
    let mut state =
        AppState::with_storage(&backend.api_config(), Arc::new(MemoryStorage::new())).expect("State");

    let err = state
        .register(&registration("luis", "pw-123", "pw-124"))
        .await
        .expect_err("Registration should fail");

    assert!(matches!(err, AppError::Api(ApiError::InvalidInput(_))));
    assert!(backend.requests_to("/api/users/users/").is_empty());
}

#[tokio::test]
async fn test_register_duplicate_username_shows_field_message() {
    let backend = MockBackend::start().await;
    let mut state =
        AppState::with_storage(&backend.api_config(), Arc::new(MemoryStorage::new())).expect("State");

    let err = state
        .register(&registration(USERNAME, "pw-123", "pw-123"))
        .await
        .expect_err("Registration should fail");

    assert_eq!(
        err.user_message(),
        "username: Ya existe un usuario con este nombre."
    );
}

#[tokio::test]
async fn test_logout_notifies_backend_and_keeps_cart() {
    let backend = MockBackend::start().await;
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let mut state =
        AppState::with_storage(&backend.api_config(), Arc::clone(&storage)).expect("State");
    state
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .expect("Login failed");
    state
        .add_to_cart(smartsales_core::ProductId::new(5))
        .await
        .expect("Add failed");

    state.logout().await.expect("Logout failed");

    assert!(!state.session().is_authenticated());
    assert_eq!(storage.get(keys::USER).expect("Read storage"), None);
    assert_eq!(state.cart().len(), 1);
    assert_eq!(backend.requests_to("/api/users/users/logout/").len(), 1);
}

#[tokio::test]
async fn test_verify_session_logs_out_revoked_token() {
    let backend = MockBackend::start().await;
    let mut state =
        AppState::with_storage(&backend.api_config(), Arc::new(MemoryStorage::new())).expect("State");
    state
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .expect("Login failed");

    assert!(state.verify_session().await.expect("Verify failed"));

    backend.revoke_token();
    assert!(!state.verify_session().await.expect("Verify failed"));
    assert!(!state.session().is_authenticated());
}
