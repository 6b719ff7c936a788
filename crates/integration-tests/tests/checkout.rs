//! Integration tests for the cart-to-order checkout.
//!
//! Run with: cargo test -p smartsales-integration-tests --test checkout

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use smartsales_client::api::{HttpClient, SalesClient};
use smartsales_client::cart::CartLine;
use smartsales_client::checkout::{CheckoutError, CheckoutState, submit};
use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_client::storage::{FileStorage, MemoryStorage, Storage};
use smartsales_core::{Credential, PaymentStatus, Price, ProductId, SaleId};
use smartsales_integration_tests::{
    CREATE_SALE_PATH, MockBackend, PASSWORD, SaleReply, TOKEN, USERNAME, closed_port_config,
};

async fn logged_in_state(backend: &MockBackend, storage: Arc<dyn Storage>) -> AppState {
    let mut state =
        AppState::with_storage(&backend.api_config(), storage).expect("Failed to create state");
    state
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .expect("Login failed");
    state
}

fn line(id: &str, price: i64, quantity: u32) -> CartLine {
    CartLine {
        id: id.to_string(),
        name: format!("Product {id}"),
        unit_price: Price::from(price),
        image: None,
        quantity,
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[tokio::test]
async fn test_checkout_sends_token_and_cart_items() {
    let backend = MockBackend::start().await;
    let mut state = logged_in_state(&backend, Arc::new(MemoryStorage::new())).await;

    state.add_to_cart(ProductId::new(5)).await.expect("Add failed");
    state.add_to_cart(ProductId::new(5)).await.expect("Add failed");
    state.add_to_cart(ProductId::new(6)).await.expect("Add failed");
    state.select_payment_method("efectivo");

    let sale = state.checkout().await.expect("Checkout failed");

    let requests = backend.requests_to(CREATE_SALE_PATH);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.authorization.as_deref(),
        Some(format!("Token {TOKEN}").as_str())
    );
    assert_eq!(
        request.body,
        json!({
            "items": [
                {"producto_id": 5, "cantidad": 2},
                {"producto_id": 6, "cantidad": 1},
            ],
            "payment_method": "cash",
        })
    );

    assert_eq!(sale.status, "Completado");
    assert_eq!(sale.payment_status, Some(PaymentStatus::Completed));
    assert_eq!(sale.total, Some(Price::from_cents(9050)));
    assert!(!sale.partial);
    assert_eq!(sale.line_items.len(), 2);
    assert_eq!(sale.payment_method.as_deref(), Some("Efectivo"));
}

#[tokio::test]
async fn test_unknown_payment_label_is_forwarded() {
    let backend = MockBackend::start().await;
    let mut state = logged_in_state(&backend, Arc::new(MemoryStorage::new())).await;
    state.add_to_cart(ProductId::new(8)).await.expect("Add failed");
    state.select_payment_method("stripe");

    state.checkout().await.expect("Checkout failed");

    let requests = backend.requests_to(CREATE_SALE_PATH);
    assert_eq!(requests[0].body["payment_method"], "stripe");
}

// ============================================================================
// Cart lifecycle
// ============================================================================

#[tokio::test]
async fn test_success_clears_persisted_cart() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage_path = dir.path().join("storage.json");

    let storage = Arc::new(FileStorage::open(&storage_path).expect("Failed to open storage"));
    let mut state = logged_in_state(&backend, storage).await;
    state.add_to_cart(ProductId::new(5)).await.expect("Add failed");
    state.select_payment_method("paypal");
    state.checkout().await.expect("Checkout failed");
    assert!(state.cart().is_empty());
    assert!(matches!(
        state.checkout_flow().state(),
        CheckoutState::Succeeded { .. }
    ));
    drop(state);

    // A restarted app sees the empty cart and the same session.
    let storage = Arc::new(FileStorage::open(&storage_path).expect("Failed to open storage"));
    let state = AppState::with_storage(&backend.api_config(), storage).expect("Failed to reload");
    assert!(state.cart().is_empty());
    assert!(state.session().is_authenticated());

    let history = state.sales_history().await.expect("History failed");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_backend_rejection_keeps_cart() {
    let backend = MockBackend::start().await;
    backend.set_sale_reply(SaleReply::Fail {
        status: 400,
        body: json!({"items": ["Stock insuficiente"]}),
    });
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let mut state = logged_in_state(&backend, Arc::clone(&storage)).await;
    state.add_to_cart(ProductId::new(5)).await.expect("Add failed");
    state.select_payment_method("efectivo");

    let err = state.checkout().await.expect_err("Checkout should fail");

    match &err {
        AppError::Checkout(CheckoutError::BackendRejected { status, message }) => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Stock insuficiente");
        }
        other => panic!("Unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Stock insuficiente");
    assert_eq!(state.cart().len(), 1);
    assert_eq!(state.checkout_flow().state(), &CheckoutState::Idle);
    assert_eq!(backend.requests_to(CREATE_SALE_PATH).len(), 1);

    // The user retries once stock is back; only then is a second request sent.
    backend.set_sale_reply(SaleReply::default());
    state.checkout().await.expect("Retry failed");
    assert_eq!(backend.requests_to(CREATE_SALE_PATH).len(), 2);
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn test_accepted_sale_with_bare_body_clears_cart() {
    let backend = MockBackend::start().await;
    backend.set_sale_reply(SaleReply::CreateBare);
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let mut state = logged_in_state(&backend, Arc::clone(&storage)).await;
    state.add_to_cart(ProductId::new(5)).await.expect("Add failed");
    state.select_payment_method("efectivo");

    let sale = state.checkout().await.expect("Checkout failed");

    assert!(sale.partial);
    assert_eq!(sale.id, Some(SaleId::new(1)));
    assert_eq!(sale.total, None);
    assert!(state.cart().is_empty());
    assert!(matches!(
        state.checkout_flow().state(),
        CheckoutState::Succeeded { .. }
    ));
    assert_eq!(backend.requests_to(CREATE_SALE_PATH).len(), 1);
}

#[tokio::test]
async fn test_rejected_token_is_backend_rejection() {
    let backend = MockBackend::start().await;
    let mut state = logged_in_state(&backend, Arc::new(MemoryStorage::new())).await;
    state.add_to_cart(ProductId::new(5)).await.expect("Add failed");
    state.select_payment_method("efectivo");
    backend.revoke_token();

    let err = state.checkout().await.expect_err("Checkout should fail");

    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::BackendRejected { status: 401, .. })
    ));
    assert_eq!(state.cart().len(), 1);
}

// ============================================================================
// Pipeline against real HTTP
// ============================================================================

#[tokio::test]
async fn test_closed_port_is_connectivity_error() {
    let http = HttpClient::new(&closed_port_config().await).expect("Failed to build client");
    let sales = SalesClient::new(http);
    let credential = Credential::parse(TOKEN).expect("Valid token");

    let err = submit(&sales, &[line("5", 25, 1)], "efectivo", Some(&credential))
        .await
        .expect_err("Submit should fail");

    assert!(matches!(err, CheckoutError::Connectivity(_)));
    assert_eq!(err.user_message(), "Could not connect to the server.");
}

#[tokio::test]
async fn test_precondition_failures_send_nothing() {
    let backend = MockBackend::start().await;
    let sales = SalesClient::new(HttpClient::new(&backend.api_config()).expect("Client"));
    let credential = Credential::parse(TOKEN).expect("Valid token");

    let empty = submit(&sales, &[], "efectivo", Some(&credential)).await;
    assert!(matches!(empty, Err(CheckoutError::Validation(_))));

    let no_method = submit(&sales, &[line("5", 25, 1)], "  ", Some(&credential)).await;
    assert!(matches!(no_method, Err(CheckoutError::Validation(_))));

    let anonymous = submit(&sales, &[line("5", 25, 1)], "efectivo", None).await;
    assert!(matches!(anonymous, Err(CheckoutError::Validation(_))));

    assert!(backend.requests_to(CREATE_SALE_PATH).is_empty());
}
