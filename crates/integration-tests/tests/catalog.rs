//! Integration tests for catalog browsing and adding catalog products to the cart.
//!
//! Run with: cargo test -p smartsales-integration-tests --test catalog

use std::sync::Arc;

use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_client::storage::MemoryStorage;
use smartsales_core::{CategoryId, Price, ProductId};
use smartsales_integration_tests::MockBackend;

async fn anonymous_state(backend: &MockBackend) -> AppState {
    AppState::with_storage(&backend.api_config(), Arc::new(MemoryStorage::new()))
        .expect("Failed to create state")
}

#[tokio::test]
async fn test_product_listings() {
    let backend = MockBackend::start().await;
    let state = anonymous_state(&backend).await;
    let catalog = state.catalog();

    let all = catalog.products().await.expect("Products failed");
    assert_eq!(all.len(), 4);

    let featured = catalog.featured_products().await.expect("Featured failed");
    let featured_ids: Vec<_> = featured.iter().map(|p| p.id).collect();
    assert_eq!(featured_ids, vec![ProductId::new(5), ProductId::new(8)]);

    let furniture = catalog
        .products_by_category(CategoryId::new(2))
        .await
        .expect("By category failed");
    assert_eq!(furniture.len(), 1);
    assert_eq!(furniture[0].price, Price::from(120));

    let categories = catalog.categories().await.expect("Categories failed");
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].name, "Perifericos");
    assert_eq!(categories[1].features, None);

    let chair = catalog.product(ProductId::new(8)).await.expect("Product failed");
    assert_eq!(chair.description, None);
}

#[tokio::test]
async fn test_add_to_cart_uses_catalog_price() {
    let backend = MockBackend::start().await;
    let mut state = anonymous_state(&backend).await;

    let line = state
        .add_to_cart(ProductId::new(6))
        .await
        .expect("Add failed");

    assert_eq!(line.id, "6");
    assert_eq!(line.name, "Teclado mecanico");
    assert_eq!(line.unit_price, Price::from_cents(4050));
    assert_eq!(state.cart().total(), Price::from_cents(4050));
}

#[tokio::test]
async fn test_add_missing_or_inactive_product_is_not_found() {
    let backend = MockBackend::start().await;
    let mut state = anonymous_state(&backend).await;

    let missing = state.add_to_cart(ProductId::new(404)).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let inactive = state.add_to_cart(ProductId::new(9)).await;
    assert!(matches!(inactive, Err(AppError::NotFound(_))));

    assert!(state.cart().is_empty());
}
