//! Catalog browsing commands.

use smartsales_client::api::Product;
use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_core::CategoryId;

/// List products: featured, by category, or the full catalog.
pub async fn products(
    state: &AppState,
    featured: bool,
    category: Option<CategoryId>,
) -> Result<(), AppError> {
    let catalog = state.catalog();
    let products = match (featured, category) {
        (true, _) => catalog.featured_products().await?,
        (false, Some(category)) => catalog.products_by_category(category).await?,
        (false, None) => catalog.products().await?,
    };

    print_products(&products);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }

    for product in products.iter().filter(|p| p.active) {
        let marker = if product.featured { "*" } else { " " };
        println!(
            "{marker} {:>5}  {:<40} {:>12}  {}",
            product.id,
            product.name,
            product.price.to_string(),
            product.category_name.as_deref().unwrap_or("-"),
        );
    }
}

#[allow(clippy::print_stdout)]
pub async fn categories(state: &AppState) -> Result<(), AppError> {
    let categories = state.catalog().categories().await?;
    if categories.is_empty() {
        println!("No categories found");
    }
    for category in &categories {
        println!("{:>5}  {}", category.id, category.name);
    }
    Ok(())
}
