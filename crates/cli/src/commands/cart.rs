//! Cart commands. Every edit is saved before the command returns.

use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_core::ProductId;

#[allow(clippy::print_stdout)]
pub fn show(state: &AppState) {
    let cart = state.cart();
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:>5}  {:<40} {:>4} x {:>10} = {:>12}",
            line.id,
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string(),
        );
    }
    println!();
    println!("{} item(s), total {}", cart.item_count(), cart.total());
}

#[allow(clippy::print_stdout)]
pub async fn add(state: &mut AppState, product_id: ProductId) -> Result<(), AppError> {
    let line = state.add_to_cart(product_id).await?;
    println!("{} x{} in cart", line.name, line.quantity);
    Ok(())
}

pub fn set(state: &mut AppState, id: &str, quantity: i64) -> Result<(), AppError> {
    state.set_quantity(id, quantity)?;
    show(state);
    Ok(())
}

pub fn remove(state: &mut AppState, id: &str) -> Result<(), AppError> {
    state.remove_from_cart(id)?;
    show(state);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn clear(state: &mut AppState) -> Result<(), AppError> {
    state.clear_cart()?;
    println!("Cart cleared");
    Ok(())
}
