//! Checkout command.

use smartsales_client::error::AppError;
use smartsales_client::state::AppState;

/// Submit the persisted cart with the given payment method.
///
/// The cart is only emptied when the backend created the sale.
#[allow(clippy::print_stdout)]
pub async fn run(state: &mut AppState, method: &str) -> Result<(), AppError> {
    state.select_payment_method(method);
    let sale = state.checkout().await?;

    match sale.id {
        Some(id) => println!("Sale #{id} created"),
        None => println!("Sale created"),
    }
    if sale.partial {
        println!("The server accepted the order but its confirmation was incomplete.");
        println!("Check `sales list` for the full details.");
    }
    for line in &sale.line_items {
        println!(
            "  {:<40} {:>4} x {:>10}",
            line.product_name,
            line.quantity,
            line.unit_price.to_string(),
        );
    }
    if let Some(total) = sale.total {
        println!("Total:   {total}");
    }
    println!(
        "Payment: {} ({})",
        if sale.status.is_empty() { "-" } else { sale.status.as_str() },
        sale.payment_method.as_deref().unwrap_or(method),
    );
    println!("Status:  {}", sale.sale_status);
    Ok(())
}
