//! Sales history and receipt downloads.

use std::path::Path;

use smartsales_client::api::FileFormat;
use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_core::SaleId;

#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState) -> Result<(), AppError> {
    let sales = state.sales_history().await?;
    if sales.is_empty() {
        println!("No sales yet");
        return Ok(());
    }

    for sale in &sales {
        let date = sale
            .created_at
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "#{:<6} {:<16} {:>12}  {:<12} {}",
            sale.id,
            date,
            sale.total.to_string(),
            sale.sale_status_display
                .clone()
                .unwrap_or_else(|| sale.sale_status.to_string()),
            sale.payment_status.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn download(
    state: &AppState,
    sale_id: SaleId,
    format: FileFormat,
    out: &Path,
) -> Result<(), AppError> {
    let file = state.download_sale(sale_id, format).await?;
    let path = file.save_to(out)?;
    println!("Saved {} ({} bytes)", path.display(), file.bytes.len());
    Ok(())
}
