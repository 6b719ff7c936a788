//! Cart-to-order submission.
//!
//! [`submit`] turns a cart snapshot into exactly one create-sale request.
//! Preconditions are checked locally first; any failure there means no
//! request is sent. The pipeline never retries and never touches the cart:
//! clearing it after a successful sale is the caller's job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use smartsales_core::{Credential, PaymentMethod, PaymentStatus, Price, ProductId, SaleId, SaleStatus};
use tracing::instrument;

use super::SalesApi;
use super::error::{CheckoutError, ValidationError};
use crate::api::{ApiError, CreateSaleRequest, SaleItemRequest, SaleLineRecord, SaleRecord};
use crate::cart::CartLine;

/// A created sale, as shown on the confirmation screen.
///
/// `id` and `total` are `None` only when the backend accepted the sale but
/// its reply could not be read in full (`partial` is then set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleResult {
    pub id: Option<SaleId>,
    pub total: Option<Price>,
    /// Payment outcome label as reported by the backend (e.g. `"Completado"`).
    pub status: String,
    /// `status` parsed into a known payment status, when it is one.
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub sale_status: SaleStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub line_items: Vec<SaleLineRecord>,
    pub partial: bool,
}

impl From<SaleRecord> for SaleResult {
    fn from(sale: SaleRecord) -> Self {
        let status = sale.payment_status.unwrap_or_default();
        Self {
            id: Some(sale.id),
            total: Some(sale.total),
            payment_status: PaymentStatus::parse(&status),
            status,
            payment_method: sale.payment_method,
            sale_status: sale.sale_status,
            created_at: sale.created_at,
            line_items: sale.lines,
            partial: false,
        }
    }
}

impl SaleResult {
    /// Salvage what can be read from an accepted sale whose reply did not
    /// match the expected shape.
    #[must_use]
    pub fn from_unreadable(body: &str) -> Self {
        let payload = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
        let field = |key: &str| payload.get(key).cloned().unwrap_or(Value::Null);
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(ToString::to_string);

        let status = text("pago_status").unwrap_or_default();
        Self {
            id: serde_json::from_value(field("id")).ok(),
            total: serde_json::from_value(field("total")).ok(),
            payment_status: PaymentStatus::parse(&status),
            status,
            payment_method: text("pago_method"),
            sale_status: SaleStatus::default(),
            created_at: None,
            line_items: Vec::new(),
            partial: true,
        }
    }
}

/// Check preconditions and build the create-sale request.
///
/// Checks run in order: non-empty cart, payment method selected, credential
/// present, then each line's id and quantity.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn prepare<'c>(
    lines: &[CartLine],
    method_label: &str,
    credential: Option<&'c Credential>,
) -> Result<(CreateSaleRequest, &'c Credential), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    let method = PaymentMethod::from_label(method_label).ok_or(ValidationError::MissingPaymentMethod)?;
    let credential = credential.ok_or(ValidationError::NotAuthenticated)?;

    let items = lines
        .iter()
        .map(sale_item)
        .collect::<Result<Vec<_>, _>>()?;

    if method.is_passthrough() {
        tracing::warn!(
            payment_method = %method.backend_code(),
            "Unrecognized payment method forwarded to backend unchanged"
        );
    }

    Ok((
        CreateSaleRequest {
            items,
            payment_method: method.backend_code().to_owned(),
        },
        credential,
    ))
}

fn sale_item(line: &CartLine) -> Result<SaleItemRequest, ValidationError> {
    let producto_id = line
        .id
        .parse::<ProductId>()
        .map_err(|_| ValidationError::InvalidProductId(line.id.clone()))?;
    if line.quantity == 0 {
        return Err(ValidationError::InvalidQuantity(line.id.clone()));
    }
    Ok(SaleItemRequest {
        producto_id,
        cantidad: line.quantity,
    })
}

/// Submit a cart snapshot as a sale.
///
/// Sends at most one request.
///
/// # Errors
///
/// - [`CheckoutError::Validation`] if a precondition fails (nothing sent)
/// - [`CheckoutError::BackendRejected`] if the backend refuses the sale
/// - [`CheckoutError::Connectivity`] if the backend could not be reached
#[instrument(skip_all, fields(items = lines.len(), method = %method_label))]
pub async fn submit<A: SalesApi>(
    api: &A,
    lines: &[CartLine],
    method_label: &str,
    credential: Option<&Credential>,
) -> Result<SaleResult, CheckoutError> {
    let (request, credential) = prepare(lines, method_label, credential).inspect_err(|e| {
        tracing::debug!(error = %e, "Checkout preconditions failed");
    })?;

    let outcome = api.create_sale_from_cart(&request, credential).await;
    conclude(outcome)
}

/// Map the backend's answer to a checkout outcome.
///
/// A 2xx whose body could not be read still means the sale exists, so it
/// concludes as a partial [`SaleResult`] rather than an error.
pub(crate) fn conclude(outcome: Result<SaleRecord, ApiError>) -> Result<SaleResult, CheckoutError> {
    match outcome {
        Ok(sale) => {
            let result = SaleResult::from(sale);
            tracing::info!(
                sale_id = ?result.id,
                total = ?result.total,
                status = %result.status,
                "Sale created"
            );
            Ok(result)
        }
        Err(ApiError::UnreadableSuccess { status, message, body }) => {
            let result = SaleResult::from_unreadable(&body);
            tracing::warn!(
                status,
                error = %message,
                sale_id = ?result.id,
                "Sale created but the response could not be read"
            );
            Ok(result)
        }
        Err(e) => {
            let err = CheckoutError::from(e);
            tracing::warn!(error = %err, "Sale submission failed");
            Err(err)
        }
    }
}
