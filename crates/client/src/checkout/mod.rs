//! Checkout: turning the cart into a sale.
//!
//! - [`submit`] is the transactional core: validate, send one request, map the result
//! - [`CheckoutFlow`] is the per-screen state machine that guards against double submission
//! - [`SalesApi`] is the seam to the backend (implemented by [`SalesClient`](crate::api::SalesClient))

mod error;
mod flow;
mod pipeline;

pub use error::{CheckoutError, ValidationError};
pub use flow::{CheckoutFlow, CheckoutState, Submission};
pub use pipeline::{SaleResult, prepare, submit};

use std::future::Future;

use smartsales_core::Credential;

use crate::api::{ApiError, CreateSaleRequest, SaleRecord};

/// Backend operations the checkout needs.
pub trait SalesApi: Send + Sync {
    /// `POST sales/ventas/crear-desde-carrito/` with `Authorization: Token <credential>`.
    fn create_sale_from_cart(
        &self,
        request: &CreateSaleRequest,
        credential: &Credential,
    ) -> impl Future<Output = Result<SaleRecord, ApiError>> + Send;
}
