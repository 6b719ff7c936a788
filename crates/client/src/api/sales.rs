//! Sales API: create a sale from the cart, list past sales, download receipts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartsales_core::{Credential, PaymentId, Price, ProductId, SaleId, SaleLineId, SaleStatus};
use tracing::instrument;

use super::{ApiError, HttpClient, ListResponse};
use crate::checkout::SalesApi;

/// Path of the create-sale-from-cart endpoint.
pub const CREATE_SALE_PATH: &str = "sales/ventas/crear-desde-carrito/";

// =============================================================================
// Request types
// =============================================================================

/// One line of a create-sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub producto_id: ProductId,
    pub cantidad: u32,
}

/// Body of `POST sales/ventas/crear-desde-carrito/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleItemRequest>,
    pub payment_method: String,
}

// =============================================================================
// Response types
// =============================================================================

/// One line of a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineRecord {
    pub id: SaleLineId,
    /// `None` once the product has been deleted from the catalog.
    #[serde(rename = "producto", default)]
    pub product_id: Option<ProductId>,
    #[serde(rename = "nombre_producto", default)]
    pub product_name: String,
    #[serde(rename = "precio_unitario")]
    pub unit_price: Price,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

impl SaleLineRecord {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.line_total(self.quantity)
    }
}

/// A sale as returned by the backend.
///
/// The payment outcome lives under `pago_status` (a display label such as
/// `"Completado"`); the checkout pipeline normalizes it into `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    #[serde(rename = "pago", default)]
    pub payment_id: Option<PaymentId>,
    #[serde(rename = "pago_status", default)]
    pub payment_status: Option<String>,
    #[serde(rename = "pago_method", default)]
    pub payment_method: Option<String>,
    pub total: Price,
    #[serde(rename = "estado", default)]
    pub sale_status: SaleStatus,
    #[serde(rename = "get_estado_display", default)]
    pub sale_status_display: Option<String>,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "detalles", default)]
    pub lines: Vec<SaleLineRecord>,
}

/// Receipt formats offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Pdf,
    Excel,
}

impl FileFormat {
    /// Endpoint suffix: `download-pdf` / `download-excel`.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Pdf => "download-pdf",
            Self::Excel => "download-excel",
        }
    }

    /// File extension of the downloaded file.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "excel" | "xlsx" => Ok(Self::Excel),
            other => Err(format!("unknown file format '{other}' (expected pdf or excel)")),
        }
    }
}

/// A downloaded sale receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Suggested file name, `venta_<id>.<ext>`.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    /// Write the file into `dir` under its suggested name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

// =============================================================================
// SalesClient
// =============================================================================

/// Client for the Sales API.
#[derive(Debug, Clone)]
pub struct SalesClient {
    http: HttpClient,
}

impl SalesClient {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Sales visible to the credential's user, newest first as ordered by
    /// the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn sales_history(&self, credential: &Credential) -> Result<Vec<SaleRecord>, ApiError> {
        let list: ListResponse<SaleRecord> = self.http.get("sales/ventas/", Some(credential)).await?;
        let sales = list.into_vec();
        tracing::debug!(count = sales.len(), "Fetched sales history");
        Ok(sales)
    }

    /// Download a sale receipt as PDF or Excel.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credential), fields(sale_id = %sale_id, format = ?format))]
    pub async fn download_sale_file(
        &self,
        sale_id: SaleId,
        format: FileFormat,
        credential: &Credential,
    ) -> Result<DownloadedFile, ApiError> {
        let path = format!("sales/ventas/{sale_id}/{}/", format.path_segment());
        let (content_type, bytes) = self.http.get_bytes(&path, Some(credential)).await?;

        tracing::info!(bytes = bytes.len(), "Downloaded sale file");

        Ok(DownloadedFile {
            file_name: format!("venta_{sale_id}.{}", format.extension()),
            content_type,
            bytes,
        })
    }
}

impl SalesApi for SalesClient {
    #[instrument(skip_all, fields(items = request.items.len(), payment_method = %request.payment_method))]
    async fn create_sale_from_cart(
        &self,
        request: &CreateSaleRequest,
        credential: &Credential,
    ) -> Result<SaleRecord, ApiError> {
        self.http
            .post(CREATE_SALE_PATH, request, Some(credential))
            .await
    }
}
