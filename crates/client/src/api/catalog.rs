//! Catalog API: products and categories.
//!
//! Read-only and unauthenticated. Products and categories are cached for
//! 5 minutes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use smartsales_core::{CategoryId, Price, ProductId};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, HttpClient, ListResponse};

/// A product as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "precio_venta")]
    pub price: Price,
    #[serde(rename = "categoria", default)]
    pub category: Option<CategoryId>,
    #[serde(rename = "categoria_nombre", default)]
    pub category_name: Option<String>,
    #[serde(rename = "imagen", default)]
    pub image: Option<String>,
    #[serde(rename = "activo", default = "default_true")]
    pub active: bool,
    #[serde(rename = "destacado", default)]
    pub featured: bool,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "caracteristicas", default)]
    pub features: Option<String>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product catalog.
#[derive(Clone)]
pub struct CatalogClient {
    http: HttpClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self { http, cache }
    }

    /// Products flagged as featured, for the home screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        self.cached_products(CacheKey::FeaturedProducts, "products/productos/destacados/")
            .await
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.cached_products(CacheKey::Products, "products/productos/")
            .await
    }

    /// Products in one category. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, ApiError> {
        let path = format!("products/productos/por_categoria/?categoria_id={category_id}");
        let list: ListResponse<Product> = self.http.get(&path, None).await?;
        Ok(list.into_vec())
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.as_i64());

        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .http
            .get(&format!("products/productos/{id}/"), None)
            .await?;

        self.cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let list: ListResponse<Category> = self.http.get("products/categorias/", None).await?;
        let categories = list.into_vec();

        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Drop every cached catalog response.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    async fn cached_products(
        &self,
        cache_key: CacheKey,
        path: &str,
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&cache_key).await {
            debug!(path, "Cache hit for products");
            return Ok(products);
        }

        let list: ListResponse<Product> = self.http.get(path, None).await?;
        let products = list.into_vec();
        debug!(path, count = products.len(), "Fetched products");

        self.cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("http", &self.http)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_shape() {
        let json = r#"{
            "id": 5,
            "nombre": "Mouse inalámbrico",
            "descripcion": "2.4 GHz",
            "precio_venta": "25.00",
            "categoria": 2,
            "categoria_nombre": "Periféricos",
            "imagen": null,
            "activo": true,
            "destacado": true,
            "fecha_creacion": "2025-03-01T14:30:00.123456-04:00"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.price, Price::from(25));
        assert_eq!(product.category, Some(CategoryId::new(2)));
        assert!(product.featured);
        assert!(product.created_at.is_some());
    }

    #[test]
    fn test_product_minimal_shape() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "nombre": "Cable", "precio_venta": 3.5}"#).unwrap();
        assert!(product.active);
        assert!(!product.featured);
        assert_eq!(product.image, None);
    }

    #[test]
    fn test_category_shape() {
        let category: Category =
            serde_json::from_str(r#"{"id": 2, "nombre": "Periféricos", "caracteristicas": ""}"#)
                .unwrap();
        assert_eq!(category.name, "Periféricos");
    }

    #[test]
    fn test_null_text_fields_are_accepted() {
        let product: Product = serde_json::from_str(
            r#"{"id": 7, "nombre": "Lampara", "descripcion": null, "precio_venta": "12.00"}"#,
        )
        .unwrap();
        assert_eq!(product.description, None);

        let category: Category =
            serde_json::from_str(r#"{"id": 3, "nombre": "Hogar", "caracteristicas": null}"#)
                .unwrap();
        assert_eq!(category.features, None);
    }
}
