//! Integration tests for the SmartSales client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p smartsales-integration-tests
//! ```
//!
//! The tests need no running backend. [`MockBackend`] serves the subset of
//! the SmartSales REST API the client talks to on an ephemeral loopback port
//! and records the requests it receives.
//!
//! # Test Categories
//!
//! - `session` - Login, registration, logout and session persistence
//! - `catalog` - Product listing and adding catalog products to the cart
//! - `checkout` - Cart-to-order submission and error mapping
//! - `sales` - Sales history and receipt downloads

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use smartsales_client::config::ApiConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Token the mock issues on login and registration.
pub const TOKEN: &str = "tok-integration-0001";

/// Username and password the mock accepts.
pub const USERNAME: &str = "vendedor1";
pub const PASSWORD: &str = "secret123";

/// Path of the create-sale endpoint, relative to the server root.
pub const CREATE_SALE_PATH: &str = "/api/sales/ventas/crear-desde-carrito/";

/// Body served for receipt downloads.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4 smartsales mock receipt";

// ============================================================================
// Catalog fixture
// ============================================================================

struct MockProduct {
    id: i64,
    name: &'static str,
    price_cents: i64,
    category: i64,
    active: bool,
    featured: bool,
}

const PRODUCTS: &[MockProduct] = &[
    MockProduct {
        id: 5,
        name: "Mouse inalambrico",
        price_cents: 2500,
        category: 1,
        active: true,
        featured: true,
    },
    MockProduct {
        id: 6,
        name: "Teclado mecanico",
        price_cents: 4050,
        category: 1,
        active: true,
        featured: false,
    },
    MockProduct {
        id: 8,
        name: "Silla de oficina",
        price_cents: 12000,
        category: 2,
        active: true,
        featured: true,
    },
    MockProduct {
        id: 9,
        name: "Monitor descontinuado",
        price_cents: 9900,
        category: 1,
        active: false,
        featured: false,
    },
];

fn money(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn category_name(id: i64) -> &'static str {
    if id == 1 { "Perifericos" } else { "Muebles" }
}

impl MockProduct {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "nombre": self.name,
            "descripcion": (self.id != 8).then_some("Producto de prueba"),
            "precio_venta": money(self.price_cents),
            "categoria": self.category,
            "categoria_nombre": category_name(self.category),
            "imagen": null,
            "activo": self.active,
            "destacado": self.featured,
            "fecha_creacion": "2026-01-15T10:00:00Z",
        })
    }
}

fn find_product(id: i64) -> Option<&'static MockProduct> {
    PRODUCTS.iter().find(|p| p.id == id)
}

fn user_json(username: &str, email: &str) -> Value {
    json!({
        "id": 7,
        "username": username,
        "email": email,
        "first_name": "Ana",
        "last_name": "Rojas",
        "role": "seller",
        "role_display": "Vendedor",
        "phone": "70000000",
        "ciudad": "Santa Cruz",
    })
}

// ============================================================================
// Mock state
// ============================================================================

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// How the mock answers the next create-sale requests.
#[derive(Debug, Clone)]
pub enum SaleReply {
    /// Create the sale, reporting this payment status label.
    Create { payment_status: String },
    /// Accept the sale but answer with a body holding only its id.
    CreateBare,
    /// Refuse with this status and JSON body.
    Fail { status: u16, body: Value },
}

impl Default for SaleReply {
    fn default() -> Self {
        Self::Create {
            payment_status: "Completado".to_string(),
        }
    }
}

#[derive(Default)]
struct MockInner {
    requests: Mutex<Vec<RecordedRequest>>,
    sale_reply: Mutex<SaleReply>,
    sales: Mutex<Vec<Value>>,
    next_sale_id: AtomicI64,
    token_revoked: AtomicBool,
}

#[derive(Clone, Default)]
struct MockState(Arc<MockInner>);

impl MockState {
    fn record(&self, path: &str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.0
            .requests
            .lock()
            .expect("mock state poisoned")
            .push(RecordedRequest {
                path: path.to_string(),
                authorization,
                body,
            });
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Token {TOKEN}");
        !self.0.token_revoked.load(Ordering::SeqCst)
            && headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some(expected.as_str())
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Token invalido."})),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/api/users/users/login/", &headers, body.clone());

    let Ok(login) = serde_json::from_value::<LoginBody>(body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["Este campo es requerido."]})),
        )
            .into_response();
    };
    if login.username != USERNAME || login.password != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Credenciales invalidas"})),
        )
            .into_response();
    }

    state.0.token_revoked.store(false, Ordering::SeqCst);
    Json(json!({
        "user": user_json(USERNAME, "vendedor1@example.com"),
        "token": TOKEN,
    }))
    .into_response()
}

async fn register(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/api/users/users/", &headers, body.clone());

    let username = body["username"].as_str().unwrap_or_default();
    if username == USERNAME {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["Ya existe un usuario con este nombre."]})),
        )
            .into_response();
    }

    // Flat shape: user fields at the top level next to the token.
    let mut user = user_json(username, body["email"].as_str().unwrap_or_default());
    if let Some(fields) = user.as_object_mut() {
        fields.insert("token".to_string(), json!(TOKEN));
    }
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("/api/users/users/logout/", &headers, Value::Null);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"message": "Sesion cerrada"})).into_response()
}

async fn current_user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(user_json(USERNAME, "vendedor1@example.com")).into_response()
}

async fn products() -> Json<Value> {
    Json(json!({
        "count": PRODUCTS.len(),
        "results": PRODUCTS.iter().map(MockProduct::to_json).collect::<Vec<_>>(),
    }))
}

async fn featured_products() -> Json<Value> {
    Json(Value::Array(
        PRODUCTS
            .iter()
            .filter(|p| p.featured && p.active)
            .map(MockProduct::to_json)
            .collect(),
    ))
}

async fn products_by_category(Query(params): Query<HashMap<String, String>>) -> Response {
    let Some(category) = params
        .get("categoria_id")
        .and_then(|raw| raw.parse::<i64>().ok())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "categoria_id es requerido"})),
        )
            .into_response();
    };
    Json(Value::Array(
        PRODUCTS
            .iter()
            .filter(|p| p.category == category)
            .map(MockProduct::to_json)
            .collect(),
    ))
    .into_response()
}

async fn product(Path(id): Path<i64>) -> Response {
    find_product(id).map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response(),
        |product| Json(product.to_json()).into_response(),
    )
}

async fn categories() -> Json<Value> {
    Json(json!([
        {"id": 1, "nombre": "Perifericos", "caracteristicas": "Entrada y salida"},
        {"id": 2, "nombre": "Muebles", "caracteristicas": null},
    ]))
}

async fn create_sale(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(CREATE_SALE_PATH, &headers, body.clone());
    if !state.authorized(&headers) {
        return unauthorized();
    }

    let reply = state.0.sale_reply.lock().expect("mock state poisoned").clone();
    let payment_status = match reply {
        SaleReply::Fail { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
            return (status, Json(body)).into_response();
        }
        SaleReply::CreateBare => {
            let sale_id = state.0.next_sale_id.fetch_add(1, Ordering::SeqCst) + 1;
            return (StatusCode::CREATED, Json(json!({"id": sale_id}))).into_response();
        }
        SaleReply::Create { payment_status } => payment_status,
    };

    let sale_id = state.0.next_sale_id.fetch_add(1, Ordering::SeqCst) + 1;
    let mut total_cents = 0;
    let mut lines = Vec::new();
    for (item, line_id) in body["items"].as_array().into_iter().flatten().zip(1..) {
        let product_id = item["producto_id"].as_i64().unwrap_or_default();
        let quantity = item["cantidad"].as_i64().unwrap_or_default();
        let Some(product) = find_product(product_id).filter(|p| p.active) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"items": [format!("Producto {product_id} no disponible")]})),
            )
                .into_response();
        };
        total_cents += product.price_cents * quantity;
        lines.push(json!({
            "id": sale_id * 100 + line_id,
            "producto": product.id,
            "nombre_producto": product.name,
            "precio_unitario": money(product.price_cents),
            "cantidad": quantity,
        }));
    }

    let method_label = match body["payment_method"].as_str() {
        Some("cash") => "Efectivo",
        Some("paypal") => "PayPal",
        Some(other) => other,
        None => "",
    };
    let sale = json!({
        "id": sale_id,
        "pago": sale_id + 500,
        "pago_status": payment_status,
        "pago_method": method_label,
        "total": money(total_cents),
        "estado": "COMPLETADO",
        "get_estado_display": "Completado",
        "fecha_creacion": "2026-03-02T15:30:00Z",
        "detalles": lines,
    });
    state
        .0
        .sales
        .lock()
        .expect("mock state poisoned")
        .push(sale.clone());

    (StatusCode::CREATED, Json(sale)).into_response()
}

async fn sales(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let sales = state.0.sales.lock().expect("mock state poisoned").clone();
    Json(json!({"count": sales.len(), "results": sales})).into_response()
}

async fn download_sale(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path((id, kind)): Path<(i64, String)>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let exists = state
        .0
        .sales
        .lock()
        .expect("mock state poisoned")
        .iter()
        .any(|sale| sale["id"].as_i64() == Some(id));
    if !exists {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response();
    }

    match kind.as_str() {
        "download-pdf" => {
            ([(header::CONTENT_TYPE, "application/pdf")], PDF_BYTES).into_response()
        }
        "download-excel" => (
            [(
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )],
            b"PK mock workbook".as_slice(),
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/users/users/", post(register))
        .route("/api/users/users/login/", post(login))
        .route("/api/users/users/logout/", post(logout))
        .route("/api/users/users/current_user/", get(current_user))
        .route("/api/products/productos/", get(products))
        .route("/api/products/productos/destacados/", get(featured_products))
        .route(
            "/api/products/productos/por_categoria/",
            get(products_by_category),
        )
        .route("/api/products/productos/{id}/", get(product))
        .route("/api/products/categorias/", get(categories))
        .route(CREATE_SALE_PATH, post(create_sale))
        .route("/api/sales/ventas/", get(sales))
        .route("/api/sales/ventas/{id}/{kind}/", get(download_sale))
        .with_state(state)
}

// ============================================================================
// MockBackend
// ============================================================================

/// A SmartSales backend stand-in listening on `127.0.0.1`.
///
/// The server task is aborted when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the loopback listener cannot be bound.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local address");

        let state = MockState::default();
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the generated URL is rejected, which would be a bug here.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&format!("http://{}/api", self.addr)).expect("Mock URL is valid")
    }

    /// Answer subsequent create-sale requests with `reply`.
    pub fn set_sale_reply(&self, reply: SaleReply) {
        *self.state.0.sale_reply.lock().expect("mock state poisoned") = reply;
    }

    /// Make the issued token invalid until the next successful login.
    pub fn revoke_token(&self) {
        self.state.0.token_revoked.store(true, Ordering::SeqCst);
    }

    /// Recorded requests to `path` (e.g. [`CREATE_SALE_PATH`]).
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .0
            .requests
            .lock()
            .expect("mock state poisoned")
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Configuration for an address nothing listens on.
///
/// # Panics
///
/// Panics if a loopback port cannot be reserved.
pub async fn closed_port_config() -> ApiConfig {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    ApiConfig::new(&format!("http://{addr}/api")).expect("URL is valid")
}
