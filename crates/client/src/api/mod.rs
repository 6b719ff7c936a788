//! REST clients for the SmartSales backend.
//!
//! # Architecture
//!
//! - One shared [`HttpClient`] (a `reqwest::Client` plus the API root) per process
//! - Thin domain clients on top: [`UsersClient`], [`SalesClient`], [`CatalogClient`]
//! - Authenticated calls carry `Authorization: Token <credential>`
//! - Catalog responses cached in-memory via `moka` (5 minute TTL)
//!
//! # Errors
//!
//! Every call resolves to an [`ApiError`]. The distinction that matters to
//! callers is between a request that never got a response
//! ([`ApiError::Connectivity`]) and one the backend answered with a
//! non-success status ([`ApiError::Rejected`] / [`ApiError::Unauthorized`]).
//! Backend error payloads are flattened into one readable message by
//! [`error_message_from_payload`].

mod cache;
pub mod catalog;
pub mod sales;
pub mod users;

pub use catalog::{CatalogClient, Category, Product};
pub use sales::{
    CreateSaleRequest, DownloadedFile, FileFormat, SaleItemRequest, SaleLineRecord, SaleRecord,
    SalesClient,
};
pub use users::{AuthResponse, RegistrationForm, UsersClient};

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smartsales_core::Credential;
use thiserror::Error;

use crate::config::ApiConfig;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("smartsales/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (DNS, refused connection, reset, timeout).
    #[error("Could not reach the server: {0}")]
    Connectivity(String),

    /// The backend answered with a non-success status.
    #[error("Backend error {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The backend refused the credential (401/403).
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The response body was not what the client expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backend accepted the request (2xx) but its body could not be
    /// read. The operation took effect; `body` keeps the raw text.
    #[error("Unreadable response ({status}): {message}")]
    UnreadableSuccess {
        status: u16,
        message: String,
        body: String,
    },

    /// Input rejected locally before any request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a backend rejection, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Unauthorized { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend carried out the request despite the error.
    #[must_use]
    pub const fn succeeded_remotely(&self) -> bool {
        matches!(self, Self::UnreadableSuccess { .. })
    }

    /// Whether the backend refused the credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::Client(err)
        } else {
            Self::Connectivity(err.to_string())
        }
    }
}

// =============================================================================
// Error payload flattening
// =============================================================================

/// Keys checked, in order, for a top-level error message.
const MESSAGE_KEYS: [&str; 4] = ["error", "detail", "items", "message"];

/// Flatten a backend error payload into a single human-readable message.
///
/// Looks at `error`, `detail`, `items` and `message` in that order, then at
/// any other field errors. A string is used as-is; a list of messages is
/// joined with `"; "`. When nothing usable is found the message falls back to
/// `"Error <status>: <reason>"`.
///
/// ```
/// use reqwest::StatusCode;
/// use serde_json::json;
/// use smartsales_client::api::error_message_from_payload;
///
/// let payload = json!({"items": ["Stock insuficiente"]});
/// assert_eq!(
///     error_message_from_payload(&payload, StatusCode::BAD_REQUEST),
///     "Stock insuficiente"
/// );
/// assert_eq!(
///     error_message_from_payload(&json!({}), StatusCode::BAD_REQUEST),
///     "Error 400: Bad Request"
/// );
/// ```
#[must_use]
pub fn error_message_from_payload(payload: &Value, status: StatusCode) -> String {
    let fallback = || {
        format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    };

    let message = match payload {
        Value::Object(fields) => MESSAGE_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .map(flatten_messages)
            .find(|message| !message.is_empty())
            .or_else(|| {
                // Field-level validation errors: {"password": ["..."], ...}
                let joined = fields
                    .iter()
                    .filter(|(key, _)| !MESSAGE_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key, flatten_messages(value)))
                    .filter(|(_, message)| !message.is_empty())
                    .map(|(key, message)| format!("{key}: {message}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }),
        other => Some(flatten_messages(other)).filter(|message| !message.is_empty()),
    };

    message.unwrap_or_else(fallback)
}

fn flatten_messages(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(message) => message.trim().to_string(),
        Value::Array(values) => join_non_empty(values.iter().map(flatten_messages)),
        Value::Object(fields) => join_non_empty(fields.values().map(flatten_messages)),
        other => other.to_string(),
    }
}

fn join_non_empty(messages: impl Iterator<Item = String>) -> String {
    messages
        .filter(|message| !message.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// List responses
// =============================================================================

/// A list endpoint response: either a paginated envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Paginated { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Paginated { results } => results,
            Self::Bare(items) => items,
        }
    }
}

// =============================================================================
// HttpClient
// =============================================================================

/// Shared HTTP plumbing for the domain clients.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpClient {
    /// Create a new HTTP client for the configured API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client,
                config: config.clone(),
            }),
        })
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        self.inner.config.endpoint(path)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> reqwest::RequestBuilder {
        let builder = self.inner.client.request(method, self.endpoint(path));
        match credential {
            Some(credential) => builder.header(
                reqwest::header::AUTHORIZATION,
                credential.authorization_header(),
            ),
            None => builder,
        }
    }

    /// Execute a GET request and parse the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let response = self
            .request(reqwest::Method::GET, path, credential)
            .send()
            .await?;
        Self::handle_response(path, response).await
    }

    /// Execute a POST request with a JSON body and parse the JSON response.
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let response = self
            .request(reqwest::Method::POST, path, credential)
            .json(body)
            .send()
            .await?;
        Self::handle_response(path, response).await
    }

    /// Execute a GET request and return the raw body.
    pub(crate) async fn get_bytes(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<(Option<String>, Vec<u8>), ApiError> {
        let response = self
            .request(reqwest::Method::GET, path, credential)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::rejection(path, status, &body));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?;
        Ok((content_type, bytes.to_vec()))
    }

    /// Handle an API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        // Body read failures after the status arrived are still transport failures.
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::rejection(path, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                path,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::UnreadableSuccess {
                status: status.as_u16(),
                message: e.to_string(),
                body: body.clone(),
            }
        })
    }

    /// Turn a non-success response into an [`ApiError`].
    fn rejection(path: &str, status: StatusCode, body: &str) -> ApiError {
        let payload = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
        let message = error_message_from_payload(&payload, status);

        tracing::warn!(
            path,
            status = status.as_u16(),
            message = %message,
            "Backend returned non-success status"
        );

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            ApiError::Unauthorized {
                status: status.as_u16(),
                message,
            }
        } else {
            ApiError::Rejected {
                status: status.as_u16(),
                message,
            }
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}
