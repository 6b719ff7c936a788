//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for everything the front-end can hit.
//! [`AppError::user_message`] gives the text to show; [`AppError::report`]
//! sends the unexpected ones to Sentry.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout did not produce a sale.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// The action needs a logged-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether this error points at a defect or broken environment rather
    /// than something the user can fix by changing input or retrying.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Io(_) => true,
            Self::Api(err) => matches!(
                err,
                ApiError::Parse(_) | ApiError::UnreadableSuccess { .. } | ApiError::Client(_)
            ),
            Self::Checkout(_) | Self::NotAuthenticated | Self::NotFound(_) => false,
        }
    }

    /// Message to show the user. Internal details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.to_string(),
            Self::Storage(_) => "Could not save your data on this device.".to_string(),
            Self::Api(err) => match err {
                ApiError::Connectivity(_) => "Could not connect to the server.".to_string(),
                ApiError::Rejected { message, .. }
                | ApiError::Unauthorized { message, .. }
                | ApiError::InvalidInput(message) => message.clone(),
                ApiError::Parse(_) | ApiError::UnreadableSuccess { .. } | ApiError::Client(_) => {
                    "Unexpected response from the server.".to_string()
                }
            },
            Self::Checkout(err) => err.user_message(),
            Self::NotAuthenticated => "You are not logged in.".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Io(err) => format!("Could not write file: {err}"),
        }
    }

    /// Log the error, capturing unexpected ones to Sentry.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Unexpected error"
            );
        } else {
            tracing::warn!(error = %self, "Action failed");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after login to associate errors with the user.
pub fn set_sentry_user(user_id: &impl ToString, username: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            email: email.filter(|e| !e.is_empty()).map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "5")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::ValidationError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 9".to_string());
        assert_eq!(err.to_string(), "Not found: product 9");

        let err = AppError::from(CheckoutError::Validation(ValidationError::EmptyCart));
        assert_eq!(
            err.to_string(),
            "Checkout error: checkout validation failed: the cart is empty"
        );
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::Api(ApiError::Parse("expected value at line 1".to_string()));
        assert_eq!(err.user_message(), "Unexpected response from the server.");
        assert!(err.is_unexpected());

        let err = AppError::Api(ApiError::UnreadableSuccess {
            status: 201,
            message: "missing field `total`".to_string(),
            body: r#"{"id": 1}"#.to_string(),
        });
        assert_eq!(err.user_message(), "Unexpected response from the server.");
        assert!(err.is_unexpected());

        let err = AppError::Api(ApiError::Rejected {
            status: 400,
            message: "Stock insuficiente".to_string(),
        });
        assert_eq!(err.user_message(), "Stock insuficiente");
        assert!(!err.is_unexpected());
    }

    #[test]
    fn test_checkout_errors_are_expected() {
        let err = AppError::from(CheckoutError::Connectivity("refused".to_string()));
        assert!(!err.is_unexpected());
        assert_eq!(err.user_message(), "Could not connect to the server.");
    }
}
