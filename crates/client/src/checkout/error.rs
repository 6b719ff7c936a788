//! Checkout error taxonomy.
//!
//! Every checkout failure is recoverable: the cart is left untouched and the
//! flow returns to idle with the error attached, so the user can fix the
//! input (or wait for the network) and try again.

use thiserror::Error;

use crate::api::ApiError;

/// A precondition failed locally. No request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the cart is empty")]
    EmptyCart,

    #[error("no payment method selected")]
    MissingPaymentMethod,

    #[error("not authenticated")]
    NotAuthenticated,

    /// A cart line's id is not a numeric product id.
    #[error("invalid product id '{0}'")]
    InvalidProductId(String),

    /// A cart line has a zero quantity.
    #[error("invalid quantity for product '{0}'")]
    InvalidQuantity(String),
}

/// Why a checkout attempt did not produce a sale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("checkout validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The backend answered with a non-success status.
    #[error("sale rejected ({status}): {message}")]
    BackendRejected { status: u16, message: String },

    /// The request never got a response.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// A submission for this checkout is already in flight.
    #[error("a checkout is already being submitted")]
    AlreadySubmitting,
}

impl CheckoutError {
    /// Whether the user can retry without restarting the app.
    ///
    /// Always true: no checkout failure is fatal.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_)
            | Self::BackendRejected { .. }
            | Self::Connectivity(_)
            | Self::AlreadySubmitting => true,
        }
    }

    /// Message to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::EmptyCart) => "Your cart is empty.".to_string(),
            Self::Validation(ValidationError::MissingPaymentMethod) => {
                "Please select a payment method.".to_string()
            }
            Self::Validation(ValidationError::NotAuthenticated) => {
                "You are not logged in. Please log in and try again.".to_string()
            }
            Self::Validation(ValidationError::InvalidProductId(_) | ValidationError::InvalidQuantity(_)) => {
                "Your cart contains an invalid item. Please remove it and try again.".to_string()
            }
            Self::BackendRejected { message, .. } => message.clone(),
            Self::Connectivity(_) => "Could not connect to the server.".to_string(),
            Self::AlreadySubmitting => "Your order is already being processed.".to_string(),
        }
    }
}

impl From<ApiError> for CheckoutError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Connectivity(message) => Self::Connectivity(message),
            ApiError::Rejected { status, message } | ApiError::Unauthorized { status, message } => {
                Self::BackendRejected { status, message }
            }
            // Checkout concludes an unreadable 2xx as a sale before reaching here.
            ApiError::UnreadableSuccess { status, message, .. } => Self::BackendRejected {
                status,
                message: format!("Unexpected response from server: {message}"),
            },
            ApiError::Parse(message) => Self::BackendRejected {
                status: 0,
                message: format!("Unexpected response from server: {message}"),
            },
            // Not produced by the sales endpoint; status 0 marks "no HTTP status".
            ApiError::InvalidInput(message) => Self::BackendRejected { status: 0, message },
            ApiError::Client(e) => Self::Connectivity(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_is_recoverable() {
        let errors = [
            CheckoutError::Validation(ValidationError::EmptyCart),
            CheckoutError::BackendRejected {
                status: 400,
                message: "Stock insuficiente".to_string(),
            },
            CheckoutError::Connectivity("connection refused".to_string()),
            CheckoutError::AlreadySubmitting,
        ];
        assert!(errors.iter().all(CheckoutError::is_recoverable));
    }

    #[test]
    fn test_api_error_mapping() {
        assert_eq!(
            CheckoutError::from(ApiError::Connectivity("refused".to_string())),
            CheckoutError::Connectivity("refused".to_string())
        );
        assert_eq!(
            CheckoutError::from(ApiError::Rejected {
                status: 400,
                message: "Stock insuficiente".to_string()
            }),
            CheckoutError::BackendRejected {
                status: 400,
                message: "Stock insuficiente".to_string()
            }
        );
        assert!(matches!(
            CheckoutError::from(ApiError::Unauthorized {
                status: 401,
                message: "Token inválido.".to_string()
            }),
            CheckoutError::BackendRejected { status: 401, .. }
        ));
        assert!(matches!(
            CheckoutError::from(ApiError::Parse("bad body".to_string())),
            CheckoutError::BackendRejected { status: 0, .. }
        ));
    }

    #[test]
    fn test_user_messages() {
        let rejected = CheckoutError::BackendRejected {
            status: 400,
            message: "Stock insuficiente".to_string(),
        };
        assert_eq!(rejected.user_message(), "Stock insuficiente");
        assert_eq!(
            CheckoutError::Connectivity("refused".to_string()).user_message(),
            "Could not connect to the server."
        );
    }
}
