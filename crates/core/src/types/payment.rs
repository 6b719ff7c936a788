//! Payment method selection at checkout.
//!
//! The checkout screen offers shopper-facing labels (`efectivo`, `paypal`,
//! `stripe`). The backend's sale endpoint expects its own method codes, so a
//! label is mapped before submission.

use core::fmt;

/// A payment method chosen by the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// Cash on delivery or at the counter (`efectivo` -> `cash`).
    Cash,
    /// `PayPal` (`paypal` -> `paypal`).
    PayPal,
    /// Any other label, forwarded to the backend unchanged.
    ///
    /// The backend decides whether it accepts the method; the client does not
    /// maintain an allow-list.
    Other(String),
}

impl PaymentMethod {
    /// Map a checkout label to a payment method.
    ///
    /// Returns `None` when no method was selected (empty or whitespace label).
    ///
    /// ```
    /// use smartsales_core::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::from_label("efectivo"), Some(PaymentMethod::Cash));
    /// assert_eq!(PaymentMethod::from_label("efectivo").unwrap().backend_code(), "cash");
    /// assert_eq!(PaymentMethod::from_label("stripe").unwrap().backend_code(), "stripe");
    /// assert_eq!(PaymentMethod::from_label(""), None);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label {
            "" => None,
            "efectivo" | "cash" => Some(Self::Cash),
            "paypal" => Some(Self::PayPal),
            other => Some(Self::Other(other.to_owned())),
        }
    }

    /// Method code sent as `payment_method` in the sale request.
    #[must_use]
    pub fn backend_code(&self) -> &str {
        match self {
            Self::Cash => "cash",
            Self::PayPal => "paypal",
            Self::Other(code) => code,
        }
    }

    /// Whether this label had no known mapping and is being passed through.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "Efectivo"),
            Self::PayPal => write!(f, "PayPal"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}
