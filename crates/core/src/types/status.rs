//! Role and status enums mirrored from the backend's choice fields.
//!
//! The backend serializes some of these as machine codes (`completed`) and
//! others as their human display label (`Completado`), so parsing accepts both.

use serde::{Deserialize, Serialize};

/// User role in the store.
///
/// Unknown roles are kept verbatim rather than rejected so a backend that adds
/// a role does not lock existing clients out of hydrating their session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    /// Full access to store management features.
    Admin,
    /// Can sell and view sales reports.
    Seller,
    /// Regular shopper.
    #[default]
    Customer,
    /// Any role this client does not know about.
    Other(String),
}

impl UserRole {
    /// Backend code for this role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Customer => "customer",
            Self::Other(code) => code,
        }
    }

    /// Whether this role may see staff screens (users, reports, dashboards).
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Seller)
    }
}

impl From<String> for UserRole {
    fn from(code: String) -> Self {
        match code.as_str() {
            "admin" => Self::Admin,
            "seller" => Self::Seller,
            "customer" => Self::Customer,
            _ => Self::Other(code),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Other(code) => code,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

/// Payment status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Parse either the backend code (`completed`) or its display label
    /// (`Completado`), case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Some(Self::Pending),
            "completed" | "completado" => Some(Self::Completed),
            "failed" | "fallido" => Some(Self::Failed),
            "cancelled" | "cancelado" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Backend code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Display label as shown to shoppers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Completed => "Completado",
            Self::Failed => "Fallido",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Whether the money has been collected.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SaleStatus {
    #[default]
    #[serde(rename = "PROCESANDO")]
    Processing,
    #[serde(rename = "COMPLETADO")]
    Completed,
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "Procesando"),
            Self::Completed => write!(f, "Completado"),
            Self::Cancelled => write!(f, "Cancelado"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_known_and_unknown() {
        let role: UserRole = serde_json::from_str("\"seller\"").unwrap();
        assert_eq!(role, UserRole::Seller);
        assert!(role.is_staff());

        let role: UserRole = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(role, UserRole::Other("auditor".to_string()));
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"auditor\"");
        assert!(!role.is_staff());
    }

    #[test]
    fn test_payment_status_parses_code_and_label() {
        assert_eq!(PaymentStatus::parse("completed"), Some(PaymentStatus::Completed));
        assert_eq!(PaymentStatus::parse("Completado"), Some(PaymentStatus::Completed));
        assert_eq!(PaymentStatus::parse("Pendiente"), Some(PaymentStatus::Pending));
        assert_eq!(PaymentStatus::parse("refunded"), None);
    }

    #[test]
    fn test_payment_status_is_paid() {
        assert!(PaymentStatus::Completed.is_paid());
        assert!(!PaymentStatus::Pending.is_paid());
    }

    #[test]
    fn test_sale_status_wire_names() {
        let status: SaleStatus = serde_json::from_str("\"COMPLETADO\"").unwrap();
        assert_eq!(status, SaleStatus::Completed);
        assert_eq!(
            serde_json::to_string(&SaleStatus::Processing).unwrap(),
            "\"PROCESANDO\""
        );
    }
}
