//! Core types for SmartSales.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod id;
pub mod payment;
pub mod price;
pub mod status;

pub use credential::{Credential, CredentialError};
pub use id::*;
pub use payment::PaymentMethod;
pub use price::Price;
pub use status::*;
