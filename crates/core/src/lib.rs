//! SmartSales Core - Shared types library.
//!
//! This crate provides the domain types used across all SmartSales components:
//! - `client` - Session store, cart, backend API clients and checkout pipeline
//! - `cli` - Command-line storefront built on the client library
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no storage access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, credentials,
//!   payment methods and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
