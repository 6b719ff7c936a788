//! Subcommand implementations.
//!
//! Each command works on an [`AppState`](smartsales_client::state::AppState)
//! and prints its result to stdout. Logs go to stderr.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod sales;
