//! SmartSales client library.
//!
//! Everything a storefront front-end needs between the shopper and the
//! SmartSales REST backend:
//!
//! - [`session`] - who is logged in, persisted across restarts
//! - [`cart`] - the shopping cart and its invariants
//! - [`checkout`] - the one-shot cart-to-sale transaction and its state machine
//! - [`api`] - typed clients for the Users, Sales and Catalog endpoints
//! - [`storage`] - durable key/value storage backing the session and cart
//! - [`state`] - [`AppState`](state::AppState), wiring all of the above together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod storage;
