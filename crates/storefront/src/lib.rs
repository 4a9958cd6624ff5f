//! Solewave Storefront library.
//!
//! The public JSON API (catalog, cart, checkout, auth, account, creator
//! dashboard, wallet) as a library, so the binary stays thin and the router
//! can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
