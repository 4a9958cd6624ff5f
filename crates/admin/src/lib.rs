//! Solewave Admin library.
//!
//! The back-office JSON API (orders, catalog, users, creator program,
//! analytics) as a library, so the CLI can reuse its repositories and the
//! router can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
