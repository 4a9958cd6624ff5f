//! Solewave Core - Shared domain library.
//!
//! This crate provides the types and rules shared by all Solewave components:
//! - `storefront` - Public JSON API for the shop, cart, checkout and creator dashboard
//! - `admin` - Back-office API (orders, products, users, creators, analytics)
//! - `cli` - Command-line tools for migrations, seeding and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that touches money lives here so the two
//! binaries can never disagree on a total, a commission or a credit conversion.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices and statuses
//! - [`tier`] - Creator commission tiers and the follower payout table
//! - [`credits`] - Credit/dollar conversion
//! - [`coupon`] - Coupon code validation and discount math
//! - [`cart`] - Session cart
//! - [`stock`] - Low-stock threshold and availability labels
//! - [`checkout`] - Checkout pricing (coupon, credits, commission)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod credits;
pub mod stock;
pub mod tier;
pub mod types;

pub use types::*;
