//! ShopEasy Core - Shared types library.
//!
//! This crate provides common types used across all ShopEasy components:
//! - `client` - Cart engine and REST API client
//! - `cli` - Command-line storefront shell
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, cart model, product and user types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
