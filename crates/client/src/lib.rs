//! ShopEasy client engine.
//!
//! This crate is the client side of the ShopEasy store: everything a
//! frontend needs short of rendering. It owns the cart state machine and
//! talks to the ShopEasy REST API.
//!
//! # Architecture
//!
//! - [`cart::CartReconciler`] owns the authoritative [`shopeasy_core::CartSnapshot`]
//!   for the active session and runs the anonymous-to-authenticated merge on
//!   login. Collaborators are injected, so the reconciler is testable with
//!   in-memory fakes.
//! - [`api::ApiClient`] is a typed `reqwest` client for the auth, product,
//!   and cart endpoints.
//! - [`storage`] is the localStorage analog: a string key-value store with
//!   in-memory and file-backed implementations.
//! - [`session`] tracks whether the session is anonymous or authenticated
//!   and persists the bearer token.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopeasy_client::api::ApiClient;
//! use shopeasy_client::cart::CartReconciler;
//! use shopeasy_client::config::ClientConfig;
//! use shopeasy_client::session::SessionMode;
//! use shopeasy_client::storage::FileStore;
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config)?;
//! let store = FileStore::open(config.data_dir.join("storage.json"))?;
//!
//! let mut cart = CartReconciler::new(store, api.clone());
//! cart.add_line(&product, 1).await?;
//!
//! // Logging in migrates the anonymous cart into the account cart.
//! cart.on_mode_transition(SessionMode::Authenticated).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod session;
pub mod storage;
