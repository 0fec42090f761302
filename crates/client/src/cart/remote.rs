//! Remote cart contract.
//!
//! The reconciler only needs five calls against the account cart. Keeping
//! them behind a trait lets tests drive the merge protocol with an
//! in-memory fake instead of a live server.

use thiserror::Error;

use shopeasy_core::{CartLineId, CartSnapshot, ProductId};

use crate::api::types::RemoteCartView;
use crate::api::{ApiClient, ApiError};

/// Failures of a remote cart call.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// Referenced product or cart line does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the request as malformed.
    #[error("rejected: {0}")]
    Validation(String),

    /// Transport failure or server-side error.
    #[error("server error: {0}")]
    Server(String),
}

/// The account cart as seen by the reconciler.
///
/// `add` merges by product ID on the server side: adding a product already
/// in the cart increments its quantity. `update` and `remove` address rows
/// by the server's line ID, which the snapshot returned from [`list`]
/// carries on every line.
///
/// [`list`]: RemoteCart::list
#[allow(async_fn_in_trait)]
pub trait RemoteCart {
    /// Fetch the full cart.
    async fn list(&self) -> Result<CartSnapshot, RemoteCartError>;

    /// Add units of a product, incrementing on conflict.
    async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteCartError>;

    /// Overwrite a line's quantity.
    async fn update(&self, line_id: &CartLineId, quantity: u32) -> Result<(), RemoteCartError>;

    /// Delete a line.
    async fn remove(&self, line_id: &CartLineId) -> Result<(), RemoteCartError>;

    /// Delete every line.
    async fn clear(&self) -> Result<(), RemoteCartError>;
}

impl From<ApiError> for RemoteCartError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(message) => Self::NotFound(message),
            ApiError::Validation(message) => Self::Validation(message),
            ApiError::Unauthorized(message) => Self::Server(format!("unauthorized: {message}")),
            other => Self::Server(other.to_string()),
        }
    }
}

impl RemoteCart for ApiClient {
    async fn list(&self) -> Result<CartSnapshot, RemoteCartError> {
        Ok(self.cart().await.map(RemoteCartView::into_snapshot)?)
    }

    async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteCartError> {
        self.cart_add(product_id, quantity).await?;
        Ok(())
    }

    async fn update(&self, line_id: &CartLineId, quantity: u32) -> Result<(), RemoteCartError> {
        Ok(self.cart_update(line_id, quantity).await?)
    }

    async fn remove(&self, line_id: &CartLineId) -> Result<(), RemoteCartError> {
        Ok(self.cart_remove(line_id).await?)
    }

    async fn clear(&self) -> Result<(), RemoteCartError> {
        Ok(self.cart_clear().await?)
    }
}
