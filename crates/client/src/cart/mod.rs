//! Cart reconciliation.
//!
//! [`CartReconciler`] owns the single authoritative [`CartSnapshot`] for
//! the active session and keeps it consistent with the session mode:
//!
//! - **Anonymous**: the cart lives in local storage. Mutations apply to the
//!   in-memory snapshot and are persisted on every change.
//! - **Authenticated**: the remote cart is authoritative. Every mutation is
//!   a remote call followed by a full re-fetch; the snapshot is never
//!   patched optimistically, so it cannot drift from the server.
//!
//! # Login merge
//!
//! The anonymous-to-authenticated transition migrates the guest cart into
//! the account cart exactly once: each stored line is replayed as a
//! sequential remote `add` (the server increments on conflict), and the
//! local blob is deleted only after every add succeeded. A failed merge
//! leaves the blob in place, so the next login transition retries the whole
//! merge. This is at-least-once, not exactly-once: a retry after a partial
//! failure re-adds lines that already landed, and the additive `add`
//! semantics make that visible as an inflated quantity rather than a
//! duplicate row. Merge failures are logged and swallowed; losing a guest
//! cart is worse than merging it late.
//!
//! Mutation failures, by contrast, always propagate as
//! [`CartOperationFailed`] and leave the snapshot untouched.

mod remote;

pub use remote::{RemoteCart, RemoteCartError};

use rust_decimal::Decimal;
use tracing::instrument;

use shopeasy_core::{CartLine, CartSnapshot, Product, ProductId};

use crate::session::SessionMode;
use crate::storage::{LocalStore, StoreError, keys};

/// The cart operation that was being attempted when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    /// `add_line`
    Add,
    /// `set_quantity`
    SetQuantity,
    /// `remove_line`
    Remove,
    /// `clear`
    Clear,
    /// `refresh`
    Refresh,
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::SetQuantity => "set-quantity",
            Self::Remove => "remove",
            Self::Clear => "clear",
            Self::Refresh => "refresh",
        };
        write!(f, "{name}")
    }
}

/// Why a cart operation failed.
#[derive(Debug, thiserror::Error)]
pub enum CartErrorKind {
    /// Referenced product or cart line does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input was malformed.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Remote call failed for transport or server reasons.
    #[error("server error: {0}")]
    Server(String),

    /// Local storage could not be read or written.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<RemoteCartError> for CartErrorKind {
    fn from(e: RemoteCartError) -> Self {
        match e {
            RemoteCartError::NotFound(message) => Self::NotFound(message),
            RemoteCartError::Validation(message) => Self::Validation(message),
            RemoteCartError::Server(message) => Self::Server(message),
        }
    }
}

/// A mutating cart operation failed; the in-memory snapshot is unchanged.
#[derive(Debug, thiserror::Error)]
#[error("cart operation `{operation}` failed")]
pub struct CartOperationFailed {
    /// The attempted operation.
    pub operation: CartOperation,
    /// The product involved, when the operation targets one.
    pub product_id: Option<ProductId>,
    /// Underlying cause.
    #[source]
    pub kind: CartErrorKind,
}

impl CartOperationFailed {
    fn new(operation: CartOperation, product_id: Option<ProductId>, kind: CartErrorKind) -> Self {
        Self {
            operation,
            product_id,
            kind,
        }
    }
}

/// Owner of the session's cart state.
///
/// One reconciler exists per session, all operations take `&mut self`, and
/// remote calls during a merge run sequentially - so overlapping merges or
/// racing mutations are unrepresentable without wrapping the reconciler in
/// a lock of the caller's choosing.
pub struct CartReconciler<S, R> {
    store: S,
    remote: R,
    mode: SessionMode,
    snapshot: CartSnapshot,
}

impl<S: LocalStore, R: RemoteCart> CartReconciler<S, R> {
    /// Create a reconciler in anonymous mode, seeded from the cart blob in
    /// local storage when one exists.
    ///
    /// An unreadable blob is logged and treated as an empty cart rather
    /// than failing construction; the blob itself is left in place.
    pub fn new(store: S, remote: R) -> Self {
        let mut reconciler = Self {
            store,
            remote,
            mode: SessionMode::Anonymous,
            snapshot: CartSnapshot::new(),
        };
        reconciler.snapshot = reconciler.load_local().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored anonymous cart is unreadable, starting empty");
            CartSnapshot::new()
        });
        reconciler
    }

    /// The active session mode.
    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// The current authoritative snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// Sum of quantity x unit price over the current snapshot.
    ///
    /// Recomputed on every call; never cached.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.snapshot.total()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity_delta` units of a product to the cart.
    ///
    /// A line for the same product merges quantities instead of
    /// duplicating. A non-positive delta is coerced to removal.
    ///
    /// # Errors
    ///
    /// `NotFound` when the remote rejects the product reference, `Server`
    /// on transport failure, `Storage` when the local blob cannot be
    /// written. The snapshot is unchanged on error.
    #[instrument(skip(self, product), fields(product_id = %product.id, mode = %self.mode))]
    pub async fn add_line(
        &mut self,
        product: &Product,
        quantity_delta: i64,
    ) -> Result<&CartSnapshot, CartOperationFailed> {
        if quantity_delta <= 0 {
            return self.remove_line_inner(CartOperation::Add, &product.id).await;
        }
        let quantity = checked_quantity(CartOperation::Add, &product.id, quantity_delta)?;

        if self.mode.is_authenticated() {
            self.remote
                .add(&product.id, quantity)
                .await
                .map_err(|e| {
                    CartOperationFailed::new(CartOperation::Add, Some(product.id.clone()), e.into())
                })?;
            return self.refetch(CartOperation::Add, Some(product.id.clone())).await;
        }

        let mut next = self.snapshot.clone();
        next.add(CartLine::from_product(product, quantity));
        self.commit_local(CartOperation::Add, Some(product.id.clone()), next)
    }

    /// Overwrite the quantity of the line for a product.
    ///
    /// A quantity of zero or less behaves exactly like [`remove_line`].
    ///
    /// # Errors
    ///
    /// `NotFound` when no line exists for the product (authenticated: when
    /// no server-side line is known). The snapshot is unchanged on error.
    ///
    /// [`remove_line`]: Self::remove_line
    #[instrument(skip(self), fields(product_id = %product_id, mode = %self.mode))]
    pub async fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<&CartSnapshot, CartOperationFailed> {
        if quantity <= 0 {
            return self.remove_line_inner(CartOperation::SetQuantity, product_id).await;
        }
        let quantity = checked_quantity(CartOperation::SetQuantity, product_id, quantity)?;

        if self.mode.is_authenticated() {
            let line_id = self
                .snapshot
                .get(product_id)
                .and_then(|line| line.line_id().cloned())
                .ok_or_else(|| {
                    CartOperationFailed::new(
                        CartOperation::SetQuantity,
                        Some(product_id.clone()),
                        CartErrorKind::NotFound(format!("no cart line for product {product_id}")),
                    )
                })?;
            self.remote.update(&line_id, quantity).await.map_err(|e| {
                CartOperationFailed::new(
                    CartOperation::SetQuantity,
                    Some(product_id.clone()),
                    e.into(),
                )
            })?;
            return self
                .refetch(CartOperation::SetQuantity, Some(product_id.clone()))
                .await;
        }

        let mut next = self.snapshot.clone();
        if !next.set_quantity(product_id, quantity) {
            return Err(CartOperationFailed::new(
                CartOperation::SetQuantity,
                Some(product_id.clone()),
                CartErrorKind::NotFound(format!("no cart line for product {product_id}")),
            ));
        }
        self.commit_local(CartOperation::SetQuantity, Some(product_id.clone()), next)
    }

    /// Remove the line for a product. Removing an unknown product is a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// `Server` on remote failure, `Storage` when the local blob cannot be
    /// written. The snapshot is unchanged on error.
    #[instrument(skip(self), fields(product_id = %product_id, mode = %self.mode))]
    pub async fn remove_line(
        &mut self,
        product_id: &ProductId,
    ) -> Result<&CartSnapshot, CartOperationFailed> {
        self.remove_line_inner(CartOperation::Remove, product_id).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// `Server` on remote failure, `Storage` when the local blob cannot be
    /// written. The snapshot is unchanged on error.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn clear(&mut self) -> Result<&CartSnapshot, CartOperationFailed> {
        if self.mode.is_authenticated() {
            self.remote
                .clear()
                .await
                .map_err(|e| CartOperationFailed::new(CartOperation::Clear, None, e.into()))?;
            return self.refetch(CartOperation::Clear, None).await;
        }

        self.commit_local(CartOperation::Clear, None, CartSnapshot::new())
    }

    /// Re-derive the authoritative snapshot for the current mode: re-read
    /// local storage when anonymous, re-fetch the remote cart when
    /// authenticated.
    ///
    /// # Errors
    ///
    /// `Server` or `Storage` depending on the mode. The snapshot is
    /// unchanged on error.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn refresh(&mut self) -> Result<&CartSnapshot, CartOperationFailed> {
        if self.mode.is_authenticated() {
            return self.refetch(CartOperation::Refresh, None).await;
        }
        self.snapshot = self
            .load_local()
            .map_err(|kind| CartOperationFailed::new(CartOperation::Refresh, None, kind))?;
        Ok(&self.snapshot)
    }

    // =========================================================================
    // Mode transitions
    // =========================================================================

    /// React to a login or logout.
    ///
    /// - `Anonymous -> Authenticated` runs the one-time merge of the guest
    ///   cart into the account cart, then adopts the remote cart as the
    ///   authoritative snapshot. Merge failures are logged, keep the local
    ///   blob for a retry on the next login, and leave the snapshot as
    ///   whatever was last fetched.
    /// - `Authenticated -> Anonymous` discards the in-memory cart (the
    ///   remote cart is not deleted) and reloads whatever guest cart local
    ///   storage holds - normally empty, since a merged blob is removed.
    /// - A transition to the mode already active is a no-op.
    #[instrument(skip(self), fields(from = %self.mode, to = %new_mode))]
    pub async fn on_mode_transition(&mut self, new_mode: SessionMode) -> &CartSnapshot {
        if new_mode == self.mode {
            return &self.snapshot;
        }
        self.mode = new_mode;

        match new_mode {
            SessionMode::Anonymous => {
                self.snapshot = self.load_local().unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "stored anonymous cart is unreadable, starting empty");
                    CartSnapshot::new()
                });
            }
            SessionMode::Authenticated => {
                match self.merge_anonymous_cart().await {
                    Ok(()) => match self.remote.list().await {
                        Ok(snapshot) => self.snapshot = snapshot,
                        Err(e) => {
                            tracing::warn!(error = %e, "cart re-fetch after login failed, keeping stale snapshot");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "anonymous cart merge failed, keeping local cart for retry");
                    }
                }
            }
        }

        &self.snapshot
    }

    /// Replay the stored anonymous cart into the account cart, then
    /// consume the local blob.
    ///
    /// Adds run sequentially so at most one write against the cart is in
    /// flight at a time. The blob is removed only after the last add
    /// succeeded; any earlier failure aborts the remaining adds and leaves
    /// it untouched.
    async fn merge_anonymous_cart(&mut self) -> Result<(), CartErrorKind> {
        let local = self.load_local()?;
        if local.is_empty() {
            return Ok(());
        }

        for line in local.lines() {
            self.remote
                .add(line.product_id(), line.quantity())
                .await
                .map_err(CartErrorKind::from)?;
        }

        self.store.remove(keys::CART)?;
        tracing::info!(lines = local.len(), "anonymous cart merged into account cart");
        Ok(())
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn remove_line_inner(
        &mut self,
        operation: CartOperation,
        product_id: &ProductId,
    ) -> Result<&CartSnapshot, CartOperationFailed> {
        if self.mode.is_authenticated() {
            let Some(line_id) = self
                .snapshot
                .get(product_id)
                .and_then(|line| line.line_id().cloned())
            else {
                // No server-side line is known for this product
                return Ok(&self.snapshot);
            };
            self.remote.remove(&line_id).await.map_err(|e| {
                CartOperationFailed::new(operation, Some(product_id.clone()), e.into())
            })?;
            return self.refetch(operation, Some(product_id.clone())).await;
        }

        if !self.snapshot.contains(product_id) {
            return Ok(&self.snapshot);
        }
        let mut next = self.snapshot.clone();
        next.remove(product_id);
        self.commit_local(operation, Some(product_id.clone()), next)
    }

    /// Fetch the remote cart and adopt it as the authoritative snapshot.
    async fn refetch(
        &mut self,
        operation: CartOperation,
        product_id: Option<ProductId>,
    ) -> Result<&CartSnapshot, CartOperationFailed> {
        let snapshot = self
            .remote
            .list()
            .await
            .map_err(|e| CartOperationFailed::new(operation, product_id, e.into()))?;
        self.snapshot = snapshot;
        Ok(&self.snapshot)
    }

    /// Persist a mutated anonymous snapshot, then adopt it. The in-memory
    /// snapshot only changes once the write succeeded.
    fn commit_local(
        &mut self,
        operation: CartOperation,
        product_id: Option<ProductId>,
        next: CartSnapshot,
    ) -> Result<&CartSnapshot, CartOperationFailed> {
        self.persist_local(&next)
            .map_err(|kind| CartOperationFailed::new(operation, product_id, kind))?;
        self.snapshot = next;
        Ok(&self.snapshot)
    }

    fn load_local(&self) -> Result<CartSnapshot, CartErrorKind> {
        match self.store.get(keys::CART)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| CartErrorKind::Storage(StoreError::Encoding(e))),
            None => Ok(CartSnapshot::new()),
        }
    }

    fn persist_local(&mut self, snapshot: &CartSnapshot) -> Result<(), CartErrorKind> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| CartErrorKind::Storage(StoreError::Encoding(e)))?;
        self.store.set(keys::CART, &raw)?;
        Ok(())
    }
}

fn checked_quantity(
    operation: CartOperation,
    product_id: &ProductId,
    quantity: i64,
) -> Result<u32, CartOperationFailed> {
    u32::try_from(quantity).map_err(|_| {
        CartOperationFailed::new(
            operation,
            Some(product_id.clone()),
            CartErrorKind::Validation(format!("quantity {quantity} out of range")),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(CartOperation::Add.to_string(), "add");
        assert_eq!(CartOperation::SetQuantity.to_string(), "set-quantity");
    }

    #[test]
    fn test_operation_failed_display_and_source() {
        let err = CartOperationFailed::new(
            CartOperation::Add,
            Some(ProductId::new("p1")),
            CartErrorKind::NotFound("no such product".to_owned()),
        );
        assert_eq!(err.to_string(), "cart operation `add` failed");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "not found: no such product");
    }

    #[test]
    fn test_remote_error_mapping() {
        let kind: CartErrorKind = RemoteCartError::NotFound("gone".to_owned()).into();
        assert!(matches!(kind, CartErrorKind::NotFound(_)));

        let kind: CartErrorKind = RemoteCartError::Server("boom".to_owned()).into();
        assert!(matches!(kind, CartErrorKind::Server(_)));
    }
}
