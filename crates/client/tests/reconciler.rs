//! Reconciler behavior against in-memory collaborators.
//!
//! These tests drive the cart state machine with a fake remote cart and
//! the in-memory store, covering the mode-specific mutation rules and the
//! login merge protocol (including its partial-failure retry semantics).

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;

use shopeasy_client::cart::{CartErrorKind, CartReconciler, RemoteCart, RemoteCartError};
use shopeasy_client::session::SessionMode;
use shopeasy_client::storage::{LocalStore, MemoryStore, keys};
use shopeasy_core::{CartLine, CartLineId, CartSnapshot, Product, ProductId};

// =============================================================================
// Fake remote cart
// =============================================================================

#[derive(Default)]
struct RemoteState {
    catalog: Vec<Product>,
    lines: Vec<(CartLineId, ProductId, u32)>,
    next_line: u32,
    fail_add_for: HashSet<ProductId>,
    fail_list: bool,
    add_calls: Vec<(ProductId, u32)>,
}

/// In-memory stand-in for the account cart endpoints. Mirrors the server's
/// contract: `add` validates the product and increments on conflict,
/// `update`/`remove` address rows by line ID.
#[derive(Clone, Default)]
struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    fn with_catalog(catalog: Vec<Product>) -> Self {
        let remote = Self::default();
        remote.state().catalog = catalog;
        remote
    }

    fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state()
            .lines
            .iter()
            .find(|(_, pid, _)| pid == product_id)
            .map(|(_, _, quantity)| *quantity)
    }

    fn line_count(&self) -> usize {
        self.state().lines.len()
    }

    fn add_calls(&self) -> Vec<(ProductId, u32)> {
        self.state().add_calls.clone()
    }

    fn fail_adds_for(&self, product_id: &ProductId) {
        self.state().fail_add_for.insert(product_id.clone());
    }

    fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_add_for.clear();
        state.fail_list = false;
    }

    fn fail_list(&self, fail: bool) {
        self.state().fail_list = fail;
    }
}

impl RemoteCart for FakeRemote {
    async fn list(&self) -> Result<CartSnapshot, RemoteCartError> {
        let state = self.state();
        if state.fail_list {
            return Err(RemoteCartError::Server("injected list failure".to_owned()));
        }
        let lines = state
            .lines
            .iter()
            .map(|(line_id, product_id, quantity)| {
                let product = state
                    .catalog
                    .iter()
                    .find(|p| &p.id == product_id)
                    .cloned()
                    .ok_or_else(|| RemoteCartError::Server("orphaned cart line".to_owned()))?;
                Ok(CartLine::from_product(&product, *quantity).with_line_id(line_id.clone()))
            })
            .collect::<Result<Vec<_>, RemoteCartError>>()?;
        Ok(CartSnapshot::from_lines(lines))
    }

    async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteCartError> {
        let mut state = self.state();
        if state.fail_add_for.contains(product_id) {
            return Err(RemoteCartError::Server("injected add failure".to_owned()));
        }
        if !state.catalog.iter().any(|p| &p.id == product_id) {
            return Err(RemoteCartError::NotFound("Product not found".to_owned()));
        }
        state.add_calls.push((product_id.clone(), quantity));
        if let Some(line) = state.lines.iter_mut().find(|(_, pid, _)| pid == product_id) {
            line.2 += quantity;
        } else {
            state.next_line += 1;
            let line_id = CartLineId::new(format!("line-{}", state.next_line));
            state.lines.push((line_id, product_id.clone(), quantity));
        }
        Ok(())
    }

    async fn update(&self, line_id: &CartLineId, quantity: u32) -> Result<(), RemoteCartError> {
        let mut state = self.state();
        let line = state
            .lines
            .iter_mut()
            .find(|(lid, _, _)| lid == line_id)
            .ok_or_else(|| RemoteCartError::NotFound("Cart item not found".to_owned()))?;
        line.2 = quantity;
        Ok(())
    }

    async fn remove(&self, line_id: &CartLineId) -> Result<(), RemoteCartError> {
        let mut state = self.state();
        let index = state
            .lines
            .iter()
            .position(|(lid, _, _)| lid == line_id)
            .ok_or_else(|| RemoteCartError::NotFound("Cart item not found".to_owned()))?;
        state.lines.remove(index);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RemoteCartError> {
        self.state().lines.clear();
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn product(id: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: price.parse().unwrap(),
        category: "Electronics".to_owned(),
        description: String::new(),
        image: String::new(),
        background_color: String::new(),
        in_stock: true,
        stock_quantity: 10,
        created_at: None,
        updated_at: None,
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// =============================================================================
// Anonymous mutations
// =============================================================================

#[tokio::test]
async fn anonymous_add_is_additive() {
    let remote = FakeRemote::default();
    let mut cart = CartReconciler::new(MemoryStore::new(), remote);

    let p1 = product("p1", "10.00");
    cart.add_line(&p1, 2).await.unwrap();
    cart.add_line(&p1, 3).await.unwrap();
    cart.add_line(&p1, 1).await.unwrap();

    let line = cart.snapshot().get(&p1.id).unwrap();
    assert_eq!(line.quantity(), 6);
    assert_eq!(cart.snapshot().len(), 1);
}

#[tokio::test]
async fn anonymous_add_persists_to_local_storage() {
    let mut store = MemoryStore::new();
    {
        let mut cart = CartReconciler::new(&mut store, FakeRemote::default());
        cart.add_line(&product("p1", "10.00"), 2).await.unwrap();
    }

    let raw = store.get(keys::CART).unwrap().expect("cart blob persisted");
    let persisted: CartSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.get(&ProductId::new("p1")).unwrap().quantity(), 2);
}

#[tokio::test]
async fn anonymous_cart_survives_reconciler_restart() {
    let mut store = MemoryStore::new();
    {
        let mut cart = CartReconciler::new(&mut store, FakeRemote::default());
        cart.add_line(&product("p1", "10.00"), 2).await.unwrap();
        cart.add_line(&product("p2", "5.00"), 1).await.unwrap();
    }

    let cart = CartReconciler::new(&mut store, FakeRemote::default());
    assert_eq!(cart.snapshot().len(), 2);
    assert_eq!(cart.total(), dec("25.00"));
}

#[tokio::test]
async fn set_quantity_zero_equals_remove() {
    let mut cart = CartReconciler::new(MemoryStore::new(), FakeRemote::default());
    let p1 = product("p1", "10.00");

    cart.add_line(&p1, 2).await.unwrap();
    cart.set_quantity(&p1.id, 0).await.unwrap();
    assert!(!cart.snapshot().contains(&p1.id));

    // Negative quantities take the same path
    cart.add_line(&p1, 2).await.unwrap();
    cart.set_quantity(&p1.id, -1).await.unwrap();
    assert!(!cart.snapshot().contains(&p1.id));
}

#[tokio::test]
async fn set_quantity_on_missing_line_is_not_found() {
    let mut cart = CartReconciler::new(MemoryStore::new(), FakeRemote::default());
    let before = cart.snapshot().clone();

    let err = cart
        .set_quantity(&ProductId::new("ghost"), 3)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, CartErrorKind::NotFound(_)));
    assert_eq!(cart.snapshot(), &before);
}

#[tokio::test]
async fn add_line_nonpositive_delta_coerces_to_removal() {
    let mut cart = CartReconciler::new(MemoryStore::new(), FakeRemote::default());
    let p1 = product("p1", "10.00");

    cart.add_line(&p1, 2).await.unwrap();
    cart.add_line(&p1, 0).await.unwrap();
    assert!(!cart.snapshot().contains(&p1.id));

    // Removing a product that is not in the cart is a no-op, not an error
    cart.add_line(&p1, -5).await.unwrap();
    assert!(cart.snapshot().is_empty());
}

#[tokio::test]
async fn remove_unknown_product_is_noop() {
    let mut cart = CartReconciler::new(MemoryStore::new(), FakeRemote::default());
    cart.add_line(&product("p1", "10.00"), 1).await.unwrap();

    cart.remove_line(&ProductId::new("ghost")).await.unwrap();
    assert_eq!(cart.snapshot().len(), 1);
}

#[tokio::test]
async fn total_recomputes_after_every_mutation() {
    let mut cart = CartReconciler::new(MemoryStore::new(), FakeRemote::default());
    let p1 = product("p1", "10.00");
    let p2 = product("p2", "2.50");

    cart.add_line(&p1, 2).await.unwrap();
    assert_eq!(cart.total(), dec("20.00"));

    cart.add_line(&p1, 1).await.unwrap();
    assert_eq!(cart.total(), dec("30.00"));

    cart.add_line(&p2, 4).await.unwrap();
    assert_eq!(cart.total(), dec("40.00"));

    cart.set_quantity(&p2.id, 1).await.unwrap();
    assert_eq!(cart.total(), dec("32.50"));

    cart.remove_line(&p1.id).await.unwrap();
    assert_eq!(cart.total(), dec("2.50"));

    cart.clear().await.unwrap();
    assert_eq!(cart.total(), Decimal::ZERO);
}

// =============================================================================
// Authenticated mutations
// =============================================================================

#[tokio::test]
async fn authenticated_add_is_additive_and_refetches() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);
    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;

    cart.add_line(&p1, 2).await.unwrap();
    cart.add_line(&p1, 3).await.unwrap();

    assert_eq!(remote.quantity_of(&p1.id), Some(5));

    // The snapshot came from a re-fetch: it carries the server line ID
    let line = cart.snapshot().get(&p1.id).unwrap();
    assert_eq!(line.quantity(), 5);
    assert!(line.line_id().is_some());
}

#[tokio::test]
async fn authenticated_add_unknown_product_is_not_found() {
    let remote = FakeRemote::with_catalog(vec![]);
    let mut cart = CartReconciler::new(MemoryStore::new(), remote);
    cart.on_mode_transition(SessionMode::Authenticated).await;

    let before = cart.snapshot().clone();
    let err = cart.add_line(&product("ghost", "1.00"), 1).await.unwrap_err();
    assert!(matches!(err.kind, CartErrorKind::NotFound(_)));
    assert_eq!(cart.snapshot(), &before);
}

#[tokio::test]
async fn authenticated_set_quantity_and_remove_by_line_id() {
    let p1 = product("p1", "10.00");
    let p2 = product("p2", "4.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone(), p2.clone()]);
    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;

    cart.add_line(&p1, 2).await.unwrap();
    cart.add_line(&p2, 1).await.unwrap();

    cart.set_quantity(&p1.id, 7).await.unwrap();
    assert_eq!(remote.quantity_of(&p1.id), Some(7));
    assert_eq!(cart.snapshot().get(&p1.id).unwrap().quantity(), 7);

    // set_quantity(0) removes, server-side too
    cart.set_quantity(&p2.id, 0).await.unwrap();
    assert_eq!(remote.quantity_of(&p2.id), None);
    assert!(!cart.snapshot().contains(&p2.id));

    cart.remove_line(&p1.id).await.unwrap();
    assert_eq!(remote.line_count(), 0);
    assert!(cart.snapshot().is_empty());
}

#[tokio::test]
async fn authenticated_remove_without_known_line_is_noop() {
    let remote = FakeRemote::with_catalog(vec![product("p1", "10.00")]);
    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;

    // Nothing known locally for this product, so no remote call is made
    cart.remove_line(&ProductId::new("p1")).await.unwrap();
    assert_eq!(remote.line_count(), 0);
}

#[tokio::test]
async fn authenticated_clear_empties_remote_cart() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);
    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;

    cart.add_line(&p1, 3).await.unwrap();
    cart.clear().await.unwrap();

    assert_eq!(remote.line_count(), 0);
    assert!(cart.snapshot().is_empty());
}

#[tokio::test]
async fn refetch_failure_leaves_snapshot_unchanged() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);
    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;

    cart.add_line(&p1, 1).await.unwrap();
    let before = cart.snapshot().clone();

    remote.fail_list(true);
    let err = cart.add_line(&p1, 1).await.unwrap_err();
    assert!(matches!(err.kind, CartErrorKind::Server(_)));

    // The remote write happened, but the snapshot stays at the last
    // successfully fetched state until a refresh succeeds.
    assert_eq!(remote.quantity_of(&p1.id), Some(2));
    assert_eq!(cart.snapshot(), &before);

    remote.fail_list(false);
    cart.refresh().await.unwrap();
    assert_eq!(cart.snapshot().get(&p1.id).unwrap().quantity(), 2);
}

// =============================================================================
// Login merge
// =============================================================================

#[tokio::test]
async fn merge_replays_lines_in_order_and_consumes_local_cart() {
    let p1 = product("p1", "10.00");
    let p2 = product("p2", "4.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone(), p2.clone()]);

    let mut store = MemoryStore::new();
    {
        let mut cart = CartReconciler::new(&mut store, remote.clone());
        cart.add_line(&p1, 2).await.unwrap();
        cart.add_line(&p2, 1).await.unwrap();

        let snapshot = cart.on_mode_transition(SessionMode::Authenticated).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&p1.id).unwrap().quantity(), 2);
        assert_eq!(snapshot.get(&p2.id).unwrap().quantity(), 1);
    }

    // Adds were replayed in stored order, one at a time
    assert_eq!(
        remote.add_calls(),
        vec![(p1.id.clone(), 2), (p2.id.clone(), 1)]
    );

    // The merge is consumed exactly once
    assert!(store.get(keys::CART).unwrap().is_none());
}

#[tokio::test]
async fn merge_into_nonempty_remote_cart_sums_quantities() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);

    // The account cart already holds two units from an earlier session
    remote.add(&p1.id, 2).await.unwrap();

    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.add_line(&p1, 3).await.unwrap();
    cart.on_mode_transition(SessionMode::Authenticated).await;

    assert_eq!(remote.quantity_of(&p1.id), Some(5));
    assert_eq!(cart.snapshot().get(&p1.id).unwrap().quantity(), 5);
}

#[tokio::test]
async fn merge_with_empty_local_cart_skips_adds() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);
    remote.add(&p1.id, 1).await.unwrap();
    let baseline_calls = remote.add_calls().len();

    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    let snapshot = cart.on_mode_transition(SessionMode::Authenticated).await;

    assert_eq!(remote.add_calls().len(), baseline_calls);
    assert_eq!(snapshot.get(&p1.id).unwrap().quantity(), 1);
}

#[tokio::test]
async fn merge_partial_failure_keeps_local_cart_for_retry() {
    let p1 = product("p1", "10.00");
    let p2 = product("p2", "4.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone(), p2.clone()]);

    let mut store = MemoryStore::new();
    {
        let mut cart = CartReconciler::new(&mut store, remote.clone());
        cart.add_line(&p1, 2).await.unwrap();
        cart.add_line(&p2, 1).await.unwrap();

        // The second add fails mid-merge
        remote.fail_adds_for(&p2.id);
        let snapshot = cart.on_mode_transition(SessionMode::Authenticated).await;

        // The merge aborted before anything was fetched, so the in-memory
        // cart is the stale pre-transition state: both guest lines, no
        // server line IDs.
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(&p1.id).unwrap().line_id().is_none());
    }

    // p1 landed before the failure; p2 never did
    assert_eq!(remote.quantity_of(&p1.id), Some(2));
    assert_eq!(remote.quantity_of(&p2.id), None);

    // The local blob is untouched, still holding both lines
    let raw = store.get(keys::CART).unwrap().expect("local cart kept");
    let kept: CartSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(kept.len(), 2);

    // A later login retries the whole merge. Replay is additive, so the
    // line that already landed is counted again (at-least-once semantics).
    remote.clear_failures();
    {
        let mut cart = CartReconciler::new(&mut store, remote.clone());
        cart.on_mode_transition(SessionMode::Authenticated).await;
    }
    assert_eq!(remote.quantity_of(&p1.id), Some(4));
    assert_eq!(remote.quantity_of(&p2.id), Some(1));
    assert!(store.get(keys::CART).unwrap().is_none());
}

#[tokio::test]
async fn merge_refetch_failure_keeps_stale_snapshot() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);

    let mut store = MemoryStore::new();
    let mut cart = CartReconciler::new(&mut store, remote.clone());
    cart.add_line(&p1, 2).await.unwrap();

    // Adds succeed but the post-merge fetch fails: the stale guest view
    // stays in memory (it has no server line IDs yet)
    remote.fail_list(true);
    let snapshot = cart.on_mode_transition(SessionMode::Authenticated).await;
    assert_eq!(snapshot.get(&p1.id).unwrap().quantity(), 2);
    assert!(snapshot.get(&p1.id).unwrap().line_id().is_none());

    // The merge itself completed, so the blob was consumed
    assert_eq!(remote.quantity_of(&p1.id), Some(2));

    remote.fail_list(false);
    cart.refresh().await.unwrap();
    assert!(cart.snapshot().get(&p1.id).unwrap().line_id().is_some());
}

// =============================================================================
// Mode transitions
// =============================================================================

#[tokio::test]
async fn repeated_transition_to_same_mode_is_noop() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);

    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.add_line(&p1, 1).await.unwrap();

    cart.on_mode_transition(SessionMode::Authenticated).await;
    let calls_after_merge = remote.add_calls().len();

    cart.on_mode_transition(SessionMode::Authenticated).await;
    assert_eq!(remote.add_calls().len(), calls_after_merge);
}

#[tokio::test]
async fn logout_discards_memory_but_not_remote_cart() {
    let p1 = product("p1", "10.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone()]);

    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;
    cart.add_line(&p1, 2).await.unwrap();
    assert_eq!(cart.snapshot().len(), 1);

    let snapshot = cart.on_mode_transition(SessionMode::Anonymous).await;

    // In-memory state reverts to the (empty) guest cart...
    assert!(snapshot.is_empty());
    assert_eq!(cart.mode(), SessionMode::Anonymous);

    // ...while the account cart is untouched
    assert_eq!(remote.quantity_of(&p1.id), Some(2));
}

#[tokio::test]
async fn guest_cart_after_logout_merges_on_next_login() {
    let p1 = product("p1", "10.00");
    let p2 = product("p2", "4.00");
    let remote = FakeRemote::with_catalog(vec![p1.clone(), p2.clone()]);

    let mut cart = CartReconciler::new(MemoryStore::new(), remote.clone());
    cart.on_mode_transition(SessionMode::Authenticated).await;
    cart.add_line(&p1, 1).await.unwrap();

    // Log out, shop as a guest, log back in
    cart.on_mode_transition(SessionMode::Anonymous).await;
    cart.add_line(&p2, 2).await.unwrap();
    let snapshot = cart.on_mode_transition(SessionMode::Authenticated).await;

    assert_eq!(snapshot.get(&p1.id).unwrap().quantity(), 1);
    assert_eq!(snapshot.get(&p2.id).unwrap().quantity(), 2);
}
