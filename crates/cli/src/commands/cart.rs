//! Cart commands, routed through the reconciler.
//!
//! Every mutation goes through [`CartReconciler`] so the guest/account
//! split and the login merge behave exactly as in the browser client. The
//! raw API is only used directly for the server-computed summary (tax).

use shopeasy_client::api::ApiClient;
use shopeasy_client::cart::CartReconciler;
use shopeasy_client::session::SessionMode;
use shopeasy_client::storage::FileStore;
use shopeasy_core::{CartSnapshot, ProductId};

use super::format_price;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Build the reconciler for this invocation. With a stored token the
/// session starts authenticated, which also retries any pending guest-cart
/// merge left over from a failed login sync.
async fn reconciler(
    api: &ApiClient,
    store: FileStore,
    authenticated: bool,
) -> CartReconciler<FileStore, ApiClient> {
    let mut cart = CartReconciler::new(store, api.clone());
    if authenticated {
        cart.on_mode_transition(SessionMode::Authenticated).await;
    }
    cart
}

fn print_snapshot(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in snapshot.lines() {
        println!(
            "{:<30} {:>3} x {:>9} = {:>10}  [{}]",
            line.name,
            line.quantity(),
            format_price(line.unit_price()),
            format_price(line.line_total()),
            line.product_id(),
        );
    }
}

/// Show the cart with its total.
pub async fn show(api: &ApiClient, store: FileStore, authenticated: bool) -> CliResult {
    let cart = reconciler(api, store, authenticated).await;
    print_snapshot(cart.snapshot());

    if cart.snapshot().is_empty() {
        return Ok(());
    }

    if authenticated {
        // The server also computes tax for account carts
        let view = api.cart().await?;
        println!(
            "\nSubtotal {}   Tax {}   Total {}",
            format_price(view.summary.subtotal),
            format_price(view.summary.tax),
            format_price(view.summary.total),
        );
    } else {
        println!("\nTotal {}", format_price(cart.total()));
    }
    Ok(())
}

/// Add units of a product to the cart.
pub async fn add(
    api: &ApiClient,
    store: FileStore,
    authenticated: bool,
    product_id: &str,
    quantity: i64,
) -> CliResult {
    let product = api.product(&ProductId::new(product_id)).await?;
    let mut cart = reconciler(api, store, authenticated).await;
    let snapshot = cart.add_line(&product, quantity).await?;

    println!(
        "Added {} - cart now holds {} item(s), total {}",
        product.name,
        snapshot.item_count(),
        format_price(snapshot.total()),
    );
    Ok(())
}

/// Overwrite the quantity of a cart line. Zero removes the line.
pub async fn set(
    api: &ApiClient,
    store: FileStore,
    authenticated: bool,
    product_id: &str,
    quantity: i64,
) -> CliResult {
    let product_id = ProductId::new(product_id);
    let mut cart = reconciler(api, store, authenticated).await;
    let snapshot = cart.set_quantity(&product_id, quantity).await?;

    match snapshot.get(&product_id) {
        Some(line) => println!("{} now at {} unit(s)", line.name, line.quantity()),
        None => println!("Removed {product_id} from the cart"),
    }
    println!("Total {}", format_price(snapshot.total()));
    Ok(())
}

/// Remove a product from the cart.
pub async fn remove(
    api: &ApiClient,
    store: FileStore,
    authenticated: bool,
    product_id: &str,
) -> CliResult {
    let product_id = ProductId::new(product_id);
    let mut cart = reconciler(api, store, authenticated).await;
    cart.remove_line(&product_id).await?;

    println!(
        "Removed {product_id}; cart now holds {} item(s)",
        cart.snapshot().item_count(),
    );
    Ok(())
}

/// Empty the cart.
pub async fn clear(api: &ApiClient, store: FileStore, authenticated: bool) -> CliResult {
    let mut cart = reconciler(api, store, authenticated).await;
    cart.clear().await?;
    println!("Cart cleared");
    Ok(())
}
