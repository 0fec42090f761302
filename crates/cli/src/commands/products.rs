//! Catalog browsing commands.

use shopeasy_client::api::ApiClient;
use shopeasy_client::api::types::ProductQuery;
use shopeasy_core::ProductId;

use super::format_price;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// List products matching the query.
pub async fn list(api: &ApiClient, query: &ProductQuery) -> CliResult {
    let page = api.products(query).await?;

    if page.products.is_empty() {
        println!("No products match the given filters");
        return Ok(());
    }

    for product in &page.products {
        let stock = if product.in_stock { "" } else { "  (out of stock)" };
        println!(
            "{:<30} {:<16} {:>10}{stock}  [{}]",
            product.name,
            product.category,
            format_price(product.price),
            product.id,
        );
    }

    println!(
        "\nPage {}/{} ({} products)",
        page.pagination.current_page, page.pagination.total_pages, page.pagination.total_products,
    );
    if !page.categories.is_empty() {
        println!("Categories: {}", page.categories.join(", "));
    }
    Ok(())
}

/// Show one product in detail.
pub async fn show(api: &ApiClient, id: &str) -> CliResult {
    let product = api.product(&ProductId::new(id)).await?;

    println!("{}", product.name);
    println!("  Price:    {}", format_price(product.price));
    println!("  Category: {}", product.category);
    if !product.description.is_empty() {
        println!("  About:    {}", product.description);
    }
    if product.in_stock {
        println!("  Stock:    {} available", product.stock_quantity);
    } else {
        println!("  Stock:    out of stock");
    }
    Ok(())
}

/// List all product categories.
pub async fn categories(api: &ApiClient) -> CliResult {
    let categories = api.categories().await?;
    if categories.is_empty() {
        println!("No categories yet");
    } else {
        for category in categories {
            println!("{category}");
        }
    }
    Ok(())
}
