//! Wire types for the ShopEasy REST API.
//!
//! Field names mirror the JSON the server emits (`camelCase`, Mongo-style
//! `_id` keys). Response envelopes are thin; anything the rest of the
//! engine consumes is converted into `shopeasy-core` types at the edge.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopeasy_core::{CartLine, CartLineId, CartSnapshot, Product, User};

// =============================================================================
// Error envelope
// =============================================================================

/// Error payload attached to non-success responses.
///
/// Route handlers use `{"error": ...}`; the global handlers use
/// `{"message": ...}`. Either may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Route-level error description.
    #[serde(default)]
    pub error: Option<String>,
    /// Global-handler error description.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best available message, or the fallback when the body carried none.
    #[must_use]
    pub fn into_message(self, fallback: &str) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| fallback.to_owned())
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Response to `POST /api/auth/register` and `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The registered or logged-in user.
    pub user: User,
    /// Bearer token for subsequent requests.
    pub token: String,
}

/// Response to `GET /api/auth/profile`.
#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    /// The current user.
    pub user: User,
}

/// Response to `GET /api/auth/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    pub message: String,
    pub valid: bool,
}

// =============================================================================
// Products
// =============================================================================

/// Sort field accepted by the product listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    CreatedAt,
}

impl SortField {
    /// Wire value of this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::CreatedAt => "createdAt",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "createdAt" | "created-at" => Ok(Self::CreatedAt),
            other => Err(format!("unknown sort field `{other}` (expected name, price, or createdAt)")),
        }
    }
}

/// Sort direction accepted by the product listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Wire value of this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order `{other}` (expected asc or desc)")),
        }
    }
}

/// Filters for the product listing endpoint.
///
/// Unset fields are omitted from the query string and the server applies
/// its defaults (page 1, 20 per page, newest first).
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive match against name and description.
    pub search: Option<String>,
    /// Exact category; the server treats "All" as no filter.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Sort field.
    pub sort_by: Option<SortField>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    /// Query-string pairs for the set fields.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("minPrice", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("maxPrice", max_price.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(sort_by) = self.sort_by {
            pairs.push(("sortBy", sort_by.as_str().to_owned()));
        }
        if let Some(sort_order) = self.sort_order {
            pairs.push(("sortOrder", sort_order.as_str().to_owned()));
        }
        pairs
    }
}

/// Pagination metadata on the product listing response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Response to `GET /api/products`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsPage {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Pagination metadata.
    pub pagination: Pagination,
    /// All known categories, for filter UIs.
    pub categories: Vec<String>,
}

/// Response to `GET /api/products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
}

/// Response to `GET /api/products/categories/list`.
#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// One cart row joined with its product document.
#[derive(Debug, Deserialize)]
pub struct RemoteCartItem {
    /// Server-side cart line ID.
    #[serde(rename = "_id")]
    pub id: CartLineId,
    /// Units of this product in the cart.
    pub quantity: u32,
    /// The product document.
    pub product: Product,
    /// Server-computed quantity x price.
    #[serde(rename = "totalPrice", default)]
    pub total_price: Option<Decimal>,
}

/// Server-computed totals for the whole cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Units across all lines.
    pub item_count: u32,
    /// Sum of line totals before tax.
    pub subtotal: Decimal,
    /// Tax amount (8%).
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
}

/// Response to `GET /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartView {
    /// Cart rows joined with product documents.
    pub cart_items: Vec<RemoteCartItem>,
    /// Server-computed totals.
    pub summary: CartSummary,
}

impl RemoteCartView {
    /// Flatten into the engine's snapshot model, carrying the server line
    /// IDs needed for later update/remove calls.
    #[must_use]
    pub fn into_snapshot(self) -> CartSnapshot {
        CartSnapshot::from_lines(
            self.cart_items
                .into_iter()
                .map(|item| {
                    CartLine::from_product(&item.product, item.quantity).with_line_id(item.id)
                })
                .collect(),
        )
    }
}

/// Response to `POST /api/cart/add`.
#[derive(Debug, Deserialize)]
pub struct AddToCartResponse {
    pub message: String,
    /// Quantity of the affected line after the add.
    pub quantity: u32,
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of `POST /api/cart/add`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

/// Body of `PUT /api/cart/{id}`.
#[derive(Debug, Serialize)]
pub struct UpdateCartRequest {
    pub quantity: u32,
}
