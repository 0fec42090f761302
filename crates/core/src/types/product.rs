//! Catalog product type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product document as served by the catalog API.
///
/// Prices are decimal to keep cart arithmetic exact; the wire format carries
/// them as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog document ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Category name used for filtering.
    pub category: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Image path.
    #[serde(default)]
    pub image: String,
    /// Swatch color used as the image backdrop.
    #[serde(default)]
    pub background_color: String,
    /// Whether the product can currently be purchased.
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    /// Units on hand.
    #[serde(default)]
    pub stock_quantity: u32,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Catalog document ID.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_document() {
        let json = r##"{
            "_id": "64a1f0c2e4b0a1b2c3d4e5f6",
            "name": "Wireless Headphones",
            "price": 79.99,
            "category": "Electronics",
            "description": "High-quality wireless headphones with noise cancellation",
            "image": "/black-wireless-headphones.jpg",
            "backgroundColor": "#fbbf24",
            "inStock": true,
            "stockQuantity": 50,
            "createdAt": "2024-01-15T10:30:00.000Z",
            "updatedAt": "2024-01-15T10:30:00.000Z"
        }"##;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "64a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(product.price, "79.99".parse::<Decimal>().unwrap());
        assert_eq!(product.background_color, "#fbbf24");
        assert!(product.in_stock);
        assert!(product.created_at.is_some());
    }

    #[test]
    fn test_deserialize_minimal_document() {
        // Older documents may lack optional display fields
        let json = r#"{"_id": "p1", "name": "Widget", "price": 5, "category": "Misc"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.in_stock);
        assert_eq!(product.stock_quantity, 0);
        assert!(product.created_at.is_none());
    }
}
