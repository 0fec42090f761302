//! Cart model: lines and snapshots.
//!
//! A [`CartSnapshot`] is the full set of [`CartLine`] entries for one
//! session, keyed by product ID (one line per product). Insertion order is
//! preserved because the login merge replays lines in the order they were
//! stored.
//!
//! The snapshot serializes as a bare JSON array of lines, which is exactly
//! the blob persisted to local storage for anonymous sessions. Field names
//! follow the API wire format (`_id`, `price`, `backgroundColor`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::product::Product;

/// One product + quantity entry in a cart.
///
/// Display fields (name, category, description, image, swatch color) are
/// denormalized from the product catalog so an anonymous cart can render
/// without further lookups.
///
/// Invariant: `quantity >= 1`. A line whose quantity would reach zero is
/// removed from its snapshot, never stored at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(rename = "_id")]
    product_id: ProductId,
    /// Product display name.
    pub name: String,
    #[serde(rename = "price")]
    unit_price: Decimal,
    /// Product category.
    pub category: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Product image path.
    #[serde(default)]
    pub image: String,
    /// Swatch color used as the image backdrop.
    #[serde(default)]
    pub background_color: String,
    quantity: u32,
    /// Server-side cart line ID. Present only on lines sourced from the
    /// remote cart; anonymous lines have none.
    #[serde(rename = "cartItemId", default, skip_serializing_if = "Option::is_none")]
    line_id: Option<CartLineId>,
}

impl CartLine {
    /// Create a line from a catalog product.
    ///
    /// A zero `quantity` is clamped to 1 to preserve the line invariant;
    /// callers that mean "remove" must go through the snapshot instead.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            category: product.category.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            background_color: product.background_color.clone(),
            quantity: quantity.max(1),
            line_id: None,
        }
    }

    /// The product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Current quantity (always >= 1).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price at the time the line was created.
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Server-side line ID, if this line came from the remote cart.
    #[must_use]
    pub const fn line_id(&self) -> Option<&CartLineId> {
        self.line_id.as_ref()
    }

    /// Attach the server-side line ID.
    #[must_use]
    pub fn with_line_id(mut self, line_id: CartLineId) -> Self {
        self.line_id = Some(line_id);
        self
    }

    /// quantity x unit price for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// The full set of cart lines for one session.
///
/// Product IDs are unique within a snapshot; adding a line for a product
/// that is already present merges quantities instead of duplicating the
/// entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a snapshot from lines, merging any duplicate product IDs by
    /// summing quantities (the first occurrence keeps its position).
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut snapshot = Self::new();
        for line in lines {
            snapshot.add(line);
        }
        snapshot
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    /// Whether a line exists for a product.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Add a line, merging quantities when the product is already present.
    ///
    /// The merged line keeps the existing display fields; only the quantity
    /// changes. Saturates rather than overflowing.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }

    /// Overwrite a line's quantity (absolute, not a delta).
    ///
    /// A quantity of zero removes the line, preserving the invariant that
    /// lines are never stored at zero. Returns `false` if no line exists
    /// for the product.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id).is_some();
        }
        match self.lines.iter_mut().find(|l| l.product_id() == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove the line for a product, returning it if present.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id() == product_id)?;
        Some(self.lines.remove(index))
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantity x unit price across all lines.
    ///
    /// Computed on demand, never cached, so it always reflects the current
    /// snapshot.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(CartLine::quantity).sum()
    }
}

impl<'a> IntoIterator for &'a CartSnapshot {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
