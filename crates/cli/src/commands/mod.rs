//! Command implementations.

pub mod auth;
pub mod cart;
pub mod products;

use rust_decimal::Decimal;

/// Format a decimal amount as a dollar price string.
pub(crate) fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Decimal::new(7999, 2)), "$79.99");
        assert_eq!(format_price(Decimal::from(20)), "$20.00");
        assert_eq!(format_price(Decimal::ZERO), "$0.00");
    }
}
