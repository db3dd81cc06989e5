//! Cart types mirroring the cart service's wire format.
//!
//! The cart returned by the cart service is the only source of truth; the
//! client never computes a cart locally beyond the derived `count` and
//! `subtotal` views below.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ItemId, ProductId};

/// A single line in the cart.
///
/// Invariant (server-enforced): `quantity >= 1`. Lines with a zero quantity
/// never exist in the authoritative cart; the client refuses to request one
/// (see `CartStore::update_item_quantity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line identifier used by the cart service's item endpoints.
    pub item_id: ItemId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Unit price at the time the item was added (wire name `productPrice`).
    #[serde(rename = "productPrice")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl CartItem {
    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The cart as returned by the cart service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by its item ID.
    #[must_use]
    pub fn item(&self, item_id: ItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.item_id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: i64, price: i64, quantity: u32) -> CartItem {
        CartItem {
            item_id: ItemId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            unit_price: Decimal::from(price),
            quantity,
            image_url: None,
            sku: None,
        }
    }

    #[test]
    fn count_sums_quantities() {
        let cart = Cart {
            items: vec![item(1, 499, 2), item(2, 120, 3)],
        };
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let cart = Cart {
            items: vec![item(1, 499, 2), item(2, 120, 3)],
        };
        assert_eq!(cart.subtotal(), Decimal::from(499 * 2 + 120 * 3));
    }

    #[test]
    fn empty_cart_derives_zero() {
        let cart = Cart::empty();
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn deserializes_cart_service_shape() {
        // The cart service also sends userId/totalPrice/totalItems; unknown
        // fields are ignored and `items` is all the client relies on.
        let cart: Cart = serde_json::from_str(
            r#"{
                "userId": 42,
                "items": [{
                    "itemId": 9,
                    "productId": 9,
                    "productName": "Masala Chai Sampler",
                    "productPrice": "499",
                    "quantity": 2,
                    "sku": "CHAI-9"
                }],
                "totalItems": 2,
                "empty": false
            }"#,
        )
        .unwrap();

        assert_eq!(cart.items.len(), 1);
        let line = cart.item(ItemId::new(9)).unwrap();
        assert_eq!(line.unit_price, Decimal::from(499));
        assert_eq!(line.line_total(), Decimal::from(998));
        assert_eq!(cart.count(), 2);
    }
}
