//! # Cart Ledger
//!
//! Ordered line items of the sale in progress.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Ledger Operations                               │
//! │                                                                         │
//! │  Cashier Action           Ledger Call              State Change         │
//! │  ──────────────           ───────────              ────────────         │
//! │                                                                         │
//! │  Tap product / scan ─────► add_item() ───────────► qty += 1 or push     │
//! │                                                                         │
//! │  [+] / [-] buttons ──────► change_quantity() ────► qty += delta         │
//! │                                   │                 (0 removes line)    │
//! │                                   └─ above stock? ─► rejected, unchanged│
//! │                                                                         │
//! │  Trash icon ─────────────► remove_item() ────────► line removed         │
//! │                                                                         │
//! │  Available stock is the product's (quantity − reserved) captured when   │
//! │  it was added; it is not re-fetched per keystroke.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Binding a customer before mutation is enforced one level up by the
//! type-state [`Session`](crate::session::Session).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CatalogProduct;
use crate::MAX_CART_ITEMS;

/// One line of the cart.
///
/// Name, SKU and price are frozen when the product is first added so the
/// line renders consistently even if the catalog changes mid-sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Line id (UUID v4), distinct from the product id.
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    /// Always ≥ 1 while the line exists.
    pub quantity: i64,
    pub sku: Option<String>,
    /// Stock ceiling from the product snapshot.
    pub available_stock: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    fn from_product(product: &CatalogProduct) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price(),
            quantity: 1,
            sku: Some(product.sku.clone()).filter(|s| !s.is_empty()),
            available_stock: product.available(),
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    fn insufficient(&self, requested: i64) -> CoreError {
        CoreError::InsufficientStock {
            product: self.name.clone(),
            available: self.available_stock,
            requested,
        }
    }
}

/// The cart ledger.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again increments quantity)
/// - `1 <= quantity <= available_stock` for every line
/// - At most `MAX_CART_ITEMS` distinct lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    items: Vec<LineItem>,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Already in cart: quantity + 1, unless that would pass available stock
    /// - Not in cart: appended at quantity 1 when at least one unit is available
    ///
    /// A rejected add leaves the cart untouched.
    pub fn add_item(&mut self, product: &CatalogProduct) -> CoreResult<&LineItem> {
        let available = product.available();

        if let Some(idx) = self.items.iter().position(|i| i.product_id == product.id) {
            let line = &mut self.items[idx];
            if line.quantity >= available {
                return Err(CoreError::InsufficientStock {
                    product: line.name.clone(),
                    available,
                    requested: line.quantity + 1,
                });
            }
            // Only a successful add adopts the fresher snapshot
            line.available_stock = available;
            line.quantity += 1;
            return Ok(&self.items[idx]);
        }

        if available < 1 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available,
                requested: 1,
            });
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(LineItem::from_product(product));
        Ok(&self.items[self.items.len() - 1])
    }

    /// Moves a line's quantity by `delta`.
    ///
    /// ## Returns
    /// - `Ok(Some(qty))` with the new quantity
    /// - `Ok(None)` when the line reached zero and was removed
    /// - `Err(InsufficientStock)` when an increase would pass available stock;
    ///   the line is left unchanged
    ///
    /// Decreases are always accepted, so a line can be brought back under a
    /// ceiling that dropped since it was added.
    pub fn change_quantity(&mut self, line_id: &str, delta: i64) -> CoreResult<Option<i64>> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        let line = &mut self.items[idx];
        let requested = line.quantity + delta;

        if delta > 0 && requested > line.available_stock {
            return Err(line.insufficient(requested));
        }

        if requested <= 0 {
            self.items.remove(idx);
            return Ok(None);
        }

        line.quantity = requested;
        Ok(Some(requested))
    }

    /// Removes a line. Unknown ids are ignored.
    pub fn remove_item(&mut self, line_id: &str) -> Option<LineItem> {
        let idx = self.items.iter().position(|i| i.id == line_id)?;
        Some(self.items.remove(idx))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn line(&self, line_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == line_id)
    }

    /// Quantity of a product currently in the cart (0 if absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ(unit price × quantity).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::StockLevel;

    pub(crate) fn product(id: &str, price_paise: i64, quantity: i64, reserved: i64) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: Some(format!("890{:010}", id.len())),
            name: format!("Product {}", id),
            price_paise,
            is_active: true,
            stock: StockLevel::new(quantity, reserved),
        }
    }

    #[test]
    fn test_add_item_appends_then_increments() {
        let mut cart = Cart::new();
        let p = product("1", 999, 10, 0);

        cart.add_item(&p).unwrap();
        cart.add_item(&p).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal(), Money::from_paise(1998));
    }

    #[test]
    fn test_add_item_stops_at_available_stock() {
        let mut cart = Cart::new();
        // 5 on hand, 3 reserved → 2 sellable
        let p = product("1", 500, 5, 3);

        cart.add_item(&p).unwrap();
        cart.add_item(&p).unwrap();
        let err = cart.add_item(&p).unwrap_err();

        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product: "Product 1".into(),
                available: 2,
                requested: 3
            }
        );
        assert_eq!(cart.quantity_of("1"), 2);
    }

    #[test]
    fn test_add_out_of_stock_product_is_rejected() {
        let mut cart = Cart::new();
        let p = product("1", 500, 3, 3);

        assert!(cart.add_item(&p).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_rejects_over_stock_and_keeps_line() {
        let mut cart = Cart::new();
        let p = product("1", 500, 4, 0);
        let line_id = cart.add_item(&p).unwrap().id.clone();

        assert_eq!(cart.change_quantity(&line_id, 2).unwrap(), Some(3));
        assert!(cart.change_quantity(&line_id, 5).is_err());
        assert_eq!(cart.line(&line_id).unwrap().quantity, 3);
    }

    #[test]
    fn test_change_quantity_to_zero_removes_line() {
        let mut cart = Cart::new();
        let p = product("1", 500, 4, 0);
        let line_id = cart.add_item(&p).unwrap().id.clone();

        assert_eq!(cart.change_quantity(&line_id, -1).unwrap(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_below_zero_clamps_to_removal() {
        let mut cart = Cart::new();
        let p = product("1", 500, 4, 0);
        let line_id = cart.add_item(&p).unwrap().id.clone();

        assert_eq!(cart.change_quantity(&line_id, -10).unwrap(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_unknown_line() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.change_quantity("missing", 1),
            Err(CoreError::LineNotFound("missing".into()))
        );
    }

    #[test]
    fn test_remove_item_is_unconditional() {
        let mut cart = Cart::new();
        let line_id = cart.add_item(&product("1", 500, 4, 0)).unwrap().id.clone();
        cart.add_item(&product("2", 700, 4, 0)).unwrap();

        assert!(cart.remove_item(&line_id).is_some());
        assert!(cart.remove_item(&line_id).is_none());
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_quantity_never_exceeds_stock_over_mixed_operations() {
        let mut cart = Cart::new();
        let p = product("1", 100, 3, 0);
        let line_id = cart.add_item(&p).unwrap().id.clone();

        let deltas = [1, 1, 1, -2, 5, 2, -1, 1, 1];
        for delta in deltas {
            let _ = cart.change_quantity(&line_id, delta);
            let _ = cart.add_item(&p);
            for line in cart.items() {
                assert!(line.quantity <= p.available());
                assert!(line.quantity >= 1);
            }
        }
    }

    #[test]
    fn test_rescan_with_lower_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        let p = product("1", 100, 3, 0);
        let line_id = cart.add_item(&p).unwrap().id.clone();
        cart.change_quantity(&line_id, 2).unwrap();
        let before = cart.clone();

        // Re-scan returns a snapshot where only one unit is left
        let err = cart.add_item(&product("1", 100, 1, 0)).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product: "Product 1".into(),
                available: 1,
                requested: 4
            }
        );
        assert_eq!(cart, before);

        assert_eq!(cart.change_quantity(&line_id, -1).unwrap(), Some(2));
        assert_eq!(cart.line(&line_id).unwrap().available_stock, 3);
    }

    #[test]
    fn test_decrement_accepted_when_ceiling_dropped_below_quantity() {
        let mut cart = Cart::new();
        let line_id = cart.add_item(&product("1", 100, 5, 0)).unwrap().id.clone();
        cart.change_quantity(&line_id, 3).unwrap();

        // Ceiling drops to 2 while the line holds 4
        cart.items[0].available_stock = 2;

        assert_eq!(cart.change_quantity(&line_id, -1).unwrap(), Some(3));
        assert!(cart.change_quantity(&line_id, 1).is_err());
        assert_eq!(cart.change_quantity(&line_id, -1).unwrap(), Some(2));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&product("1", 999, 2, 0)).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
