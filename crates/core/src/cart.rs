//! Session-scoped shopping cart.
//!
//! The cart is a keyed collection of line items in insertion order. All
//! mutation goes through [`Cart::dispatch`], which returns a [`CartEvent`]
//! describing what changed so callers can acknowledge it to the user.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

/// One product in the cart, with the fields copied at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    /// Always at least 1; a line item at 0 is removed.
    pub quantity: u32,
}

impl CartLineItem {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A requested cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit of a product.
    Add(Product),
    /// Change a line item's quantity by `delta`.
    UpdateQuantity { id: ProductId, delta: i32 },
    /// Remove everything.
    Clear,
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A product was added; `quantity` is the line item's new quantity.
    ItemAdded {
        id: ProductId,
        name: String,
        quantity: u32,
    },
    /// A line item's quantity changed and it is still in the cart.
    QuantityChanged { id: ProductId, quantity: u32 },
    /// A line item dropped to zero or below and was removed.
    ItemRemoved { id: ProductId },
    /// The cart was emptied.
    Cleared,
    /// Nothing happened (absent id, or a zero delta).
    Unchanged,
}

/// The cart store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Apply an action.
    pub fn dispatch(&mut self, action: CartAction) -> CartEvent {
        match action {
            CartAction::Add(product) => self.add_item(&product),
            CartAction::UpdateQuantity { id, delta } => self.update_quantity(&id, delta),
            CartAction::Clear => {
                self.clear();
                CartEvent::Cleared
            }
        }
    }

    /// Add one unit of `product`, creating the line item if needed.
    pub fn add_item(&mut self, product: &Product) -> CartEvent {
        let existing = self.items.iter_mut().find(|item| item.id == product.id);
        let quantity = if let Some(item) = existing {
            item.quantity = item.quantity.saturating_add(1);
            item.quantity
        } else {
            self.items.push(CartLineItem::from_product(product));
            1
        };

        CartEvent::ItemAdded {
            id: product.id.clone(),
            name: product.name.clone(),
            quantity,
        }
    }

    /// Change the quantity of line item `id` by `delta`.
    ///
    /// An absent id is a no-op. A line item whose quantity reaches zero or
    /// below is removed.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i32) -> CartEvent {
        let Some(index) = self.items.iter().position(|item| &item.id == id) else {
            return CartEvent::Unchanged;
        };
        let Some(item) = self.items.get_mut(index) else {
            return CartEvent::Unchanged;
        };
        if delta == 0 {
            return CartEvent::Unchanged;
        }

        let next = i64::from(item.quantity) + i64::from(delta);
        if next <= 0 {
            self.items.remove(index);
            return CartEvent::ItemRemoved { id: id.clone() };
        }

        let quantity = u32::try_from(next).unwrap_or(u32::MAX);
        item.quantity = quantity;
        CartEvent::QuantityChanged {
            id: id.clone(),
            quantity,
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price × quantity` over all line items.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Sum of quantities over all line items.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line item.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
