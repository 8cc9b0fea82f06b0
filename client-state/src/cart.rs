use crate::persist::{Persisted, PersistedStore, StateContainer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type CartStore<S> = PersistedStore<Cart, S>;

/// Identity of a cart line: the same product in another size or color is a
/// separate line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartKey {
    pub fn new(product_id: Uuid, size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            product_id,
            size: size.map(str::to_string),
            color: color.map(str::to_string),
        }
    }
}

/// What the product page hands to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartProduct {
    pub fn key(&self) -> CartKey {
        CartKey {
            product_id: self.product_id,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    pub fn key(&self) -> CartKey {
        CartKey {
            product_id: self.product_id,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// Price × quantity, pinned at the `i64` bounds.
    pub fn line_total(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone)]
pub enum CartAction {
    /// One more unit of the product's line.
    AddItem(CartProduct),
    /// `quantity` more units; zero counts as one.
    AddItems { product: CartProduct, quantity: u32 },
    RemoveItem(CartKey),
    UpdateQuantity { key: CartKey, quantity: u32 },
    Clear,
}

/// Cart lines keyed by [`CartKey`], iterated in the order they were first added.
///
/// Quantities and totals saturate instead of overflowing, so neither an
/// absurd `UpdateQuantity` nor a tampered snapshot can bring the store down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: HashMap<CartKey, CartItem>,
    order: Vec<CartKey>,
}

impl Cart {
    pub fn items(&self) -> impl Iterator<Item = &CartItem> + '_ {
        self.order.iter().filter_map(|key| self.lines.get(key))
    }

    pub fn get(&self, key: &CartKey) -> Option<&CartItem> {
        self.lines.get(key)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> u32 {
        self.lines
            .values()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    pub fn total_price(&self) -> i64 {
        self.lines
            .values()
            .fold(0i64, |acc, item| acc.saturating_add(item.line_total()))
    }

    fn add(&mut self, item: CartItem) {
        let key = item.key();
        match self.lines.get_mut(&key) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => {
                self.order.push(key.clone());
                self.lines.insert(key, item);
            }
        }
    }

    fn add_product(&mut self, product: CartProduct, quantity: u32) {
        self.add(CartItem {
            product_id: product.product_id,
            name: product.name,
            price: product.price,
            image: product.image,
            size: product.size,
            color: product.color,
            quantity: quantity.max(1),
        });
    }

    fn remove_item(&mut self, key: &CartKey) {
        if self.lines.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    fn update_quantity(&mut self, key: &CartKey, quantity: u32) {
        if let Some(item) = self.lines.get_mut(key) {
            item.quantity = quantity.max(1);
        }
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.order.clear();
    }
}

impl StateContainer for Cart {
    type Action = CartAction;

    fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::AddItem(product) => self.add_product(product, 1),
            CartAction::AddItems { product, quantity } => self.add_product(product, quantity),
            CartAction::RemoveItem(key) => self.remove_item(&key),
            CartAction::UpdateQuantity { key, quantity } => self.update_quantity(&key, quantity),
            CartAction::Clear => self.clear(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

impl Persisted for Cart {
    const STORAGE_NAME: &'static str = "cart-storage";
    type Snapshot = CartSnapshot;

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items().cloned().collect(),
        }
    }

    fn restore(snapshot: CartSnapshot) -> Self {
        // A hand-edited snapshot may repeat a line; fold duplicates back together.
        let mut cart = Cart::default();
        for item in snapshot.items {
            let quantity = item.quantity.max(1);
            cart.add(CartItem { quantity, ..item });
        }
        cart
    }
}
