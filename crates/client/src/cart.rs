//! Shopping cart.
//!
//! Lines are keyed by product id: adding a product that is already in the
//! cart bumps its quantity instead of adding a second line, and a quantity
//! never drops below one (setting it to zero removes the line). The total is
//! always computed from the lines, never stored.
//!
//! Mutations are pure in-memory transitions. Persistence is explicit via
//! [`Cart::load`] and [`Cart::save`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};
use smartsales_core::Price;

use crate::api::catalog::Product;
use crate::storage::{Storage, StorageError, keys};

/// One row in the cart: a distinct product and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product identifier, as stored by the catalog (numeric string).
    pub id: String,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.line_total(self.quantity)
    }
}

/// Product data needed to put something in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartProduct {
    pub id: String,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            unit_price: product.price,
            image: product.image.clone(),
        }
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: HashMap<String, CartLine>,
    /// Product ids in display (insertion) order.
    order: Vec<String>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the product, or appends a new line
    /// with quantity 1.
    pub fn add_item(&mut self, product: CartProduct) -> &CartLine {
        match self.lines.entry(product.id.clone()) {
            Entry::Occupied(entry) => {
                let line = entry.into_mut();
                line.quantity = line.quantity.saturating_add(1);
                line
            }
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(CartLine {
                    id: product.id,
                    name: product.name,
                    unit_price: product.unit_price,
                    image: product.image,
                    quantity: 1,
                })
            }
        }
    }

    /// Set the quantity of the line for `id`.
    ///
    /// A quantity of zero or less removes the line. Setting the quantity of a
    /// product that is not in the cart does nothing.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        if let Some(line) = self.lines.get_mut(id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Remove the line for `id`, if present.
    pub fn remove_item(&mut self, id: &str) {
        if self.lines.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.order.clear();
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines().map(CartLine::line_total).sum()
    }

    /// Lines in display order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.order.iter().filter_map(|id| self.lines.get(id))
    }

    /// Owned copy of the lines, in display order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines().cloned().collect()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartLine> {
        self.lines.get(id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of units across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines().map(|line| u64::from(line.quantity)).sum()
    }

    /// Load the persisted cart.
    ///
    /// A missing or unreadable persisted cart yields an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage itself cannot be read.
    pub fn load(storage: &dyn Storage) -> Result<Self, StorageError> {
        let Some(saved) = storage.get(keys::CART)? else {
            return Ok(Self::new());
        };
        match serde_json::from_str::<Self>(&saved) {
            Ok(cart) => Ok(cart),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted cart is unreadable, starting with an empty cart");
                Ok(Self::new())
            }
        }
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written to storage.
    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)?;
        storage.set(keys::CART, &json)
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Rebuild a cart from stored lines, re-establishing the invariants:
    /// duplicate ids are merged and non-positive quantities are dropped.
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = cart.lines.get_mut(&line.id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                cart.order.push(line.id.clone());
                cart.lines.insert(line.id.clone(), line);
            }
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(mut cart: Cart) -> Self {
        cart.order
            .iter()
            .filter_map(|id| cart.lines.remove(id))
            .collect()
    }
}
