//! Concession line items with upsert / decrement semantics.

use serde::{Deserialize, Serialize};

use crate::models::{FoodItem, FoodLineItem};
use crate::money::Money;

/// An ordered list of [`FoodLineItem`]s, at most one per item id.
///
/// A line never holds quantity zero: decrementing the last unit removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodLines {
    lines: Vec<FoodLineItem>,
}

impl FoodLines {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `item`, creating the line or incrementing it.
    ///
    /// A zero quantity is ignored. An existing line keeps its original
    /// name/price snapshot.
    pub fn add(&mut self, item: &FoodItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|line| line.item_id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(FoodLineItem {
                item_id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                quantity,
            }),
        }
    }

    /// Remove one unit of `item_id`. Returns the remaining quantity, or
    /// `None` if the item was not in the list.
    pub fn remove_one(&mut self, item_id: &str) -> Option<u32> {
        let pos = self.lines.iter().position(|line| line.item_id == item_id)?;
        let remaining = {
            let line = self.lines.get_mut(pos)?;
            line.quantity = line.quantity.saturating_sub(1);
            line.quantity
        };
        if remaining == 0 {
            self.lines.remove(pos);
        }
        Some(remaining)
    }

    /// Quantity of `item_id`, zero if absent.
    pub fn quantity(&self, item_id: &str) -> u32 {
        self.lines
            .iter()
            .find(|line| line.item_id == item_id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of `price * quantity` over all lines.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(FoodLineItem::subtotal).sum()
    }

    /// Total number of units.
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// The lines in insertion order.
    pub fn lines(&self) -> &[FoodLineItem] {
        &self.lines
    }

    /// Returns `true` if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop any zero-quantity lines, e.g. after decoding untrusted storage.
    pub(crate) fn normalize(&mut self) {
        self.lines.retain(|line| line.quantity > 0);
    }
}

impl From<Vec<FoodLineItem>> for FoodLines {
    fn from(lines: Vec<FoodLineItem>) -> Self {
        let mut food = Self { lines };
        food.normalize();
        food
    }
}
