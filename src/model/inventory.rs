// src/model/inventory.rs

use serde::Serialize;

/// Inventory bookkeeping for a single location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InventoryState {
    pub on_hand: u64,
    pub backorder: u64,
    pub on_order: u64, // Ordered but not yet received
}

impl InventoryState {
    pub fn new(on_hand: u64) -> Self {
        Self {
            on_hand,
            backorder: 0,
            on_order: 0,
        }
    }

    /// On-hand plus pipeline minus what is owed. Compared against reorder points.
    pub fn inventory_position(&self) -> i64 {
        self.on_hand as i64 + self.on_order as i64 - self.backorder as i64
    }

    /// Pipeline stock leaves `on_order` when it lands (capped at 0).
    pub fn settle_on_order(&mut self, quantity: u64) {
        self.on_order = self.on_order.saturating_sub(quantity);
    }
}
