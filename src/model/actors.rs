// src/model/actors.rs

use crate::model::inventory::InventoryState;
use serde::Serialize;
use std::cmp;

/// The two locations of the network. Arrivals are addressed by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Location {
    Store,
    DistributionCenter,
}

/// Anything that can take delivery of a shipment.
pub trait Receiver {
    fn inventory_mut(&mut self) -> &mut InventoryState;

    /// Books an inbound shipment. Quantities of zero are ignored.
    fn receive(&mut self, quantity: u64);
}

/// Retail location where demand is realized and service is measured.
#[derive(Debug, Clone)]
pub struct Store {
    pub inventory: InventoryState,

    // Service counters
    pub demand_units: u64,
    pub fulfilled_units: u64,
    pub stockout_days: u64,
    pub orders_placed: u64,
}

impl Store {
    pub fn new(initial_on_hand: u64) -> Self {
        Self {
            inventory: InventoryState::new(initial_on_hand),
            demand_units: 0,
            fulfilled_units: 0,
            stockout_days: 0,
            orders_placed: 0,
        }
    }

    /// Serves a day's demand from stock; the shortfall becomes backorder.
    ///
    /// A day with any shortfall counts as one stockout day regardless of size.
    /// Returns the units fulfilled.
    pub fn consume_demand(&mut self, quantity: u64) -> u64 {
        self.demand_units += quantity;

        let fulfilled = cmp::min(self.inventory.on_hand, quantity);
        self.inventory.on_hand -= fulfilled;
        self.fulfilled_units += fulfilled;

        let unmet = quantity - fulfilled;
        if unmet > 0 {
            self.inventory.backorder += unmet;
            self.stockout_days += 1;
        }
        fulfilled
    }

    /// Records stock the DC owes but could not ship.
    pub fn add_backorder(&mut self, quantity: u64) {
        self.inventory.backorder += quantity;
    }
}

impl Receiver for Store {
    fn inventory_mut(&mut self) -> &mut InventoryState {
        &mut self.inventory
    }

    /// Backorders are cleared first; only the remainder goes on the shelf.
    fn receive(&mut self, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let cleared = cmp::min(self.inventory.backorder, quantity);
        self.inventory.backorder -= cleared;
        self.inventory.on_hand += quantity - cleared;
    }
}

/// Upstream buffer that ships to the store out of on-hand stock only.
#[derive(Debug, Clone)]
pub struct DistributionCenter {
    pub inventory: InventoryState,
    pub orders_placed: u64,
}

impl DistributionCenter {
    pub fn new(initial_on_hand: u64) -> Self {
        Self {
            inventory: InventoryState::new(initial_on_hand),
            orders_placed: 0,
        }
    }

    /// Ships what it can of `requested`. The unmet part is the caller's problem.
    pub fn ship_to_store(&mut self, requested: u64) -> u64 {
        let shipped = cmp::min(self.inventory.on_hand, requested);
        self.inventory.on_hand -= shipped;
        shipped
    }
}

impl Receiver for DistributionCenter {
    fn inventory_mut(&mut self) -> &mut InventoryState {
        &mut self.inventory
    }

    fn receive(&mut self, quantity: u64) {
        self.inventory.on_hand += quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn demand_within_stock_is_fully_served() {
        let mut store = Store::new(10);
        assert_eq!(store.consume_demand(7), 7);
        assert_eq!(store.inventory.on_hand, 3);
        assert_eq!(store.inventory.backorder, 0);
        assert_eq!(store.stockout_days, 0);
    }

    #[test]
    fn shortfall_goes_to_backorder_and_counts_one_day() {
        let mut store = Store::new(4);
        assert_eq!(store.consume_demand(30), 4);
        assert_eq!(store.inventory.on_hand, 0);
        assert_eq!(store.inventory.backorder, 26);
        assert_eq!(store.stockout_days, 1);
        assert_eq!(store.demand_units, 30);
        assert_eq!(store.fulfilled_units, 4);
    }

    #[test]
    fn store_receipt_clears_backorder_first() {
        let mut store = Store::new(0);
        store.consume_demand(10);

        store.receive(6);
        assert_eq!(store.inventory.backorder, 4);
        assert_eq!(store.inventory.on_hand, 0);

        store.receive(9);
        assert_eq!(store.inventory.backorder, 0);
        assert_eq!(store.inventory.on_hand, 5);
    }

    #[test]
    fn zero_receipt_is_noop() {
        let mut store = Store::new(2);
        store.add_backorder(3);
        store.receive(0);
        assert_eq!(store.inventory.on_hand, 2);
        assert_eq!(store.inventory.backorder, 3);
    }

    #[test]
    fn dc_ships_at_most_on_hand() {
        let mut dc = DistributionCenter::new(50);
        assert_eq!(dc.ship_to_store(30), 30);
        assert_eq!(dc.ship_to_store(30), 20);
        assert_eq!(dc.ship_to_store(30), 0);
        assert_eq!(dc.inventory.on_hand, 0);

        dc.receive(15);
        assert_eq!(dc.inventory.on_hand, 15);
        assert_eq!(dc.inventory.backorder, 0);
    }

    proptest! {
        #[test]
        fn store_ledger_is_conserved(
            initial in 0u64..500,
            demands in prop::collection::vec(0u64..100, 0..40),
            receipts in prop::collection::vec(0u64..100, 0..40),
        ) {
            let mut store = Store::new(initial);
            for (i, d) in demands.iter().enumerate() {
                store.consume_demand(*d);
                if let Some(r) = receipts.get(i) {
                    store.receive(*r);
                }
                prop_assert!(store.fulfilled_units <= store.demand_units);
            }
            let received: u64 = receipts.iter().take(demands.len()).sum();
            // Every unit either sits on the shelf or was handed to a customer
            // (directly or by clearing a backorder).
            let served_late = store.demand_units - store.fulfilled_units - store.inventory.backorder;
            prop_assert_eq!(
                initial + received,
                store.inventory.on_hand + store.fulfilled_units + served_late
            );
        }

        #[test]
        fn dc_never_ships_more_than_requested_or_held(stock in 0u64..1000, request in 0u64..1000) {
            let mut dc = DistributionCenter::new(stock);
            let shipped = dc.ship_to_store(request);
            prop_assert!(shipped <= request);
            prop_assert!(shipped <= stock);
            prop_assert_eq!(dc.inventory.on_hand, stock - shipped);
        }
    }
}
