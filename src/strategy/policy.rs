// src/strategy/policy.rs

use crate::error::{Result, SimError};
use serde::Serialize;

// =========================================================================
// (s, S) Order-Up-To
// =========================================================================

/// Order nothing above the reorder point `s`; at or below it, order up to `S`.
///
/// `inventory_position` is on-hand + on-order - backorder and may be negative.
pub fn order_up_to(inventory_position: i64, reorder_point: i64, order_up_to_level: i64) -> Result<u64> {
    if reorder_point > order_up_to_level {
        return Err(SimError::InvalidPolicy {
            reorder_point,
            order_up_to: order_up_to_level,
        });
    }

    if inventory_position <= reorder_point {
        // Convert through i128 so a very negative position cannot overflow
        let gap = order_up_to_level as i128 - inventory_position as i128;
        Ok(gap.max(0) as u64)
    } else {
        Ok(0)
    }
}

/// A validated `(s, S)` pair for one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SsPolicy {
    reorder_point: i64,
    order_up_to_level: i64,
}

impl SsPolicy {
    pub fn new(reorder_point: u64, order_up_to_level: u64) -> Result<Self> {
        let policy = Self {
            reorder_point: reorder_point as i64,
            order_up_to_level: order_up_to_level as i64,
        };
        if policy.reorder_point > policy.order_up_to_level {
            return Err(SimError::InvalidPolicy {
                reorder_point: policy.reorder_point,
                order_up_to: policy.order_up_to_level,
            });
        }
        Ok(policy)
    }

    /// Quantity to order given the current inventory position.
    pub fn order_quantity(&self, inventory_position: i64) -> Result<u64> {
        order_up_to(inventory_position, self.reorder_point, self.order_up_to_level)
    }
}
