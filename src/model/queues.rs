// src/model/queues.rs

use crate::model::actors::Location;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A shipment in transit, due at a real-valued simulation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingArrival {
    pub due: f64,
    pub destination: Location,
    pub quantity: u64,
    seq: u64,
}

/// Orders by due time, then by scheduling order.
#[derive(Debug)]
struct ArrivalOrd(PendingArrival);

impl PartialEq for ArrivalOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ArrivalOrd {}

impl PartialOrd for ArrivalOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArrivalOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .due
            .total_cmp(&other.0.due)
            .then(self.0.seq.cmp(&other.0.seq))
    }
}

/// Min-heap of future receipts, polled at each day boundary.
#[derive(Debug, Default)]
pub struct ArrivalSchedule {
    heap: BinaryHeap<Reverse<ArrivalOrd>>,
    next_seq: u64,
}

impl ArrivalSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items enter the pipeline.
    pub fn push(&mut self, due: f64, destination: Location, quantity: u64) {
        let arrival = PendingArrival {
            due,
            destination,
            quantity,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(ArrivalOrd(arrival)));
    }

    /// Removes and returns the earliest arrival if it is due at or before `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<PendingArrival> {
        match self.heap.peek() {
            Some(Reverse(ArrivalOrd(next))) if next.due <= now => {
                self.heap.pop().map(|Reverse(ArrivalOrd(arrival))| arrival)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
