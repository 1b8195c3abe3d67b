// src/simulation/kpi.rs

use crate::model::actors::{DistributionCenter, Store};
use crate::simulation::engine::TimeseriesRow;
use serde::Serialize;

/// Names of the KPI fields, in declaration order.
pub const KPI_FIELDS: [&str; 10] = [
    "service_level",
    "fill_rate",
    "demand_units",
    "fulfilled_units",
    "stockout_days",
    "avg_on_hand_store",
    "avg_on_hand_dc",
    "avg_backorder_store",
    "total_orders_store",
    "total_orders_dc",
];

/// Summary of one completed replication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub service_level: f64,
    pub fill_rate: f64,
    pub demand_units: u64,
    pub fulfilled_units: u64,
    pub stockout_days: u64,
    pub avg_on_hand_store: f64,
    pub avg_on_hand_dc: f64,
    pub avg_backorder_store: f64,
    pub total_orders_store: u64,
    pub total_orders_dc: u64,
}

impl Kpis {
    /// Reduces the actor counters and the recorded trajectory.
    pub fn compute(days: u32, store: &Store, dc: &DistributionCenter, timeseries: &[TimeseriesRow]) -> Self {
        let stockout_ratio = if days > 0 {
            store.stockout_days as f64 / days as f64
        } else {
            0.0
        };
        let fill_rate = if store.demand_units > 0 {
            store.fulfilled_units as f64 / store.demand_units as f64
        } else {
            1.0
        };

        Self {
            service_level: 1.0 - stockout_ratio,
            fill_rate,
            demand_units: store.demand_units,
            fulfilled_units: store.fulfilled_units,
            stockout_days: store.stockout_days,
            avg_on_hand_store: mean_of(timeseries, |row| row.store_on_hand),
            avg_on_hand_dc: mean_of(timeseries, |row| row.dc_on_hand),
            avg_backorder_store: mean_of(timeseries, |row| row.store_backorder),
            total_orders_store: store.orders_placed,
            total_orders_dc: dc.orders_placed,
        }
    }

    /// `(name, value)` pairs in [`KPI_FIELDS`] order, for cross-replication statistics.
    pub fn fields(&self) -> [(&'static str, f64); 10] {
        let values = [
            self.service_level,
            self.fill_rate,
            self.demand_units as f64,
            self.fulfilled_units as f64,
            self.stockout_days as f64,
            self.avg_on_hand_store,
            self.avg_on_hand_dc,
            self.avg_backorder_store,
            self.total_orders_store as f64,
            self.total_orders_dc as f64,
        ];
        let mut out = [("", 0.0); 10];
        for (slot, (name, value)) in out.iter_mut().zip(KPI_FIELDS.iter().zip(values)) {
            *slot = (*name, value);
        }
        out
    }
}

fn mean_of<F: Fn(&TimeseriesRow) -> u64>(rows: &[TimeseriesRow], field: F) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|row| field(row) as f64).sum::<f64>() / rows.len() as f64
}
