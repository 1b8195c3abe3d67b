// src/simulation/engine.rs

use crate::error::{Result, SimError};
use crate::model::actors::{DistributionCenter, Location, Receiver, Store};
use crate::model::queues::ArrivalSchedule;
use crate::simulation::config::SimulationConfig;
use crate::simulation::kpi::Kpis;
use crate::simulation::sampler;
use crate::strategy::policy::SsPolicy;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// End-of-day snapshot. Serialize so it can go straight to CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeseriesRow {
    pub day: u32,
    pub demand_units: u64,
    pub fulfilled_units: u64,
    pub store_on_hand: u64,
    pub store_backorder: u64,
    pub store_on_order: u64,
    pub dc_on_hand: u64,
    pub dc_on_order: u64,
}

/// Output of one replication.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub config: SimulationConfig,
    pub kpis: Kpis,
    pub timeseries: Vec<TimeseriesRow>,
}

/// One replication of the store + DC network, advanced a day at a time.
pub struct DailySimulation {
    config: SimulationConfig,
    rng: ChaCha8Rng,

    // The Actors
    pub store: Store,
    pub dc: DistributionCenter,
    store_policy: SsPolicy,
    dc_policy: SsPolicy,

    // Shipments in transit
    arrivals: ArrivalSchedule,

    pub current_day: u32,
    pub timeseries: Vec<TimeseriesRow>,
    cancel: Option<Arc<AtomicBool>>,
}

impl DailySimulation {
    /// Validates `config` and builds the initial state. Nothing is drawn yet.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let store_policy = SsPolicy::new(config.reorder_point_store, config.order_up_to_store)?;
        let dc_policy = SsPolicy::new(config.reorder_point_dc, config.order_up_to_dc)?;

        Ok(Self {
            rng: sampler::rng_from_seed(config.seed),
            store: Store::new(config.initial_on_hand_store),
            dc: DistributionCenter::new(config.initial_on_hand_dc),
            store_policy,
            dc_policy,
            arrivals: ArrivalSchedule::new(),
            current_day: 0,
            timeseries: Vec::with_capacity(config.days as usize),
            cancel: None,
            config,
        })
    }

    /// Checked before every day; a raised flag ends the run with `Cancelled`.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Shipments still in transit.
    pub fn pending_arrivals(&self) -> usize {
        self.arrivals.len()
    }

    /// Runs the remaining days and reduces the trajectory to KPIs.
    ///
    /// Shipments still in transit at the horizon are dropped.
    pub fn run(mut self) -> Result<SimulationResult> {
        while self.current_day < self.config.days {
            if let Some(cancel) = &self.cancel {
                if cancel.load(Ordering::Relaxed) {
                    return Err(SimError::Cancelled);
                }
            }
            self.step()?;
        }

        let kpis = Kpis::compute(self.config.days, &self.store, &self.dc, &self.timeseries);
        debug!(
            days = self.config.days,
            seed = ?self.config.seed,
            service_level = kpis.service_level,
            fill_rate = kpis.fill_rate,
            in_transit = self.arrivals.len(),
            "replication finished"
        );

        Ok(SimulationResult {
            config: self.config,
            kpis,
            timeseries: self.timeseries,
        })
    }

    /// Simulates one day.
    pub fn step(&mut self) -> Result<()> {
        let day = self.current_day;
        let now = day as f64;

        // =================================================================
        // MORNING: everything due by now lands before demand is realized
        // =================================================================
        self.deliver_due_arrivals(now);

        // =================================================================
        // DAY: demand at the store
        // =================================================================
        let intensity = self.config.demand_intensity_for_day(day);
        let demand = sampler::demand(&mut self.rng, intensity)?;
        let fulfilled = self.store.consume_demand(demand);

        // Ship what the store is owed before evaluating a fresh order
        if self.store.inventory.backorder > 0 {
            let shipped = self.dc.ship_to_store(self.store.inventory.backorder);
            self.schedule_inbound(Location::Store, shipped, now)?;
        }

        // =================================================================
        // EVENING: replenishment decisions
        // =================================================================
        let store_position = self.store.inventory.inventory_position();
        let store_order = self.store_policy.order_quantity(store_position)?;
        if store_order > 0 {
            self.store.orders_placed += 1;
            let shipped = self.dc.ship_to_store(store_order);
            self.schedule_inbound(Location::Store, shipped, now)?;

            // The DC owes whatever it could not ship
            let unshipped = store_order - shipped;
            if unshipped > 0 {
                self.store.add_backorder(unshipped);
            }
        }

        let dc_position = self.dc.inventory.inventory_position();
        let dc_order = self.dc_policy.order_quantity(dc_position)?;
        if dc_order > 0 {
            self.dc.orders_placed += 1;
            // External supply has unlimited capacity
            self.schedule_inbound(Location::DistributionCenter, dc_order, now)?;
        }

        // =================================================================
        // RECORD & ADVANCE
        // =================================================================
        trace!(
            day,
            demand,
            fulfilled,
            store_on_hand = self.store.inventory.on_hand,
            store_backorder = self.store.inventory.backorder,
            dc_on_hand = self.dc.inventory.on_hand,
            "day complete"
        );
        self.record_row(demand, fulfilled);
        self.current_day += 1;
        Ok(())
    }

    fn deliver_due_arrivals(&mut self, now: f64) {
        while let Some(arrival) = self.arrivals.pop_due(now) {
            match arrival.destination {
                Location::Store => land(&mut self.store, arrival.quantity),
                Location::DistributionCenter => land(&mut self.dc, arrival.quantity),
            }
        }
    }

    /// Puts `quantity` in transit to `destination`.
    ///
    /// Pipeline stock counts toward inventory position immediately. Empty
    /// shipments are skipped without drawing from the stream.
    fn schedule_inbound(&mut self, destination: Location, quantity: u64, now: f64) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }

        match destination {
            Location::Store => self.store.inventory_mut().on_order += quantity,
            Location::DistributionCenter => self.dc.inventory_mut().on_order += quantity,
        }

        let lead_time = sampler::lead_time(
            &mut self.rng,
            self.config.lead_time_mean_days,
            self.config.lead_time_std_days,
        )?;
        let delay = sampler::disruption_delay(
            &mut self.rng,
            self.config.disruption_probability_per_shipment,
            self.config.disruption_delay_days,
        )?;

        self.arrivals.push(now + lead_time + delay, destination, quantity);
        Ok(())
    }

    fn record_row(&mut self, demand_units: u64, fulfilled_units: u64) {
        self.timeseries.push(TimeseriesRow {
            day: self.current_day,
            demand_units,
            fulfilled_units,
            store_on_hand: self.store.inventory.on_hand,
            store_backorder: self.store.inventory.backorder,
            store_on_order: self.store.inventory.on_order,
            dc_on_hand: self.dc.inventory.on_hand,
            dc_on_order: self.dc.inventory.on_order,
        });
    }
}

fn land<R: Receiver>(receiver: &mut R, quantity: u64) {
    receiver.inventory_mut().settle_on_order(quantity);
    receiver.receive(quantity);
}

/// Runs one full replication of `config`.
pub fn run_single(config: &SimulationConfig) -> Result<SimulationResult> {
    DailySimulation::new(config.clone())?.run()
}
