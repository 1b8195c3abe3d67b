//! Two-echelon (store + distribution center) inventory simulation under
//! stochastic demand, lognormal lead times and shipment disruptions.
//!
//! A replication walks the horizon one day at a time: arrivals land, Poisson
//! demand hits the store, the store and the DC evaluate their (s, S) policies,
//! and new shipments enter the pipeline. Monte Carlo studies repeat that with
//! derived seeds and summarize the KPIs.
//!
//! ```no_run
//! use stochastix_twin::{run_monte_carlo, run_single, SimulationConfig};
//!
//! let config = SimulationConfig { seed: Some(42), ..Default::default() };
//! let single = run_single(&config)?;
//! println!("service level {:.3}", single.kpis.service_level);
//!
//! let study = run_monte_carlo(&config, 100, None)?;
//! println!("mean fill rate {:.3}", study.summary.kpi_mean["fill_rate"]);
//! # Ok::<(), stochastix_twin::SimError>(())
//! ```

pub mod error;
pub mod io;
pub mod jobs;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{ConfigError, SimError};
pub use jobs::{JobOutput, JobRegistry, JobState, JobStatus};
pub use model::actors::{DistributionCenter, Location, Receiver, Store};
pub use model::inventory::InventoryState;
pub use simulation::config::{DemandPeak, SimulationConfig, MAX_DAYS};
pub use simulation::engine::{run_single, DailySimulation, SimulationResult, TimeseriesRow};
pub use simulation::kpi::{Kpis, KPI_FIELDS};
pub use simulation::monte_carlo::{
    run_monte_carlo, run_monte_carlo_parallel, summarize, MonteCarloResult, MonteCarloRunner,
    MonteCarloSummary, MAX_REPLICATIONS,
};
pub use strategy::policy::{order_up_to, SsPolicy};
