// src/simulation/monte_carlo.rs

//! Monte Carlo replication and cross-replication statistics.

use crate::error::{Result, SimError};
use crate::simulation::config::SimulationConfig;
use crate::simulation::engine::DailySimulation;
use crate::simulation::kpi::{Kpis, KPI_FIELDS};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on replications per study.
pub const MAX_REPLICATIONS: usize = 2000;

/// Mean and sample standard deviation of every KPI across replications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloSummary {
    pub replications: usize,
    pub kpi_mean: BTreeMap<String, f64>,
    pub kpi_std: BTreeMap<String, f64>,
}

/// Summary plus the raw per-replication KPIs for deeper analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloResult {
    pub config: SimulationConfig,
    pub summary: MonteCarloSummary,
    pub samples: Vec<Kpis>,
}

/// Seed for replication `index`: the base seed offset by the index, or none.
pub fn replication_seed(base_seed: Option<u64>, index: usize) -> Option<u64> {
    base_seed.map(|seed| seed.wrapping_add(index as u64))
}

/// Mean and Bessel-corrected standard deviation per KPI field.
///
/// With a single sample the standard deviation is reported as 0.
pub fn summarize(samples: &[Kpis]) -> MonteCarloSummary {
    let n = samples.len();
    let mut kpi_mean = BTreeMap::new();
    let mut kpi_std = BTreeMap::new();

    for (idx, name) in KPI_FIELDS.iter().enumerate() {
        let values: Vec<f64> = samples.iter().map(|k| k.fields()[idx].1).collect();

        let mean = if n > 0 {
            values.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };
        let std_dev = if n > 1 {
            let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        kpi_mean.insert(name.to_string(), mean);
        kpi_std.insert(name.to_string(), std_dev);
    }

    MonteCarloSummary {
        replications: n,
        kpi_mean,
        kpi_std,
    }
}

/// Configures how a Monte Carlo study is executed.
#[derive(Debug, Clone)]
pub struct MonteCarloRunner {
    replications: usize,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl MonteCarloRunner {
    pub fn new(replications: usize) -> Self {
        Self {
            replications,
            parallel: false,
            cancel: None,
        }
    }

    /// Runs replications on the rayon pool. Progress may arrive out of order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checked between replications and between days.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn run(
        &self,
        config: &SimulationConfig,
        progress: Option<&(dyn Fn(f64) + Sync)>,
    ) -> Result<MonteCarloResult> {
        if self.parallel {
            run_parallel(config, self.replications, self.cancel.as_ref(), progress)
        } else {
            let mut forward = |p: f64| {
                if let Some(sink) = progress {
                    sink(p);
                }
            };
            run_sequential(config, self.replications, self.cancel.as_ref(), Some(&mut forward))
        }
    }
}

/// Runs `replications` seeded replications in index order.
///
/// `progress` receives `(i + 1) / replications` after replication `i`.
pub fn run_monte_carlo(
    config: &SimulationConfig,
    replications: usize,
    progress: Option<&mut dyn FnMut(f64)>,
) -> Result<MonteCarloResult> {
    run_sequential(config, replications, None, progress)
}

/// Parallel variant of [`run_monte_carlo`]. Samples keep replication order,
/// so a seeded study gives the same result either way.
pub fn run_monte_carlo_parallel(
    config: &SimulationConfig,
    replications: usize,
    progress: Option<&(dyn Fn(f64) + Sync)>,
) -> Result<MonteCarloResult> {
    run_parallel(config, replications, None, progress)
}

fn check_inputs(config: &SimulationConfig, replications: usize) -> Result<()> {
    if replications < 1 || replications > MAX_REPLICATIONS {
        return Err(SimError::InvalidReplicationCount(replications));
    }
    config.validate()
}

fn is_cancelled(cancel: Option<&Arc<AtomicBool>>) -> bool {
    cancel.map_or(false, |flag| flag.load(Ordering::Relaxed))
}

fn run_replication(
    config: &SimulationConfig,
    index: usize,
    cancel: Option<&Arc<AtomicBool>>,
) -> Result<Kpis> {
    if is_cancelled(cancel) {
        return Err(SimError::Cancelled);
    }
    let seed = replication_seed(config.seed, index);
    let mut sim = DailySimulation::new(config.with_seed(seed))?;
    if let Some(flag) = cancel {
        sim = sim.with_cancel_flag(Arc::clone(flag));
    }
    let kpis = sim.run()?.kpis;
    debug!(replication = index, seed = ?seed, "replication complete");
    Ok(kpis)
}

fn run_sequential(
    config: &SimulationConfig,
    replications: usize,
    cancel: Option<&Arc<AtomicBool>>,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<MonteCarloResult> {
    check_inputs(config, replications)?;
    info!(replications, seed = ?config.seed, "starting Monte Carlo study");

    let mut samples = Vec::with_capacity(replications);
    for i in 0..replications {
        samples.push(run_replication(config, i, cancel)?);
        if let Some(sink) = progress.as_deref_mut() {
            sink((i + 1) as f64 / replications as f64);
        }
    }

    finish(config, samples)
}

fn run_parallel(
    config: &SimulationConfig,
    replications: usize,
    cancel: Option<&Arc<AtomicBool>>,
    progress: Option<&(dyn Fn(f64) + Sync)>,
) -> Result<MonteCarloResult> {
    check_inputs(config, replications)?;
    info!(replications, seed = ?config.seed, "starting parallel Monte Carlo study");

    let completed = AtomicUsize::new(0);
    let samples = (0..replications)
        .into_par_iter()
        .map(|i| -> Result<Kpis> {
            let kpis = run_replication(config, i, cancel)?;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(sink) = progress {
                sink(done as f64 / replications as f64);
            }
            Ok(kpis)
        })
        .collect::<Result<Vec<Kpis>>>()?;

    finish(config, samples)
}

fn finish(config: &SimulationConfig, samples: Vec<Kpis>) -> Result<MonteCarloResult> {
    let summary = summarize(&samples);
    info!(
        replications = summary.replications,
        mean_service_level = summary.kpi_mean["service_level"],
        mean_fill_rate = summary.kpi_mean["fill_rate"],
        "Monte Carlo study complete"
    );
    Ok(MonteCarloResult {
        config: config.clone(),
        summary,
        samples,
    })
}
