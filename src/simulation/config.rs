// src/simulation/config.rs

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Longest horizon a single replication may cover (ten years).
pub const MAX_DAYS: u32 = 3650;

/// A temporary multiplier on baseline demand over an inclusive day window.
///
/// Used to model promotions and seasonality. Overlapping peaks multiply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPeak {
    pub start_day: u32,
    pub end_day: u32,
    pub multiplier: f64,
}

impl DemandPeak {
    pub fn new(start_day: u32, end_day: u32, multiplier: f64) -> Self {
        Self {
            start_day,
            end_day,
            multiplier,
        }
    }

    pub fn contains(&self, day: u32) -> bool {
        self.start_day <= day && day <= self.end_day
    }
}

/// Inputs controlling one replication. Quantities are in units, durations in days.
///
/// Serialized names follow the service's wire format, including the
/// case-distinct `s_store` / `S_store` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub days: u32,

    pub demand_lambda_per_day: f64,
    pub demand_peaks: Vec<DemandPeak>,

    #[serde(rename = "s_store")]
    pub reorder_point_store: u64,
    #[serde(rename = "S_store")]
    pub order_up_to_store: u64,
    #[serde(rename = "s_dc")]
    pub reorder_point_dc: u64,
    #[serde(rename = "S_dc")]
    pub order_up_to_dc: u64,

    pub initial_on_hand_store: u64,
    pub initial_on_hand_dc: u64,

    pub lead_time_mean_days: f64,
    pub lead_time_std_days: f64,

    pub disruption_probability_per_shipment: f64,
    pub disruption_delay_days: f64,

    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 365,
            demand_lambda_per_day: 20.0,
            demand_peaks: Vec::new(),
            reorder_point_store: 80,
            order_up_to_store: 160,
            reorder_point_dc: 300,
            order_up_to_dc: 600,
            initial_on_hand_store: 120,
            initial_on_hand_dc: 500,
            lead_time_mean_days: 7.0,
            lead_time_std_days: 2.0,
            disruption_probability_per_shipment: 0.0,
            disruption_delay_days: 0.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Returns a copy differing only in seed.
    pub fn with_seed(&self, seed: Option<u64>) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Product of the multipliers of every peak covering `day` (1.0 if none).
    pub fn demand_multiplier_for_day(&self, day: u32) -> f64 {
        self.demand_peaks
            .iter()
            .filter(|peak| peak.contains(day))
            .map(|peak| peak.multiplier)
            .product()
    }

    /// Baseline intensity scaled by the active peaks.
    pub fn demand_intensity_for_day(&self, day: u32) -> f64 {
        self.demand_lambda_per_day * self.demand_multiplier_for_day(day)
    }

    /// Checks every parameter before a replication builds any state.
    ///
    /// Reports the same error kinds the sampler and policy would raise
    /// mid-run, so a rejected config never produces a partial trajectory.
    pub fn validate(&self) -> Result<()> {
        if self.days == 0 || self.days > MAX_DAYS {
            return Err(SimError::invalid(format!(
                "days must be in 1..={} (got {})",
                MAX_DAYS, self.days
            )));
        }
        if !(self.demand_lambda_per_day >= 0.0) || !self.demand_lambda_per_day.is_finite() {
            return Err(SimError::invalid(format!(
                "demand lambda must be a finite value >= 0 (got {})",
                self.demand_lambda_per_day
            )));
        }
        for peak in &self.demand_peaks {
            if peak.start_day > peak.end_day {
                return Err(SimError::invalid(format!(
                    "demand peak start_day {} is after end_day {}",
                    peak.start_day, peak.end_day
                )));
            }
            if !(peak.multiplier > 0.0) || !peak.multiplier.is_finite() {
                return Err(SimError::invalid(format!(
                    "demand peak multiplier must be > 0 (got {})",
                    peak.multiplier
                )));
            }
        }

        check_policy(self.reorder_point_store, self.order_up_to_store)?;
        check_policy(self.reorder_point_dc, self.order_up_to_dc)?;

        if !(self.lead_time_mean_days > 0.0) || !self.lead_time_mean_days.is_finite() {
            return Err(SimError::invalid(format!(
                "lead time mean must be > 0 (got {})",
                self.lead_time_mean_days
            )));
        }
        if !(self.lead_time_std_days >= 0.0) || !self.lead_time_std_days.is_finite() {
            return Err(SimError::invalid(format!(
                "lead time std must be >= 0 (got {})",
                self.lead_time_std_days
            )));
        }
        if !(0.0..=1.0).contains(&self.disruption_probability_per_shipment) {
            return Err(SimError::invalid(format!(
                "disruption probability must be in [0, 1] (got {})",
                self.disruption_probability_per_shipment
            )));
        }
        if !(self.disruption_delay_days >= 0.0) || !self.disruption_delay_days.is_finite() {
            return Err(SimError::invalid(format!(
                "disruption delay must be >= 0 (got {})",
                self.disruption_delay_days
            )));
        }
        Ok(())
    }
}

fn check_policy(reorder_point: u64, order_up_to: u64) -> Result<()> {
    if reorder_point > order_up_to {
        return Err(SimError::InvalidPolicy {
            reorder_point: reorder_point as i64,
            order_up_to: order_up_to as i64,
        });
    }
    Ok(())
}
