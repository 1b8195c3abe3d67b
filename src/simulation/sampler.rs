// src/simulation/sampler.rs

//! Random variates for demand, lead times and shipment disruptions.
//!
//! Every draw in a replication goes through one `ChaCha8Rng`, so a seed
//! reproduces the whole trajectory. The call order inside a day is part of
//! that contract: demand first, then lead time and disruption per shipment.

use crate::error::{Result, SimError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, Poisson};

/// Builds the random stream for one replication. `None` seeds from OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Poisson demand with mean `intensity`.
pub fn demand<R: Rng + ?Sized>(rng: &mut R, intensity: f64) -> Result<u64> {
    if !(intensity >= 0.0) || !intensity.is_finite() {
        return Err(SimError::invalid(format!(
            "demand intensity must be a finite value >= 0 (got {})",
            intensity
        )));
    }
    // Poisson(0) is degenerate and rand_distr rejects it
    if intensity == 0.0 {
        return Ok(0);
    }

    let poisson = Poisson::new(intensity)
        .map_err(|e| SimError::invalid(format!("poisson({}): {}", intensity, e)))?;
    let draw: f64 = poisson.sample(rng);
    Ok(draw as u64)
}

/// Converts the mean/std of a lognormal into the underlying normal's (mu, sigma).
fn lognormal_mu_sigma(mean: f64, std: f64) -> (f64, f64) {
    let sigma2 = (1.0 + (std * std) / (mean * mean)).ln();
    let mu = mean.ln() - 0.5 * sigma2;
    (mu, sigma2.sqrt())
}

/// Lognormal lead time whose resulting distribution has the given mean and std.
///
/// A zero std returns `mean_days` exactly without consuming a draw.
pub fn lead_time<R: Rng + ?Sized>(rng: &mut R, mean_days: f64, std_days: f64) -> Result<f64> {
    if !(mean_days > 0.0) || !mean_days.is_finite() {
        return Err(SimError::invalid(format!(
            "lead time mean must be > 0 (got {})",
            mean_days
        )));
    }
    if !(std_days >= 0.0) || !std_days.is_finite() {
        return Err(SimError::invalid(format!(
            "lead time std must be >= 0 (got {})",
            std_days
        )));
    }
    if std_days == 0.0 {
        return Ok(mean_days);
    }

    let (mu, sigma) = lognormal_mu_sigma(mean_days, std_days);
    let lognormal = LogNormal::new(mu, sigma)
        .map_err(|e| SimError::invalid(format!("lognormal({}, {}): {}", mu, sigma, e)))?;
    Ok(lognormal.sample(rng))
}

/// Extra transit delay: `delay_days` with probability `probability`, else 0.
///
/// Returns 0 without touching the stream when the disruption is switched off.
pub fn disruption_delay<R: Rng + ?Sized>(
    rng: &mut R,
    probability: f64,
    delay_days: f64,
) -> Result<f64> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(SimError::invalid(format!(
            "disruption probability must be in [0, 1] (got {})",
            probability
        )));
    }
    if !(delay_days >= 0.0) || !delay_days.is_finite() {
        return Err(SimError::invalid(format!(
            "disruption delay must be >= 0 (got {})",
            delay_days
        )));
    }
    if probability == 0.0 || delay_days == 0.0 {
        return Ok(0.0);
    }

    if rng.gen::<f64>() < probability {
        Ok(delay_days)
    } else {
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn mean(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn poisson_demand_mean_approx() {
        let mut rng = rng_from_seed(Some(123));
        let lambda = 20.0;
        let samples: Vec<f64> = (0..20_000)
            .map(|_| demand(&mut rng, lambda).unwrap() as f64)
            .collect();

        let m = mean(&samples);
        assert!((m - lambda).abs() / lambda < 0.05, "mean {} too far from {}", m, lambda);
    }

    #[test]
    fn zero_intensity_yields_zero_demand() {
        let mut rng = rng_from_seed(Some(1));
        for _ in 0..100 {
            assert_eq!(demand(&mut rng, 0.0).unwrap(), 0);
        }
    }

    #[test]
    fn negative_intensity_is_rejected() {
        let mut rng = rng_from_seed(Some(1));
        assert!(matches!(demand(&mut rng, -0.1), Err(SimError::InvalidParameter(_))));
    }

    #[test]
    fn lognormal_lead_time_mean_approx() {
        let mut rng = rng_from_seed(Some(123));
        let samples: Vec<f64> = (0..30_000)
            .map(|_| lead_time(&mut rng, 7.0, 2.0).unwrap())
            .collect();

        let m = mean(&samples);
        assert!((m - 7.0).abs() / 7.0 < 0.06, "mean lead time {}", m);
    }

    #[test]
    fn lead_time_is_non_negative() {
        let mut rng = rng_from_seed(Some(1));
        for _ in 0..1000 {
            assert!(lead_time(&mut rng, 3.0, 1.0).unwrap() >= 0.0);
        }
    }

    #[test]
    fn zero_std_lead_time_is_exact_mean() {
        let mut rng = rng_from_seed(Some(9));
        for _ in 0..100 {
            assert_eq!(lead_time(&mut rng, 4.5, 0.0).unwrap(), 4.5);
        }
    }

    #[test]
    fn lead_time_rejects_bad_moments() {
        let mut rng = rng_from_seed(Some(1));
        assert!(lead_time(&mut rng, 0.0, 1.0).is_err());
        assert!(lead_time(&mut rng, -3.0, 1.0).is_err());
        assert!(lead_time(&mut rng, 3.0, -1.0).is_err());
    }

    #[test]
    fn disabled_disruption_does_not_advance_stream() {
        let mut rng = rng_from_seed(Some(42));
        let mut control = rng_from_seed(Some(42));

        for _ in 0..50 {
            assert_eq!(disruption_delay(&mut rng, 0.0, 5.0).unwrap(), 0.0);
            assert_eq!(disruption_delay(&mut rng, 0.7, 0.0).unwrap(), 0.0);
        }

        for _ in 0..10 {
            assert_eq!(rng.next_u64(), control.next_u64());
        }
    }

    #[test]
    fn certain_disruption_always_delays() {
        let mut rng = rng_from_seed(Some(3));
        for _ in 0..100 {
            assert_eq!(disruption_delay(&mut rng, 1.0, 2.5).unwrap(), 2.5);
        }
    }

    #[test]
    fn disruption_frequency_tracks_probability() {
        let mut rng = rng_from_seed(Some(11));
        let hits = (0..10_000)
            .filter(|_| disruption_delay(&mut rng, 0.3, 1.0).unwrap() > 0.0)
            .count();
        let rate = hits as f64 / 10_000.0;
        assert!((rate - 0.3).abs() < 0.03, "disruption rate {}", rate);
    }

    #[test]
    fn disruption_rejects_bad_parameters() {
        let mut rng = rng_from_seed(Some(1));
        assert!(disruption_delay(&mut rng, -0.1, 1.0).is_err());
        assert!(disruption_delay(&mut rng, 1.1, 1.0).is_err());
        assert!(disruption_delay(&mut rng, 0.5, -1.0).is_err());
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = rng_from_seed(Some(77));
        let mut b = rng_from_seed(Some(77));
        for _ in 0..100 {
            assert_eq!(demand(&mut a, 12.0).unwrap(), demand(&mut b, 12.0).unwrap());
            assert_eq!(
                lead_time(&mut a, 5.0, 1.5).unwrap().to_bits(),
                lead_time(&mut b, 5.0, 1.5).unwrap().to_bits()
            );
        }
    }
}
