//! Reproducible parameter sampling for driving parameter studies.

use crate::error::KError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Draws `count` parameter vectors whose k-th entry follows
/// `N(means[k], std_devs[k])`.
///
/// Parameters are drawn column by column: all `count` values of the first
/// parameter, then all values of the second, and so on.
pub fn sample_normal_parameters(
    count: usize,
    means: &[f64],
    std_devs: &[f64],
    seed: u64,
) -> Result<Vec<Vec<f64>>, KError> {
    if means.len() != std_devs.len() {
        return Err(KError::Configuration(format!(
            "{} means but {} standard deviations",
            means.len(),
            std_devs.len()
        )));
    }
    if let Some(k) = std_devs.iter().position(|s| !(s.is_finite() && *s >= 0.0)) {
        return Err(KError::Configuration(format!(
            "standard deviation of parameter {k} must be finite and non-negative, got {}",
            std_devs[k]
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = vec![Vec::with_capacity(means.len()); count];
    for (&mean, &std_dev) in means.iter().zip(std_devs) {
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| KError::Configuration(format!("invalid normal distribution: {e}")))?;
        for sample in samples.iter_mut() {
            sample.push(normal.sample(&mut rng));
        }
    }
    Ok(samples)
}
