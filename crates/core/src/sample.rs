//! Weighted-choice sampling
//!
//! Complexity knobs express discrete distributions as `(value, weight)`
//! pairs; every draw goes through the session RNG so corpora are
//! reproducible from their seed.

use rand::Rng;

/// Draw one value from a weighted distribution. The distribution must be
/// non-empty; weights need not be normalized.
pub fn sample_weighted<T: Copy, R: Rng>(rng: &mut R, dist: &[(T, f64)]) -> T {
    let total: f64 = dist.iter().map(|(_, w)| w).sum();
    let mut remaining = rng.gen::<f64>() * total;
    for (value, weight) in dist {
        remaining -= weight;
        if remaining <= 0.0 {
            return *value;
        }
    }
    dist[dist.len() - 1].0
}
