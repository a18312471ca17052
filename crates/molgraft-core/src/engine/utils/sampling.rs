use rand::{distributions::WeightedIndex, prelude::*};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error, PartialEq)]
pub enum SamplingError {
    #[error("Cannot sample from an empty list of weights")]
    EmptyWeights,
    #[error("All weights are zero, nothing can be sampled")]
    ZeroTotalWeight,
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

/// Draws an index with probability proportional to its integer weight.
#[instrument(level = "trace", skip_all, fields(n = weights.len()))]
pub fn weighted_sample(weights: &[u32], rng: &mut impl Rng) -> Result<usize, SamplingError> {
    if weights.is_empty() {
        return Err(SamplingError::EmptyWeights);
    }
    if weights.iter().all(|&w| w == 0) {
        return Err(SamplingError::ZeroTotalWeight);
    }
    let dist = WeightedIndex::new(weights)?;
    Ok(dist.sample(rng))
}

/// Like [`weighted_sample`], but an all-zero list means "nothing to pick".
pub fn try_weighted_sample(weights: &[u32], rng: &mut impl Rng) -> Option<usize> {
    match weighted_sample(weights, rng) {
        Ok(index) => Some(index),
        Err(SamplingError::EmptyWeights) | Err(SamplingError::ZeroTotalWeight) => None,
        Err(e) => {
            tracing::warn!("Weighted sampling failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn zero_weights_are_never_drawn() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let i = weighted_sample(&[0, 3, 0, 1], &mut rng).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn heavier_weights_are_drawn_more_often() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0usize; 2];
        for _ in 0..2000 {
            counts[weighted_sample(&[1, 9], &mut rng).unwrap()] += 1;
        }
        assert!(counts[1] > counts[0] * 4);
    }

    #[test]
    fn degenerate_inputs_are_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            weighted_sample(&[], &mut rng),
            Err(SamplingError::EmptyWeights)
        );
        assert_eq!(
            weighted_sample(&[0, 0], &mut rng),
            Err(SamplingError::ZeroTotalWeight)
        );
        assert_eq!(try_weighted_sample(&[0, 0], &mut rng), None);
    }
}
