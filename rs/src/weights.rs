//! Draws weight triples from a Dirichlet distribution on the 2-simplex,
//! plus the four fixed corner vectors used to cover its extremes.

use crate::core::errors::{CoreError, Result};
use crate::core::types::WeightVector;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::Dirichlet;

/// Samples [`WeightVector`] triples for the weight/rotation sweep.
/// Reproducible given the same seed.
pub struct WeightSampler {
    rng: SmallRng,
}

impl WeightSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { rng }
    }

    /// Samples `n_samples` weight triples from `Dirichlet(1, 1, 1)`
    /// (uniform over the 2-simplex).
    pub fn sample(&mut self, n_samples: usize) -> Result<Vec<WeightVector>> {
        self.sample_with_bias(n_samples, 1.0, 1.0, 1.0)
    }

    /// Samples from a biased Dirichlet distribution; biasing a component
    /// above 1.0 concentrates mass toward that objective.
    pub fn sample_with_bias(
        &mut self,
        n_samples: usize,
        shape_bias: f64,
        length_bias: f64,
        crossing_bias: f64,
    ) -> Result<Vec<WeightVector>> {
        if n_samples == 0 {
            return Err(CoreError::InvalidInput(
                "sample count must be positive".into(),
            ));
        }
        if shape_bias <= 0.0 || length_bias <= 0.0 || crossing_bias <= 0.0 {
            return Err(CoreError::InvalidInput(
                "bias values must be positive".into(),
            ));
        }

        let dirichlet = Dirichlet::new(vec![shape_bias, length_bias, crossing_bias])
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

        Ok((0..n_samples)
            .map(|_| {
                let sample: Vec<f64> = self.rng.sample(&dirichlet);
                WeightVector::new(sample[0], sample[1], sample[2])
            })
            .collect())
    }

    /// The four fixed corner vectors: one heavily favoring each objective,
    /// plus a near-balanced triple.
    pub fn corner_weights(&self) -> [WeightVector; 4] {
        [
            WeightVector::new(0.8, 0.1, 0.1),
            WeightVector::new(0.1, 0.8, 0.1),
            WeightVector::new(0.1, 0.1, 0.8),
            WeightVector::new(0.34, 0.33, 0.33),
        ]
    }

    /// A sample of size `n`: the four corners, followed by `n - 4`
    /// Dirichlet draws. If `n <= 4`, returns the first `n` corners instead.
    pub fn sample_with_corners(&mut self, n: usize) -> Result<Vec<WeightVector>> {
        if n == 0 {
            return Err(CoreError::InvalidInput(
                "sample count must be positive".into(),
            ));
        }

        let corners = self.corner_weights();
        if n <= corners.len() {
            return Ok(corners[..n].to_vec());
        }

        let mut result = corners.to_vec();
        result.extend(self.sample(n - corners.len())?);
        Ok(result)
    }
}
