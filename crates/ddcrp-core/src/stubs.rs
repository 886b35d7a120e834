//! Deterministic stand-ins for external collaborators.
//!
//! [`PartitionStub`] implements [`MixtureModel`] with plain label
//! bookkeeping and a closed-form surrogate marginal (a spherical Gaussian
//! with known unit variance, up to constants). It exists so the sampler's
//! combinatorial logic can be exercised without a real conjugate mixture;
//! the crate's unit and integration tests are built on it.

use std::cell::Cell;
use std::collections::BTreeSet;

use crate::mixture::MixtureModel;

/// Label vector + surrogate marginal likelihood.
///
/// The surrogate marginal of a member set is the negated within-set sum of
/// squares, `-1/2 * Σ ||v_i − mean||²`: cohesive sets score higher, and a
/// set of identical vectors scores exactly 0. Deterministic, so tests can
/// assert on probabilities.
#[derive(Debug, Default)]
pub struct PartitionStub {
    z: Vec<usize>,
    vectors: Vec<Vec<f64>>,
    marginal_calls: Cell<u64>,
}

impl PartitionStub {
    /// Create an empty stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the surrogate marginal has been computed. Used to
    /// verify the likelihood cache shields the mixture model.
    pub fn marginal_calls(&self) -> u64 {
        self.marginal_calls.get()
    }

    /// Current label vector, for partition assertions in tests.
    pub fn labels(&self) -> &[usize] {
        &self.z
    }
}

impl MixtureModel for PartitionStub {
    fn new_vector(&mut self, vector: &[f64], cluster_id: usize) {
        self.vectors.push(vector.to_vec());
        self.z.push(cluster_id);
    }

    fn cluster_id(&self, customer: usize) -> usize {
        self.z[customer]
    }

    fn merge(&mut self, surviving: usize, absorbed: usize) {
        for label in &mut self.z {
            if *label == absorbed {
                *label = surviving;
            }
        }
    }

    fn split(&mut self, old: usize, new: usize, moved: &BTreeSet<usize>) {
        for &customer in moved {
            debug_assert_eq!(
                self.z[customer], old,
                "split moved customer {customer} that was not in cluster {old}"
            );
            self.z[customer] = new;
        }
    }

    fn marginal_log_likelihood(&self, members: &BTreeSet<usize>) -> f64 {
        self.marginal_calls.set(self.marginal_calls.get() + 1);

        let Some(&first) = members.iter().next() else {
            return 0.0;
        };

        let dim = self.vectors[first].len();
        let mut mean = vec![0.0f64; dim];
        for &m in members {
            for (acc, x) in mean.iter_mut().zip(&self.vectors[m]) {
                *acc += x;
            }
        }
        let n = members.len() as f64;
        for acc in &mut mean {
            *acc /= n;
        }

        let mut ss = 0.0;
        for &m in members {
            for (mu, x) in mean.iter().zip(&self.vectors[m]) {
                let d = x - mu;
                ss += d * d;
            }
        }
        -0.5 * ss
    }
}
