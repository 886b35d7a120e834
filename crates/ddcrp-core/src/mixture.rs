//! Seam to the external mixture/density model.
//!
//! The sampler decides merges and splits from graph topology alone; all
//! per-customer cluster labels (the `z` array) and sufficient statistics
//! live behind this trait. A conjugate Gaussian mixture is the intended
//! production implementation; [`PartitionStub`](crate::stubs::PartitionStub)
//! is the deterministic stand-in used by this crate's tests.

use std::collections::BTreeSet;

/// Cluster-label bookkeeping and marginal likelihoods, owned externally.
pub trait MixtureModel {
    /// Register a new observation under a fresh singleton cluster id.
    fn new_vector(&mut self, vector: &[f64], cluster_id: usize);

    /// Current cluster id of a customer (the `z` array).
    fn cluster_id(&self, customer: usize) -> usize;

    /// Move every member of `absorbed` into `surviving` and fold the
    /// absorbed table's sufficient statistics in.
    fn merge(&mut self, surviving: usize, absorbed: usize);

    /// Move exactly `moved` out of `old` into the fresh id `new`,
    /// updating both tables' sufficient statistics.
    fn split(&mut self, old: usize, new: usize, moved: &BTreeSet<usize>);

    /// Marginal log-likelihood of the observations in `members` under the
    /// conjugate prior. Depends only on the observations, never on the
    /// current partition, which is what makes it cacheable by member set.
    fn marginal_log_likelihood(&self, members: &BTreeSet<usize>) -> f64;
}
