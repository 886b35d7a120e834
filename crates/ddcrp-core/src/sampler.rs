//! Gibbs sampler and cluster membership coordinator for the ddCRP.
//!
//! Each customer links to exactly one customer (possibly itself); connected
//! components of the symmetrized link graph are the tables. One Gibbs step
//! for customer `i`:
//!
//! 1. lift `i`'s current link, splitting its table if that link was the
//!    sole return path to the component's cycle;
//! 2. score every candidate target `t`:
//!
//!    ```text
//!    t == i          ->  log(alpha)
//!    z[i] == z[t]    ->  log(f(|ts_i - ts_t|))
//!    z[i] != z[t]    ->  log(f(|ts_i - ts_t|)) + L(k ∪ l) - L(k) - L(l)
//!    ```
//!
//!    where `f` is the decay kernel, `k`/`l` are the tables of `i`/`t`, and
//!    `L` is the mixture model's marginal log-likelihood, memoized per
//!    member set;
//! 3. normalize via log-sum-exp and draw a target;
//! 4. apply the new link, merging tables when it bridges two of them.
//!
//! Merges and splits are decided purely from topology; the mixture model
//! only ever sees `merge`, `split`, and `new_vector` calls, so its label
//! array stays equal to the graph partition at every step boundary.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::cache::LikelihoodCache;
use crate::config::DdcrpParams;
use crate::error::{DdcrpError, Result};
use crate::graph::LinkGraph;
use crate::mixture::MixtureModel;
use crate::pool::ClusterIdPool;

/// Timestamps are normalized to day scale at ingestion.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One row of [`DdcrpClustering::assignments`]: a document, its cluster,
/// and the document its customer currently links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Document identifier supplied at ingestion.
    pub doc_id: Uuid,
    /// Cluster id from the mixture model.
    pub cluster_id: usize,
    /// Document the customer points to (itself for a self-link).
    pub linked_doc_id: Uuid,
}

/// Incremental ddCRP clustering state.
///
/// Owns the link graph, the timestamp arena, the cluster-id pool, and the
/// likelihood cache; delegates label bookkeeping and sufficient statistics
/// to the injected [`MixtureModel`].
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use rand::SeedableRng;
/// use uuid::Uuid;
///
/// use ddcrp_core::config::DdcrpParams;
/// use ddcrp_core::sampler::DdcrpClustering;
/// use ddcrp_core::stubs::PartitionStub;
///
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
/// let mut clustering =
///     DdcrpClustering::new(DdcrpParams::default(), PartitionStub::new()).unwrap();
///
/// for day in 0..4 {
///     let ts = Utc.timestamp_opt(day * 86_400, 0).unwrap();
///     clustering
///         .add_document(&[day as f64], Uuid::new_v4(), ts, &mut rng)
///         .unwrap();
/// }
/// clustering.fit(&mut rng).unwrap();
/// assert_eq!(clustering.customer_count(), 4);
/// ```
#[derive(Debug)]
pub struct DdcrpClustering<M: MixtureModel> {
    params: DdcrpParams,
    mixture: M,
    graph: LinkGraph,
    pool: ClusterIdPool,
    cache: LikelihoodCache,
    ids: Vec<Uuid>,
    /// Day-scale timestamps, index-aligned with the graph.
    timestamps: Vec<f64>,
    /// Live table count; incremented on ingestion and splits, decremented
    /// on merges.
    cluster_count: usize,
}

impl<M: MixtureModel> DdcrpClustering<M> {
    /// Create an empty clustering with validated parameters.
    ///
    /// # Errors
    ///
    /// Returns `DdcrpError::InvalidParameter` if `params` fail validation.
    pub fn new(params: DdcrpParams, mixture: M) -> Result<Self> {
        params.validate()?;
        let pool = ClusterIdPool::new(params.max_clusters);
        Ok(Self {
            params,
            mixture,
            graph: LinkGraph::new(),
            pool,
            cache: LikelihoodCache::new(),
            ids: Vec::new(),
            timestamps: Vec::new(),
            cluster_count: 0,
        })
    }

    /// Number of customers ingested.
    pub fn customer_count(&self) -> usize {
        self.graph.len()
    }

    /// Number of live tables.
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Cluster id of customer `i`.
    pub fn cluster_of(&self, i: usize) -> usize {
        self.mixture.cluster_id(i)
    }

    /// Customer index that `i` currently links to; `None` only while a
    /// Gibbs step holds the link lifted.
    pub fn link_of(&self, i: usize) -> Option<usize> {
        self.graph.target_of(i)
    }

    /// The injected mixture model.
    pub fn mixture(&self) -> &M {
        &self.mixture
    }

    /// Sampler parameters.
    pub fn params(&self) -> &DdcrpParams {
        &self.params
    }

    /// Ingest one document: seat it alone at a fresh table, then, if the
    /// customer count has exceeded `max_clusters`, immediately re-link it
    /// onto a uniformly random customer (possibly itself) instead of
    /// leaving another singleton behind. Returns the customer index.
    ///
    /// The timestamp is normalized to day scale before storage; only time
    /// *differences* feed the decay kernel afterwards.
    pub fn add_document<R: Rng>(
        &mut self,
        vector: &[f64],
        doc_id: Uuid,
        timestamp: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<usize> {
        let i = self.graph.push_customer();
        self.ids.push(doc_id);
        self.timestamps
            .push(timestamp.timestamp() as f64 / SECONDS_PER_DAY);
        self.mixture.new_vector(vector, self.pool.acquire());
        self.cluster_count += 1;

        if self.customer_count() > self.params.max_clusters {
            self.remove_assignment(i)?;
            let target = rng.gen_range(0..=i);
            self.add_assignment(i, target)?;
        }

        trace!(
            customer = i,
            clusters = self.cluster_count,
            "ingested document"
        );
        Ok(i)
    }

    /// One Gibbs step for customer `i`: lift the link, score all candidate
    /// targets, draw one, re-link. Returns the drawn target.
    ///
    /// # Errors
    ///
    /// Returns `DdcrpError::CustomerOutOfRange` for an unknown index.
    pub fn sample_customer<R: Rng>(&mut self, i: usize, rng: &mut R) -> Result<usize> {
        self.check_customer(i)?;
        self.remove_assignment(i)?;

        let probabilities = self.assignment_probabilities(i)?;

        // Cumulative draw; the final candidate absorbs any floating-point
        // shortfall.
        let u: f64 = rng.gen();
        let mut cumulative = 0.0;
        let mut target = probabilities.len() - 1;
        for (t, p) in &probabilities {
            cumulative += p;
            if u < cumulative {
                target = *t;
                break;
            }
        }

        self.add_assignment(i, target)?;
        trace!(customer = i, target, "sampled new link");
        Ok(target)
    }

    /// One full Gibbs sweep over all customers, in ingestion order.
    ///
    /// The likelihood cache is cleared first: member-set keys cannot go
    /// stale within a sweep, but clearing between sweeps keeps the memo
    /// bounded by the sets the sweep actually visits.
    pub fn sweep<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        self.cache.clear();
        for i in 0..self.customer_count() {
            self.sample_customer(i, rng)?;
        }
        debug!(
            customers = self.customer_count(),
            clusters = self.cluster_count,
            cache_hits = self.cache.hits(),
            cache_misses = self.cache.misses(),
            "completed Gibbs sweep"
        );
        Ok(())
    }

    /// Run `n_iterations` sweeps.
    pub fn fit<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        for iteration in 0..self.params.n_iterations {
            trace!(iteration, "starting Gibbs sweep");
            self.sweep(rng)?;
        }
        Ok(())
    }

    /// Current `(doc_id, cluster_id, linked_doc_id)` rows in ingestion
    /// order.
    pub fn assignments(&self) -> impl Iterator<Item = AssignmentRecord> + '_ {
        (0..self.customer_count()).map(|i| AssignmentRecord {
            doc_id: self.ids[i],
            cluster_id: self.mixture.cluster_id(i),
            // A lifted link only exists mid-step; report it as a self-link.
            linked_doc_id: self.ids[self.graph.target_of(i).unwrap_or(i)],
        })
    }

    /// Normalized assignment probabilities for customer `i` over every
    /// candidate target, as `(target, probability)` pairs in target order.
    ///
    /// Valid while `i`'s link is lifted (i.e. between the removal and
    /// re-add halves of a Gibbs step); [`sample_customer`](Self::sample_customer)
    /// drives it that way. The self-assignment weight `log(alpha)` is
    /// always finite, so the distribution is never empty even when a
    /// window kernel zeroes every other candidate.
    pub fn assignment_probabilities(&mut self, i: usize) -> Result<Vec<(usize, f64)>> {
        self.check_customer(i)?;

        let n = self.customer_count();
        let mut log_weights = Vec::with_capacity(n);
        for t in 0..n {
            log_weights.push(self.assignment_log_weight(i, t));
        }

        let lse = log_sum_exp(&log_weights);
        Ok(log_weights
            .into_iter()
            .enumerate()
            .map(|(t, w)| (t, (w - lse).exp()))
            .collect())
    }

    /// Log-weight of linking `i` to `t` (unnormalized log-probability).
    fn assignment_log_weight(&mut self, i: usize, t: usize) -> f64 {
        if i == t {
            return self.params.alpha.ln();
        }

        let distance = (self.timestamps[i] - self.timestamps[t]).abs();
        let weight = self.params.decay.weight(distance);
        if weight <= 0.0 {
            // Window kernel past its width: probability exactly zero, and
            // no reason to touch the mixture model.
            return f64::NEG_INFINITY;
        }

        let prior = weight.ln();
        if self.mixture.cluster_id(i) == self.mixture.cluster_id(t) {
            prior
        } else {
            prior + self.log_likelihood_ratio(i, t)
        }
    }

    /// `L(k ∪ l) - L(k) - L(l)` for the tables of `i` and `t`, served
    /// through the member-set cache.
    fn log_likelihood_ratio(&mut self, i: usize, t: usize) -> f64 {
        let table_k = self.graph.component_of(i);
        let table_l = self.graph.component_of(t);
        let table_kl: BTreeSet<usize> = table_k.union(&table_l).copied().collect();

        let mixture = &self.mixture;
        let cache = &mut self.cache;
        let l_k = cache.get_or_insert_with(&table_k, || mixture.marginal_log_likelihood(&table_k));
        let l_l = cache.get_or_insert_with(&table_l, || mixture.marginal_log_likelihood(&table_l));
        let l_kl =
            cache.get_or_insert_with(&table_kl, || mixture.marginal_log_likelihood(&table_kl));

        l_kl - l_k - l_l
    }

    /// Apply the link `i -> target`, merging two tables when it bridges
    /// them. The table with the numerically larger cluster id is absorbed
    /// into the smaller one and its id is returned to the pool.
    pub fn add_assignment(&mut self, i: usize, target: usize) -> Result<()> {
        self.check_customer(i)?;
        self.check_customer(target)?;

        let z_i = self.mixture.cluster_id(i);
        let z_t = self.mixture.cluster_id(target);
        if z_i != z_t {
            let (surviving, absorbed) = if z_i < z_t { (z_i, z_t) } else { (z_t, z_i) };
            self.pool.release(absorbed);
            self.cluster_count -= 1;
            self.mixture.merge(surviving, absorbed);
            debug!(surviving, absorbed, "tables merged");
        }

        self.graph.add_link(i, target);
        Ok(())
    }

    /// Lift customer `i`'s link. When that link was the sole return path
    /// to its table's cycle, the table splits: the component still
    /// reachable from `i` moves to a fresh cluster id.
    ///
    /// Split detection reads pre-removal state, so it runs before the
    /// graph mutation.
    pub fn remove_assignment(&mut self, i: usize) -> Result<()> {
        self.check_customer(i)?;

        let is_split = self.graph.splits_component(i);
        self.graph.remove_link(i);

        if is_split {
            let new_id = self.pool.acquire();
            let old_id = self.mixture.cluster_id(i);
            let moved = self.graph.component_of(i);
            debug!(
                old = old_id,
                new = new_id,
                moved = moved.len(),
                "table split"
            );
            self.mixture.split(old_id, new_id, &moved);
            self.cluster_count += 1;
        }

        Ok(())
    }

    fn check_customer(&self, i: usize) -> Result<()> {
        let count = self.customer_count();
        if i >= count {
            return Err(DdcrpError::customer_out_of_range(i, count));
        }
        Ok(())
    }
}

/// Numerically stable `log(Σ exp(v))`: subtract the max before
/// exponentiating. Returns negative infinity for an all-`-inf` input.
fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}
