//! # ddcrp-core
//!
//! Incremental clustering by the distance-dependent Chinese Restaurant
//! Process (ddCRP).
//!
//! Every observation ("customer") links to exactly one observation,
//! possibly itself; connected components of the symmetrized link graph are
//! the clusters ("tables"). Gibbs sampling re-draws one link at a time,
//! with a decay-weighted temporal prior and a marginal-likelihood ratio
//! scoring prospective table merges.
//!
//! # Architecture
//!
//! This crate owns the combinatorial core:
//! - the link graph: a functional assignment array plus its undirected
//!   view, with near-constant-time merge/split detection ([`graph`]);
//! - cluster membership coordination: pairing every link mutation with the
//!   matching mixture merge or split, and recycling cluster ids through a
//!   free-list pool ([`sampler`], [`pool`]);
//! - the Gibbs step itself, with log-sum-exp normalization and a
//!   member-set-keyed likelihood memo ([`sampler`], [`cache`]).
//!
//! The density model stays external behind the [`mixture::MixtureModel`]
//! trait: it owns the per-customer cluster labels and sufficient
//! statistics, and answers marginal log-likelihood queries for exact
//! member sets. [`stubs::PartitionStub`] is a deterministic in-crate
//! implementation for tests and examples.
//!
//! # Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`config`] | [`DdcrpParams`] | Validated sampler parameters |
//! | [`decay`] | [`DecayFunction`] | Exponential / window / logistic priors |
//! | [`graph`] | [`LinkGraph`] | Assignment array + undirected adjacency |
//! | [`pool`] | [`ClusterIdPool`] | Reusable cluster-id free list |
//! | [`cache`] | [`LikelihoodCache`] | Member-set-keyed likelihood memo |
//! | [`mixture`] | [`MixtureModel`] | External density-model seam |
//! | [`sampler`] | [`DdcrpClustering`] | Coordinator + Gibbs step |

#![deny(missing_docs)]

pub mod cache;
pub mod config;
pub mod decay;
pub mod error;
pub mod graph;
pub mod mixture;
pub mod pool;
pub mod sampler;
pub mod stubs;

// Re-exports for convenience
pub use cache::LikelihoodCache;
pub use config::DdcrpParams;
pub use decay::DecayFunction;
pub use error::{DdcrpError, Result};
pub use graph::LinkGraph;
pub use mixture::MixtureModel;
pub use pool::ClusterIdPool;
pub use sampler::{AssignmentRecord, DdcrpClustering};
