//! Sampler parameters.

use serde::{Deserialize, Serialize};

use crate::decay::DecayFunction;
use crate::error::{DdcrpError, Result};

/// Parameters for the ddCRP Gibbs sampler.
///
/// Values are NOT automatically clamped - call [`validate`](Self::validate)
/// before handing the params to the sampler.
///
/// # Example
///
/// ```
/// use ddcrp_core::config::DdcrpParams;
/// use ddcrp_core::decay::DecayFunction;
///
/// let params = DdcrpParams::default()
///     .with_alpha(0.5)
///     .with_decay(DecayFunction::Window { width: 30.0 });
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdcrpParams {
    /// Concentration hyperparameter: prior weight of a customer linking to
    /// itself (opening its own table). Must be strictly positive so the
    /// self-assignment log-weight is always finite.
    pub alpha: f64,

    /// Soft cap on the number of clusters. Ingestion re-links customers
    /// arriving past this count onto a random predecessor instead of
    /// seating them alone; the id pool may still grow past it on splits.
    pub max_clusters: usize,

    /// Number of full Gibbs sweeps performed by [`fit`].
    ///
    /// [`fit`]: crate::sampler::DdcrpClustering::fit
    pub n_iterations: usize,

    /// Temporal decay kernel for the link prior.
    pub decay: DecayFunction,
}

impl Default for DdcrpParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_clusters: 100,
            n_iterations: 3,
            decay: DecayFunction::default(),
        }
    }
}

impl DdcrpParams {
    /// Set the concentration hyperparameter.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the soft cluster cap.
    #[must_use]
    pub fn with_max_clusters(mut self, max_clusters: usize) -> Self {
        self.max_clusters = max_clusters;
        self
    }

    /// Set the number of Gibbs sweeps per `fit` call.
    #[must_use]
    pub fn with_n_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Set the decay kernel.
    #[must_use]
    pub fn with_decay(mut self, decay: DecayFunction) -> Self {
        self.decay = decay;
        self
    }

    /// Validate parameters.
    ///
    /// # Errors
    ///
    /// Returns `DdcrpError::InvalidParameter` if:
    /// - `alpha` is not finite or not strictly positive
    /// - `max_clusters` is 0
    /// - `n_iterations` is 0
    /// - the decay kernel fails its own validation
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(DdcrpError::invalid_parameter(format!(
                "alpha must be finite and > 0, got {}. The self-assignment \
                 weight log(alpha) anchors every sampling distribution.",
                self.alpha
            )));
        }

        if self.max_clusters == 0 {
            return Err(DdcrpError::invalid_parameter(
                "max_clusters must be >= 1; every customer arena needs at least one table",
            ));
        }

        if self.n_iterations == 0 {
            return Err(DdcrpError::invalid_parameter(
                "n_iterations must be >= 1; a fit with zero sweeps never moves a link",
            ));
        }

        self.decay.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = DdcrpParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.alpha, 1.0);
        assert_eq!(params.max_clusters, 100);
    }

    #[test]
    fn test_builders() {
        let params = DdcrpParams::default()
            .with_alpha(0.01)
            .with_max_clusters(8)
            .with_n_iterations(10)
            .with_decay(DecayFunction::Logistic { midpoint: 14.0 });

        assert_eq!(params.alpha, 0.01);
        assert_eq!(params.max_clusters, 8);
        assert_eq!(params.n_iterations, 10);
        assert_eq!(params.decay, DecayFunction::Logistic { midpoint: 14.0 });
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(DdcrpParams::default().with_alpha(0.0).validate().is_err());
        assert!(DdcrpParams::default().with_alpha(-1.0).validate().is_err());
        assert!(DdcrpParams::default()
            .with_alpha(f64::NAN)
            .validate()
            .is_err());
        assert!(DdcrpParams::default()
            .with_max_clusters(0)
            .validate()
            .is_err());
        assert!(DdcrpParams::default()
            .with_n_iterations(0)
            .validate()
            .is_err());
        assert!(DdcrpParams::default()
            .with_decay(DecayFunction::Exponential { rate: -2.0 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let params = DdcrpParams::default().with_decay(DecayFunction::Window { width: 3.0 });
        let json = serde_json::to_string(&params).expect("serialize");
        let back: DdcrpParams = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(params, back);
    }
}
