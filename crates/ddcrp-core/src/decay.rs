//! Decay kernels for the ddCRP temporal prior.
//!
//! The prior probability of linking two customers decays with the time
//! distance between them. A kernel maps a non-negative distance to a weight
//! in `(0, 1]` and must be monotonically non-increasing.
//!
//! # Shapes
//!
//! ```text
//! exponential:  f(d) = exp(-d / rate)
//! window:       f(d) = 1 if d < width else 0
//! logistic:     f(d) = exp(-d + midpoint) / (1 + exp(-d + midpoint))
//! ```
//!
//! The window kernel is the one exception to the `(0, 1]` range: it returns
//! an exact zero past its width. Callers take the logarithm of the weight,
//! so a zero weight becomes `f64::NEG_INFINITY` and the candidate drops out
//! of the assignment distribution with probability exactly 0.

use serde::{Deserialize, Serialize};

use crate::error::{DdcrpError, Result};

/// Temporal decay kernel, selected and parameterized at configuration time.
///
/// # Example
///
/// ```
/// use ddcrp_core::decay::DecayFunction;
///
/// let f = DecayFunction::Exponential { rate: 1.0 };
/// assert!((f.weight(0.0) - 1.0).abs() < 1e-12);
/// assert!(f.weight(2.0) < f.weight(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayFunction {
    /// `exp(-d / rate)`, `rate > 0`. Larger rates decay more slowly.
    Exponential {
        /// Decay constant.
        rate: f64,
    },
    /// `1` within `width`, `0` at or past it. Only kernel that returns zero.
    Window {
        /// Maximum distance considered.
        width: f64,
    },
    /// Smooth approximation of the window kernel with sigmoid midpoint
    /// `midpoint`.
    Logistic {
        /// Distance at which the weight crosses 1/2.
        midpoint: f64,
    },
}

impl Default for DecayFunction {
    fn default() -> Self {
        Self::Exponential { rate: 1.0 }
    }
}

impl DecayFunction {
    /// Evaluate the kernel at a non-negative distance.
    ///
    /// Monotonically non-increasing in `distance` for every shape.
    pub fn weight(&self, distance: f64) -> f64 {
        match *self {
            Self::Exponential { rate } => (-distance / rate).exp(),
            Self::Window { width } => {
                if distance < width {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Logistic { midpoint } => {
                // Equivalent to exp(-d + m) / (1 + exp(-d + m)), but the
                // exponential only appears on the decaying side, where it
                // saturates to 0 instead of overflowing to infinity.
                1.0 / (1.0 + (distance - midpoint).exp())
            }
        }
    }

    /// Validate kernel parameters.
    ///
    /// # Errors
    ///
    /// Returns `DdcrpError::InvalidParameter` if:
    /// - the parameter is NaN or infinite
    /// - `rate` or `width` is not strictly positive
    pub fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            Self::Exponential { rate } => ("rate", rate),
            Self::Window { width } => ("width", width),
            Self::Logistic { midpoint } => ("midpoint", midpoint),
        };

        if !value.is_finite() {
            return Err(DdcrpError::invalid_parameter(format!(
                "decay {name} must be finite, got {value}"
            )));
        }

        // The logistic midpoint may sit anywhere, including 0 or below.
        if !matches!(self, Self::Logistic { .. }) && value <= 0.0 {
            return Err(DdcrpError::invalid_parameter(format!(
                "decay {name} must be > 0, got {value}"
            )));
        }

        Ok(())
    }
}
