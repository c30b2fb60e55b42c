// In: src/transform.rs

//! The generalized Anscombe transform engine: a pure, stateless,
//! variance-stabilizing mapping for Poisson-limited count data.
//!
//! Photon counts carry Poisson noise (variance equals mean), which compresses
//! poorly and violates the constant-variance assumption of most downstream
//! algorithms. The forward transform maps counts to an approximately
//! unit-variance Gaussian domain; the algebraic inverse recovers the original
//! scale exactly (up to float rounding).
//!
//! The codec applies [`forward`] at encode time and never applies [`inverse`]
//! automatically: consumers that need photon-count scale call it themselves,
//! because many processing steps are meant to run in the stabilized domain.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::types::CountArray;

/// Parameters of the generalized Anscombe transform.
///
/// Together these fully determine the forward/inverse mapping. The current
/// codec version always writes the defaults (pure Poisson noise), but decode
/// reads them back from storage, so future per-array values remain readable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AnscombeParams {
    /// Detector gain (photons per digital unit). Must be > 0.
    #[serde(default = "default_gain")]
    pub gain: f64,
    /// Constant detector offset in digital units.
    #[serde(default)]
    pub offset: f64,
    /// Variance of the additive Gaussian read-noise component. Must be >= 0.
    #[serde(default)]
    pub variance: f64,
}

impl Default for AnscombeParams {
    fn default() -> Self {
        Self {
            gain: default_gain(),
            offset: 0.0,
            variance: 0.0,
        }
    }
}

fn default_gain() -> f64 {
    1.0
}

/// Applies the forward generalized Anscombe transform elementwise, producing
/// a `float64` array of the same shape.
///
/// `y = (2/gain) * sqrt(gain*x + (3/8)*gain^2 + variance - gain*offset)`
///
/// The term under the root is clamped at zero so the mapping stays defined for
/// boundary parameter combinations; the validator guarantees `x >= 0` for the
/// data itself.
pub fn forward(value: &CountArray, params: &AnscombeParams) -> ArrayD<f64> {
    let g = params.gain;
    let constant = 0.375 * g * g + params.variance - g * params.offset;
    value
        .to_f64()
        .mapv_into(|x| 2.0 / g * (g * x + constant).max(0.0).sqrt())
}

/// Applies the algebraic inverse of [`forward`] elementwise.
///
/// `x = ((gain*y/2)^2 - (3/8)*gain^2 - variance + gain*offset) / gain`
pub fn inverse(value: &ArrayD<f64>, params: &AnscombeParams) -> ArrayD<f64> {
    let g = params.gain;
    let constant = 0.375 * g * g + params.variance - g * params.offset;
    value.mapv(|y| {
        let half = g * y / 2.0;
        (half * half - constant) / g
    })
}
