// In: src/validate.rs

//! Fail-fast input validation, run before any transform or storage work.
//!
//! The forward Anscombe transform is undefined for negative inputs, so the
//! validator must reject them before the transform engine is ever invoked.
//! Container and element-type preconditions are discharged statically by
//! [`CountArray`]: a non-array or object-dtype input is unrepresentable.

use crate::error::PhotonError;
use crate::types::CountArray;

/// Checks that `value` is valid photon-count data.
///
/// Checks run in order, each with a distinct failure reason:
/// 1. rank >= 3, interpreted as time x height x width [x extra axes]
/// 2. every element >= 0 (photon counts cannot be negative)
///
/// No side effects; succeeds by returning `Ok(())`.
pub fn validate(value: &CountArray) -> Result<(), PhotonError> {
    if value.ndim() < 3 {
        return Err(PhotonError::RankTooLow(value.ndim()));
    }
    if value.has_negative() {
        return Err(PhotonError::NegativeValues);
    }
    Ok(())
}
