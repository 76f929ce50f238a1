//! Shape parameterizations.

use crate::config::E_ROUNDOFF_MAX;
use crate::error::{GMixError, Result};

/// Convert reduced shear `(g1, g2)` to standard ellipticity `(e1, e2)`.
///
/// `|g|` maps to `|e| = tanh(2 atanh |g|)` with the direction preserved.
/// Shears with `|g| >= 1` have no ellipticity and are rejected.
pub fn g1g2_to_e1e2(g1: f64, g2: f64) -> Result<(f64, f64)> {
    let g = (g1 * g1 + g2 * g2).sqrt();

    if !(g < 1.0) {
        return Err(GMixError::ShearOutOfBounds { g });
    }
    if g == 0.0 {
        return Ok((0.0, 0.0));
    }

    let eta = 2.0 * g.atanh();
    let mut e = eta.tanh();
    if e >= 1.0 {
        // round off
        e = E_ROUNDOFF_MAX;
    }

    let fac = e / g;
    Ok((fac * g1, fac * g2))
}
