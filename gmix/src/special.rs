//! Error function, scalar and elementwise.

use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use statrs::function::erf as statrs_erf;

use crate::error::{GMixError, Result};

pub fn erf(x: f64) -> f64 {
    statrs_erf::erf(x)
}

/// Fill `out` with `erf` of each element of `x`.
pub fn erf_array(x: &ArrayView1<f64>, mut out: ArrayViewMut1<f64>) -> Result<()> {
    if x.len() != out.len() {
        return Err(GMixError::ShapeMismatch(format!(
            "erf input has {} elements, output {}",
            x.len(),
            out.len()
        )));
    }
    Zip::from(&mut out).and(x).for_each(|o, &v| *o = erf(v));
    Ok(())
}
