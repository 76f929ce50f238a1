//! Simple scalar priors for fit parameters.
//!
//! The normal priors are unnormalized: `ln p` is zero at the center.

use serde::{Deserialize, Serialize};

use crate::error::{GMixError, Result};

/// 1-D normal distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normal {
    pub cen: f64,
    pub sigma: f64,
}

impl Normal {
    pub fn new(cen: f64, sigma: f64) -> Self {
        Self { cen, sigma }
    }

    pub fn get_lnprob(&self, x: f64) -> f64 {
        let diff = (self.cen - x) / self.sigma;
        -0.5 * diff * diff
    }

    pub fn get_prob(&self, x: f64) -> f64 {
        self.get_lnprob(x).exp()
    }
}

/// Separable 2-D normal distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normal2D {
    pub cen1: f64,
    pub cen2: f64,
    pub sigma1: f64,
    pub sigma2: f64,
}

impl Normal2D {
    pub fn new(cen1: f64, cen2: f64, sigma1: f64, sigma2: f64) -> Self {
        Self {
            cen1,
            cen2,
            sigma1,
            sigma2,
        }
    }

    pub fn get_lnprob(&self, x1: f64, x2: f64) -> f64 {
        let (lnp1, lnp2) = self.get_lnprob_sep(x1, x2);
        lnp1 + lnp2
    }

    pub fn get_prob(&self, x1: f64, x2: f64) -> f64 {
        self.get_lnprob(x1, x2).exp()
    }

    /// `ln p` for each dimension separately.
    pub fn get_lnprob_sep(&self, x1: f64, x2: f64) -> (f64, f64) {
        let d1 = (self.cen1 - x1) / self.sigma1;
        let d2 = (self.cen2 - x2) / self.sigma2;
        (-0.5 * d1 * d1, -0.5 * d2 * d2)
    }
}

/// Flat prior on a disk of fixed radius about the origin.
///
/// Positions on or beyond the edge are outside. `ln p` there is undefined and
/// reported as [`GMixError::OutOfDisk`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZDisk2D {
    pub radius: f64,
}

impl ZDisk2D {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn get_lnprob1d(&self, r: f64) -> Result<f64> {
        if r >= self.radius {
            return Err(GMixError::OutOfDisk {
                r,
                radius: self.radius,
            });
        }
        Ok(0.0)
    }

    pub fn get_prob1d(&self, r: f64) -> f64 {
        if r >= self.radius {
            0.0
        } else {
            1.0
        }
    }

    pub fn get_lnprob2d(&self, x: f64, y: f64) -> Result<f64> {
        let r2 = x * x + y * y;
        if r2 >= self.radius * self.radius {
            return Err(GMixError::OutOfDisk {
                r: r2.sqrt(),
                radius: self.radius,
            });
        }
        Ok(0.0)
    }

    pub fn get_prob2d(&self, x: f64, y: f64) -> f64 {
        if x * x + y * y >= self.radius * self.radius {
            0.0
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal() {
        let prior = Normal::new(1.0, 0.5);
        assert_eq!(prior.get_lnprob(1.0), 0.0);
        assert_relative_eq!(prior.get_lnprob(2.0), -2.0, epsilon = 1e-15);
        assert_relative_eq!(prior.get_prob(0.0), (-2.0f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn test_normal2d_separates() {
        let prior = Normal2D::new(0.0, 1.0, 1.0, 2.0);
        let (lnp1, lnp2) = prior.get_lnprob_sep(1.0, 3.0);
        assert_relative_eq!(lnp1, -0.5, epsilon = 1e-15);
        assert_relative_eq!(lnp2, -0.5, epsilon = 1e-15);
        assert_relative_eq!(prior.get_lnprob(1.0, 3.0), -1.0, epsilon = 1e-15);
        assert_relative_eq!(prior.get_prob(1.0, 3.0), (-1.0f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn test_zdisk_inside() {
        let prior = ZDisk2D::new(2.0);
        assert_eq!(prior.get_lnprob1d(1.9).unwrap(), 0.0);
        assert_eq!(prior.get_lnprob2d(1.0, 1.0).unwrap(), 0.0);
        assert_eq!(prior.get_prob1d(0.0), 1.0);
        assert_eq!(prior.get_prob2d(-1.0, 1.5), 1.0);
    }

    #[test]
    fn test_zdisk_edge_is_outside() {
        let prior = ZDisk2D::new(2.0);

        let err = prior.get_lnprob1d(2.0).unwrap_err();
        assert_eq!(err, GMixError::OutOfDisk { r: 2.0, radius: 2.0 });
        assert!(err.is_range());

        let err = prior.get_lnprob2d(3.0, 4.0).unwrap_err();
        assert_eq!(err, GMixError::OutOfDisk { r: 5.0, radius: 2.0 });

        assert_eq!(prior.get_prob1d(2.0), 0.0);
        assert_eq!(prior.get_prob2d(0.0, 2.0), 0.0);
    }
}
