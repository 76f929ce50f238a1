//! Single elliptical 2-D Gaussian.
//!
//! A component is described by its weight `p`, center `(row, col)` and the
//! symmetric covariance `(irr, irc, icc)`. Everything else (determinant,
//! inverse covariance, normalization) is derived and recomputed by
//! [`Gauss2D::set`], which is the only way to mutate a component.

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::{GAUSS2D_MIN_DET, GMIX_MAX_CHI2};
use crate::error::{GMixError, Result};

/// Caller-supplied fields of a [`Gauss2D`], used for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gauss2DPars {
    pub p: f64,
    pub row: f64,
    pub col: f64,
    pub irr: f64,
    pub irc: f64,
    pub icc: f64,
}

/// Elliptical Gaussian with cached inverse covariance and normalization.
///
/// The default value is all zeros: it is placeholder storage that evaluates
/// to zero everywhere, not a valid component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Gauss2DPars", into = "Gauss2DPars")]
pub struct Gauss2D {
    p: f64,
    row: f64,
    col: f64,
    irr: f64,
    irc: f64,
    icc: f64,

    det: f64,
    drr: f64,
    drc: f64,
    dcc: f64,
    norm: f64,
    pnorm: f64,
}

impl Gauss2D {
    /// Create a validated component.
    pub fn new(p: f64, row: f64, col: f64, irr: f64, irc: f64, icc: f64) -> Result<Self> {
        let mut gauss = Self::default();
        gauss.set(p, row, col, irr, irc, icc)?;
        Ok(gauss)
    }

    /// Overwrite all fields.
    ///
    /// Fails with [`GMixError::DeterminantTooLow`] when `irr*icc - irc²` is
    /// below [`GAUSS2D_MIN_DET`] (or NaN); the component is then untouched.
    pub fn set(&mut self, p: f64, row: f64, col: f64, irr: f64, irc: f64, icc: f64) -> Result<()> {
        let det = irr * icc - irc * irc;
        if !(det >= GAUSS2D_MIN_DET) {
            return Err(GMixError::DeterminantTooLow { det });
        }

        let idet = 1.0 / det;
        let norm = 1.0 / (2.0 * PI * det.sqrt());

        *self = Self {
            p,
            row,
            col,
            irr,
            irc,
            icc,
            det,
            drr: irr * idet,
            drc: irc * idet,
            dcc: icc * idet,
            norm,
            pnorm: p * norm,
        };
        Ok(())
    }

    /// Mahalanobis distance squared of `(u, v)` from the center.
    #[inline]
    pub fn chi2(&self, u: f64, v: f64) -> f64 {
        let udiff = u - self.row;
        let vdiff = v - self.col;
        self.dcc * udiff * udiff + self.drr * vdiff * vdiff - 2.0 * self.drc * udiff * vdiff
    }

    /// Weighted density at `(u, v)`.
    ///
    /// Returns exactly zero once chi² reaches [`GMIX_MAX_CHI2`], and for
    /// negative chi² produced by round-off.
    #[inline]
    pub fn eval(&self, u: f64, v: f64) -> f64 {
        let chi2 = self.chi2(u, v);
        if (0.0..GMIX_MAX_CHI2).contains(&chi2) {
            self.pnorm * (-0.5 * chi2).exp()
        } else {
            0.0
        }
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn row(&self) -> f64 {
        self.row
    }

    pub fn col(&self) -> f64 {
        self.col
    }

    pub fn irr(&self) -> f64 {
        self.irr
    }

    pub fn irc(&self) -> f64 {
        self.irc
    }

    pub fn icc(&self) -> f64 {
        self.icc
    }

    pub fn det(&self) -> f64 {
        self.det
    }

    pub fn drr(&self) -> f64 {
        self.drr
    }

    pub fn drc(&self) -> f64 {
        self.drc
    }

    pub fn dcc(&self) -> f64 {
        self.dcc
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn pnorm(&self) -> f64 {
        self.pnorm
    }

    /// Size measure `irr + icc`.
    pub fn t(&self) -> f64 {
        self.irr + self.icc
    }

    /// Covariance as a 2x2 matrix in (row, col) order.
    pub fn covariance(&self) -> Matrix2<f64> {
        Matrix2::new(self.irr, self.irc, self.irc, self.icc)
    }

    pub fn pars(&self) -> Gauss2DPars {
        Gauss2DPars {
            p: self.p,
            row: self.row,
            col: self.col,
            irr: self.irr,
            irc: self.irc,
            icc: self.icc,
        }
    }
}

impl TryFrom<Gauss2DPars> for Gauss2D {
    type Error = GMixError;

    fn try_from(pars: Gauss2DPars) -> Result<Self> {
        Self::new(pars.p, pars.row, pars.col, pars.irr, pars.irc, pars.icc)
    }
}

impl From<Gauss2D> for Gauss2DPars {
    fn from(gauss: Gauss2D) -> Self {
        gauss.pars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_set_derived_fields() {
        let gauss = Gauss2D::new(200.0, 15.2, 14.75, 1.8, 0.25, 1.9).unwrap();

        let det = 1.8 * 1.9 - 0.25 * 0.25;
        assert_relative_eq!(gauss.det(), det, epsilon = 1e-14);
        assert_relative_eq!(gauss.drr(), 1.8 / det, epsilon = 1e-14);
        assert_relative_eq!(gauss.drc(), 0.25 / det, epsilon = 1e-14);
        assert_relative_eq!(gauss.dcc(), 1.9 / det, epsilon = 1e-14);
        assert_relative_eq!(gauss.norm(), 1.0 / (2.0 * PI * det.sqrt()), epsilon = 1e-14);
        assert_relative_eq!(gauss.pnorm(), 200.0 * gauss.norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_eval_at_center_is_pnorm() {
        let gauss = Gauss2D::new(1.0, 25.0, 26.0, 4.0, 1.6, 3.7).unwrap();
        assert_eq!(gauss.eval(25.0, 26.0), gauss.pnorm());
    }

    #[test]
    fn test_eval_matches_inverse_covariance() {
        let gauss = Gauss2D::new(3.0, 1.0, -2.0, 4.0, 1.6, 3.7).unwrap();
        let inv = gauss.covariance().try_inverse().unwrap();
        let d = nalgebra::Vector2::new(0.7, -1.1);
        let chi2 = (d.transpose() * inv * d)[(0, 0)];

        assert_relative_eq!(gauss.chi2(1.7, -3.1), chi2, epsilon = 1e-12);
        assert_relative_eq!(
            gauss.eval(1.7, -3.1),
            gauss.pnorm() * (-0.5 * chi2).exp(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_eval_clamped_far_away() {
        let gauss = Gauss2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 1.0).unwrap();
        // chi2 = 25 exactly is outside the accepted range
        assert_eq!(gauss.eval(5.0, 0.0), 0.0);
        assert_eq!(gauss.eval(100.0, 100.0), 0.0);
        assert!(gauss.eval(4.9, 0.0) > 0.0);
    }

    #[test]
    fn test_bad_det_leaves_component_unchanged() {
        let mut gauss = Gauss2D::new(1.0, 2.0, 3.0, 2.0, 0.0, 2.0).unwrap();
        let before = gauss;

        let err = gauss.set(5.0, 0.0, 0.0, 1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, GMixError::DeterminantTooLow { det } if det == 0.0));
        assert!(err.is_range());
        assert_eq!(gauss, before);
    }

    #[test]
    fn test_nan_covariance_rejected() {
        let result = Gauss2D::new(1.0, 0.0, 0.0, f64::NAN, 0.0, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_validates() {
        let gauss = Gauss2D::new(1.0, 2.0, 3.0, 2.0, 0.5, 2.0).unwrap();
        let json = serde_json::to_string(&gauss).unwrap();
        let back: Gauss2D = serde_json::from_str(&json).unwrap();
        assert_eq!(gauss, back);

        let bad = r#"{"p":1.0,"row":0.0,"col":0.0,"irr":1.0,"irc":2.0,"icc":1.0}"#;
        assert!(serde_json::from_str::<Gauss2D>(bad).is_err());
    }
}
