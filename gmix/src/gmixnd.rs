//! Full-covariance Gaussian mixtures in up to [`GMIXND_MAX_DIM`] dimensions.
//!
//! Used as a scalar probability density, typically for priors fit to samples.
//! Evaluation works in log space and sums components with log-sum-exp so that
//! points far from every component still give a finite `ln p`.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};
use std::f64::consts::PI;

use crate::config::GMIXND_MAX_DIM;
use crate::error::{GMixError, Result};

/// Mixture of `n_gauss` Gaussians in `n_dim` dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct GMixND {
    /// `ln(w_i / sqrt((2π)^n_dim |Σ_i|))`, shape `(n_gauss,)`
    log_pnorms: Array1<f64>,
    /// shape `(n_gauss, n_dim)`
    means: Array2<f64>,
    /// Inverse covariances, shape `(n_gauss, n_dim, n_dim)`
    icovars: Array3<f64>,
}

impl GMixND {
    /// Create from precomputed log normalizations and inverse covariances.
    ///
    /// # Errors
    /// [`GMixError::ShapeMismatch`] when the array shapes disagree or there
    /// are no components, [`GMixError::DimensionTooLarge`] beyond
    /// [`GMIXND_MAX_DIM`].
    pub fn new(log_pnorms: Array1<f64>, means: Array2<f64>, icovars: Array3<f64>) -> Result<Self> {
        let (n_gauss, n_dim) = means.dim();
        check_dims(n_gauss, n_dim)?;

        if log_pnorms.len() != n_gauss {
            return Err(GMixError::ShapeMismatch(format!(
                "n_gauss is {} but got {} log_pnorms",
                n_gauss,
                log_pnorms.len()
            )));
        }
        if icovars.dim() != (n_gauss, n_dim, n_dim) {
            return Err(GMixError::ShapeMismatch(format!(
                "icovars shape {:?}, expected {:?}",
                icovars.dim(),
                (n_gauss, n_dim, n_dim)
            )));
        }

        Ok(Self {
            log_pnorms,
            means,
            icovars,
        })
    }

    /// Create from component weights and covariance matrices.
    ///
    /// Weights need not sum to one. Each covariance must be symmetric
    /// positive definite.
    pub fn from_covars(weights: Array1<f64>, means: Array2<f64>, covars: Array3<f64>) -> Result<Self> {
        let (n_gauss, n_dim) = means.dim();
        check_dims(n_gauss, n_dim)?;

        if weights.len() != n_gauss {
            return Err(GMixError::ShapeMismatch(format!(
                "n_gauss is {} but got {} weights",
                n_gauss,
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|&&w| !(w > 0.0)) {
            return Err(GMixError::ShapeMismatch(format!(
                "weights must be positive, got {}",
                w
            )));
        }
        if covars.dim() != (n_gauss, n_dim, n_dim) {
            return Err(GMixError::ShapeMismatch(format!(
                "covars shape {:?}, expected {:?}",
                covars.dim(),
                (n_gauss, n_dim, n_dim)
            )));
        }

        let log_2pi_term = 0.5 * n_dim as f64 * (2.0 * PI).ln();
        let mut log_pnorms = Array1::zeros(n_gauss);
        let mut icovars = Array3::zeros((n_gauss, n_dim, n_dim));

        for i in 0..n_gauss {
            let cov = DMatrix::from_fn(n_dim, n_dim, |r, c| covars[[i, r, c]]);
            let chol = cov.cholesky().ok_or(GMixError::SingularCovariance(i))?;

            // ln|Σ| = 2 Σ ln L_kk
            let log_det: f64 = 2.0 * chol.l_dirty().diagonal().iter().map(|d| d.ln()).sum::<f64>();
            if !log_det.is_finite() {
                return Err(GMixError::SingularCovariance(i));
            }

            let icov = chol.inverse();
            for r in 0..n_dim {
                for c in 0..n_dim {
                    icovars[[i, r, c]] = icov[(r, c)];
                }
            }
            log_pnorms[i] = weights[i].ln() - 0.5 * log_det - log_2pi_term;
        }

        Self::new(log_pnorms, means, icovars)
    }

    pub fn n_gauss(&self) -> usize {
        self.means.nrows()
    }

    pub fn n_dim(&self) -> usize {
        self.means.ncols()
    }

    pub fn log_pnorms(&self) -> &Array1<f64> {
        &self.log_pnorms
    }

    pub fn means(&self) -> &Array2<f64> {
        &self.means
    }

    pub fn icovars(&self) -> &Array3<f64> {
        &self.icovars
    }

    /// Natural log of the mixture density at `x`.
    pub fn get_lnprob(&self, x: &[f64]) -> Result<f64> {
        self.check_point(x.len())?;
        Ok(self.lnprob_unchecked(x))
    }

    /// Mixture density at `x`.
    pub fn get_prob(&self, x: &[f64]) -> Result<f64> {
        self.check_point(x.len())?;
        let (sum, lnpmax) = self.sum_exp(x);
        Ok(sum * lnpmax.exp())
    }

    /// `ln p` for each row of `xs`, shape `(n_points, n_dim)`.
    pub fn get_lnprob_many(&self, xs: &ArrayView2<f64>) -> Result<Array1<f64>> {
        self.check_point(xs.ncols())?;

        let mut point = [0.0; GMIXND_MAX_DIM];
        let n_dim = self.n_dim();
        Ok(xs
            .rows()
            .into_iter()
            .map(|row| {
                copy_point(&row, &mut point[..n_dim]);
                self.lnprob_unchecked(&point[..n_dim])
            })
            .collect())
    }

    fn check_point(&self, len: usize) -> Result<()> {
        if len != self.n_dim() {
            return Err(GMixError::ShapeMismatch(format!(
                "n_dim is {} but n_pars is {}",
                self.n_dim(),
                len
            )));
        }
        Ok(())
    }

    fn lnprob_unchecked(&self, x: &[f64]) -> f64 {
        let (sum, lnpmax) = self.sum_exp(x);
        sum.ln() + lnpmax
    }

    /// Returns `(Σ exp(lnp_i - lnpmax), lnpmax)` in one pass, rescaling the
    /// running sum whenever a larger `lnp_i` shows up.
    fn sum_exp(&self, x: &[f64]) -> (f64, f64) {
        let mut lnpmax = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for i in 0..self.n_gauss() {
            let lnp = self.component_lnprob(i, x);
            if lnp == f64::NEG_INFINITY {
                continue;
            }
            if lnp > lnpmax {
                sum = sum * (lnpmax - lnp).exp() + 1.0;
                lnpmax = lnp;
            } else {
                sum += (lnp - lnpmax).exp();
            }
        }

        if lnpmax == f64::NEG_INFINITY {
            return (0.0, 0.0);
        }
        (sum, lnpmax)
    }

    fn component_lnprob(&self, i: usize, x: &[f64]) -> f64 {
        let n_dim = self.n_dim();
        let mut xdiff = [0.0; GMIXND_MAX_DIM];
        for (d, diff) in xdiff[..n_dim].iter_mut().enumerate() {
            *diff = x[d] - self.means[[i, d]];
        }

        let mut chi2 = 0.0;
        for d1 in 0..n_dim {
            for d2 in 0..n_dim {
                chi2 += xdiff[d1] * xdiff[d2] * self.icovars[[i, d1, d2]];
            }
        }
        -0.5 * chi2 + self.log_pnorms[i]
    }
}

fn check_dims(n_gauss: usize, n_dim: usize) -> Result<()> {
    if n_dim > GMIXND_MAX_DIM {
        return Err(GMixError::DimensionTooLarge {
            max: GMIXND_MAX_DIM,
            got: n_dim,
        });
    }
    if n_gauss == 0 || n_dim == 0 {
        return Err(GMixError::ShapeMismatch(format!(
            "need at least one component and dimension, got means shape ({}, {})",
            n_gauss, n_dim
        )));
    }
    Ok(())
}

fn copy_point(row: &ArrayView1<f64>, out: &mut [f64]) {
    for (o, v) in out.iter_mut().zip(row.iter()) {
        *o = *v;
    }
}
