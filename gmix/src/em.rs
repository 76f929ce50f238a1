//! Expectation-Maximization fitting of a mixture to image pixels.
//!
//! The image is treated as a normalized density over the sky plane: each
//! pixel value is divided by `counts`, and the mixture weights are fractions
//! of `counts`. A uniform sky term competes with the components for every
//! pixel and is re-estimated each iteration.
//!
//! The mixture is a density per unit sky area while `counts` sums pixels, so
//! `p * counts * sdet^2` is the component flux in the units of the rendered
//! model.
//!
//! Each iteration:
//! 1. E-step: per pixel, component responsibilities `gi = pnorm exp(-chi2/2)`
//!    (zero beyond [`GMIX_MAX_CHI2`]) and the sky term give `gtot`.
//! 2. Posterior-weighted zeroth, first and second moments are accumulated
//!    per component in [`EmSums`].
//! 3. M-step: every component is reset from its sums through the validating
//!    [`crate::Gauss2D::set`].
//! 4. The sky term is updated and convergence is judged on the fractional
//!    change of the mixture size `T`.
//!
//! The mixture is updated in place. On error it holds the components set so
//! far; there is no rollback.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::config::{EmConfig, EM_T_SENTINEL, GMIX_MAX_CHI2};
use crate::error::{GMixError, Result};
use crate::jacobian::Jacobian;
use crate::mixture::GMix;

/// Per-component sufficient statistics, cleared every iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmSums {
    // current pixel
    pub gi: f64,
    pub trowsum: f64,
    pub tcolsum: f64,
    pub tu2sum: f64,
    pub tuvsum: f64,
    pub tv2sum: f64,

    // accumulated over the image
    pub pnew: f64,
    pub rowsum: f64,
    pub colsum: f64,
    pub u2sum: f64,
    pub uvsum: f64,
    pub v2sum: f64,
}

/// Outcome of an EM run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmResult {
    /// Iterations completed before convergence, or `maxiter` if exhausted
    pub numiter: usize,
    /// Last fractional change in T
    pub frac_diff: f64,
    /// Final sky estimate per pixel, in the units of the `sky` argument.
    /// Equal to the input sky when no iteration ran.
    pub sky: f64,
    pub converged: bool,
}

/// EM solver with fixed stopping criteria.
#[derive(Debug, Clone, Default)]
pub struct EmFitter {
    config: EmConfig,
}

impl EmFitter {
    pub fn new(config: EmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmConfig {
        &self.config
    }

    /// Run EM on `gmix`, which holds the initial guess.
    ///
    /// # Arguments
    /// * `gmix` - Guess with weights as fractions of `counts`; holds the result
    /// * `image` - Pixel data, including sky
    /// * `jacob` - Pixel to sky-plane transform for `image`
    /// * `sky` - Initial per-pixel sky level
    /// * `counts` - Total counts used to normalize the image
    ///
    /// # Errors
    /// * [`GMixError::InvalidCounts`] for non-positive or non-finite `counts`
    /// * [`GMixError::ZeroResponsibility`] when no component nor the sky
    ///   explains a pixel
    /// * Any range error from resetting a component in the M-step
    pub fn run(
        &self,
        gmix: &mut GMix,
        image: &ArrayView2<f64>,
        jacob: &Jacobian,
        sky: f64,
        counts: f64,
    ) -> Result<EmResult> {
        if !(counts > 0.0) || !counts.is_finite() {
            return Err(GMixError::InvalidCounts(counts));
        }

        let npix = image.len() as f64;
        let scale = jacob.sdet();
        let area = npix * scale * scale;
        let mut nsky = sky / counts;
        let mut sky_fit = sky;

        let mut sums = vec![EmSums::default(); gmix.len()];
        let mut t_last = EM_T_SENTINEL;
        let mut frac_diff = f64::INFINITY;
        let mut numiter = 0;
        let mut converged = false;

        while numiter < self.config.maxiter {
            sums.fill(EmSums::default());
            let skysum = accumulate_sums(gmix, image, jacob, nsky, counts, &mut sums)?;

            set_gmix_from_sums(gmix, &sums)?;
            nsky = skysum / area;
            // nsky is per unit sky area, skysum is per image
            sky_fit = skysum * counts / npix;

            let t = gmix.get_t()?;
            frac_diff = ((t - t_last) / t).abs();
            log::debug!(
                "em iter {}: T={:.6e}, frac_diff={:.3e}, nsky={:.3e}",
                numiter,
                t,
                frac_diff,
                nsky
            );

            if frac_diff < self.config.tol {
                converged = true;
                break;
            }

            t_last = t;
            numiter += 1;
        }

        if !converged {
            log::warn!(
                "em did not converge in {} iterations, frac_diff={:.3e}",
                self.config.maxiter,
                frac_diff
            );
        }

        Ok(EmResult {
            numiter,
            frac_diff,
            sky: sky_fit,
            converged,
        })
    }
}

/// E-step over the whole image. Returns the summed sky responsibility.
fn accumulate_sums(
    gmix: &GMix,
    image: &ArrayView2<f64>,
    jacob: &Jacobian,
    nsky: f64,
    counts: f64,
    sums: &mut [EmSums],
) -> Result<f64> {
    let (n_row, n_col) = image.dim();
    let mut skysum = 0.0;

    for row in 0..n_row {
        let (mut u, mut v) = jacob.get_uv(row as f64, 0.0);

        for col in 0..n_col {
            let imnorm = image[[row, col]] / counts;
            let mut gtot = 0.0;

            for (sum, gauss) in sums.iter_mut().zip(gmix) {
                let udiff = u - gauss.row();
                let vdiff = v - gauss.col();

                let u2 = udiff * udiff;
                let v2 = vdiff * vdiff;
                let uv = udiff * vdiff;

                let chi2 = gauss.dcc() * u2 + gauss.drr() * v2 - 2.0 * gauss.drc() * uv;

                sum.gi = if (0.0..GMIX_MAX_CHI2).contains(&chi2) {
                    gauss.pnorm() * (-0.5 * chi2).exp()
                } else {
                    0.0
                };
                gtot += sum.gi;

                sum.trowsum = u * sum.gi;
                sum.tcolsum = v * sum.gi;
                sum.tu2sum = u2 * sum.gi;
                sum.tuvsum = uv * sum.gi;
                sum.tv2sum = v2 * sum.gi;
            }

            gtot += nsky;
            if gtot == 0.0 {
                return Err(GMixError::ZeroResponsibility { row, col });
            }

            let igrat = imnorm / gtot;
            for sum in sums.iter_mut() {
                // responsibility-weighted normalized flux
                sum.pnew += sum.gi * igrat;

                sum.rowsum += sum.trowsum * igrat;
                sum.colsum += sum.tcolsum * igrat;
                sum.u2sum += sum.tu2sum * igrat;
                sum.uvsum += sum.tuvsum * igrat;
                sum.v2sum += sum.tv2sum * igrat;
            }
            skysum += nsky * igrat;

            u += jacob.dudcol();
            v += jacob.dvdcol();
        }
    }

    Ok(skysum)
}

/// M-step: reset each component from its accumulated moments.
fn set_gmix_from_sums(gmix: &mut GMix, sums: &[EmSums]) -> Result<()> {
    for (gauss, sum) in gmix.as_mut_slice().iter_mut().zip(sums) {
        let p = sum.pnew;
        let pinv = 1.0 / p;

        gauss.set(
            p,
            sum.rowsum * pinv,
            sum.colsum * pinv,
            sum.u2sum * pinv,
            sum.uvsum * pinv,
            sum.v2sum * pinv,
        )?;
    }
    Ok(())
}
