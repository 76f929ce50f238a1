//! Per-pixel comparison of a mixture with image data.
//!
//! All evaluators walk the grid in row-major order, mapping pixels through
//! the jacobian, and skip pixels with inverse variance `<= 0`. Image, weight
//! and jacobian must describe the same grid; that is checked by the caller.
//!
//! Besides the fit statistic each evaluator accumulates the matched-filter
//! signal-to-noise sums `s2n_numer = Σ data*model*ivar` and
//! `s2n_denom = Σ model²*ivar`.

use ndarray::ArrayView2;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

use crate::error::{GMixError, Result};
use crate::jacobian::Jacobian;
use crate::mixture::GMix;
use crate::render::SubPixel;

/// Matched-filter signal-to-noise accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct S2nSums {
    pub s2n_numer: f64,
    pub s2n_denom: f64,
}

impl S2nSums {
    #[inline]
    fn add(&mut self, data: f64, model: f64, ivar: f64) {
        self.s2n_numer += data * model * ivar;
        self.s2n_denom += model * model * ivar;
    }

    /// Matched-filter S/N, `numer / sqrt(denom)`, or zero for an empty model.
    pub fn s2n(&self) -> f64 {
        if self.s2n_denom > 0.0 {
            self.s2n_numer / self.s2n_denom.sqrt()
        } else {
            0.0
        }
    }
}

/// Log-likelihood together with the S/N sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogLike {
    pub loglike: f64,
    pub s2n_numer: f64,
    pub s2n_denom: f64,
}

impl LogLike {
    fn from_parts(loglike: f64, sums: S2nSums) -> Self {
        Self {
            loglike,
            s2n_numer: sums.s2n_numer,
            s2n_denom: sums.s2n_denom,
        }
    }
}

/// Visit every unmasked pixel with `(data, ivar, model)`.
#[inline]
fn for_each_valid_pixel<F>(
    gmix: &GMix,
    image: &ArrayView2<f64>,
    weight: &ArrayView2<f64>,
    jacob: &Jacobian,
    mut f: F,
) where
    F: FnMut(f64, f64, f64),
{
    debug_assert_eq!(image.dim(), weight.dim(), "image and weight must share a grid");
    let (n_row, n_col) = image.dim();

    for row in 0..n_row {
        let (mut u, mut v) = jacob.get_uv(row as f64, 0.0);
        for col in 0..n_col {
            let ivar = weight[[row, col]];
            if ivar > 0.0 {
                let data = image[[row, col]];
                f(data, ivar, gmix.eval(u, v));
            }
            u += jacob.dudcol();
            v += jacob.dvdcol();
        }
    }
}

/// Gaussian log-likelihood `-0.5 Σ (model - data)² ivar`.
pub fn get_loglike(
    gmix: &GMix,
    image: &ArrayView2<f64>,
    weight: &ArrayView2<f64>,
    jacob: &Jacobian,
) -> LogLike {
    let mut loglike = 0.0;
    let mut sums = S2nSums::default();

    for_each_valid_pixel(gmix, image, weight, jacob, |data, ivar, model| {
        let diff = model - data;
        loglike += diff * diff * ivar;
        sums.add(data, model, ivar);
    });

    LogLike::from_parts(-0.5 * loglike, sums)
}

/// Student-t log-likelihood with `nu` degrees of freedom.
///
/// `logfactor` must be [`student_t_logfactor`]`(nu)` for a normalized density;
/// it is not checked here.
pub fn get_loglike_robust(
    gmix: &GMix,
    image: &ArrayView2<f64>,
    weight: &ArrayView2<f64>,
    jacob: &Jacobian,
    nu: f64,
    logfactor: f64,
) -> LogLike {
    let nupow = -0.5 * (nu + 1.0);
    let mut loglike = 0.0;
    let mut sums = S2nSums::default();

    for_each_valid_pixel(gmix, image, weight, jacob, |data, ivar, model| {
        let diff = model - data;
        loglike += logfactor + nupow * (1.0 + diff * diff * ivar / nu).ln();
        sums.add(data, model, ivar);
    });

    LogLike::from_parts(loglike, sums)
}

/// `ln(Γ((nu+1)/2) / (Γ(nu/2) √(π nu)))`, the Student-t normalization.
pub fn student_t_logfactor(nu: f64) -> f64 {
    ln_gamma((nu + 1.0) / 2.0) - ln_gamma(nu / 2.0) - 0.5 * (PI * nu).ln()
}

fn check_fdiff_len(fdiff: &[f64], start: usize, image: &ArrayView2<f64>) -> Result<()> {
    let needed = start + image.len();
    if fdiff.len() < needed {
        return Err(GMixError::BufferTooSmall {
            len: fdiff.len(),
            needed,
        });
    }
    Ok(())
}

/// Write `(model - data) * sqrt(ivar)` for every pixel into
/// `fdiff[start..start + npix]`, zero for masked pixels.
///
/// `start` leaves room for prior terms at the front of a least-squares
/// residual vector.
pub fn fill_fdiff(
    gmix: &GMix,
    image: &ArrayView2<f64>,
    weight: &ArrayView2<f64>,
    jacob: &Jacobian,
    fdiff: &mut [f64],
    start: usize,
) -> Result<S2nSums> {
    check_fdiff_len(fdiff, start, image)?;
    debug_assert_eq!(image.dim(), weight.dim(), "image and weight must share a grid");

    let (n_row, n_col) = image.dim();
    let mut sums = S2nSums::default();
    let mut out = fdiff[start..].iter_mut();

    for row in 0..n_row {
        let (mut u, mut v) = jacob.get_uv(row as f64, 0.0);
        for col in 0..n_col {
            let ivar = weight[[row, col]];
            let value = if ivar > 0.0 {
                let data = image[[row, col]];
                let model = gmix.eval(u, v);
                sums.add(data, model, ivar);
                (model - data) * ivar.sqrt()
            } else {
                0.0
            };
            if let Some(slot) = out.next() {
                *slot = value;
            }

            u += jacob.dudcol();
            v += jacob.dvdcol();
        }
    }

    Ok(sums)
}

/// Like [`fill_fdiff`], with the model averaged over `nsub x nsub`
/// sub-pixels as in [`crate::render::render_jacob`].
pub fn fill_fdiff_sub(
    gmix: &GMix,
    image: &ArrayView2<f64>,
    weight: &ArrayView2<f64>,
    jacob: &Jacobian,
    fdiff: &mut [f64],
    start: usize,
    nsub: usize,
) -> Result<S2nSums> {
    let sub = SubPixel::new(nsub)?;
    check_fdiff_len(fdiff, start, image)?;
    debug_assert_eq!(image.dim(), weight.dim(), "image and weight must share a grid");

    let mut sums = S2nSums::default();
    let out = &mut fdiff[start..];

    for (i, ((row, col), &ivar)) in weight.indexed_iter().enumerate() {
        out[i] = if ivar > 0.0 {
            let data = image[[row, col]];
            let model = sub.integrate(gmix, jacob, row as f64, col as f64);
            sums.add(data, model, ivar);
            (model - data) * ivar.sqrt()
        } else {
            0.0
        };
    }

    Ok(sums)
}
