//! Rasterize a mixture onto a pixel grid.
//!
//! Each pixel receives the mean of the mixture density over an
//! `nsub x nsub` grid of sub-samples placed symmetrically about the pixel
//! center. Values are added to the existing image contents, so clear the
//! image first for a fresh render.

use ndarray::ArrayViewMut2;
use std::time::Instant;

use crate::error::{GMixError, Result};
use crate::jacobian::Jacobian;
use crate::mixture::GMix;

/// Sub-pixel sampling geometry for an oversampling factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SubPixel {
    pub nsub: usize,
    /// Distance between sub-samples in pixels
    pub stepsize: f64,
    /// Distance from the pixel center to the first sub-sample
    pub offset: f64,
    /// Weight of each sub-sample in the pixel average
    pub areafac: f64,
}

impl SubPixel {
    pub fn new(nsub: usize) -> Result<Self> {
        if nsub == 0 {
            return Err(GMixError::InvalidOversample(nsub));
        }
        let stepsize = 1.0 / nsub as f64;
        Ok(Self {
            nsub,
            stepsize,
            offset: (nsub - 1) as f64 * stepsize / 2.0,
            areafac: 1.0 / (nsub * nsub) as f64,
        })
    }

    /// Mean density over pixel `(row, col)`, sampled through `jacob`.
    #[inline]
    pub fn integrate(&self, gmix: &GMix, jacob: &Jacobian, row: f64, col: f64) -> f64 {
        let ustep = self.stepsize * jacob.dudcol();
        let vstep = self.stepsize * jacob.dvdcol();
        let lowcol = col - self.offset;

        let mut tval = 0.0;
        let mut trow = row - self.offset;
        for _ in 0..self.nsub {
            let (mut u, mut v) = jacob.get_uv(trow, lowcol);
            for _ in 0..self.nsub {
                tval += gmix.eval(u, v);
                u += ustep;
                v += vstep;
            }
            trow += self.stepsize;
        }
        tval * self.areafac
    }
}

/// Add the mixture to `image`, treating mixture coordinates as pixel
/// coordinates.
pub fn render(gmix: &GMix, mut image: ArrayViewMut2<f64>, nsub: usize) -> Result<()> {
    let sub = SubPixel::new(nsub)?;
    let start = Instant::now();

    for ((row, col), pixel) in image.indexed_iter_mut() {
        let mut tval = 0.0;
        let mut trow = row as f64 - sub.offset;
        for _ in 0..sub.nsub {
            let mut tcol = col as f64 - sub.offset;
            for _ in 0..sub.nsub {
                tval += gmix.eval(trow, tcol);
                tcol += sub.stepsize;
            }
            trow += sub.stepsize;
        }
        *pixel += tval * sub.areafac;
    }

    log::debug!(
        "render: n_gauss={}, shape={:?}, nsub={}, duration={:.3}ms",
        gmix.len(),
        image.dim(),
        nsub,
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Add the mixture to `image`, mapping every sub-sample through `jacob`.
pub fn render_jacob(
    gmix: &GMix,
    mut image: ArrayViewMut2<f64>,
    nsub: usize,
    jacob: &Jacobian,
) -> Result<()> {
    let sub = SubPixel::new(nsub)?;
    let start = Instant::now();

    for ((row, col), pixel) in image.indexed_iter_mut() {
        *pixel += sub.integrate(gmix, jacob, row as f64, col as f64);
    }

    log::debug!(
        "render_jacob: n_gauss={}, shape={:?}, nsub={}, duration={:.3}ms",
        gmix.len(),
        image.dim(),
        nsub,
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauss2d::Gauss2D;
    use crate::models::GMixModel;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_subpixel_geometry() {
        let sub = SubPixel::new(4).unwrap();
        assert_eq!(sub.stepsize, 0.25);
        assert_eq!(sub.offset, 0.375);
        assert_eq!(sub.areafac, 1.0 / 16.0);

        let sub = SubPixel::new(1).unwrap();
        assert_eq!(sub.offset, 0.0);
        assert_eq!(sub.areafac, 1.0);

        assert_eq!(SubPixel::new(0).unwrap_err(), GMixError::InvalidOversample(0));
    }

    #[test]
    fn test_nsub1_is_point_evaluation() {
        let gmix = GMix::from_pars(GMixModel::Exp, &[7.3, 8.1, 0.1, -0.2, 6.0, 100.0]).unwrap();
        let mut image = Array2::<f64>::zeros((16, 17));
        render(&gmix, image.view_mut(), 1).unwrap();

        for ((row, col), &value) in image.indexed_iter() {
            assert_eq!(value, gmix.eval(row as f64, col as f64));
        }
    }

    #[test]
    fn test_render_accumulates() {
        let gmix = GMix::from_pars(GMixModel::Gauss, &[5.0, 5.0, 0.0, 0.0, 4.0, 1.0]).unwrap();
        let mut image = Array2::<f64>::from_elem((11, 11), 2.0);
        render(&gmix, image.view_mut(), 2).unwrap();

        let mut fresh = Array2::<f64>::zeros((11, 11));
        render(&gmix, fresh.view_mut(), 2).unwrap();

        for (a, b) in image.iter().zip(fresh.iter()) {
            assert_relative_eq!(*a, b + 2.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_identity_jacobian_matches_plain_render() {
        let gmix = GMix::from_pars(GMixModel::Dev, &[12.2, 11.7, 0.3, 0.1, 10.0, 5.0]).unwrap();
        let mut plain = Array2::<f64>::zeros((24, 24));
        let mut jac = Array2::<f64>::zeros((24, 24));

        render(&gmix, plain.view_mut(), 3).unwrap();
        render_jacob(&gmix, jac.view_mut(), 3, &Jacobian::identity()).unwrap();

        for (a, b) in plain.iter().zip(jac.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_oversampled_flux_converges() {
        // a small object where point sampling misestimates the flux
        let gmix = GMix::from_gaussians(vec![
            Gauss2D::new(1.0, 10.3, 9.6, 0.3, 0.05, 0.25).unwrap(),
        ]);

        let flux = |nsub: usize| {
            let mut image = Array2::<f64>::zeros((21, 21));
            render(&gmix, image.view_mut(), nsub).unwrap();
            image.sum()
        };

        let err1 = (flux(1) - 1.0).abs();
        let err8 = (flux(8) - 1.0).abs();
        assert!(err8 < err1);
        assert!(err8 < 1e-3);
    }

    #[test]
    fn test_jacobian_scale_conserves_flux() {
        // 0.5 sky units per pixel: pixel area is 0.25 sky units
        let scale = 0.5;
        let jacob = Jacobian::from_scale(15.0, 15.0, scale).unwrap();
        let gmix = GMix::from_pars(GMixModel::Gauss, &[0.0, 0.0, 0.1, 0.0, 2.0, 1.0]).unwrap();

        let mut image = Array2::<f64>::zeros((31, 31));
        render_jacob(&gmix, image.view_mut(), 4, &jacob).unwrap();

        assert_relative_eq!(image.sum() * scale * scale, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_sheared_jacobian_matches_direct_mapping() {
        let jacob = Jacobian::new(10.2, 11.4, 0.25, 0.02, -0.03, 0.27).unwrap();
        let gmix = GMix::from_pars(GMixModel::Exp, &[0.1, -0.2, 0.2, -0.1, 1.5, 10.0]).unwrap();

        let mut image = Array2::<f64>::zeros((21, 23));
        render_jacob(&gmix, image.view_mut(), 1, &jacob).unwrap();

        for ((row, col), &value) in image.indexed_iter() {
            let (u, v) = jacob.get_uv(row as f64, col as f64);
            assert_relative_eq!(value, gmix.eval(u, v), epsilon = 1e-12, max_relative = 1e-10);
        }

        // oversampled: mean over the sub-grid, each sample mapped directly
        let nsub = 3;
        let mut image = Array2::<f64>::zeros((21, 23));
        render_jacob(&gmix, image.view_mut(), nsub, &jacob).unwrap();

        for ((row, col), &value) in image.indexed_iter() {
            let mut expected = 0.0;
            for i in 0..nsub {
                for j in 0..nsub {
                    let trow = row as f64 - 1.0 / 3.0 + i as f64 / 3.0;
                    let tcol = col as f64 - 1.0 / 3.0 + j as f64 / 3.0;
                    let (u, v) = jacob.get_uv(trow, tcol);
                    expected += gmix.eval(u, v);
                }
            }
            assert_relative_eq!(value, expected / 9.0, epsilon = 1e-12, max_relative = 1e-9);
        }
    }
}
