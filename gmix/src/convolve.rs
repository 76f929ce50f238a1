//! Analytic convolution of a mixture with a PSF mixture.
//!
//! Convolving two Gaussians adds their covariances, so an `n`-component
//! object convolved with an `m`-component PSF is an `n*m`-component mixture.
//! The PSF is re-centered on its own weighted centroid and normalized by its
//! total weight, so the object keeps its position and flux.

use crate::error::{GMixError, Result};
use crate::mixture::GMix;

/// Fill `target` with `obj` convolved by `psf`, object-major order.
///
/// `target` must already hold exactly `obj.len() * psf.len()` components. On
/// a range error the target may be partially overwritten.
pub fn convolve_fill(target: &mut GMix, obj: &GMix, psf: &GMix) -> Result<()> {
    let expected = obj.len() * psf.len();
    if target.len() != expected {
        return Err(GMixError::WrongGaussCount {
            expected,
            got: target.len(),
        });
    }

    let (psf_rowcen, psf_colcen, psf_psum) = psf.get_cen()?;
    let psf_ipsum = 1.0 / psf_psum;

    let mut out = target.as_mut_slice().iter_mut();
    for obj_gauss in obj {
        for psf_gauss in psf {
            let p = obj_gauss.p() * psf_gauss.p() * psf_ipsum;

            let row = obj_gauss.row() + (psf_gauss.row() - psf_rowcen);
            let col = obj_gauss.col() + (psf_gauss.col() - psf_colcen);

            let irr = obj_gauss.irr() + psf_gauss.irr();
            let irc = obj_gauss.irc() + psf_gauss.irc();
            let icc = obj_gauss.icc() + psf_gauss.icc();

            if let Some(gauss) = out.next() {
                gauss.set(p, row, col, irr, irc, icc)?;
            }
        }
    }

    Ok(())
}

impl GMix {
    /// New mixture holding this mixture convolved with `psf`.
    pub fn convolve(&self, psf: &GMix) -> Result<GMix> {
        let mut target = GMix::zeros(self.len() * psf.len());
        convolve_fill(&mut target, self, psf)?;
        Ok(target)
    }
}
