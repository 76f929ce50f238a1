//! Profile family catalogue and mixture builders.
//!
//! Each simple family approximates a radial profile by a fixed set of
//! concentric Gaussians. Component `i` carries the fraction `pvals[i]` of the
//! flux and has size `fvals[i]` relative to the requested `T`.
//!
//! | model | components | pars |
//! |-------|-----------:|------|
//! | gauss | 1  | `[row, col, g1, g2, T, flux]` |
//! | exp   | 6  | `[row, col, g1, g2, T, flux]` |
//! | dev   | 10 | `[row, col, g1, g2, T, flux]` |
//! | turb  | 3  | `[row, col, g1, g2, T, flux]` |
//! | bdf   | 16 | `[row, col, g1, g2, T, fracdev, flux]` |
//! | bdc   | 16 | `[row, col, g1b, g2b, g1d, g2d, Tb, Td, Fb, Fd]` |
//! | full  | n  | `6n` values `[p, row, col, irr, irc, icc, ...]` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GMixError, Result};
use crate::gauss2d::Gauss2D;
use crate::mixture::GMix;
use crate::shape::g1g2_to_e1e2;

const PVALS_EXP: [f64; 6] = [
    0.00061601229677880041,
    0.0079461395724623237,
    0.053280454055540001,
    0.21797364640726541,
    0.45496740582554868,
    0.26521634184240478,
];

const FVALS_EXP: [f64; 6] = [
    0.002467115141477932,
    0.018147435573256168,
    0.07944063151366336,
    0.27137669897479122,
    0.79782256866993773,
    2.1623306025075739,
];

const PVALS_DEV: [f64; 10] = [
    6.5288960012625658e-05,
    0.00044199216814302695,
    0.0020859587871659754,
    0.0075913681418996841,
    0.02260266219257237,
    0.056532254390212859,
    0.11939049233042602,
    0.20969545753234975,
    0.29254151133139222,
    0.28905301416582552,
];

const FVALS_DEV: [f64; 10] = [
    3.068330909892871e-07,
    3.551788624668698e-06,
    2.542810833482682e-05,
    0.0001466508940804874,
    0.0007457199853069548,
    0.003544702600428794,
    0.01648881157673708,
    0.07893194619504579,
    0.4203787615506401,
    3.055782252301236,
];

const PVALS_TURB: [f64; 3] = [0.596510042804182, 0.4034898268889178, 1.303069003078001e-07];

const FVALS_TURB: [f64; 3] = [0.5793612389470884, 1.621860687127999, 7.019347162356363];

const PVALS_GAUSS: [f64; 1] = [1.0];
const FVALS_GAUSS: [f64; 1] = [1.0];

/// Parameter count for the single-profile families.
pub const SIMPLE_NPARS: usize = 6;
pub const BDF_NPARS: usize = 7;
pub const BDC_NPARS: usize = 10;

/// Profile family identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GMixModel {
    Gauss,
    Exp,
    Dev,
    Turb,
    /// Bulge and disk with independent shapes, sizes and fluxes
    Bdc,
    /// Bulge and disk sharing shape and size, split by `fracdev`
    Bdf,
    /// Explicit components, six values each
    Full,
}

impl GMixModel {
    pub const ALL: [GMixModel; 7] = [
        GMixModel::Gauss,
        GMixModel::Exp,
        GMixModel::Dev,
        GMixModel::Turb,
        GMixModel::Bdc,
        GMixModel::Bdf,
        GMixModel::Full,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GMixModel::Gauss => "gauss",
            GMixModel::Exp => "exp",
            GMixModel::Dev => "dev",
            GMixModel::Turb => "turb",
            GMixModel::Bdc => "bdc",
            GMixModel::Bdf => "bdf",
            GMixModel::Full => "full",
        }
    }

    /// Fixed component count, `None` for [`GMixModel::Full`].
    pub fn n_gauss(&self) -> Option<usize> {
        match self {
            GMixModel::Gauss => Some(1),
            GMixModel::Exp => Some(6),
            GMixModel::Dev => Some(10),
            GMixModel::Turb => Some(3),
            GMixModel::Bdc | GMixModel::Bdf => Some(16),
            GMixModel::Full => None,
        }
    }

    /// Fixed parameter count, `None` for [`GMixModel::Full`].
    pub fn npars(&self) -> Option<usize> {
        match self {
            GMixModel::Gauss | GMixModel::Exp | GMixModel::Dev | GMixModel::Turb => {
                Some(SIMPLE_NPARS)
            }
            GMixModel::Bdf => Some(BDF_NPARS),
            GMixModel::Bdc => Some(BDC_NPARS),
            GMixModel::Full => None,
        }
    }

    /// `(pvals, fvals)` for the single-profile families.
    fn tables(&self) -> Option<(&'static [f64], &'static [f64])> {
        match self {
            GMixModel::Gauss => Some((&PVALS_GAUSS, &FVALS_GAUSS)),
            GMixModel::Exp => Some((&PVALS_EXP, &FVALS_EXP)),
            GMixModel::Dev => Some((&PVALS_DEV, &FVALS_DEV)),
            GMixModel::Turb => Some((&PVALS_TURB, &FVALS_TURB)),
            _ => None,
        }
    }
}

impl fmt::Display for GMixModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GMixModel {
    type Err = GMixError;

    fn from_str(s: &str) -> Result<Self> {
        GMixModel::ALL
            .iter()
            .copied()
            .find(|model| model.name() == s)
            .ok_or_else(|| GMixError::UnknownModel(s.to_string()))
    }
}

/// Number of components needed to hold `model` given `n_pars` parameters.
pub fn family_component_count(model: GMixModel, n_pars: usize) -> Result<usize> {
    match model.n_gauss() {
        Some(n) => Ok(n),
        None => {
            if n_pars % 6 != 0 {
                return Err(GMixError::FullParsNotMultipleOf6(n_pars));
            }
            Ok(n_pars / 6)
        }
    }
}

/// Convert a log-parameterized simple vector to linear pars.
///
/// Index 4 holds `log10(T)` and index `5 + band` holds `log10(flux)` of the
/// requested band; indices 0-3 are copied unchanged.
pub fn convert_simple_double_logpars(logpars: &[f64], band: usize) -> Result<[f64; 6]> {
    let needed = SIMPLE_NPARS + band;
    if logpars.len() < needed {
        return Err(GMixError::WrongParCount {
            model: "logpars",
            expected: needed,
            got: logpars.len(),
        });
    }

    Ok([
        logpars[0],
        logpars[1],
        logpars[2],
        logpars[3],
        10f64.powf(logpars[4]),
        10f64.powf(logpars[5 + band]),
    ])
}

/// Write one profile of the table family into `out`.
fn fill_profile(
    out: &mut [Gauss2D],
    pvals: &[f64],
    fvals: &[f64],
    (row, col): (f64, f64),
    (e1, e2): (f64, f64),
    t: f64,
    flux: f64,
) -> Result<()> {
    for ((gauss, &pval), &fval) in out.iter_mut().zip(pvals).zip(fvals) {
        let t_i_2 = 0.5 * t * fval;
        gauss.set(
            flux * pval,
            row,
            col,
            t_i_2 * (1.0 - e1),
            t_i_2 * e2,
            t_i_2 * (1.0 + e1),
        )?;
    }
    Ok(())
}

fn check_npars(model: GMixModel, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(GMixError::WrongParCount {
            model: model.name(),
            expected,
            got,
        });
    }
    Ok(())
}

fn fill_full(out: &mut [Gauss2D], pars: &[f64]) -> Result<()> {
    for (gauss, chunk) in out.iter_mut().zip(pars.chunks_exact(6)) {
        gauss.set(chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5])?;
    }
    Ok(())
}

fn fill_simple(
    out: &mut [Gauss2D],
    model: GMixModel,
    pvals: &[f64],
    fvals: &[f64],
    pars: &[f64],
) -> Result<()> {
    check_npars(model, SIMPLE_NPARS, pars.len())?;
    let e = g1g2_to_e1e2(pars[2], pars[3])?;
    fill_profile(out, pvals, fvals, (pars[0], pars[1]), e, pars[4], pars[5])
}

fn fill_bdf(out: &mut [Gauss2D], pars: &[f64]) -> Result<()> {
    check_npars(GMixModel::Bdf, BDF_NPARS, pars.len())?;
    let (cen, t, fracdev, flux) = ((pars[0], pars[1]), pars[4], pars[5], pars[6]);
    let e = g1g2_to_e1e2(pars[2], pars[3])?;

    let (bulge, disk) = out.split_at_mut(PVALS_DEV.len());
    fill_profile(bulge, &PVALS_DEV, &FVALS_DEV, cen, e, t, flux * fracdev)?;
    fill_profile(disk, &PVALS_EXP, &FVALS_EXP, cen, e, t, flux * (1.0 - fracdev))
}

fn fill_bdc(out: &mut [Gauss2D], pars: &[f64]) -> Result<()> {
    check_npars(GMixModel::Bdc, BDC_NPARS, pars.len())?;
    let cen = (pars[0], pars[1]);
    let e_bulge = g1g2_to_e1e2(pars[2], pars[3])?;
    let e_disk = g1g2_to_e1e2(pars[4], pars[5])?;
    let (t_bulge, t_disk, f_bulge, f_disk) = (pars[6], pars[7], pars[8], pars[9]);

    let (bulge, disk) = out.split_at_mut(PVALS_DEV.len());
    fill_profile(bulge, &PVALS_DEV, &FVALS_DEV, cen, e_bulge, t_bulge, f_bulge)?;
    fill_profile(disk, &PVALS_EXP, &FVALS_EXP, cen, e_disk, t_disk, f_disk)
}

impl GMix {
    /// Build a new mixture for `model` from `pars`.
    ///
    /// The mixture is only returned if every component is valid.
    pub fn from_pars(model: GMixModel, pars: &[f64]) -> Result<GMix> {
        let n_gauss = family_component_count(model, pars.len())?;
        let mut gmix = GMix::zeros(n_gauss);
        gmix.fill(model, pars)?;
        Ok(gmix)
    }

    /// Overwrite this mixture in place from `pars`.
    ///
    /// On error the first failing component is reported; earlier components
    /// may already have been overwritten, so the contents must be discarded.
    pub fn fill(&mut self, model: GMixModel, pars: &[f64]) -> Result<()> {
        let expected = family_component_count(model, pars.len())?;
        if expected != self.len() {
            return Err(GMixError::WrongGaussCount {
                expected,
                got: self.len(),
            });
        }

        let out = self.as_mut_slice();
        match model {
            GMixModel::Full => fill_full(out, pars),
            GMixModel::Bdf => fill_bdf(out, pars),
            GMixModel::Bdc => fill_bdc(out, pars),
            simple => {
                let (pvals, fvals) = simple
                    .tables()
                    .ok_or_else(|| GMixError::UnknownModel(simple.name().to_string()))?;
                fill_simple(out, simple, pvals, fvals, pars)
            }
        }
    }
}
