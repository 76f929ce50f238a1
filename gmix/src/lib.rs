//! gmix - Gaussian mixture light profiles
//!
//! This crate models galaxy and PSF light profiles as weighted sums of
//! elliptical 2-D Gaussians, including:
//!
//! - **Gauss2D / GMix** - Components with cached inverse covariance, and mixtures of them
//! - **Models** - Fixed-table approximations of exponential, de Vaucouleurs and turbulent profiles
//! - **Convolution** - Analytic PSF convolution
//! - **Rendering** - Sub-pixel integrated images through an affine Jacobian
//! - **Likelihood** - Gaussian and Student-t log-likelihoods, weighted residuals
//! - **EM** - Expectation-Maximization fitting of a mixture plus sky to an image
//! - **GMixND / priors** - Scalar densities for priors
//! - **Special functions** - `erf` over scalars and arrays
//!
//! # Example
//!
//! ```text
//! use gmix::{render_jacob, GMix, GMixModel, Jacobian};
//! use ndarray::Array2;
//!
//! // exponential disk, T = 8, flux 100, convolved with a round PSF
//! let obj = GMix::from_pars(GMixModel::Exp, &[0.0, 0.0, 0.2, -0.1, 8.0, 100.0])?;
//! let psf = GMix::from_pars(GMixModel::Gauss, &[0.0, 0.0, 0.0, 0.0, 4.0, 1.0])?;
//! let conv = obj.convolve(&psf)?;
//!
//! let jacob = Jacobian::from_scale(24.0, 24.0, 0.263)?;
//! let mut image = Array2::<f64>::zeros((49, 49));
//! render_jacob(&conv, image.view_mut(), 4, &jacob)?;
//! ```

pub mod config;
pub mod convolve;
pub mod em;
pub mod error;
pub mod gauss2d;
pub mod gmixnd;
pub mod jacobian;
pub mod loglike;
pub mod mixture;
pub mod models;
pub mod priors;
pub mod render;
pub mod shape;
pub mod special;

// Re-export commonly used types
pub use config::EmConfig;
pub use convolve::convolve_fill;
pub use em::{EmFitter, EmResult};
pub use error::{ErrorKind, GMixError, Result};
pub use gauss2d::Gauss2D;
pub use gmixnd::GMixND;
pub use jacobian::Jacobian;
pub use loglike::{
    fill_fdiff, fill_fdiff_sub, get_loglike, get_loglike_robust, student_t_logfactor, LogLike,
    S2nSums,
};
pub use mixture::GMix;
pub use models::{convert_simple_double_logpars, family_component_count, GMixModel};
pub use priors::{Normal, Normal2D, ZDisk2D};
pub use render::{render, render_jacob};
pub use shape::g1g2_to_e1e2;
pub use special::{erf, erf_array};
