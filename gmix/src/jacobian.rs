//! Affine map between pixel coordinates and the sky plane.
//!
//! ```text
//! u = dudrow * (row - row0) + dudcol * (col - col0)
//! v = dvdrow * (row - row0) + dvdcol * (col - col0)
//! ```
//!
//! Mixtures evaluated through a jacobian have their centers and covariances
//! expressed in `(u, v)`. `sdet` is the square root of the absolute
//! determinant, the linear scale converting pixel areas to sky areas.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GMixError, Result};

/// Caller-supplied fields of a [`Jacobian`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JacobianPars {
    pub row0: f64,
    pub col0: f64,
    pub dudrow: f64,
    pub dudcol: f64,
    pub dvdrow: f64,
    pub dvdcol: f64,
}

/// Pixel to sky-plane transform. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JacobianPars", into = "JacobianPars")]
pub struct Jacobian {
    row0: f64,
    col0: f64,
    dudrow: f64,
    dudcol: f64,
    dvdrow: f64,
    dvdcol: f64,
    det: f64,
    sdet: f64,
}

impl Jacobian {
    /// Create a transform, rejecting singular maps.
    pub fn new(
        row0: f64,
        col0: f64,
        dudrow: f64,
        dudcol: f64,
        dvdrow: f64,
        dvdcol: f64,
    ) -> Result<Self> {
        let det = (dudrow * dvdcol - dudcol * dvdrow).abs();
        if !(det > 0.0) || !det.is_finite() {
            return Err(GMixError::SingularJacobian { det });
        }

        Ok(Self {
            row0,
            col0,
            dudrow,
            dudcol,
            dvdrow,
            dvdcol,
            det,
            sdet: det.sqrt(),
        })
    }

    /// Unit map centered on pixel `(0, 0)`: `u = row`, `v = col`.
    pub fn identity() -> Self {
        Self {
            row0: 0.0,
            col0: 0.0,
            dudrow: 1.0,
            dudcol: 0.0,
            dvdrow: 0.0,
            dvdcol: 1.0,
            det: 1.0,
            sdet: 1.0,
        }
    }

    /// Diagonal map with `scale` sky units per pixel, centered on `(row0, col0)`.
    pub fn from_scale(row0: f64, col0: f64, scale: f64) -> Result<Self> {
        Self::new(row0, col0, scale, 0.0, 0.0, scale)
    }

    #[inline]
    pub fn get_u(&self, row: f64, col: f64) -> f64 {
        self.dudrow * (row - self.row0) + self.dudcol * (col - self.col0)
    }

    #[inline]
    pub fn get_v(&self, row: f64, col: f64) -> f64 {
        self.dvdrow * (row - self.row0) + self.dvdcol * (col - self.col0)
    }

    /// Sky coordinates of pixel position `(row, col)`.
    #[inline]
    pub fn get_uv(&self, row: f64, col: f64) -> (f64, f64) {
        (self.get_u(row, col), self.get_v(row, col))
    }

    /// Pixel position of sky coordinates `(u, v)`.
    pub fn get_rowcol(&self, u: f64, v: f64) -> (f64, f64) {
        // non-singular by construction, so the inverse always exists
        let inverse = self.matrix().try_inverse().unwrap_or_else(Matrix2::zeros);
        let offset = inverse * Vector2::new(u, v);
        (self.row0 + offset.x, self.col0 + offset.y)
    }

    /// The linear part as `[[dudrow, dudcol], [dvdrow, dvdcol]]`.
    pub fn matrix(&self) -> Matrix2<f64> {
        Matrix2::new(self.dudrow, self.dudcol, self.dvdrow, self.dvdcol)
    }

    pub fn row0(&self) -> f64 {
        self.row0
    }

    pub fn col0(&self) -> f64 {
        self.col0
    }

    pub fn dudrow(&self) -> f64 {
        self.dudrow
    }

    pub fn dudcol(&self) -> f64 {
        self.dudcol
    }

    pub fn dvdrow(&self) -> f64 {
        self.dvdrow
    }

    pub fn dvdcol(&self) -> f64 {
        self.dvdcol
    }

    pub fn det(&self) -> f64 {
        self.det
    }

    pub fn sdet(&self) -> f64 {
        self.sdet
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> std::result::Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl Default for Jacobian {
    fn default() -> Self {
        Self::identity()
    }
}

impl TryFrom<JacobianPars> for Jacobian {
    type Error = GMixError;

    fn try_from(pars: JacobianPars) -> Result<Self> {
        Self::new(
            pars.row0,
            pars.col0,
            pars.dudrow,
            pars.dudcol,
            pars.dvdrow,
            pars.dvdcol,
        )
    }
}

impl From<Jacobian> for JacobianPars {
    fn from(jacob: Jacobian) -> Self {
        Self {
            row0: jacob.row0,
            col0: jacob.col0,
            dudrow: jacob.dudrow,
            dudcol: jacob.dudcol,
            dvdrow: jacob.dvdrow,
            dvdcol: jacob.dvdcol,
        }
    }
}
