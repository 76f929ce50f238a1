//! Error types for mixture construction, evaluation and fitting.
//!
//! Failures fall into two classes. Range errors are data dependent and
//! recoverable: a fit driver typically rejects the trial parameters and moves
//! on. Fatal errors are contract violations by the caller (wrong sizes,
//! unknown model names) and indicate a bug upstream.

use thiserror::Error;

/// Classification of a [`GMixError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Data-dependent failure, e.g. a degenerate covariance.
    Range,
    /// Caller contract violation, e.g. a malformed parameter count.
    Fatal,
}

/// Errors produced by the gmix library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GMixError {
    #[error("gauss2d det too low: {det:e}")]
    DeterminantTooLow { det: f64 },

    #[error("g out of bounds: {g}")]
    ShearOutOfBounds { g: f64 },

    #[error("total mixture weight is zero")]
    ZeroWeight,

    /// Every component and the sky term vanish at a pixel during EM.
    #[error("em gtot = 0 at pixel ({row}, {col})")]
    ZeroResponsibility { row: usize, col: usize },

    #[error("position out of bounds: r={r} >= radius {radius}")]
    OutOfDisk { r: f64, radius: f64 },

    #[error("unknown gmix model: {0:?}")]
    UnknownModel(String),

    #[error("model {model} expects {expected} pars, got {got}")]
    WrongParCount {
        model: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("full pars should be multiple of 6, got {0}")]
    FullParsNotMultipleOf6(usize),

    #[error("target gmix is wrong size {got}, expected {expected}")]
    WrongGaussCount { expected: usize, got: usize },

    #[error("output buffer holds {len} values, need {needed}")]
    BufferTooSmall { len: usize, needed: usize },

    #[error("oversampling factor must be >= 1, got {0}")]
    InvalidOversample(usize),

    #[error("counts must be positive and finite, got {0}")]
    InvalidCounts(f64),

    #[error("singular jacobian: determinant={det:.6e}")]
    SingularJacobian { det: f64 },

    #[error("covariance {0} is singular or not positive definite")]
    SingularCovariance(usize),

    #[error("dim must be <= {max}, got {got}")]
    DimensionTooLarge { max: usize, got: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

impl GMixError {
    /// Whether this error is a recoverable range error or a fatal one.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GMixError::DeterminantTooLow { .. }
            | GMixError::ShearOutOfBounds { .. }
            | GMixError::ZeroWeight
            | GMixError::ZeroResponsibility { .. }
            | GMixError::OutOfDisk { .. }
            | GMixError::SingularCovariance(_) => ErrorKind::Range,
            _ => ErrorKind::Fatal,
        }
    }

    pub fn is_range(&self) -> bool {
        self.kind() == ErrorKind::Range
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

pub type Result<T> = std::result::Result<T, GMixError>;
