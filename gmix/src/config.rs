//! Numeric thresholds and fit configuration.
//!
//! The thresholds here are fixed constants that downstream fit convergence is
//! sensitive to; change them only with care.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest covariance determinant accepted by [`crate::Gauss2D::set`].
pub const GAUSS2D_MIN_DET: f64 = 1.0e-200;

/// Components contribute exactly zero beyond this chi².
pub const GMIX_MAX_CHI2: f64 = 25.0;

/// Ellipticity substituted when `tanh` rounds up to 1.
pub const E_ROUNDOFF_MAX: f64 = 0.99999999;

/// Initial "previous T" so the first EM iteration can never converge.
pub const EM_T_SENTINEL: f64 = -9999.0;

/// Maximum dimension supported by [`crate::GMixND`].
pub const GMIXND_MAX_DIM: usize = 10;

/// Stopping criteria for the EM solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmConfig {
    /// Fractional change in total second moment T that counts as converged
    pub tol: f64,
    /// Hard cap on the number of iterations
    pub maxiter: usize,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            tol: 1.0e-6,
            maxiter: 5000,
        }
    }
}

impl EmConfig {
    pub fn new(tol: f64, maxiter: usize) -> Self {
        Self { tol, maxiter }
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = EmConfig::default();
        assert_eq!(config.tol, 1.0e-6);
        assert_eq!(config.maxiter, 5000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EmConfig = serde_json::from_str(r#"{"maxiter": 200}"#).unwrap();
        assert_eq!(config.maxiter, 200);
        assert_eq!(config.tol, 1.0e-6);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join("gmix_em_config_test.json");
        let config = EmConfig::new(1e-8, 123);
        config.save_to_file(&path).unwrap();
        let loaded = EmConfig::load_from_file(&path).unwrap();
        assert_eq!(config, loaded);
        let _ = std::fs::remove_file(&path);
    }
}
