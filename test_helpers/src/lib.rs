//! Test helpers for gmix
//!
//! Seeded noise fields, synthetic image construction and a scratch output
//! directory shared by the tests and tools in this workspace.

use ndarray::{Array2, ArrayViewMut2};
use once_cell::sync::Lazy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::env;
use std::path::{Path, PathBuf};

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),

    #[error("Invalid noise sigma: {0}")]
    InvalidSigma(f64),
}

/// Returns the path to the workspace root.
///
/// Walks up from the current directory until a `Cargo.toml` declaring
/// `[workspace]` is found.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {}", e))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {}", e))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Directory for test artifacts (rendered images, fitted mixtures), created
/// on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Path of `path` inside [`get_output_dir`].
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

/// Zero-mean Gaussian noise field, reproducible for a given seed.
pub fn gaussian_noise(
    shape: (usize, usize),
    sigma: f64,
    seed: u64,
) -> Result<Array2<f64>, TestHelperError> {
    let normal = Normal::new(0.0, sigma).map_err(|_| TestHelperError::InvalidSigma(sigma))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok(Array2::from_shape_fn(shape, |_| normal.sample(&mut rng)))
}

/// Configuration for synthetic image generation
#[derive(Debug, Clone)]
pub struct SyntheticImageConfig {
    /// (rows, cols)
    pub shape: (usize, usize),
    /// Constant level added to every pixel
    pub sky: f64,
    /// Per-pixel Gaussian noise; zero for a noiseless image
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SyntheticImageConfig {
    fn default() -> Self {
        Self {
            shape: (41, 41),
            sky: 0.0,
            noise_sigma: 0.0,
            seed: 42,
        }
    }
}

/// A synthetic image and its inverse-variance weight map.
#[derive(Debug, Clone)]
pub struct SyntheticImage {
    pub image: Array2<f64>,
    pub weight: Array2<f64>,
}

/// Build an image from `config`, letting `draw` add the object light.
///
/// `draw` receives a zeroed image; the sky and noise are added afterwards.
/// The weight map is `1/sigma²`, or all ones for a noiseless image.
pub fn synthetic_image<F>(
    config: &SyntheticImageConfig,
    draw: F,
) -> Result<SyntheticImage, TestHelperError>
where
    F: FnOnce(ArrayViewMut2<f64>),
{
    let mut image = Array2::<f64>::zeros(config.shape);
    draw(image.view_mut());
    image += config.sky;

    let ivar = if config.noise_sigma > 0.0 {
        image += &gaussian_noise(config.shape, config.noise_sigma, config.seed)?;
        1.0 / (config.noise_sigma * config.noise_sigma)
    } else {
        1.0
    };

    Ok(SyntheticImage {
        image,
        weight: Array2::from_elem(config.shape, ivar),
    })
}
