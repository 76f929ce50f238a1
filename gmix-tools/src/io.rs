//! Writing rendered images and fitted mixtures to disk.

use anyhow::{Context, Result};
use image::{ImageBuffer, Luma};
use ndarray::Array2;
use serde::Serialize;
use std::path::Path;

/// Scale a float image linearly onto the full u16 range.
///
/// The minimum maps to 0 and the maximum to 65535. A constant image maps to 0.
pub fn scale_to_u16(image: &Array2<f64>) -> Array2<u16> {
    let (min, max) = image
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));

    let range = max - min;
    if !(range > 0.0) {
        return Array2::zeros(image.dim());
    }
    image.mapv(|x| ((x - min) / range * u16::MAX as f64).round() as u16)
}

/// Save a float image as a 16-bit grayscale PNG, rescaled with [`scale_to_u16`].
pub fn save_gray16_png<P: AsRef<Path>>(image: &Array2<f64>, path: P) -> Result<()> {
    let path = path.as_ref();
    let scaled = scale_to_u16(image);
    let (height, width) = scaled.dim();

    let mut img_buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::new(width as u32, height as u32);
    for (x, y, pixel) in img_buffer.enumerate_pixels_mut() {
        *pixel = Luma([scaled[[y as usize, x as usize]]]);
    }

    img_buffer
        .save(path)
        .with_context(|| format!("Failed to write image: {}", path.display()))?;
    Ok(())
}

/// Save any serializable value as pretty JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gmix::{GMix, GMixModel};
    use ndarray::arr2;

    #[test]
    fn test_scale_to_u16() {
        let image = arr2(&[[1.0, 2.0], [3.0, 5.0]]);
        let scaled = scale_to_u16(&image);
        assert_eq!(scaled[[0, 0]], 0);
        assert_eq!(scaled[[1, 1]], u16::MAX);
        assert_eq!(scaled[[0, 1]], 16384);
    }

    #[test]
    fn test_constant_image() {
        let image = Array2::from_elem((3, 3), 7.0);
        assert!(scale_to_u16(&image).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_save_png_and_json() {
        let image = arr2(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        let png = test_helpers::output_path("gmix_tools_io_test.png");
        save_gray16_png(&image, &png).unwrap();

        let loaded = image::open(&png).unwrap().into_luma16();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(2, 1)[0], u16::MAX);

        let gmix = GMix::from_pars(GMixModel::Turb, &[0.0, 0.0, 0.1, 0.0, 2.0, 1.0]).unwrap();
        let json = test_helpers::output_path("gmix_tools_io_test.json");
        save_json(&gmix, &json).unwrap();
        let restored: GMix = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(restored.len(), gmix.len());
        for (r, g) in restored.iter().zip(&gmix) {
            assert_relative_eq!(r.p(), g.p(), max_relative = 1e-14);
            assert_relative_eq!(r.irr(), g.irr(), max_relative = 1e-14);
            assert_relative_eq!(r.icc(), g.icc(), max_relative = 1e-14);
        }
    }
}
