//! Ordered collection of Gaussian components.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::error::{GMixError, Result};
use crate::gauss2d::Gauss2D;

/// A Gaussian mixture.
///
/// The number of components is fixed when the mixture is created; builders,
/// convolution and the EM solver overwrite components in place but never
/// resize. Component order carries no meaning beyond pairing index `i` of one
/// mixture with index `i` of another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GMix {
    data: Vec<Gauss2D>,
}

impl GMix {
    /// Placeholder storage for `n` components, to be filled by a builder.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![Gauss2D::default(); n],
        }
    }

    pub fn from_gaussians(data: Vec<Gauss2D>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gauss2D> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[Gauss2D] {
        &self.data
    }

    /// Mutable access to the components. Each component can only be changed
    /// through the validating [`Gauss2D::set`].
    pub fn as_mut_slice(&mut self) -> &mut [Gauss2D] {
        &mut self.data
    }

    /// Sum of component densities at `(u, v)`.
    #[inline]
    pub fn eval(&self, u: f64, v: f64) -> f64 {
        self.data.iter().map(|gauss| gauss.eval(u, v)).sum()
    }

    /// Total weight.
    pub fn get_psum(&self) -> f64 {
        self.data.iter().map(|gauss| gauss.p()).sum()
    }

    /// Weight-averaged size `Σ p_i (irr_i + icc_i) / Σ p_i`.
    pub fn get_t(&self) -> Result<f64> {
        let mut psum = 0.0;
        let mut tsum = 0.0;
        for gauss in &self.data {
            psum += gauss.p();
            tsum += gauss.p() * gauss.t();
        }
        if psum == 0.0 {
            return Err(GMixError::ZeroWeight);
        }
        Ok(tsum / psum)
    }

    /// Weight-averaged center, returned as `(row, col, psum)`.
    pub fn get_cen(&self) -> Result<(f64, f64, f64)> {
        let mut row = 0.0;
        let mut col = 0.0;
        let mut psum = 0.0;
        for gauss in &self.data {
            row += gauss.p() * gauss.row();
            col += gauss.p() * gauss.col();
            psum += gauss.p();
        }
        if psum == 0.0 {
            return Err(GMixError::ZeroWeight);
        }
        Ok((row / psum, col / psum, psum))
    }

    /// Rescale all weights so they sum to `psum`.
    pub fn set_psum(&mut self, psum: f64) -> Result<()> {
        let current = self.get_psum();
        if current == 0.0 {
            return Err(GMixError::ZeroWeight);
        }
        let rat = psum / current;
        for gauss in &mut self.data {
            let g = *gauss;
            gauss.set(g.p() * rat, g.row(), g.col(), g.irr(), g.irc(), g.icc())?;
        }
        Ok(())
    }

    /// Move the weighted center to `(row, col)`, keeping relative offsets.
    pub fn set_cen(&mut self, row: f64, col: f64) -> Result<()> {
        let (row_cur, col_cur, _) = self.get_cen()?;
        let drow = row - row_cur;
        let dcol = col - col_cur;
        for gauss in &mut self.data {
            let g = *gauss;
            gauss.set(g.p(), g.row() + drow, g.col() + dcol, g.irr(), g.irc(), g.icc())?;
        }
        Ok(())
    }
}

impl Index<usize> for GMix {
    type Output = Gauss2D;

    fn index(&self, index: usize) -> &Gauss2D {
        &self.data[index]
    }
}

impl<'a> IntoIterator for &'a GMix {
    type Item = &'a Gauss2D;
    type IntoIter = std::slice::Iter<'a, Gauss2D>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_gauss() -> GMix {
        GMix::from_gaussians(vec![
            Gauss2D::new(0.4, 16.0, 15.0, 8.0, 1.5, 5.0).unwrap(),
            Gauss2D::new(0.6, 8.0, 15.0, 4.0, 2.2, 7.0).unwrap(),
        ])
    }

    #[test]
    fn test_get_t_and_cen() {
        let gmix = two_gauss();

        let t = gmix.get_t().unwrap();
        assert_relative_eq!(t, 0.4 * 13.0 + 0.6 * 11.0, epsilon = 1e-12);

        let (row, col, psum) = gmix.get_cen().unwrap();
        assert_relative_eq!(row, 0.4 * 16.0 + 0.6 * 8.0, epsilon = 1e-12);
        assert_relative_eq!(col, 15.0, epsilon = 1e-12);
        assert_relative_eq!(psum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_weight_is_range_error() {
        let gmix = GMix::from_gaussians(vec![Gauss2D::new(0.0, 1.0, 1.0, 1.0, 0.0, 1.0).unwrap()]);
        assert_eq!(gmix.get_t().unwrap_err(), GMixError::ZeroWeight);
        assert!(gmix.get_cen().unwrap_err().is_range());
    }

    #[test]
    fn test_eval_sums_components() {
        let gmix = two_gauss();
        let expected = gmix[0].eval(12.0, 14.0) + gmix[1].eval(12.0, 14.0);
        assert_relative_eq!(gmix.eval(12.0, 14.0), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_set_psum_and_cen() {
        let mut gmix = two_gauss();
        gmix.set_psum(50.0).unwrap();
        assert_relative_eq!(gmix.get_psum(), 50.0, epsilon = 1e-12);
        assert_relative_eq!(gmix[0].p() / gmix[1].p(), 0.4 / 0.6, epsilon = 1e-12);

        gmix.set_cen(20.0, 21.0).unwrap();
        let (row, col, _) = gmix.get_cen().unwrap();
        assert_relative_eq!(row, 20.0, epsilon = 1e-12);
        assert_relative_eq!(col, 21.0, epsilon = 1e-12);
        assert_relative_eq!(gmix[0].row() - gmix[1].row(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zeros_evaluates_to_zero() {
        let gmix = GMix::zeros(3);
        assert_eq!(gmix.len(), 3);
        assert_eq!(gmix.eval(0.0, 0.0), 0.0);
    }
}
