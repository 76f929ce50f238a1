//! Build, convolve, render and evaluate a model through a pixel-scale jacobian.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use gmix::{
    fill_fdiff, fill_fdiff_sub, get_loglike, get_loglike_robust, render_jacob,
    student_t_logfactor, GMix, GMixModel, Jacobian,
};
use ndarray::Array2;
use test_helpers::{synthetic_image, SyntheticImageConfig};

const SHAPE: (usize, usize) = (65, 65);
const SCALE: f64 = 0.5;
const FLUX: f64 = 100.0;

fn jacobian() -> Jacobian {
    Jacobian::from_scale(32.0, 32.0, SCALE).unwrap()
}

fn convolved_model() -> GMix {
    let obj = GMix::from_pars(GMixModel::Exp, &[0.3, -0.2, 0.2, -0.1, 8.0, FLUX]).unwrap();
    let psf = GMix::from_pars(GMixModel::Turb, &[0.0, 0.0, 0.0, 0.0, 2.0, 1.0]).unwrap();
    obj.convolve(&psf).unwrap()
}

fn model_image(gmix: &GMix, nsub: usize, noise_sigma: f64) -> (Array2<f64>, Array2<f64>) {
    let jacob = jacobian();
    let config = SyntheticImageConfig {
        shape: SHAPE,
        noise_sigma,
        seed: 9,
        ..Default::default()
    };
    let synth = synthetic_image(&config, |image| {
        render_jacob(gmix, image, nsub, &jacob).unwrap()
    })
    .unwrap();
    (synth.image, synth.weight)
}

#[test]
fn test_convolved_flux_is_conserved() {
    let conv = convolved_model();
    assert_eq!(conv.len(), 6 * 3);
    assert_relative_eq!(conv.get_psum(), FLUX, max_relative = 1e-12);

    let (image, _) = model_image(&conv, 4, 0.0);
    assert_relative_eq!(image.sum() * SCALE * SCALE, FLUX, max_relative = 1e-3);
}

#[test]
fn test_noiseless_loglike_is_zero() {
    let conv = convolved_model();
    let (image, weight) = model_image(&conv, 1, 0.0);

    let result = get_loglike(&conv, &image.view(), &weight.view(), &jacobian());
    assert_abs_diff_eq!(result.loglike, 0.0, epsilon = 1e-18);
    assert_relative_eq!(result.s2n_numer, result.s2n_denom, max_relative = 1e-12);
}

#[test]
fn test_noisy_loglike_matches_noise_level() {
    let conv = convolved_model();
    let (image, weight) = model_image(&conv, 1, 0.05);
    let npix = image.len() as f64;

    let result = get_loglike(&conv, &image.view(), &weight.view(), &jacobian());
    // -2 lnL is chi² with npix degrees of freedom
    let chi2_per_dof = -2.0 * result.loglike / npix;
    assert!((chi2_per_dof - 1.0).abs() < 0.1, "chi2/dof = {}", chi2_per_dof);
}

#[test]
fn test_fdiff_consistent_with_loglike() {
    let conv = convolved_model();
    let (image, weight) = model_image(&conv, 1, 0.05);
    let jacob = jacobian();

    let start = 2;
    let mut fdiff = vec![-1.0; start + image.len()];
    let sums = fill_fdiff(&conv, &image.view(), &weight.view(), &jacob, &mut fdiff, start).unwrap();
    let loglike = get_loglike(&conv, &image.view(), &weight.view(), &jacob);

    // prior slots untouched
    assert_eq!(&fdiff[..start], &[-1.0, -1.0]);

    let chi2: f64 = fdiff[start..].iter().map(|f| f * f).sum();
    assert_relative_eq!(chi2, -2.0 * loglike.loglike, max_relative = 1e-10);
    assert_relative_eq!(sums.s2n_numer, loglike.s2n_numer, max_relative = 1e-10);
    assert_relative_eq!(sums.s2n_denom, loglike.s2n_denom, max_relative = 1e-10);
    assert!(sums.s2n() > 10.0);
}

#[test]
fn test_fdiff_sub_matches_oversampled_render() {
    let conv = convolved_model();
    let (image, weight) = model_image(&conv, 3, 0.0);

    let mut fdiff = vec![0.0; image.len()];
    fill_fdiff_sub(&conv, &image.view(), &weight.view(), &jacobian(), &mut fdiff, 0, 3).unwrap();

    for f in &fdiff {
        assert_abs_diff_eq!(*f, 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_robust_loglike_tolerates_outlier() {
    let conv = convolved_model();
    let (mut image, weight) = model_image(&conv, 1, 0.05);
    let jacob = jacobian();

    let nu = 3.0;
    let logfactor = student_t_logfactor(nu);

    let gauss_before = get_loglike(&conv, &image.view(), &weight.view(), &jacob).loglike;
    let robust_before =
        get_loglike_robust(&conv, &image.view(), &weight.view(), &jacob, nu, logfactor).loglike;

    image[[5, 60]] += 50.0;

    let gauss_after = get_loglike(&conv, &image.view(), &weight.view(), &jacob).loglike;
    let robust_after =
        get_loglike_robust(&conv, &image.view(), &weight.view(), &jacob, nu, logfactor).loglike;

    let gauss_drop = gauss_before - gauss_after;
    let robust_drop = robust_before - robust_after;
    assert!(gauss_drop > 1.0e5);
    assert!(robust_drop > 0.0);
    assert!(robust_drop < 100.0);
}
