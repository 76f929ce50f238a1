use clap::Args;
use gmix::{GMix, GMixModel, Jacobian};

/// Parse a model name such as "exp" or "bdf"
fn parse_model(s: &str) -> Result<GMixModel, String> {
    s.parse::<GMixModel>().map_err(|e| e.to_string())
}

/// Model shape arguments shared by the tools
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Profile family: gauss, exp, dev, turb, bdf or bdc
    #[arg(long, default_value = "exp", value_parser = parse_model)]
    pub model: GMixModel,

    /// Center offset along u, in sky units
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub row: f64,

    /// Center offset along v, in sky units
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub col: f64,

    /// Reduced shear component 1
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub g1: f64,

    /// Reduced shear component 2
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub g2: f64,

    /// Size T = irr + icc in sky units squared
    #[arg(long = "T", default_value_t = 4.0)]
    pub t: f64,

    /// Total flux
    #[arg(long, default_value_t = 1000.0)]
    pub flux: f64,

    /// Fraction of flux in the de Vaucouleurs bulge (bdf and bdc only)
    #[arg(long, default_value_t = 0.5)]
    pub fracdev: f64,
}

impl ModelArgs {
    /// Parameter vector in the layout expected by [`GMix::from_pars`].
    ///
    /// For bdc the bulge and disk share shape and size.
    pub fn pars(&self) -> anyhow::Result<Vec<f64>> {
        let (row, col, g1, g2, t, flux) = (self.row, self.col, self.g1, self.g2, self.t, self.flux);
        let pars = match self.model {
            GMixModel::Gauss | GMixModel::Exp | GMixModel::Dev | GMixModel::Turb => {
                vec![row, col, g1, g2, t, flux]
            }
            GMixModel::Bdf => vec![row, col, g1, g2, t, self.fracdev, flux],
            GMixModel::Bdc => vec![
                row,
                col,
                g1,
                g2,
                g1,
                g2,
                t,
                t,
                flux * self.fracdev,
                flux * (1.0 - self.fracdev),
            ],
            GMixModel::Full => anyhow::bail!("the full model takes explicit components"),
        };
        Ok(pars)
    }

    pub fn build(&self) -> anyhow::Result<GMix> {
        Ok(GMix::from_pars(self.model, &self.pars()?)?)
    }
}

/// Pixel grid arguments shared by the tools
#[derive(Args, Debug, Clone)]
pub struct ImageArgs {
    /// Image size in pixels (square)
    #[arg(long, default_value_t = 64)]
    pub size: usize,

    /// Pixel scale in sky units per pixel
    #[arg(long, default_value_t = 0.263)]
    pub scale: f64,

    /// Sub-pixel oversampling factor
    #[arg(long, default_value_t = 4)]
    pub nsub: usize,
}

impl ImageArgs {
    pub fn shape(&self) -> (usize, usize) {
        (self.size, self.size)
    }

    /// Jacobian centered on the middle of the image.
    pub fn jacobian(&self) -> anyhow::Result<Jacobian> {
        let cen = (self.size as f64 - 1.0) / 2.0;
        Ok(Jacobian::from_scale(cen, cen, self.scale)?)
    }
}
