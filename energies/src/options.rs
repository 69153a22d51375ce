use std::path::{Path, PathBuf};

use config_file::FromConfigFile;
use serde::Deserialize;

use config::{MAXITER_DEFAULT, TOLERANCE_DEFAULT, WSOR_DEFAULT};
use induction::{ConvParams, TholeParams};

use crate::Result;

/// Runtime options, read from a TOML file.
///
/// ```toml
/// multipoles = "multipoles.toml"
///
/// [control]
/// induce = true
/// first = 1
/// output = "energies.dat"
///
/// [tholeparam]
/// cutoff = 3.0
/// cutoff2 = 6.0
/// expdamp = 0.39
///
/// [convparam]
/// wSOR_N = 0.75
/// wSOR_C = 0.75
/// maxiter = 512
/// tolerance = 0.001
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct Options {
    /// Template table consumed by the multipole loader.
    pub multipoles: Option<PathBuf>,
    #[serde(default)]
    pub control: Control,
    pub tholeparam: TholeOptions,
    #[serde(default)]
    pub convparam: ConvOptions,
}

/// Which segments to process and where to report.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Control {
    /// Iterate the induced dipoles; with `false` only the static energy of
    /// the central segment against its polarization shell is reported.
    pub induce: bool,
    /// First segment id to process (inclusive).
    pub first: usize,
    /// Last segment id to process (inclusive); absent means all.
    pub last: Option<usize>,
    /// Energy-table destination; absent suppresses the file.
    pub output: Option<PathBuf>,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            induce: true,
            first: 1,
            last: None,
            output: None,
        }
    }
}

/// Cutoff and damping options.
#[derive(Deserialize, Debug, Clone)]
pub struct TholeOptions {
    /// Polarization-shell radius r₁, in nm.
    pub cutoff: f64,
    /// Static-shell outer radius r₂, in nm; defaults to r₁.
    pub cutoff2: Option<f64>,
    /// Thole damping parameter a; 0 disables damping.
    #[serde(default)]
    pub expdamp: f64,
}

/// SOR convergence options.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ConvOptions {
    #[serde(rename = "wSOR_N")]
    pub wsor_n: f64,
    #[serde(rename = "wSOR_C")]
    pub wsor_c: f64,
    pub maxiter: usize,
    pub tolerance: f64,
}

impl Default for ConvOptions {
    fn default() -> Self {
        Self {
            wsor_n: WSOR_DEFAULT,
            wsor_c: WSOR_DEFAULT,
            maxiter: MAXITER_DEFAULT,
            tolerance: TOLERANCE_DEFAULT,
        }
    }
}

impl Options {
    /// Reads the options from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::from_config_file(path)?)
    }

    /// Validated interaction parameters.
    ///
    /// # Error
    ///
    /// Fails if the cutoffs are out of order; nothing must run afterwards.
    pub fn thole_params(&self) -> Result<TholeParams> {
        Ok(TholeParams::build(
            self.tholeparam.cutoff,
            self.tholeparam.cutoff2,
            self.tholeparam.expdamp,
        )?)
    }

    /// Convergence parameters.
    pub fn conv_params(&self) -> ConvParams {
        ConvParams {
            wsor_n: self.convparam.wsor_n,
            wsor_c: self.convparam.wsor_c,
            maxiter: self.convparam.maxiter,
            tolerance: self.convparam.tolerance,
        }
    }

    /// Options with every field at its default, for programmatic use.
    pub fn with_cutoffs(cutoff: f64, cutoff2: Option<f64>) -> Self {
        Self {
            multipoles: None,
            control: Control::default(),
            tholeparam: TholeOptions {
                cutoff,
                cutoff2,
                expdamp: 0.0,
            },
            convparam: ConvOptions::default(),
        }
    }
}
