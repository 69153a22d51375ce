use config::{MAXITER_DEFAULT, TOLERANCE_DEFAULT, WSOR_DEFAULT};

use crate::{InductionError, Result};

/// Interaction-range and damping parameters.
#[derive(Debug, Clone)]
pub struct TholeParams {
    /// Polarization-shell radius r₁, in nm.
    pub cutoff: f64,
    /// Static-shell outer radius r₂, in nm.
    pub cutoff2: f64,
    /// Thole damping parameter a; 0 disables damping.
    pub expdamp: f64,
}

impl TholeParams {
    /// Validates the cutoffs; `cutoff2` defaults to `cutoff` when absent.
    ///
    /// # Error
    ///
    /// Fails if the polarization cutoff is not positive or the outer radius
    /// lies inside it.
    pub fn build(cutoff: f64, cutoff2: Option<f64>, expdamp: f64) -> Result<Self> {
        if cutoff <= 0.0 {
            return Err(InductionError::BadCutoff { cutoff });
        }
        let cutoff2 = cutoff2.unwrap_or(cutoff);
        if cutoff2 < cutoff {
            return Err(InductionError::ShellOrder { cutoff, cutoff2 });
        }
        Ok(Self {
            cutoff,
            cutoff2,
            expdamp,
        })
    }
}

/// SOR convergence parameters.
#[derive(Debug, Clone)]
pub struct ConvParams {
    /// Mixing weight for the neutral state.
    pub wsor_n: f64,
    /// Mixing weight for the charged states.
    pub wsor_c: f64,
    /// Iteration cap per charge state.
    pub maxiter: usize,
    /// Convergence tolerance εtol on the relative induced-dipole change.
    pub tolerance: f64,
}

impl Default for ConvParams {
    fn default() -> Self {
        Self {
            wsor_n: WSOR_DEFAULT,
            wsor_c: WSOR_DEFAULT,
            maxiter: MAXITER_DEFAULT,
            tolerance: TOLERANCE_DEFAULT,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cutoff2_defaults_to_cutoff() {
        let params = TholeParams::build(3.0, None, 0.39).unwrap();
        assert_eq!(params.cutoff2, 3.0);
    }

    #[test]
    fn test_shell_order_enforced() {
        assert!(matches!(
            TholeParams::build(3.0, Some(2.0), 0.39),
            Err(InductionError::ShellOrder { .. })
        ));
        TholeParams::build(3.0, Some(6.0), 0.39).unwrap();
    }

    #[test]
    fn test_cutoff_must_be_positive() {
        assert!(matches!(
            TholeParams::build(0.0, None, 0.0),
            Err(InductionError::BadCutoff { .. })
        ));
    }

    #[test]
    fn test_conv_defaults() {
        let conv = ConvParams::default();
        assert_eq!(conv.wsor_n, 0.75);
        assert_eq!(conv.wsor_c, 0.75);
        assert_eq!(conv.maxiter, 512);
        assert_eq!(conv.tolerance, 0.001);
    }
}
