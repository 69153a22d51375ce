// ==================== Units

/// Conversion factor from bohr (a₀) to nm. Multipole moments of rank k scale
/// with its k-th power.
pub const BOHR2NM: f64 = 0.0529189379;

/// Conversion factor from Å to nm.
pub const ANGSTROM2NM: f64 = 0.1;

/// Conversion factor from Å³ to nm³, used for dipole polarizabilities.
pub const ANGSTROM3_2_NM3: f64 = 1e-3;

/// Vacuum permittivity ε₀, in SI units.
pub const EPS0_SI: f64 = 8.854187817e-12;

/// Elementary charge, in C.
pub const E_CHARGE_SI: f64 = 1.602176487e-19;

/// Conversion factor from internal energy units (e²/nm) to eV,
/// 1/(4πε₀)·e·10⁹ ≈ 1.4399645.
pub const INT2EV: f64 = 1.0 / (4.0 * std::f64::consts::PI * EPS0_SI) * E_CHARGE_SI / 1.0e-9;

// ==================== Induction

/// Default SOR mixing weight, for both the neutral and the charged states.
pub const WSOR_DEFAULT: f64 = 0.75;

/// The maximum amount of SOR iterations per charge state before giving up on
/// convergence.
pub const MAXITER_DEFAULT: usize = 512;

/// The default convergence tolerance on the relative induced-dipole change.
pub const TOLERANCE_DEFAULT: f64 = 0.001;

/// Above this value of a·u³ the Thole λ's are indistinguishable from 1 at
/// working precision, and the undamped tensors are used instead.
pub const THOLE_UNDAMPED_GUARD: f64 = 40.0;

/// Induced dipoles below this norm count as numerically zero in the
/// convergence metric.
pub const U1_ZERO_GUARD: f64 = 1e-20;

// ==================== Misc

/// Style of the progress bar shown while sweeping over segments.
pub const PBAR_STYLE: &str =
    "[{elapsed_precise}] {wide_bar:.cyan/blue} {spinner} {pos:>4}/{len:4} {msg}";
