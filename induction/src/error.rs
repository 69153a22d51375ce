#[derive(thiserror::Error, Debug)]
pub enum InductionError {
    /// Error from [`multipoles`].
    #[error("Multipole error: {0}")]
    Multipole(#[from] multipoles::MultipoleError),

    /// Error from [`topology`].
    #[error("Topology error: {0}")]
    Topology(#[from] topology::TopologyError),

    /// The static shell must enclose the polarization shell.
    #[error("Outer cutoff {cutoff2} nm lies inside the polarization cutoff {cutoff} nm")]
    ShellOrder { cutoff: f64, cutoff2: f64 },

    /// Cutoffs must be positive.
    #[error("Polarization cutoff must be positive, got {cutoff} nm")]
    BadCutoff { cutoff: f64 },
}
