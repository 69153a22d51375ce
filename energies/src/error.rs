#[derive(thiserror::Error, Debug)]
pub enum EnergiesError {
    /// Error from [`induction`].
    #[error("Induction error: {0}")]
    Induction(#[from] induction::InductionError),

    /// Error from [`multipoles`].
    #[error("Multipole error: {0}")]
    Multipole(#[from] multipoles::MultipoleError),

    /// Error from [`topology`].
    #[error("Topology error: {0}")]
    Topology(#[from] topology::TopologyError),

    /// Error reading the options or system file.
    #[error("Options error: {0}")]
    Options(#[from] config_file::ConfigFileError),

    /// Error writing the energy table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
