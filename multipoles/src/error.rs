use crate::ChargeState;

#[derive(thiserror::Error, Debug)]
pub enum MultipoleError {
    /// Template file could not be read.
    #[error("Template I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A punch file declared units other than bohr or angstrom.
    #[error("Unit '{units}' in {origin} not supported")]
    UnsupportedUnits { units: String, origin: String },

    /// A site line appeared before any Units declaration.
    #[error("No Units declaration before first site line in {origin}")]
    MissingUnits { origin: String },

    /// A line could not be interpreted as site, moment or polarizability data.
    #[error("Malformed line in {origin}: '{line}'")]
    Malformed { origin: String, line: String },

    /// No polarizability was templated and the element has no default.
    #[error("No polarizability given for polar site type {element}")]
    NoPolarizability { element: String },

    /// Site counts differ between the punch files of two charge states.
    #[error("Template '{segment}': {found} sites for a charged state, expected {expected}")]
    StateMismatch {
        segment: String,
        expected: usize,
        found: usize,
    },

    /// A charge state was requested that was never templated.
    #[error("Charge state {0} not available")]
    MissingState(ChargeState),

    /// Error from the template-table file.
    #[error("Template table error: {0}")]
    Table(#[from] config_file::ConfigFileError),
}
