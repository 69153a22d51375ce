#![doc = include_str!("../README.md")]

mod error;
mod gdma;
mod site;
mod states;
mod templates;

pub use error::MultipoleError;
pub use gdma::{default_polarizability, parse_gdma_file, parse_gdma_str};
pub use site::PolarSite;
pub use states::ChargeState;
pub use templates::{SegmentEntry, TemplateSet, TemplateTable, Templates};

pub type Result<T> = std::result::Result<T, MultipoleError>;

/// Dipole polarizability, in nm³.
#[doc(alias = "f64")]
pub type Polarizability = f64;

/// Multipole moment of rank k, in e·nmᵏ.
#[doc(alias = "f64")]
pub type Moment = f64;
