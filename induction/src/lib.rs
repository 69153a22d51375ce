#![doc = include_str!("../README.md")]

mod error;
mod evaluator;
mod interactor;
mod params;

pub use error::InductionError;
pub use evaluator::{InductionStatus, SiteEvaluator, SiteResult};
pub use interactor::Interactor;
pub use params::{ConvParams, TholeParams};

pub type Result<T> = std::result::Result<T, InductionError>;

/// Energy in internal units (e²/nm); multiply by [`config::INT2EV`] for eV.
#[doc(alias = "f64")]
pub type Energy = f64;
