#![doc = include_str!("../README.md")]

mod cell;
mod error;
mod segment;
mod topology;

pub use cell::PeriodicCell;
pub use error::TopologyError;
pub use segment::{Placement, Segment};
pub use topology::Topology;

pub type Result<T> = std::result::Result<T, TopologyError>;

/// Distance, in nm.
#[doc(alias = "f64")]
pub type Length = f64;
