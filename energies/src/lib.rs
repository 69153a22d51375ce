#![doc = include_str!("../README.md")]

mod error;
mod options;
mod pool;
mod results;
mod system;
mod writer;

pub use error::EnergiesError;
pub use options::{Control, ConvOptions, Options, TholeOptions};
pub use pool::run;
pub use results::SweepResults;
pub use system::{SegmentRow, SystemTable};
pub use writer::write_table;

pub use induction::{InductionStatus, SiteResult};

pub type Result<T> = std::result::Result<T, EnergiesError>;
