use std::path::Path;

use config_file::FromConfigFile;
use nalgebra::Vector3;
use serde::Deserialize;

use multipoles::Templates;
use topology::{PeriodicCell, Placement, Topology};

use crate::Result;

/// One segment placement in the system table.
#[derive(Deserialize, Debug, Clone)]
pub struct SegmentRow {
    /// Template name of the segment type.
    pub name: String,
    /// Translation of the template into the global frame, in nm.
    pub shift: [f64; 3],
}

/// Minimal system description consumed by the `site-energies` binary:
/// a periodic cell and one placement row per segment.
///
/// ```toml
/// cell = [8.0, 8.0, 8.0]
///
/// [[segments]]
/// name = "DCV"
/// shift = [0.0, 0.0, 0.0]
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct SystemTable {
    /// Orthorhombic cell edges in nm; absent means no periodicity.
    pub cell: Option<[f64; 3]>,
    pub segments: Vec<SegmentRow>,
}

impl SystemTable {
    /// Reads a system table from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::from_config_file(path)?)
    }

    /// Builds the topology and projects the templates onto it.
    pub fn to_topology(&self, templates: &Templates) -> Result<Topology> {
        let cell = match self.cell {
            Some([a, b, c]) => PeriodicCell::Orthorhombic { a, b, c },
            None => PeriodicCell::Open,
        };

        let mut top = Topology::new(cell);
        for row in self.segments.iter() {
            top.add_segment(&row.name, Placement::translation(Vector3::from(row.shift)));
        }
        top.distribute(templates)?;
        Ok(top)
    }
}
