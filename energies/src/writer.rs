use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use multipoles::ChargeState;

use crate::{Result, SweepResults};

/// Writes the per-segment energy table.
///
/// One line per segment: id, name, (state, energy in eV) for every
/// available state, (state, SOR iterations), the polarization-sphere size
/// and the center of mass in nm.
pub fn write_table(path: &Path, results: &SweepResults) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    for r in results.sites.iter() {
        write!(out, "{:4} {:4} ", r.seg_id, r.name)?;

        // Energies
        for state in ChargeState::EVAL_ORDER {
            if let Some(e) = r.energies[state.index()] {
                write!(out, "  {:>2} {e:3.8}   ", state.to_string())?;
            }
        }

        // Iterations
        for state in ChargeState::EVAL_ORDER {
            if r.energies[state.index()].is_some() {
                write!(out, "  {:>2} {:3}   ", state.to_string(), r.iters[state.index()])?;
            }
        }

        // Polarizable sphere
        write!(out, "   SPH {:4}   ", r.sphere_size)?;

        writeln!(out, "   {:4.7} {:4.7} {:4.7}   ", r.com.x, r.com.y, r.com.z)?;
    }

    out.flush()?;
    Ok(())
}
