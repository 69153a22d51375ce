use std::path::Path;

use nalgebra::Vector3;

use config::{ANGSTROM2NM, ANGSTROM3_2_NM3, BOHR2NM};

use crate::Polarizability;
use crate::{ChargeState, MultipoleError, PolarSite, Result};

/// Default isotropic polarizabilities (Thole set), in nm³, applied when a
/// punch file declares no `P` lines at all.
pub fn default_polarizability(element: &str) -> Option<Polarizability> {
    match element {
        "C" => Some(1.75e-3),
        "H" => Some(0.696e-3),
        "N" => Some(1.073e-3),
        "O" => Some(0.837e-3),
        "S" => Some(2.926e-3),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Units {
    Bohr,
    Angstrom,
}

impl Units {
    fn to_nm(self) -> f64 {
        match self {
            Units::Bohr => BOHR2NM,
            Units::Angstrom => ANGSTROM2NM,
        }
    }
}

/// Parses a GDMA punch file into polar-site templates for `state`.
///
/// Loads positions, ranks and spherical moments, converting lengths to nm
/// and moments of rank k by the k-th power of the length conversion.
/// Polarizabilities are read from `P` lines (Å³), or, if the file carries
/// none, from the element-keyed default table.
pub fn parse_gdma_file(path: &Path, state: ChargeState) -> Result<Vec<PolarSite>> {
    let text = std::fs::read_to_string(path)?;
    parse_gdma_str(&text, state, &path.display().to_string())
}

/// Parses punch-file `text`; `origin` is only used in error messages.
///
/// File structure sample:
///
/// ```text
/// ! DCV2T opt
/// Units bohr
///
/// C   -4.2414603400  -3.8124751600   0.0017575736  Rank 2
///  -0.3853409355
///  -0.0002321905  0.2401559510  0.6602334308
///  -0.7220625314  0.0004894995 -0.0003833545  0.4526409813 -0.50937399
///  P 1.75
/// ```
pub fn parse_gdma_str(text: &str, state: ChargeState, origin: &str) -> Result<Vec<PolarSite>> {
    let mut poles: Vec<PolarSite> = Vec::new();
    let mut units: Option<Units> = None;
    let mut use_default_ps = true;
    let mut pole_count = 1;

    let malformed = |line: &str| MultipoleError::Malformed {
        origin: origin.into(),
        line: line.into(),
    };

    for line in text.lines() {
        let split: Vec<&str> = line.split_whitespace().collect();

        // Empty and comment lines
        if split.is_empty() || split[0].starts_with('!') {
            continue;
        }

        // Units declaration
        if split[0] == "Units" {
            units = match split.get(1) {
                Some(&"bohr") => Some(Units::Bohr),
                Some(&"angstrom") => Some(Units::Angstrom),
                _ => {
                    return Err(MultipoleError::UnsupportedUnits {
                        units: split.get(1).unwrap_or(&"").to_string(),
                        origin: origin.into(),
                    });
                }
            };
        }
        // Element, position, rank limit
        else if split.len() == 6 {
            let scale = units
                .ok_or(MultipoleError::MissingUnits {
                    origin: origin.into(),
                })?
                .to_nm();

            let parse = |tok: &str| tok.parse::<f64>().map_err(|_| malformed(line));
            let pos = scale
                * Vector3::new(parse(split[1])?, parse(split[2])?, parse(split[3])?);
            let rank: usize = split[5].parse().map_err(|_| malformed(line))?;

            let id = pole_count;
            pole_count += 1;
            poles.push(PolarSite::new(id, split[0], rank, pos));
        }
        // 'P', dipole polarizability in Å³
        else if split[0] == "P" && split.len() == 2 {
            let p1 = ANGSTROM3_2_NM3 * split[1].parse::<f64>().map_err(|_| malformed(line))?;
            let pole = poles.last_mut().ok_or(malformed(line))?;
            pole.set_ps(p1, state);
            use_default_ps = false;
        }
        // Multipole moment line
        else {
            let pole = poles.last_mut().ok_or(malformed(line))?;
            let mut qs: Vec<f64> = pole.qs(state).map(<[f64]>::to_vec).unwrap_or_default();

            // The rank of this line follows from how many components were
            // already accumulated: 0 -> monopole, 1 -> dipole, 4 -> quadrupole.
            let line_rank = ((qs.len() as f64).sqrt() + 0.5) as i32;

            for tok in &split {
                let q: f64 = tok.parse().map_err(|_| malformed(line))?;
                // Moments are declared in e·(a0)^k; convert to e·nm^k,
                // k = line rank.
                qs.push(q * BOHR2NM.powi(line_rank));
            }
            pole.set_qs(qs, state);
        }
    }

    if use_default_ps {
        for pole in poles.iter_mut() {
            let alpha = default_polarizability(&pole.element).ok_or_else(|| {
                MultipoleError::NoPolarizability {
                    element: pole.element.clone(),
                }
            })?;
            pole.set_ps(alpha, state);
        }
    }

    Ok(poles)
}
