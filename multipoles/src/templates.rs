use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::gdma::parse_gdma_file;
use crate::{ChargeState, MultipoleError, PolarSite, Result};

/// One segment type's entry in the template table.
#[derive(Deserialize, Debug, Clone)]
pub struct SegmentEntry {
    /// Punch file for the neutral state. Mandatory.
    pub neutral: PathBuf,
    /// Punch file for the anionic state.
    pub anion: Option<PathBuf>,
    /// Punch file for the cationic state.
    pub cation: Option<PathBuf>,
    /// Overwrite template positions with the segment's stored atom positions
    /// instead of applying the rigid placement.
    #[serde(default)]
    pub map2md: bool,
}

/// Maps segment type names to their punch files.
///
/// ```toml
/// [segments.DCV]
/// neutral = "dcv_n.mps"
/// cation = "dcv_h.mps"
/// map2md = false
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct TemplateTable {
    pub segments: HashMap<String, SegmentEntry>,
}

impl TemplateTable {
    /// Reads a template table from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::from_config_file(path)?)
    }
}

/// Polar-site templates of one segment type, merged over all templated
/// charge states.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    /// One template site per interaction center, in punch-file order.
    pub sites: Vec<PolarSite>,
    /// Which charge states carry moments, indexed by [`ChargeState::index`].
    pub chrg_states: [bool; 3],
    pub map2md: bool,
}

/// Loaded polar-site templates for every segment type.
///
/// Templates are created once and live for the program's duration; workers
/// only ever see copies.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    map: HashMap<String, TemplateSet>,
}

impl Templates {
    /// Parses all punch files referenced by `table`.
    ///
    /// The neutral file defines the site list; charged-state files must
    /// carry the same number of sites and are merged onto it.
    pub fn load(table: &TemplateTable) -> Result<Self> {
        let mut map = HashMap::new();

        for (name, entry) in table.segments.iter() {
            let mut sites = parse_gdma_file(&entry.neutral, ChargeState::Neutral)?;
            let mut chrg_states = [false, true, false];

            let charged = [
                (ChargeState::Anion, &entry.anion),
                (ChargeState::Cation, &entry.cation),
            ];
            for (state, path) in charged {
                let Some(path) = path else { continue };

                let poles = parse_gdma_file(path, state)?;
                merge_state(&mut sites, &poles, state, name)?;
                chrg_states[state.index()] = true;
            }

            map.insert(
                name.clone(),
                TemplateSet {
                    sites,
                    chrg_states,
                    map2md: entry.map2md,
                },
            );
        }

        Ok(Self { map })
    }

    /// Builds a single-entry template set directly from parsed sites, for
    /// programmatic use.
    pub fn from_sites(name: &str, sites: Vec<PolarSite>, map2md: bool) -> Self {
        let mut chrg_states = [false; 3];
        for state in ChargeState::EVAL_ORDER {
            chrg_states[state.index()] = sites.iter().all(|s| s.has_state(state));
        }
        let mut map = HashMap::new();
        map.insert(
            name.into(),
            TemplateSet {
                sites,
                chrg_states,
                map2md,
            },
        );
        Self { map }
    }

    /// Merges another template collection into this one.
    pub fn extend(&mut self, other: Templates) {
        self.map.extend(other.map);
    }

    /// Looks up the template set of a segment type.
    pub fn get(&self, name: &str) -> Option<&TemplateSet> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Merges the moments of one charged state onto the neutral site list.
///
/// The punch files of all states must describe the same interaction
/// centers, so differing site counts are fatal.
fn merge_state(
    sites: &mut [PolarSite],
    poles: &[PolarSite],
    state: ChargeState,
    segment: &str,
) -> Result<()> {
    if poles.len() != sites.len() {
        return Err(MultipoleError::StateMismatch {
            segment: segment.into(),
            expected: sites.len(),
            found: poles.len(),
        });
    }
    for (site, pole) in sites.iter_mut().zip(poles) {
        if let Some(qs) = pole.qs(state) {
            site.set_qs(qs.to_vec(), state);
        }
        if let Some(p1) = pole.ps(state) {
            site.set_ps(p1, state);
        }
    }
    Ok(())
}
