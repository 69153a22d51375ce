use nalgebra::{Rotation3, Vector3};

use multipoles::{ChargeState, PolarSite};

/// Rigid placement of a segment template into the global frame.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Translation applied to the template positions.
    pub shift: Vector3<f64>,
    /// Rotation applied after translating.
    pub rotation: Rotation3<f64>,
    /// Center the rotation pivots about.
    pub center: Vector3<f64>,
}

impl Placement {
    /// A pure translation by `shift`.
    pub fn translation(shift: Vector3<f64>) -> Self {
        Self {
            shift,
            rotation: Rotation3::identity(),
            center: Vector3::zeros(),
        }
    }

    /// Maps a template position into the global frame.
    pub fn apply(&self, pos: Vector3<f64>) -> Vector3<f64> {
        self.rotation * (pos + self.shift - self.center) + self.center
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::translation(Vector3::zeros())
    }
}

/// An ordered collection of polar sites evaluated as one unit.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment id, starting from 1.
    pub id: usize,
    /// Template name of this segment type.
    pub name: String,
    /// Center of mass, in nm.
    pub pos: Vector3<f64>,
    /// Placement of the template into the global frame.
    pub placement: Placement,
    /// Stored atom positions, consumed when the template maps to MD
    /// coordinates.
    pub atoms: Vec<Vector3<f64>>,
    /// The segment's polar sites, filled in by the template projection.
    pub sites: Vec<PolarSite>,
    /// Which charge states can be evaluated, indexed by
    /// [`ChargeState::index`].
    pub chrg_states: [bool; 3],
}

impl Segment {
    /// Creates an empty segment; sites arrive via the template projection.
    pub fn new(id: usize, name: &str, placement: Placement) -> Self {
        Self {
            id,
            name: name.into(),
            pos: Vector3::zeros(),
            placement,
            atoms: Vec::new(),
            sites: Vec::new(),
            chrg_states: [false; 3],
        }
    }

    /// Creates a segment directly from already-built polar sites.
    pub fn from_sites(id: usize, name: &str, sites: Vec<PolarSite>) -> Self {
        let mut chrg_states = [false; 3];
        for state in ChargeState::EVAL_ORDER {
            chrg_states[state.index()] = !sites.is_empty() && sites.iter().all(|s| s.has_state(state));
        }
        let mut seg = Self {
            id,
            name: name.into(),
            pos: Vector3::zeros(),
            placement: Placement::default(),
            atoms: Vec::new(),
            sites,
            chrg_states,
        };
        seg.update_pos();
        seg
    }

    /// Returns `true` if `state` can be evaluated for this segment.
    pub fn has_chrg_state(&self, state: ChargeState) -> bool {
        self.chrg_states[state.index()]
    }

    /// Recomputes the center of mass as the mean site position.
    pub fn update_pos(&mut self) {
        if self.sites.is_empty() {
            return;
        }
        let sum: Vector3<f64> = self.sites.iter().map(|s| s.pos).sum();
        self.pos = sum / self.sites.len() as f64;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_placement_translation() {
        let p = Placement::translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(p.apply(Vector3::zeros()), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_placement_rotation_about_center() {
        let p = Placement {
            shift: Vector3::zeros(),
            rotation: Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            center: Vector3::new(1.0, 0.0, 0.0),
        };
        // The center itself is a fixed point.
        assert!((p.apply(p.center) - p.center).norm() < 1e-12);

        let rotated = p.apply(Vector3::new(2.0, 0.0, 0.0));
        assert!((rotated - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_from_sites_com() {
        let mut s1 = PolarSite::new(1, "C", 0, Vector3::new(0.0, 0.0, 0.0));
        let mut s2 = PolarSite::new(2, "C", 0, Vector3::new(0.0, 0.0, 2.0));
        for s in [&mut s1, &mut s2] {
            s.set_qs(vec![0.0], ChargeState::Neutral);
            s.set_ps(1.75e-3, ChargeState::Neutral);
        }
        let seg = Segment::from_sites(1, "SEG", vec![s1, s2]);
        assert_eq!(seg.pos, Vector3::new(0.0, 0.0, 1.0));
        assert!(seg.has_chrg_state(ChargeState::Neutral));
        assert!(!seg.has_chrg_state(ChargeState::Cation));
    }
}
