use nalgebra::Vector3;

use config::U1_ZERO_GUARD;

use crate::Polarizability;
use crate::{ChargeState, MultipoleError, Result};

/// One atomic-like interaction center.
///
/// Carries the spherical multipole moments (up to rank 2) and the isotropic
/// dipole polarizability for every charge state it was templated with, plus
/// the *active* values for the state currently under evaluation. The active
/// slots are only valid after a [`PolarSite::charge`] call.
#[derive(Clone)]
pub struct PolarSite {
    /// Site id, starting from 1 within its segment template.
    pub id: usize,
    /// Element name, used to look up default polarizabilities.
    pub element: String,
    /// Highest multipole rank carried by this site (0, 1 or 2).
    pub rank: usize,
    /// Position, in nm.
    pub pos: Vector3<f64>,

    /// Spherical moments per charge state:
    /// Q00; Q1x Q1y Q1z; Q20 Q21c Q21s Q22c Q22s.
    qs: [Option<Vec<f64>>; 3],
    /// Isotropic dipole polarizability per charge state, in nm³.
    ps: [Option<Polarizability>; 3],

    // Active multipole moments, copied from the per-state set by `charge`.
    pub q00: f64,
    pub q1x: f64,
    pub q1y: f64,
    pub q1z: f64,
    pub q20: f64,
    pub q21c: f64,
    pub q21s: f64,
    pub q22c: f64,
    pub q22s: f64,
    /// Active polarizability.
    pub p1: f64,

    /// Induced dipole.
    pub u1: Vector3<f64>,
    /// Field accumulator for the permanent moments of all neighbors.
    pub fp: Vector3<f64>,
    /// Field accumulator for the induced dipoles of all neighbors.
    pub fu: Vector3<f64>,

    /// Previous induced-dipole values, for the convergence metric.
    u1_hist: Vec<Vector3<f64>>,
}

// Creation
impl PolarSite {
    /// Creates a new, uncharged [`PolarSite`] with no moments assigned.
    pub fn new(id: usize, element: &str, rank: usize, pos: Vector3<f64>) -> Self {
        Self {
            id,
            element: element.into(),
            rank,
            pos,
            qs: [None, None, None],
            ps: [None, None, None],
            q00: 0.0,
            q1x: 0.0,
            q1y: 0.0,
            q1z: 0.0,
            q20: 0.0,
            q21c: 0.0,
            q21s: 0.0,
            q22c: 0.0,
            q22s: 0.0,
            p1: 0.0,
            u1: Vector3::zeros(),
            fp: Vector3::zeros(),
            fu: Vector3::zeros(),
            u1_hist: Vec::new(),
        }
    }

    /// Assigns the spherical moments of `state`.
    pub fn set_qs(&mut self, qs: Vec<f64>, state: ChargeState) {
        self.qs[state.index()] = Some(qs);
    }

    /// Returns the spherical moments of `state`, if templated.
    pub fn qs(&self, state: ChargeState) -> Option<&[f64]> {
        self.qs[state.index()].as_deref()
    }

    /// Assigns the polarizability of `state`, in nm³.
    pub fn set_ps(&mut self, p1: Polarizability, state: ChargeState) {
        self.ps[state.index()] = Some(p1);
    }

    /// Returns the polarizability of `state`, if assigned.
    pub fn ps(&self, state: ChargeState) -> Option<Polarizability> {
        self.ps[state.index()]
    }

    /// Returns `true` if moments for `state` have been assigned.
    pub fn has_state(&self, state: ChargeState) -> bool {
        self.qs[state.index()].is_some()
    }
}

// Charge state handling
impl PolarSite {
    /// Copies the moments and polarizability of `state` into the active
    /// slots. Components above [`PolarSite::rank`] stay zero.
    ///
    /// # Error
    ///
    /// Returns [`MultipoleError::MissingState`] if `state` was never
    /// templated for this site.
    pub fn charge(&mut self, state: ChargeState) -> Result<()> {
        let qs = self.qs[state.index()]
            .as_ref()
            .ok_or(MultipoleError::MissingState(state))?;

        let q = |i: usize| qs.get(i).copied().unwrap_or(0.0);
        self.q00 = q(0);
        (self.q1x, self.q1y, self.q1z) = match self.rank > 0 {
            true => (q(1), q(2), q(3)),
            false => (0.0, 0.0, 0.0),
        };
        (self.q20, self.q21c, self.q21s, self.q22c, self.q22s) = match self.rank > 1 {
            true => (q(4), q(5), q(6), q(7), q(8)),
            false => (0.0, 0.0, 0.0, 0.0, 0.0),
        };
        self.p1 = self.ps[state.index()].unwrap_or(0.0);
        Ok(())
    }

    /// Zeroes the induced dipole, both field accumulators and the history.
    pub fn depolarize(&mut self) {
        self.u1 = Vector3::zeros();
        self.fp = Vector3::zeros();
        self.fu = Vector3::zeros();
        self.u1_hist.clear();
    }
}

// Induction
impl PolarSite {
    /// First-order induction from the permanent field alone.
    pub fn induce_direct(&mut self) {
        self.u1 = -self.p1 * self.fp;
    }

    /// SOR update of the induced dipole with mixing weight `wsor`.
    ///
    /// Both field accumulators must already contain all neighbor
    /// contributions for this iteration.
    pub fn induce(&mut self, wsor: f64) {
        self.u1_hist.push(self.u1);
        self.u1 = (1.0 - wsor) * self.u1 - wsor * self.p1 * (self.fp + self.fu);
    }

    /// Relative change of the induced dipole in the latest update,
    /// `|U1 - U1_prev| / |U1|`.
    ///
    /// A numerically zero induced dipole counts as converged when the site
    /// cannot polarize (P1 ~ 0) or sees no permanent field, and as not yet
    /// converged otherwise.
    pub fn hist_du(&self) -> f64 {
        let latest = self.u1.norm();
        if latest < U1_ZERO_GUARD {
            if self.p1 < U1_ZERO_GUARD || self.fp.norm() < U1_ZERO_GUARD {
                return 0.0;
            }
            return f64::INFINITY;
        }
        match self.u1_hist.last() {
            Some(prev) => (self.u1 - prev).norm() / latest,
            None => f64::INFINITY,
        }
    }

    /// Zeroes the induced-field accumulator.
    pub fn reset_field_u(&mut self) {
        self.fu = Vector3::zeros();
    }

    /// Zeroes the permanent-field accumulator.
    pub fn reset_field_p(&mut self) {
        self.fp = Vector3::zeros();
    }

    /// Clears the induced-dipole history.
    pub fn reset_u1_hist(&mut self) {
        self.u1_hist.clear();
    }
}

/// Hides the per-state tables and the scratch accumulators.
impl std::fmt::Debug for PolarSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolarSite")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("rank", &self.rank)
            .field("pos", &format!("{:.5} {:.5} {:.5}", self.pos.x, self.pos.y, self.pos.z))
            .field("Q00", &self.q00)
            .field("P1", &self.p1)
            .field("|U1|", &self.u1.norm())
            .finish()
    }
}
