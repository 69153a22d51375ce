use nalgebra::Vector3;

use multipoles::{ChargeState, PolarSite};
use topology::{PeriodicCell, Segment, Topology};

/// A rank-0 polar site carrying charge `q` in the neutral state.
pub fn create_point_charge(q: f64, pos: Vector3<f64>, p1: f64) -> PolarSite {
    let mut site = PolarSite::new(1, "C", 0, pos);
    site.set_qs(vec![q], ChargeState::Neutral);
    site.set_ps(p1, ChargeState::Neutral);
    site
}

/// Two opposite unit charges along z, one segment each.
pub fn create_charge_pair(separation: f64, p1: f64) -> Topology {
    let mut top = Topology::new(PeriodicCell::Open);
    top.push_segment(Segment::from_sites(
        1,
        "PLUS",
        vec![create_point_charge(1.0, Vector3::zeros(), p1)],
    ));
    top.push_segment(Segment::from_sites(
        2,
        "MINU",
        vec![create_point_charge(
            -1.0,
            Vector3::new(0.0, 0.0, separation),
            p1,
        )],
    ));
    top
}
