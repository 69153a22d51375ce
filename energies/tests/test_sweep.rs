mod common;

use nalgebra::{Rotation3, Vector3};

use config::INT2EV;
use energies::*;
use multipoles::{ChargeState, PolarSite};
use topology::{PeriodicCell, Segment, Topology};

use crate::common::{create_charge_pair, create_point_charge};

#[test]
fn test_opposite_unit_charges_reference_energy() {
    // q = +1 and q = -1 separated by 1 nm, no polarizability:
    // E = -1/(4πε₀)·e·10⁹ eV.
    let top = create_charge_pair(1.0, 0.0);
    let options = Options::with_cutoffs(3.0, None);

    let results = run(&top, &options, 1).unwrap();
    for r in results.sites.iter() {
        let e = r.energies[ChargeState::Neutral.index()].unwrap();
        assert!((e - (-INT2EV)).abs() < 1e-9);
        assert!((e - (-1.4399645)).abs() < 1e-6);
    }
}

#[test]
fn test_charge_dipole_reference_energy() {
    // Point dipole of 1 e·nm along z at the origin, unit charge at 2 nm on
    // the axis: E = +1/4 in internal units, and swapping the segment order
    // must not change it.
    let mut dipole = PolarSite::new(1, "C", 1, Vector3::zeros());
    dipole.set_qs(vec![0.0, 0.0, 0.0, 1.0], ChargeState::Neutral);
    dipole.set_ps(1.75e-3, ChargeState::Neutral);
    let charge = create_point_charge(1.0, Vector3::new(0.0, 0.0, 2.0), 0.0);

    let mut orders = Vec::new();
    for swap in [false, true] {
        let mut top = Topology::new(PeriodicCell::Open);
        let (first, second) = match swap {
            false => (dipole.clone(), charge.clone()),
            true => (charge.clone(), dipole.clone()),
        };
        top.push_segment(Segment::from_sites(1, "A", vec![first]));
        top.push_segment(Segment::from_sites(2, "B", vec![second]));

        let mut options = Options::with_cutoffs(5.0, None);
        options.control.induce = false;

        let results = run(&top, &options, 1).unwrap();
        let e = results.sites[0].energies[ChargeState::Neutral.index()].unwrap();
        assert!((e - 0.25 * INT2EV).abs() < 1e-9);
        assert!((e - 0.359991).abs() < 1e-6);
        orders.push(e);
    }
    assert_eq!(orders[0], orders[1]);
}

#[test]
fn test_polarizable_pair_converges_and_lowers_energy() {
    let top = create_charge_pair(1.0, 1e-3);
    let mut options = Options::with_cutoffs(3.0, None);
    options.tholeparam.expdamp = 0.39;
    options.convparam.tolerance = 1e-6;

    let results = run(&top, &options, 1).unwrap();
    let r = &results.sites[0];
    let idx = ChargeState::Neutral.index();

    assert!(r.statuses[idx].is_converged());
    assert!(r.iters[idx] <= 20);
    assert!(r.energies[idx].unwrap() < -INT2EV);
}

#[test]
fn test_per_segment_energies_independent_of_worker_count() {
    // A small polarizable cluster; every worker count must produce bitwise
    // the same sorted energy table.
    let mut top = Topology::new(PeriodicCell::Open);
    let charges = [1.0, -1.0, 0.5, -0.5, 0.3, -0.3];
    for (i, &q) in charges.iter().enumerate() {
        let pos = Vector3::new((i % 3) as f64, (i / 3) as f64, 0.3 * i as f64);
        top.push_segment(Segment::from_sites(
            i + 1,
            "SEG",
            vec![create_point_charge(q, pos, 1e-3)],
        ));
    }

    let mut options = Options::with_cutoffs(10.0, None);
    options.tholeparam.expdamp = 0.39;

    let reference = run(&top, &options, 1).unwrap();
    for nthreads in [2, 4] {
        let results = run(&top, &options, nthreads).unwrap();
        assert_eq!(results.sites.len(), reference.sites.len());
        for (r, e) in results.sites.iter().zip(reference.sites.iter()) {
            assert_eq!(r.seg_id, e.seg_id);
            let idx = ChargeState::Neutral.index();
            assert_eq!(
                r.energies[idx].unwrap().to_bits(),
                e.energies[idx].unwrap().to_bits(),
            );
        }
    }
}

#[test]
fn test_rotational_invariance() {
    // Rigidly rotating the whole cluster about the central segment's CoM
    // leaves the reported energies invariant.
    let positions = [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.2, -0.3),
        Vector3::new(-0.6, 0.8, 0.5),
        Vector3::new(0.4, -0.9, 0.7),
    ];
    let charges = [1.0, -0.4, -0.3, -0.3];

    let build = |rotation: Option<Rotation3<f64>>| {
        let mut top = Topology::new(PeriodicCell::Open);
        for (i, (&q, &pos)) in charges.iter().zip(&positions).enumerate() {
            let pos = match rotation {
                Some(rot) => rot * pos,
                None => pos,
            };
            top.push_segment(Segment::from_sites(
                i + 1,
                "SEG",
                vec![create_point_charge(q, pos, 1e-3)],
            ));
        }
        top
    };

    let mut options = Options::with_cutoffs(5.0, None);
    options.tholeparam.expdamp = 0.39;
    options.convparam.tolerance = 1e-9;

    let plain = run(&build(None), &options, 1).unwrap();
    let rotation = Rotation3::from_euler_angles(0.3, -1.1, 2.4);
    let rotated = run(&build(Some(rotation)), &options, 1).unwrap();

    let idx = ChargeState::Neutral.index();
    for (a, b) in plain.sites.iter().zip(rotated.sites.iter()) {
        let ea = a.energies[idx].unwrap();
        let eb = b.energies[idx].unwrap();
        assert!((ea - eb).abs() < 1e-8);
    }
}

#[test]
fn test_missing_anion_state_is_skipped() {
    let mut anionizable = create_point_charge(0.0, Vector3::zeros(), 1e-3);
    anionizable.set_qs(vec![-1.0], ChargeState::Anion);
    anionizable.set_ps(1e-3, ChargeState::Anion);

    let mut top = Topology::new(PeriodicCell::Open);
    top.push_segment(Segment::from_sites(1, "ANI", vec![anionizable]));
    top.push_segment(Segment::from_sites(
        2,
        "NEU",
        vec![create_point_charge(0.5, Vector3::new(0.0, 0.0, 1.0), 1e-3)],
    ));

    let options = Options::with_cutoffs(5.0, None);
    let results = run(&top, &options, 1).unwrap();

    let idx = ChargeState::Anion.index();
    // Segment 1 carries an anion state and reports it.
    assert!(results.get(1).unwrap().energies[idx].is_some());
    assert!(results.get(1).unwrap().statuses[idx].is_converged());
    // Segment 2 does not; the state is skipped, the others still report.
    assert!(results.get(2).unwrap().energies[idx].is_none());
    assert!(results.get(2).unwrap().statuses[idx].is_skipped());
    assert!(
        results.get(2).unwrap().energies[ChargeState::Neutral.index()].is_some()
    );
}

#[test]
fn test_cutoff_order_error_aborts_run() {
    let top = create_charge_pair(1.0, 0.0);
    let options = Options::with_cutoffs(3.0, Some(2.0));
    assert!(matches!(
        run(&top, &options, 2),
        Err(EnergiesError::Induction(_))
    ));
}

#[test]
fn test_outer_shell_contributes_statically() {
    // Three charges in a row; the far one sits in the static shell only.
    let mut top = Topology::new(PeriodicCell::Open);
    top.push_segment(Segment::from_sites(
        1,
        "CEN",
        vec![create_point_charge(1.0, Vector3::zeros(), 0.0)],
    ));
    top.push_segment(Segment::from_sites(
        2,
        "NEAR",
        vec![create_point_charge(-1.0, Vector3::new(0.0, 0.0, 1.0), 0.0)],
    ));
    top.push_segment(Segment::from_sites(
        3,
        "FAR",
        vec![create_point_charge(1.0, Vector3::new(0.0, 0.0, 3.0), 0.0)],
    ));

    let options = Options::with_cutoffs(2.0, Some(4.0));
    let results = run(&top, &options, 1).unwrap();

    // Central energy: pair with NEAR (-1/1) plus outer coupling to FAR
    // (+1/3); the NEAR-FAR pair is not part of the central reduction.
    let e = results.get(1).unwrap().energies[ChargeState::Neutral.index()].unwrap();
    let expected = INT2EV * (-1.0 + 1.0 / 3.0);
    assert!((e - expected).abs() < 1e-9);
    assert_eq!(results.get(1).unwrap().sphere_size, 2);
}

#[test]
fn test_energy_table_written() {
    let top = create_charge_pair(1.0, 0.0);
    let options = Options::with_cutoffs(3.0, None);
    let results = run(&top, &options, 1).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("energies.dat");
    write_table(&path, &results).unwrap();

    let table = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("PLUS"));
    assert!(lines[0].contains("SPH"));
    assert!(lines[0].contains("-1.4399644"));
}
