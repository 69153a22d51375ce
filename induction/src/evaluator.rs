use nalgebra::Vector3;

use config::INT2EV;
use derive_is_enum_variant::is_enum_variant;
use multipoles::{ChargeState, PolarSite};
use topology::Topology;

use crate::{ConvParams, Energy, Interactor, Result, TholeParams};

/// How the induction of one charge state went.
#[derive(Debug, Clone, Copy, Default, PartialEq, is_enum_variant)]
pub enum InductionStatus {
    /// State not templated for this segment, nothing evaluated.
    #[default]
    Skipped,
    /// SCF met the tolerance.
    Converged,
    /// SCF hit the iteration cap; the last iterate was used.
    NotConverged,
    /// Induction disabled, static-only energy reported.
    StaticOnly,
}

/// Per-segment outcome of a site evaluation.
#[derive(Debug, Clone)]
pub struct SiteResult {
    /// Id of the evaluated segment.
    pub seg_id: usize,
    /// Template name of the evaluated segment.
    pub name: String,
    /// Energies in eV, indexed by [`ChargeState::index`]; `None` for states
    /// the segment was never templated with.
    pub energies: [Option<f64>; 3],
    /// SOR iterations spent per charge state.
    pub iters: [usize; 3],
    /// Outcome per charge state.
    pub statuses: [InductionStatus; 3],
    /// Number of segments inside the polarization sphere.
    pub sphere_size: usize,
    /// Center of mass of the evaluated segment.
    pub com: Vector3<f64>,
}

/// Evaluates the embedding energy of one segment at a time.
///
/// Each worker owns one evaluator. It holds a private replica of every polar
/// site in the topology, arranged by segment, so field accumulation runs
/// without any locking; the shared topology is only read for positions and
/// ids.
pub struct SiteEvaluator<'a> {
    top: &'a Topology,
    thole: &'a TholeParams,
    conv: &'a ConvParams,
    induce: bool,

    actor: Interactor,
    /// Private polar-site replicas, one inner vec per segment.
    sites: Vec<Vec<PolarSite>>,
    /// Segments within the polarization cutoff of the current center.
    pol_sphere: Vec<usize>,
    /// Segments between the polarization and the outer cutoff.
    out_sphere: Vec<usize>,
}

// Creation
impl<'a> SiteEvaluator<'a> {
    /// Replicates the topology's polar sites into private, neutral-charged
    /// copies.
    pub fn new(
        top: &'a Topology,
        thole: &'a TholeParams,
        conv: &'a ConvParams,
        induce: bool,
    ) -> Result<Self> {
        let mut sites = Vec::with_capacity(top.segments.len());
        for seg in top.segments.iter() {
            let mut replicas = seg.sites.clone();
            for site in replicas.iter_mut() {
                site.charge(ChargeState::Neutral)?;
            }
            sites.push(replicas);
        }

        Ok(Self {
            top,
            thole,
            conv,
            induce,
            actor: Interactor::new(thole.expdamp),
            sites,
            pol_sphere: Vec::new(),
            out_sphere: Vec::new(),
        })
    }
}

// Site evaluation
impl SiteEvaluator<'_> {
    /// Evaluates every available charge state of the segment at `seg_idx`
    /// (0-based) and reports the energies in eV.
    ///
    /// For each state: charge the central segment, iterate the induced
    /// dipoles to self-consistency (unless induction is disabled), reduce
    /// the energy over the polarization and static shells, then reset for
    /// the next state. States the segment was never templated with are
    /// silently skipped.
    pub fn eval_site(&mut self, seg_idx: usize) -> Result<SiteResult> {
        let seg = &self.top.segments[seg_idx];

        self.build_shells(seg_idx);

        // Start from a clean slate, outer shell included.
        self.depolarize();
        for &o in self.out_sphere.iter() {
            for site in self.sites[o].iter_mut() {
                site.depolarize();
            }
        }

        let mut energies = [None; 3];
        let mut iters = [0; 3];
        let mut statuses = [InductionStatus::Skipped; 3];

        for state in ChargeState::EVAL_ORDER {
            if !seg.has_chrg_state(state) {
                continue;
            }

            self.charge(seg_idx, state)?;

            let mut status = InductionStatus::StaticOnly;
            let mut iter = 0;
            if self.induce {
                (iter, status) = self.induce_state(seg_idx, state);
            }
            let e_state = match self.induce {
                true => self.energy(seg_idx),
                false => self.energy_static(seg_idx),
            };

            energies[state.index()] = Some(INT2EV * e_state);
            iters[state.index()] = iter;
            statuses[state.index()] = status;

            // Clear fields and history before the next state; the induced
            // dipoles of this state seed the next one.
            for &s in self.pol_sphere.iter() {
                for site in self.sites[s].iter_mut() {
                    site.reset_field_u();
                    site.reset_field_p();
                    site.reset_u1_hist();
                }
            }
        }

        self.depolarize();
        self.charge(seg_idx, ChargeState::Neutral)?;

        Ok(SiteResult {
            seg_id: seg.id,
            name: seg.name.clone(),
            energies,
            iters,
            statuses,
            sphere_size: self.pol_sphere.len(),
            com: seg.pos,
        })
    }

    /// Partitions all segments into the polarization and static shells
    /// around the center, by center-of-mass distance.
    fn build_shells(&mut self, seg_idx: usize) {
        self.pol_sphere.clear();
        self.out_sphere.clear();

        let center = self.top.segments[seg_idx].pos;
        for (i, other) in self.top.segments.iter().enumerate() {
            let r12 = self.top.pb_distance(other.pos, center);

            if r12 > self.thole.cutoff2 {
                continue;
            } else if r12 > self.thole.cutoff {
                self.out_sphere.push(i);
            } else {
                self.pol_sphere.push(i);
            }
        }
    }

    /// Charges the central segment's replicas to `state`.
    fn charge(&mut self, seg_idx: usize, state: ChargeState) -> Result<()> {
        for site in self.sites[seg_idx].iter_mut() {
            site.charge(state)?;
        }
        Ok(())
    }

    /// Zeroes induced moments and fields on every polarization-shell site.
    fn depolarize(&mut self) {
        for &s in self.pol_sphere.iter() {
            for site in self.sites[s].iter_mut() {
                site.depolarize();
            }
        }
    }

    /// Iterates the induced dipoles to self-consistency with SOR.
    ///
    /// Returns the number of the iteration the loop stopped at, and whether
    /// it stopped because the tolerance was met.
    fn induce_state(&mut self, seg_idx: usize, state: ChargeState) -> (usize, InductionStatus) {
        let wsor = match state {
            ChargeState::Neutral => self.conv.wsor_n,
            _ => self.conv.wsor_c,
        };
        let tol = self.conv.tolerance;

        let top = self.top;
        let actor = &mut self.actor;
        let sites = &mut self.sites;
        let pol_sphere = &self.pol_sphere;

        // Inter-site fields arising from the permanent moments. Built once;
        // they do not change over the SCF.
        for (n, &a) in pol_sphere.iter().enumerate() {
            for &b in pol_sphere[n + 1..].iter() {
                let (seg_a, seg_b) = segment_pair_mut(sites, a, b);
                for p1 in seg_a.iter_mut() {
                    for p2 in seg_b.iter_mut() {
                        let r12 = top.pb_shortest_connect(p1.pos, p2.pos);
                        actor.field_perm(r12, p1, p2);
                    }
                }
            }
        }

        // First-order induction. Only the neutral state starts from the
        // direct estimate; charged states keep their seed dipoles.
        if state == ChargeState::Neutral {
            for &s in pol_sphere.iter() {
                for site in sites[s].iter_mut() {
                    site.induce_direct();
                }
            }
        }

        // Higher-order induction.
        for iter in 0..self.conv.maxiter {
            for &s in pol_sphere.iter() {
                for site in sites[s].iter_mut() {
                    site.reset_field_u();
                }
            }

            // Intra-segment contribution to the induction field.
            for &s in pol_sphere.iter() {
                let seg_sites = &mut sites[s];
                for i in 0..seg_sites.len() {
                    for j in i + 1..seg_sites.len() {
                        let (p1, p2) = site_pair_mut(seg_sites, i, j);
                        let r12 = top.pb_shortest_connect(p1.pos, p2.pos);
                        actor.field_indu(r12, p1, p2);
                    }
                }
            }

            // Inter-segment contribution to the induction field.
            for (n, &a) in pol_sphere.iter().enumerate() {
                for &b in pol_sphere[n + 1..].iter() {
                    let (seg_a, seg_b) = segment_pair_mut(sites, a, b);
                    for p1 in seg_a.iter_mut() {
                        for p2 in seg_b.iter_mut() {
                            let r12 = top.pb_shortest_connect(p1.pos, p2.pos);
                            actor.field_indu(r12, p1, p2);
                        }
                    }
                }
            }

            // Induce again.
            for &s in pol_sphere.iter() {
                for site in sites[s].iter_mut() {
                    site.induce(wsor);
                }
            }

            // Check for convergence.
            let mut maxdu: f64 = -1.0;
            let mut avgdu = 0.0;
            let mut base_n = 0;
            for &s in pol_sphere.iter() {
                for site in sites[s].iter() {
                    let du = site.hist_du();
                    avgdu += du;
                    base_n += 1;
                    maxdu = maxdu.max(du);
                }
            }
            avgdu /= base_n as f64;
            let converged = maxdu <= tol || avgdu < tol / 10.0;

            if converged {
                return (iter, InductionStatus::Converged);
            } else if iter == self.conv.maxiter - 1 {
                eprintln!(
                    "WARNING Induced multipoles for site {} - state {state} \
                     did not converge to precision: AVG dU:U {avgdu:.2e}",
                    self.top.segments[seg_idx].id,
                );
                return (iter, InductionStatus::NotConverged);
            }
        }

        (0, InductionStatus::Converged)
    }

    /// Electrostatic + induction energy of the central segment: pair sum
    /// over the polarization shell plus the static coupling to the outer
    /// shell. Intra-segment couplings are excluded from the reduction.
    fn energy(&mut self, seg_idx: usize) -> Energy {
        self.actor.reset_energy();
        let mut e_tot = 0.0;

        let top = self.top;
        let actor = &mut self.actor;
        let sites = &mut self.sites;

        // Inter-site energy within the polarization sphere.
        for (n, &a) in self.pol_sphere.iter().enumerate() {
            for &b in self.pol_sphere[n + 1..].iter() {
                let (seg_a, seg_b) = segment_pair_mut(sites, a, b);
                for p1 in seg_a.iter_mut() {
                    for p2 in seg_b.iter_mut() {
                        let r12 = top.pb_shortest_connect(p1.pos, p2.pos);
                        e_tot += actor.energy_inter(r12, p1, p2);
                    }
                }
            }
        }

        // Outer-shell energy: static shell against the central segment.
        for &o in self.out_sphere.iter() {
            let (outer, central) = match o < seg_idx {
                true => segment_pair_mut(sites, o, seg_idx),
                false => {
                    let (c, s) = segment_pair_mut(sites, seg_idx, o);
                    (s, c)
                }
            };
            for p1 in outer.iter_mut() {
                for p2 in central.iter_mut() {
                    let r12 = top.pb_shortest_connect(p1.pos, p2.pos);
                    e_tot += actor.energy_inter(r12, p1, p2);
                }
            }
        }

        e_tot
    }

    /// Static-only energy: the central segment against the polarization
    /// shell, induced dipoles untouched.
    fn energy_static(&mut self, seg_idx: usize) -> Energy {
        self.actor.reset_energy();
        let mut e_tot = 0.0;

        let top = self.top;
        let actor = &mut self.actor;
        let sites = &mut self.sites;

        for &s in self.pol_sphere.iter() {
            if s == seg_idx {
                continue;
            }
            let (other, central) = match s < seg_idx {
                true => segment_pair_mut(sites, s, seg_idx),
                false => {
                    let (c, o) = segment_pair_mut(sites, seg_idx, s);
                    (o, c)
                }
            };
            for p1 in other.iter_mut() {
                for p2 in central.iter_mut() {
                    let r12 = top.pb_shortest_connect(p1.pos, p2.pos);
                    e_tot += actor.energy_inter(r12, p1, p2);
                }
            }
        }

        e_tot
    }
}

/// Mutable access to the site arrays of two distinct segments.
fn segment_pair_mut(
    sites: &mut [Vec<PolarSite>],
    a: usize,
    b: usize,
) -> (&mut [PolarSite], &mut [PolarSite]) {
    debug_assert!(a < b);
    let (left, right) = sites.split_at_mut(b);
    (&mut left[a], &mut right[0])
}

/// Mutable access to two distinct sites of one segment.
fn site_pair_mut(sites: &mut [PolarSite], i: usize, j: usize) -> (&mut PolarSite, &mut PolarSite) {
    debug_assert!(i < j);
    let (left, right) = sites.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

#[cfg(test)]
mod test {
    use super::*;
    use topology::{PeriodicCell, Segment};

    fn create_point_charge(q: f64, pos: Vector3<f64>, p1: f64) -> PolarSite {
        let mut site = PolarSite::new(1, "C", 0, pos);
        site.set_qs(vec![q], ChargeState::Neutral);
        site.set_ps(p1, ChargeState::Neutral);
        site
    }

    fn create_pair_topology(separation: f64, p1: f64) -> Topology {
        let mut top = Topology::new(PeriodicCell::Open);
        top.push_segment(Segment::from_sites(
            1,
            "PLUS",
            vec![create_point_charge(1.0, Vector3::zeros(), p1)],
        ));
        top.push_segment(Segment::from_sites(
            2,
            "MINUS",
            vec![create_point_charge(
                -1.0,
                Vector3::new(0.0, 0.0, separation),
                p1,
            )],
        ));
        top
    }

    #[test]
    fn test_two_point_charges() {
        let top = create_pair_topology(1.0, 0.0);
        let thole = TholeParams::build(3.0, None, 0.0).unwrap();
        let conv = ConvParams::default();

        let mut evaluator = SiteEvaluator::new(&top, &thole, &conv, true).unwrap();
        let result = evaluator.eval_site(0).unwrap();

        let e = result.energies[ChargeState::Neutral.index()].unwrap();
        assert!((e - (-INT2EV)).abs() < 1e-9);
        assert_eq!(result.sphere_size, 2);
    }

    #[test]
    fn test_zero_system_is_exactly_zero() {
        let mut top = Topology::new(PeriodicCell::Open);
        top.push_segment(Segment::from_sites(
            1,
            "NULL",
            vec![create_point_charge(0.0, Vector3::zeros(), 1e-3)],
        ));
        top.push_segment(Segment::from_sites(
            2,
            "NULL",
            vec![create_point_charge(0.0, Vector3::new(0.0, 0.0, 0.5), 1e-3)],
        ));

        let thole = TholeParams::build(3.0, None, 0.39).unwrap();
        let conv = ConvParams::default();
        let mut evaluator = SiteEvaluator::new(&top, &thole, &conv, true).unwrap();
        let result = evaluator.eval_site(0).unwrap();

        assert_eq!(result.energies[ChargeState::Neutral.index()], Some(0.0));
        assert!(result.statuses[ChargeState::Neutral.index()].is_converged());
    }

    #[test]
    fn test_missing_state_skipped() {
        let top = create_pair_topology(1.0, 0.0);
        let thole = TholeParams::build(3.0, None, 0.0).unwrap();
        let conv = ConvParams::default();

        let mut evaluator = SiteEvaluator::new(&top, &thole, &conv, true).unwrap();
        let result = evaluator.eval_site(0).unwrap();

        assert!(result.energies[ChargeState::Anion.index()].is_none());
        assert!(result.statuses[ChargeState::Anion.index()].is_skipped());
    }

    #[test]
    fn test_static_only_energy() {
        let top = create_pair_topology(1.0, 1e-3);
        let thole = TholeParams::build(3.0, None, 0.39).unwrap();
        let conv = ConvParams::default();

        let mut evaluator = SiteEvaluator::new(&top, &thole, &conv, false).unwrap();
        let result = evaluator.eval_site(0).unwrap();

        let e = result.energies[ChargeState::Neutral.index()].unwrap();
        assert!((e - (-INT2EV)).abs() < 1e-9);
        assert!(result.statuses[ChargeState::Neutral.index()].is_static_only());
    }

    #[test]
    fn test_polarizable_pair_induction_lowering() {
        let top = create_pair_topology(1.0, 1e-3);
        let thole = TholeParams::build(3.0, None, 0.39).unwrap();
        let conv = ConvParams {
            tolerance: 1e-6,
            ..Default::default()
        };

        let mut evaluator = SiteEvaluator::new(&top, &thole, &conv, true).unwrap();
        let result = evaluator.eval_site(0).unwrap();

        let e = result.energies[ChargeState::Neutral.index()].unwrap();
        let iters = result.iters[ChargeState::Neutral.index()];

        assert!(result.statuses[ChargeState::Neutral.index()].is_converged());
        assert!(iters <= 20);
        // Induction strictly lowers the pair energy below the static value.
        assert!(e < -INT2EV);
    }

    #[test]
    fn test_out_of_range_segment_ignored() {
        let top = create_pair_topology(10.0, 0.0);
        let thole = TholeParams::build(1.0, Some(2.0), 0.0).unwrap();
        let conv = ConvParams::default();

        let mut evaluator = SiteEvaluator::new(&top, &thole, &conv, true).unwrap();
        let result = evaluator.eval_site(0).unwrap();

        assert_eq!(result.sphere_size, 1);
        assert_eq!(result.energies[ChargeState::Neutral.index()], Some(0.0));
    }
}
