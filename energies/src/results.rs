use ndarray::Array1;

use induction::SiteResult;
use multipoles::ChargeState;
use utils::array1d_getter_impl;

/// Collected results of one sweep, sorted by segment id.
///
/// Per-segment energies are independent of the worker count and of the
/// segment-to-worker assignment, so the sorted table is deterministic.
#[derive(Default, Clone)]
pub struct SweepResults {
    /// One result per processed segment, ascending by id.
    pub sites: Vec<SiteResult>,

    total: usize,
    converged: usize,
    not_converged: usize,
    static_only: usize,

    // Energy columns, NaN where a state is not templated.
    e_neutral: Vec<f64>,
    e_anion: Vec<f64>,
    e_cation: Vec<f64>,
}

impl SweepResults {
    /// Sorts the collected results and builds the summary.
    pub fn new(mut sites: Vec<SiteResult>) -> Self {
        sites.sort_by_key(|r| r.seg_id);

        let column = |state: ChargeState, sites: &[SiteResult]| {
            sites
                .iter()
                .map(|r| r.energies[state.index()].unwrap_or(f64::NAN))
                .collect()
        };

        let mut results = Self {
            e_neutral: column(ChargeState::Neutral, &sites),
            e_anion: column(ChargeState::Anion, &sites),
            e_cation: column(ChargeState::Cation, &sites),
            sites,
            ..Default::default()
        };
        results.calculate_status_nums();
        results
    }

    /// Counts the occurrences of each [`InductionStatus`] variant over all
    /// evaluated states.
    fn calculate_status_nums(&mut self) {
        macro_rules! count_variants {
            ($is_enum:ident) => {
                self.sites
                    .iter()
                    .flat_map(|r| r.statuses.iter())
                    .filter(|s| s.$is_enum())
                    .count()
            };
        }
        self.converged = count_variants!(is_converged);
        self.not_converged = count_variants!(is_not_converged);
        self.static_only = count_variants!(is_static_only);
        self.total = self.sites.len();
    }

    /// Looks up the result of a segment by id.
    pub fn get(&self, seg_id: usize) -> Option<&SiteResult> {
        self.sites.iter().find(|r| r.seg_id == seg_id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

// Make the energy columns available as arrays.
impl SweepResults {
    array1d_getter_impl!(energies_neutral, e_neutral);
    array1d_getter_impl!(energies_anion, e_anion);
    array1d_getter_impl!(energies_cation, e_cation);
}

impl std::fmt::Debug for SweepResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepResults")
            .field("total segments", &self.total)
            .field("converged states", &self.converged)
            .field("not converged", &self.not_converged)
            .field("static only", &self.static_only)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use induction::InductionStatus;
    use nalgebra::Vector3;

    fn create_result(seg_id: usize, e: f64) -> SiteResult {
        SiteResult {
            seg_id,
            name: "SEG".into(),
            energies: [None, Some(e), None],
            iters: [0, 3, 0],
            statuses: [
                InductionStatus::Skipped,
                InductionStatus::Converged,
                InductionStatus::Skipped,
            ],
            sphere_size: 1,
            com: Vector3::zeros(),
        }
    }

    #[test]
    fn test_results_sorted_by_id() {
        let results = SweepResults::new(vec![
            create_result(3, 0.3),
            create_result(1, 0.1),
            create_result(2, 0.2),
        ]);
        let ids: Vec<usize> = results.sites.iter().map(|r| r.seg_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let energies = results.energies_neutral();
        assert_eq!(energies[0], 0.1);
        assert_eq!(energies[2], 0.3);
        assert!(results.energies_anion()[0].is_nan());
    }

    #[test]
    fn test_status_counts() {
        let results = SweepResults::new(vec![create_result(1, 0.1), create_result(2, 0.2)]);
        let _ = format!("{results:?}");
        assert_eq!(results.len(), 2);
        assert_eq!(results.get(2).unwrap().seg_id, 2);
        assert!(results.get(9).is_none());
    }
}
