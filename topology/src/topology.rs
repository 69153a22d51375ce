use nalgebra::Vector3;

use multipoles::Templates;

use crate::{Length, PeriodicCell, Placement, Result, Segment, TopologyError};

/// The full simulated system: an ordered collection of segments plus the
/// periodic cell they live in.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub segments: Vec<Segment>,
    pub cell: PeriodicCell,
}

// Creation
impl Topology {
    pub fn new(cell: PeriodicCell) -> Self {
        Self {
            segments: Vec::new(),
            cell,
        }
    }

    /// Appends an empty segment of type `name` and returns its id.
    pub fn add_segment(&mut self, name: &str, placement: Placement) -> usize {
        let id = self.segments.len() + 1;
        self.segments.push(Segment::new(id, name, placement));
        id
    }

    /// Appends an already-built segment, renumbering it to the next id.
    pub fn push_segment(&mut self, mut segment: Segment) -> usize {
        let id = self.segments.len() + 1;
        segment.id = id;
        self.segments.push(segment);
        id
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

// Geometry
impl Topology {
    /// The minimum-image displacement pointing from `from` to `to`.
    pub fn pb_shortest_connect(&self, from: Vector3<f64>, to: Vector3<f64>) -> Vector3<f64> {
        self.cell.shortest_connect(from, to)
    }

    /// The minimum-image distance between two points.
    pub fn pb_distance(&self, from: Vector3<f64>, to: Vector3<f64>) -> Length {
        self.cell.shortest_connect(from, to).norm()
    }
}

// Template projection
impl Topology {
    /// Equips every segment with polar sites from its template set.
    ///
    /// Template sites are either carried through the segment's rigid
    /// [`Placement`], or, for map2md templates, repositioned onto the
    /// segment's stored atom positions. The latter rejects sites of rank
    /// above 0, whose moments cannot survive a positions-only mapping.
    pub fn distribute(&mut self, templates: &Templates) -> Result<()> {
        for seg in self.segments.iter_mut() {
            let set = templates
                .get(&seg.name)
                .ok_or_else(|| TopologyError::UnknownSegment {
                    name: seg.name.clone(),
                })?;

            if set.map2md && seg.atoms.len() != set.sites.len() {
                return Err(TopologyError::Map2MdCount {
                    segment: seg.name.clone(),
                    expected: set.sites.len(),
                    found: seg.atoms.len(),
                });
            }

            seg.sites.clear();
            for (i, templ) in set.sites.iter().enumerate() {
                let mut site = templ.clone();
                if set.map2md {
                    if site.rank > 0 {
                        return Err(TopologyError::Map2MdRank {
                            segment: seg.name.clone(),
                            site: site.id,
                        });
                    }
                    site.pos = seg.atoms[i];
                } else {
                    site.pos = seg.placement.apply(site.pos);
                }
                seg.sites.push(site);
            }
            seg.chrg_states = set.chrg_states;
            seg.update_pos();
        }
        Ok(())
    }
}
