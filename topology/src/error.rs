#[derive(thiserror::Error, Debug)]
pub enum TopologyError {
    /// Error from [`multipoles`].
    #[error("Multipole error: {0}")]
    Multipole(#[from] multipoles::MultipoleError),

    /// A segment references a template name that was never loaded.
    #[error("No multipole template for segment type '{name}'")]
    UnknownSegment { name: String },

    /// map2md needs one stored atom position per polar site.
    #[error("Segment '{segment}': map2md requires {expected} atom positions, found {found}")]
    Map2MdCount {
        segment: String,
        expected: usize,
        found: usize,
    },

    /// map2md cannot reposition higher-rank multipoles.
    #[error("Segment '{segment}': map2md prevents use of higher-rank multipoles (site {site})")]
    Map2MdRank { segment: String, site: usize },
}
