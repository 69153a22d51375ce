use nalgebra::Vector3;

/// Periodic cell under which minimum-image displacements are computed.
#[derive(Debug, Clone, Default)]
pub enum PeriodicCell {
    /// No periodicity; displacements are plain differences.
    #[default]
    Open,
    /// Rectangular box with edge lengths in nm.
    Orthorhombic { a: f64, b: f64, c: f64 },
}

impl PeriodicCell {
    /// Creates a cubic cell with edge length `a` nm.
    pub fn cubic(a: f64) -> Self {
        Self::Orthorhombic { a, b: a, c: a }
    }

    /// The minimum-image displacement pointing from `from` to `to`.
    ///
    /// Satisfies `shortest_connect(a, b) == -shortest_connect(b, a)`.
    pub fn shortest_connect(&self, from: Vector3<f64>, to: Vector3<f64>) -> Vector3<f64> {
        let mut r = to - from;
        match self {
            PeriodicCell::Open => r,
            PeriodicCell::Orthorhombic { a, b, c } => {
                r.x -= a * (r.x / a).round();
                r.y -= b * (r.y / b).round();
                r.z -= c * (r.z / c).round();
                r
            }
        }
    }
}
