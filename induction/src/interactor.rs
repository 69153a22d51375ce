use nalgebra::Vector3;

use config::THOLE_UNDAMPED_GUARD;
use multipoles::PolarSite;

use crate::Energy;

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Pairwise multipole interaction kernel, up to quadrupole-quadrupole.
///
/// All methods are pure functions of the displacement handed in by the
/// caller (already minimum-imaged) and the two site references; the struct
/// itself only carries the Thole parameter, per-pair scratch registers and
/// the running energy accumulators.
///
/// The displacement always points from site 1 to site 2, which implies
/// `induced = -polarizability * field` for the accumulated fields.
pub struct Interactor {
    /// Interaction of permanent multipoles (inter-site).
    ep: Energy,
    /// Interaction of induced multipoles (inter-site).
    eu_inter: Energy,
    /// Interaction of induced multipoles (intra-site).
    eu_intra: Energy,

    /// Thole damping parameter.
    a: f64,

    // Per-pair scratch registers.
    e12: Vector3<f64>,
    u3: f64,
    damp: bool,

    // Reciprocal distance powers, e.g. r3 = 1/|r|³.
    r: f64,
    r2: f64,
    r3: f64,
    r4: f64,
    r5: f64,

    // Direction cosines of e12 in the two site frames.
    rax: f64,
    ray: f64,
    raz: f64,
    rbx: f64,
    rby: f64,
    rbz: f64,

    // Frame-coupling matrix. Per-site local frames are a disabled extension;
    // with axis-aligned frames this is the identity throughout.
    cxx: f64,
    cxy: f64,
    cxz: f64,
    cyx: f64,
    cyy: f64,
    cyz: f64,
    czx: f64,
    czy: f64,
    czz: f64,
}

// Creation
impl Interactor {
    /// Creates a kernel with Thole parameter `expdamp`.
    pub fn new(expdamp: f64) -> Self {
        Self {
            ep: 0.0,
            eu_inter: 0.0,
            eu_intra: 0.0,
            a: expdamp,
            e12: Vector3::zeros(),
            u3: 0.0,
            damp: false,
            r: 0.0,
            r2: 0.0,
            r3: 0.0,
            r4: 0.0,
            r5: 0.0,
            rax: 0.0,
            ray: 0.0,
            raz: 0.0,
            rbx: 0.0,
            rby: 0.0,
            rbz: 0.0,
            cxx: 1.0,
            cxy: 0.0,
            cxz: 0.0,
            cyx: 0.0,
            cyy: 1.0,
            cyz: 0.0,
            czx: 0.0,
            czy: 0.0,
            czz: 1.0,
        }
    }

    /// Zeroes all three energy accumulators.
    pub fn reset_energy(&mut self) {
        self.ep = 0.0;
        self.eu_inter = 0.0;
        self.eu_intra = 0.0;
    }

    /// Accumulated permanent-permanent energy.
    pub fn ep(&self) -> Energy {
        self.ep
    }

    /// Accumulated inter-site induction energy.
    pub fn eu_inter(&self) -> Energy {
        self.eu_inter
    }

    /// Accumulated intra-site induction energy.
    pub fn eu_intra(&self) -> Energy {
        self.eu_intra
    }
}

// Scratch-register setup
impl Interactor {
    /// Loads the distance powers and direction cosines for a pair at
    /// displacement `r12` (pointing from site 1 to site 2).
    fn init_pair(&mut self, r12: Vector3<f64>) {
        self.r = 1.0 / r12.norm();
        self.r2 = self.r * self.r;
        self.r3 = self.r2 * self.r;
        self.r4 = self.r3 * self.r;
        self.r5 = self.r4 * self.r;
        self.e12 = r12 * self.r;

        self.rax = self.e12.x;
        self.ray = self.e12.y;
        self.raz = self.e12.z;
        self.rbx = -self.rax;
        self.rby = -self.ray;
        self.rbz = -self.raz;
    }

    /// Loads the Thole damping state for the current pair.
    ///
    /// Beyond a·u³ ≥ 40 the λ's are indistinguishable from 1 at working
    /// precision and the undamped tensors take over.
    fn init_thole(&mut self, pol1: &PolarSite, pol2: &PolarSite) {
        self.u3 = 1.0 / (self.r3 * (pol1.p1 * pol2.p1).sqrt());
        self.damp = self.a > 0.0 && self.a * self.u3 < THOLE_UNDAMPED_GUARD;
    }

    fn lambda3(&self) -> f64 {
        1.0 - (-self.a * self.u3).exp()
    }

    fn lambda5(&self) -> f64 {
        let au3 = self.a * self.u3;
        1.0 - (1.0 + au3) * (-au3).exp()
    }

    fn lambda7(&self) -> f64 {
        let au3 = self.a * self.u3;
        1.0 - (1.0 + au3 + 0.6 * au3 * au3) * (-au3).exp()
    }

    fn lambda9(&self) -> f64 {
        let au3 = self.a * self.u3;
        1.0 - (1.0 + au3 + (18.0 * au3 * au3 + 9.0 * au3 * au3 * au3) / 35.0) * (-au3).exp()
    }
}

// Spherical interaction tensors T(l1,m1; l2,m2), undamped.
#[rustfmt::skip]
impl Interactor {
    fn t00_00(&self) -> f64 { self.r }

    fn t1x_00(&self) -> f64 { self.r2 * self.rax }
    fn t1y_00(&self) -> f64 { self.r2 * self.ray }
    fn t1z_00(&self) -> f64 { self.r2 * self.raz }
    fn t00_1x(&self) -> f64 { self.r2 * self.rbx }
    fn t00_1y(&self) -> f64 { self.r2 * self.rby }
    fn t00_1z(&self) -> f64 { self.r2 * self.rbz }

    fn t20_00(&self) -> f64 { self.r3 * 0.5 * (3.0 * self.raz * self.raz - 1.0) }
    fn t21c_00(&self) -> f64 { self.r3 * SQRT3 * self.rax * self.raz }
    fn t21s_00(&self) -> f64 { self.r3 * SQRT3 * self.ray * self.raz }
    fn t22c_00(&self) -> f64 { self.r3 * 0.5 * SQRT3 * (self.rax * self.rax - self.ray * self.ray) }
    fn t22s_00(&self) -> f64 { self.r3 * SQRT3 * self.rax * self.ray }
    fn t00_20(&self) -> f64 { self.r3 * 0.5 * (3.0 * self.rbz * self.rbz - 1.0) }
    fn t00_21c(&self) -> f64 { self.r3 * SQRT3 * self.rbx * self.rbz }
    fn t00_21s(&self) -> f64 { self.r3 * SQRT3 * self.rby * self.rbz }
    fn t00_22c(&self) -> f64 { self.r3 * 0.5 * SQRT3 * (self.rbx * self.rbx - self.rby * self.rby) }
    fn t00_22s(&self) -> f64 { self.r3 * SQRT3 * self.rbx * self.rby }

    fn t1x_1x(&self) -> f64 { self.r3 * (3.0 * self.rax * self.rbx + self.cxx) }
    fn t1x_1y(&self) -> f64 { self.r3 * (3.0 * self.rax * self.rby + self.cxy) }
    fn t1x_1z(&self) -> f64 { self.r3 * (3.0 * self.rax * self.rbz + self.cxz) }
    fn t1y_1x(&self) -> f64 { self.r3 * (3.0 * self.ray * self.rbx + self.cyx) }
    fn t1y_1y(&self) -> f64 { self.r3 * (3.0 * self.ray * self.rby + self.cyy) }
    fn t1y_1z(&self) -> f64 { self.r3 * (3.0 * self.ray * self.rbz + self.cyz) }
    fn t1z_1x(&self) -> f64 { self.r3 * (3.0 * self.raz * self.rbx + self.czx) }
    fn t1z_1y(&self) -> f64 { self.r3 * (3.0 * self.raz * self.rby + self.czy) }
    fn t1z_1z(&self) -> f64 { self.r3 * (3.0 * self.raz * self.rbz + self.czz) }

    fn t20_1x(&self) -> f64 { self.r4 * 0.5 * (15.0 * self.raz * self.raz * self.rbx + 6.0 * self.raz * self.czx - 3.0 * self.rbx) }
    fn t20_1y(&self) -> f64 { self.r4 * 0.5 * (15.0 * self.raz * self.raz * self.rby + 6.0 * self.raz * self.czy - 3.0 * self.rby) }
    fn t20_1z(&self) -> f64 { self.r4 * 0.5 * (15.0 * self.raz * self.raz * self.rbz + 6.0 * self.raz * self.czz - 3.0 * self.rbz) }
    fn t21c_1x(&self) -> f64 { self.r4 * SQRT3 * (self.rax * self.czx + self.cxx * self.raz + 5.0 * self.rax * self.raz * self.rbx) }
    fn t21c_1y(&self) -> f64 { self.r4 * SQRT3 * (self.rax * self.czy + self.cxy * self.raz + 5.0 * self.rax * self.raz * self.rby) }
    fn t21c_1z(&self) -> f64 { self.r4 * SQRT3 * (self.rax * self.czz + self.cxz * self.raz + 5.0 * self.rax * self.raz * self.rbz) }
    fn t21s_1x(&self) -> f64 { self.r4 * SQRT3 * (self.ray * self.czx + self.cyx * self.raz + 5.0 * self.ray * self.raz * self.rbx) }
    fn t21s_1y(&self) -> f64 { self.r4 * SQRT3 * (self.ray * self.czy + self.cyy * self.raz + 5.0 * self.ray * self.raz * self.rby) }
    fn t21s_1z(&self) -> f64 { self.r4 * SQRT3 * (self.ray * self.czz + self.cyz * self.raz + 5.0 * self.ray * self.raz * self.rbz) }
    fn t22c_1x(&self) -> f64 { self.r4 * 0.5 * SQRT3 * (5.0 * (self.rax * self.rax - self.ray * self.ray) * self.rbx + 2.0 * self.rax * self.cxx - 2.0 * self.ray * self.cyx) }
    fn t22c_1y(&self) -> f64 { self.r4 * 0.5 * SQRT3 * (5.0 * (self.rax * self.rax - self.ray * self.ray) * self.rby + 2.0 * self.rax * self.cxy - 2.0 * self.ray * self.cyy) }
    fn t22c_1z(&self) -> f64 { self.r4 * 0.5 * SQRT3 * (5.0 * (self.rax * self.rax - self.ray * self.ray) * self.rbz + 2.0 * self.rax * self.cxz - 2.0 * self.ray * self.cyz) }
    fn t22s_1x(&self) -> f64 { self.r4 * SQRT3 * (5.0 * self.rax * self.ray * self.rbx + self.rax * self.cyx + self.ray * self.cxx) }
    fn t22s_1y(&self) -> f64 { self.r4 * SQRT3 * (5.0 * self.rax * self.ray * self.rby + self.rax * self.cyy + self.ray * self.cxy) }
    fn t22s_1z(&self) -> f64 { self.r4 * SQRT3 * (5.0 * self.rax * self.ray * self.rbz + self.rax * self.cyz + self.ray * self.cxz) }

    fn t1x_20(&self) -> f64 { self.r4 * 0.5 * (15.0 * self.rbz * self.rbz * self.rax + 6.0 * self.rbz * self.cxz - 3.0 * self.rax) }
    fn t1y_20(&self) -> f64 { self.r4 * 0.5 * (15.0 * self.rbz * self.rbz * self.ray + 6.0 * self.rbz * self.cyz - 3.0 * self.ray) }
    fn t1z_20(&self) -> f64 { self.r4 * 0.5 * (15.0 * self.rbz * self.rbz * self.raz + 6.0 * self.rbz * self.czz - 3.0 * self.raz) }
    fn t1x_21c(&self) -> f64 { self.r4 * SQRT3 * (self.rbx * self.cxz + self.cxx * self.rbz + 5.0 * self.rbx * self.rbz * self.rax) }
    fn t1y_21c(&self) -> f64 { self.r4 * SQRT3 * (self.rbx * self.cyz + self.cyx * self.rbz + 5.0 * self.rbx * self.rbz * self.ray) }
    fn t1z_21c(&self) -> f64 { self.r4 * SQRT3 * (self.rbx * self.czz + self.czx * self.rbz + 5.0 * self.rbx * self.rbz * self.raz) }
    fn t1x_21s(&self) -> f64 { self.r4 * SQRT3 * (self.rby * self.cxz + self.cxy * self.rbz + 5.0 * self.rby * self.rbz * self.rax) }
    fn t1y_21s(&self) -> f64 { self.r4 * SQRT3 * (self.rby * self.cyz + self.cyy * self.rbz + 5.0 * self.rby * self.rbz * self.ray) }
    fn t1z_21s(&self) -> f64 { self.r4 * SQRT3 * (self.rby * self.czz + self.czy * self.rbz + 5.0 * self.rby * self.rbz * self.raz) }
    fn t1x_22c(&self) -> f64 { self.r4 * 0.5 * SQRT3 * (5.0 * (self.rbx * self.rbx - self.rby * self.rby) * self.rax + 2.0 * self.rbx * self.cxx - 2.0 * self.rby * self.cxy) }
    fn t1y_22c(&self) -> f64 { self.r4 * 0.5 * SQRT3 * (5.0 * (self.rbx * self.rbx - self.rby * self.rby) * self.ray + 2.0 * self.rbx * self.cyx - 2.0 * self.rby * self.cyy) }
    fn t1z_22c(&self) -> f64 { self.r4 * 0.5 * SQRT3 * (5.0 * (self.rbx * self.rbx - self.rby * self.rby) * self.raz + 2.0 * self.rbx * self.czx - 2.0 * self.rby * self.czy) }
    fn t1x_22s(&self) -> f64 { self.r4 * SQRT3 * (5.0 * self.rbx * self.rby * self.rax + self.rbx * self.cxy + self.rby * self.cxx) }
    fn t1y_22s(&self) -> f64 { self.r4 * SQRT3 * (5.0 * self.rbx * self.rby * self.ray + self.rbx * self.cyy + self.rby * self.cyx) }
    fn t1z_22s(&self) -> f64 { self.r4 * SQRT3 * (5.0 * self.rbx * self.rby * self.raz + self.rbx * self.czy + self.rby * self.czx) }

    fn t20_20(&self) -> f64 { self.r5 * 0.75 * (35.0 * self.raz * self.raz * self.rbz * self.rbz - 5.0 * self.raz * self.raz - 5.0 * self.rbz * self.rbz + 20.0 * self.raz * self.rbz * self.czz + 2.0 * self.czz * self.czz + 1.0) }
    fn t20_21c(&self) -> f64 { self.r5 * 0.5 * SQRT3 * (35.0 * self.raz * self.raz * self.rbx * self.rbz - 5.0 * self.rbx * self.rbz + 10.0 * self.raz * self.rbx * self.czz + 10.0 * self.raz * self.rbz * self.czx + 2.0 * self.czx * self.czz) }
    fn t20_21s(&self) -> f64 { self.r5 * 0.5 * SQRT3 * (35.0 * self.raz * self.raz * self.rby * self.rbz - 5.0 * self.rby * self.rbz + 10.0 * self.raz * self.rby * self.czz + 10.0 * self.raz * self.rbz * self.czy + 2.0 * self.czy * self.czz) }
    fn t20_22c(&self) -> f64 { self.r5 * 0.25 * SQRT3 * (35.0 * self.raz * self.raz * self.rbx * self.rbx - 35.0 * self.raz * self.raz * self.rby * self.rby - 5.0 * self.rbx * self.rbx + 5.0 * self.rby * self.rby + 20.0 * self.raz * self.rbx * self.czx - 20.0 * self.raz * self.rby * self.czy + 2.0 * self.czx * self.czx - 2.0 * self.czy * self.czy) }
    fn t20_22s(&self) -> f64 { self.r5 * 0.5 * SQRT3 * (35.0 * self.raz * self.raz * self.rbx * self.rby - 5.0 * self.rbx * self.rby + 10.0 * self.raz * self.rbx * self.czy + 10.0 * self.raz * self.rby * self.czx + 2.0 * self.czx * self.czy) }
    fn t21c_21c(&self) -> f64 { self.r5 * (35.0 * self.rax * self.raz * self.rbx * self.rbz + 5.0 * self.rax * self.rbx * self.czz + 5.0 * self.rax * self.rbz * self.czx + 5.0 * self.raz * self.rbx * self.cxz + 5.0 * self.raz * self.rbz * self.cxx + self.cxx * self.czz + self.cxz * self.czx) }
    fn t21c_21s(&self) -> f64 { self.r5 * (35.0 * self.rax * self.raz * self.rby * self.rbz + 5.0 * self.rax * self.rby * self.czz + 5.0 * self.rax * self.rbz * self.czy + 5.0 * self.raz * self.rby * self.cxz + 5.0 * self.raz * self.rbz * self.cxy + self.cxy * self.czz + self.cxz * self.czy) }
    fn t21c_22c(&self) -> f64 { self.r5 * 0.5 * (35.0 * self.rax * self.raz * self.rbx * self.rbx - 35.0 * self.rax * self.raz * self.rby * self.rby + 10.0 * self.rax * self.rbx * self.czx - 10.0 * self.rax * self.rby * self.czy + 10.0 * self.raz * self.rbx * self.cxx - 10.0 * self.raz * self.rby * self.cxy + 2.0 * self.cxx * self.czx - 2.0 * self.cxy * self.czy) }
    fn t21c_22s(&self) -> f64 { self.r5 * (35.0 * self.rax * self.raz * self.rbx * self.rby + 5.0 * self.rax * self.rbx * self.czy + 5.0 * self.rax * self.rby * self.czx + 5.0 * self.raz * self.rbx * self.cxy + 5.0 * self.raz * self.rby * self.cxx + self.cxx * self.czy + self.cxy * self.czx) }
    fn t21s_21s(&self) -> f64 { self.r5 * (35.0 * self.ray * self.raz * self.rby * self.rbz + 5.0 * self.ray * self.rby * self.czz + 5.0 * self.ray * self.rbz * self.czy + 5.0 * self.raz * self.rby * self.cyz + 5.0 * self.raz * self.rbz * self.cyy + self.cyy * self.czz + self.cyz * self.czy) }
    fn t21s_22c(&self) -> f64 { self.r5 * 0.5 * (35.0 * self.ray * self.raz * self.rbx * self.rbx - 35.0 * self.ray * self.raz * self.rby * self.rby + 10.0 * self.ray * self.rbx * self.czx - 10.0 * self.ray * self.rby * self.czy + 10.0 * self.raz * self.rbx * self.cyx - 10.0 * self.raz * self.rby * self.cyy + 2.0 * self.cyx * self.czx - 2.0 * self.cyy * self.czy) }
    fn t21s_22s(&self) -> f64 { self.r5 * (35.0 * self.ray * self.raz * self.rbx * self.rby + 5.0 * self.ray * self.rbx * self.czy + 5.0 * self.ray * self.rby * self.czx + 5.0 * self.raz * self.rbx * self.cyy + 5.0 * self.raz * self.rby * self.cyx + self.cyx * self.czy + self.cyy * self.czx) }
    fn t22c_22c(&self) -> f64 { self.r5 * 0.25 * (35.0 * self.rax * self.rax * self.rbx * self.rbx - 35.0 * self.rax * self.rax * self.rby * self.rby - 35.0 * self.ray * self.ray * self.rbx * self.rbx + 35.0 * self.ray * self.ray * self.rby * self.rby + 20.0 * self.rax * self.rbx * self.cxx - 20.0 * self.rax * self.rby * self.cxy - 20.0 * self.ray * self.rbx * self.cyx + 20.0 * self.ray * self.rby * self.cyy + 2.0 * self.cxx * self.cxx - 2.0 * self.cxy * self.cxy - 2.0 * self.cyx * self.cyx + 2.0 * self.cyy * self.cyy) }
    fn t22c_22s(&self) -> f64 { self.r5 * 0.5 * (35.0 * self.rax * self.rax * self.rbx * self.rby - 35.0 * self.ray * self.ray * self.rbx * self.rby + 10.0 * self.rax * self.rbx * self.cxy + 10.0 * self.rax * self.rby * self.cxx - 10.0 * self.ray * self.rbx * self.cyy - 10.0 * self.ray * self.rby * self.cyx + 2.0 * self.cxx * self.cxy - 2.0 * self.cyx * self.cyy) }
    fn t22s_22s(&self) -> f64 { self.r5 * (35.0 * self.rax * self.ray * self.rbx * self.rby + 5.0 * self.rax * self.rbx * self.cyy + 5.0 * self.rax * self.rby * self.cyx + 5.0 * self.ray * self.rbx * self.cxy + 5.0 * self.ray * self.rby * self.cxx + self.cxx * self.cyy + self.cxy * self.cyx) }

    fn t21c_20(&self) -> f64 { self.r5 * 0.5 * SQRT3 * (35.0 * self.rbz * self.rbz * self.rax * self.raz - 5.0 * self.rax * self.raz + 10.0 * self.rbz * self.rax * self.czz + 10.0 * self.rbz * self.raz * self.cxz + 2.0 * self.cxz * self.czz) }
    fn t21s_20(&self) -> f64 { self.r5 * 0.5 * SQRT3 * (35.0 * self.rbz * self.rbz * self.ray * self.raz - 5.0 * self.ray * self.raz + 10.0 * self.rbz * self.ray * self.czz + 10.0 * self.rbz * self.raz * self.cyz + 2.0 * self.cyz * self.czz) }
    fn t22c_20(&self) -> f64 { self.r5 * 0.25 * SQRT3 * (35.0 * self.rbz * self.rbz * self.rax * self.rax - 35.0 * self.rbz * self.rbz * self.ray * self.ray - 5.0 * self.rax * self.rax + 5.0 * self.ray * self.ray + 20.0 * self.rbz * self.rax * self.cxz - 20.0 * self.rbz * self.ray * self.cyz + 2.0 * self.cxz * self.cxz - 2.0 * self.cyz * self.cyz) }
    fn t22s_20(&self) -> f64 { self.r5 * 0.5 * SQRT3 * (35.0 * self.rbz * self.rbz * self.rax * self.ray - 5.0 * self.rax * self.ray + 10.0 * self.rbz * self.rax * self.cyz + 10.0 * self.rbz * self.ray * self.cxz + 2.0 * self.cxz * self.cyz) }
    fn t21s_21c(&self) -> f64 { self.r5 * (35.0 * self.rbx * self.rbz * self.ray * self.raz + 5.0 * self.rbx * self.ray * self.czz + 5.0 * self.rbx * self.raz * self.cyz + 5.0 * self.rbz * self.ray * self.czx + 5.0 * self.rbz * self.raz * self.cyx + self.cyx * self.czz + self.czx * self.cyz) }
    fn t22c_21c(&self) -> f64 { self.r5 * 0.5 * (35.0 * self.rbx * self.rbz * self.rax * self.rax - 35.0 * self.rbx * self.rbz * self.ray * self.ray + 10.0 * self.rbx * self.rax * self.cxz - 10.0 * self.rbx * self.ray * self.cyz + 10.0 * self.rbz * self.rax * self.cxx - 10.0 * self.rbz * self.ray * self.cyx + 2.0 * self.cxx * self.cxz - 2.0 * self.cyx * self.cyz) }
    fn t22s_21c(&self) -> f64 { self.r5 * (35.0 * self.rbx * self.rbz * self.rax * self.ray + 5.0 * self.rbx * self.rax * self.cyz + 5.0 * self.rbx * self.ray * self.cxz + 5.0 * self.rbz * self.rax * self.cyx + 5.0 * self.rbz * self.ray * self.cxx + self.cxx * self.cyz + self.cyx * self.cxz) }
    fn t22c_21s(&self) -> f64 { self.r5 * 0.5 * (35.0 * self.rby * self.rbz * self.rax * self.rax - 35.0 * self.rby * self.rbz * self.ray * self.ray + 10.0 * self.rby * self.rax * self.cxz - 10.0 * self.rby * self.ray * self.cyz + 10.0 * self.rbz * self.rax * self.cxy - 10.0 * self.rbz * self.ray * self.cyy + 2.0 * self.cxy * self.cxz - 2.0 * self.cyy * self.cyz) }
    fn t22s_21s(&self) -> f64 { self.r5 * (35.0 * self.rby * self.rbz * self.rax * self.ray + 5.0 * self.rby * self.rax * self.cyz + 5.0 * self.rby * self.ray * self.cxz + 5.0 * self.rbz * self.rax * self.cyy + 5.0 * self.rbz * self.ray * self.cxy + self.cxy * self.cyz + self.cyy * self.cxz) }
    fn t22s_22c(&self) -> f64 { self.r5 * 0.5 * (35.0 * self.rbx * self.rbx * self.rax * self.ray - 35.0 * self.rby * self.rby * self.rax * self.ray + 10.0 * self.rbx * self.rax * self.cyx + 10.0 * self.rbx * self.ray * self.cxx - 10.0 * self.rby * self.rax * self.cyy - 10.0 * self.rby * self.ray * self.cxy + 2.0 * self.cxx * self.cyx - 2.0 * self.cxy * self.cyy) }
}

// Thole-damped tensors. Each falls back to its undamped counterpart outside
// the damping window, so callers never branch on the guard themselves.
#[rustfmt::skip]
impl Interactor {
    fn tu1x_00(&self) -> f64 { if !self.damp { return self.t1x_00(); } self.lambda3() * self.r2 * self.rax }
    fn tu1y_00(&self) -> f64 { if !self.damp { return self.t1y_00(); } self.lambda3() * self.r2 * self.ray }
    fn tu1z_00(&self) -> f64 { if !self.damp { return self.t1z_00(); } self.lambda3() * self.r2 * self.raz }
    fn tu00_1x(&self) -> f64 { if !self.damp { return self.t00_1x(); } self.lambda3() * self.r2 * self.rbx }
    fn tu00_1y(&self) -> f64 { if !self.damp { return self.t00_1y(); } self.lambda3() * self.r2 * self.rby }
    fn tu00_1z(&self) -> f64 { if !self.damp { return self.t00_1z(); } self.lambda3() * self.r2 * self.rbz }

    fn tu1x_1x(&self) -> f64 { if !self.damp { return self.t1x_1x(); } self.r3 * (self.lambda5() * 3.0 * self.rax * self.rbx + self.lambda3() * self.cxx) }
    fn tu1x_1y(&self) -> f64 { if !self.damp { return self.t1x_1y(); } self.r3 * (self.lambda5() * 3.0 * self.rax * self.rby + self.lambda3() * self.cxy) }
    fn tu1x_1z(&self) -> f64 { if !self.damp { return self.t1x_1z(); } self.r3 * (self.lambda5() * 3.0 * self.rax * self.rbz + self.lambda3() * self.cxz) }
    fn tu1y_1x(&self) -> f64 { if !self.damp { return self.t1y_1x(); } self.r3 * (self.lambda5() * 3.0 * self.ray * self.rbx + self.lambda3() * self.cyx) }
    fn tu1y_1y(&self) -> f64 { if !self.damp { return self.t1y_1y(); } self.r3 * (self.lambda5() * 3.0 * self.ray * self.rby + self.lambda3() * self.cyy) }
    fn tu1y_1z(&self) -> f64 { if !self.damp { return self.t1y_1z(); } self.r3 * (self.lambda5() * 3.0 * self.ray * self.rbz + self.lambda3() * self.cyz) }
    fn tu1z_1x(&self) -> f64 { if !self.damp { return self.t1z_1x(); } self.r3 * (self.lambda5() * 3.0 * self.raz * self.rbx + self.lambda3() * self.czx) }
    fn tu1z_1y(&self) -> f64 { if !self.damp { return self.t1z_1y(); } self.r3 * (self.lambda5() * 3.0 * self.raz * self.rby + self.lambda3() * self.czy) }
    fn tu1z_1z(&self) -> f64 { if !self.damp { return self.t1z_1z(); } self.r3 * (self.lambda5() * 3.0 * self.raz * self.rbz + self.lambda3() * self.czz) }

    fn tu20_1x(&self) -> f64 { if !self.damp { return self.t20_1x(); } self.r4 * 0.5 * (self.lambda7() * 15.0 * self.raz * self.raz * self.rbx + self.lambda5() * (6.0 * self.raz * self.czx - 3.0 * self.rbx)) }
    fn tu20_1y(&self) -> f64 { if !self.damp { return self.t20_1y(); } self.r4 * 0.5 * (self.lambda7() * 15.0 * self.raz * self.raz * self.rby + self.lambda5() * (6.0 * self.raz * self.czy - 3.0 * self.rby)) }
    fn tu20_1z(&self) -> f64 { if !self.damp { return self.t20_1z(); } self.r4 * 0.5 * (self.lambda7() * 15.0 * self.raz * self.raz * self.rbz + self.lambda5() * (6.0 * self.raz * self.czz - 3.0 * self.rbz)) }
    fn tu21c_1x(&self) -> f64 { if !self.damp { return self.t21c_1x(); } self.r4 * SQRT3 * (self.lambda5() * (self.rax * self.czx + self.cxx * self.raz) + self.lambda7() * 5.0 * self.rax * self.raz * self.rbx) }
    fn tu21c_1y(&self) -> f64 { if !self.damp { return self.t21c_1y(); } self.r4 * SQRT3 * (self.lambda5() * (self.rax * self.czy + self.cxy * self.raz) + self.lambda7() * 5.0 * self.rax * self.raz * self.rby) }
    fn tu21c_1z(&self) -> f64 { if !self.damp { return self.t21c_1z(); } self.r4 * SQRT3 * (self.lambda5() * (self.rax * self.czz + self.cxz * self.raz) + self.lambda7() * 5.0 * self.rax * self.raz * self.rbz) }
    fn tu21s_1x(&self) -> f64 { if !self.damp { return self.t21s_1x(); } self.r4 * SQRT3 * (self.lambda5() * (self.ray * self.czx + self.cyx * self.raz) + self.lambda7() * 5.0 * self.ray * self.raz * self.rbx) }
    fn tu21s_1y(&self) -> f64 { if !self.damp { return self.t21s_1y(); } self.r4 * SQRT3 * (self.lambda5() * (self.ray * self.czy + self.cyy * self.raz) + self.lambda7() * 5.0 * self.ray * self.raz * self.rby) }
    fn tu21s_1z(&self) -> f64 { if !self.damp { return self.t21s_1z(); } self.r4 * SQRT3 * (self.lambda5() * (self.ray * self.czz + self.cyz * self.raz) + self.lambda7() * 5.0 * self.ray * self.raz * self.rbz) }
    fn tu22c_1x(&self) -> f64 { if !self.damp { return self.t22c_1x(); } self.r4 * 0.5 * SQRT3 * (self.lambda7() * 5.0 * (self.rax * self.rax - self.ray * self.ray) * self.rbx + self.lambda5() * (2.0 * self.rax * self.cxx - 2.0 * self.ray * self.cyx)) }
    fn tu22c_1y(&self) -> f64 { if !self.damp { return self.t22c_1y(); } self.r4 * 0.5 * SQRT3 * (self.lambda7() * 5.0 * (self.rax * self.rax - self.ray * self.ray) * self.rby + self.lambda5() * (2.0 * self.rax * self.cxy - 2.0 * self.ray * self.cyy)) }
    fn tu22c_1z(&self) -> f64 { if !self.damp { return self.t22c_1z(); } self.r4 * 0.5 * SQRT3 * (self.lambda7() * 5.0 * (self.rax * self.rax - self.ray * self.ray) * self.rbz + self.lambda5() * (2.0 * self.rax * self.cxz - 2.0 * self.ray * self.cyz)) }
    fn tu22s_1x(&self) -> f64 { if !self.damp { return self.t22s_1x(); } self.r4 * SQRT3 * (self.lambda7() * 5.0 * self.rax * self.ray * self.rbx + self.lambda5() * (self.rax * self.cyx + self.ray * self.cxx)) }
    fn tu22s_1y(&self) -> f64 { if !self.damp { return self.t22s_1y(); } self.r4 * SQRT3 * (self.lambda7() * 5.0 * self.rax * self.ray * self.rby + self.lambda5() * (self.rax * self.cyy + self.ray * self.cxy)) }
    fn tu22s_1z(&self) -> f64 { if !self.damp { return self.t22s_1z(); } self.r4 * SQRT3 * (self.lambda7() * 5.0 * self.rax * self.ray * self.rbz + self.lambda5() * (self.rax * self.cyz + self.ray * self.cxz)) }

    fn tu1x_20(&self) -> f64 { if !self.damp { return self.t1x_20(); } self.r4 * 0.5 * (self.lambda7() * 15.0 * self.rbz * self.rbz * self.rax + self.lambda5() * (6.0 * self.rbz * self.cxz - 3.0 * self.rax)) }
    fn tu1y_20(&self) -> f64 { if !self.damp { return self.t1y_20(); } self.r4 * 0.5 * (self.lambda7() * 15.0 * self.rbz * self.rbz * self.ray + self.lambda5() * (6.0 * self.rbz * self.cyz - 3.0 * self.ray)) }
    fn tu1z_20(&self) -> f64 { if !self.damp { return self.t1z_20(); } self.r4 * 0.5 * (self.lambda7() * 15.0 * self.rbz * self.rbz * self.raz + self.lambda5() * (6.0 * self.rbz * self.czz - 3.0 * self.raz)) }
    fn tu1x_21c(&self) -> f64 { if !self.damp { return self.t1x_21c(); } self.r4 * SQRT3 * (self.lambda5() * (self.rbx * self.cxz + self.cxx * self.rbz) + self.lambda7() * 5.0 * self.rbx * self.rbz * self.rax) }
    fn tu1y_21c(&self) -> f64 { if !self.damp { return self.t1y_21c(); } self.r4 * SQRT3 * (self.lambda5() * (self.rbx * self.cyz + self.cyx * self.rbz) + self.lambda7() * 5.0 * self.rbx * self.rbz * self.ray) }
    fn tu1z_21c(&self) -> f64 { if !self.damp { return self.t1z_21c(); } self.r4 * SQRT3 * (self.lambda5() * (self.rbx * self.czz + self.czx * self.rbz) + self.lambda7() * 5.0 * self.rbx * self.rbz * self.raz) }
    fn tu1x_21s(&self) -> f64 { if !self.damp { return self.t1x_21s(); } self.r4 * SQRT3 * (self.lambda5() * (self.rby * self.cxz + self.cxy * self.rbz) + self.lambda7() * 5.0 * self.rby * self.rbz * self.rax) }
    fn tu1y_21s(&self) -> f64 { if !self.damp { return self.t1y_21s(); } self.r4 * SQRT3 * (self.lambda5() * (self.rby * self.cyz + self.cyy * self.rbz) + self.lambda7() * 5.0 * self.rby * self.rbz * self.ray) }
    fn tu1z_21s(&self) -> f64 { if !self.damp { return self.t1z_21s(); } self.r4 * SQRT3 * (self.lambda5() * (self.rby * self.czz + self.czy * self.rbz) + self.lambda7() * 5.0 * self.rby * self.rbz * self.raz) }
    fn tu1x_22c(&self) -> f64 { if !self.damp { return self.t1x_22c(); } self.r4 * 0.5 * SQRT3 * (self.lambda7() * 5.0 * (self.rbx * self.rbx - self.rby * self.rby) * self.rax + self.lambda5() * (2.0 * self.rbx * self.cxx - 2.0 * self.rby * self.cxy)) }
    fn tu1y_22c(&self) -> f64 { if !self.damp { return self.t1y_22c(); } self.r4 * 0.5 * SQRT3 * (self.lambda7() * 5.0 * (self.rbx * self.rbx - self.rby * self.rby) * self.ray + self.lambda5() * (2.0 * self.rbx * self.cyx - 2.0 * self.rby * self.cyy)) }
    fn tu1z_22c(&self) -> f64 { if !self.damp { return self.t1z_22c(); } self.r4 * 0.5 * SQRT3 * (self.lambda7() * 5.0 * (self.rbx * self.rbx - self.rby * self.rby) * self.raz + self.lambda5() * (2.0 * self.rbx * self.czx - 2.0 * self.rby * self.czy)) }
    fn tu1x_22s(&self) -> f64 { if !self.damp { return self.t1x_22s(); } self.r4 * SQRT3 * (self.lambda7() * 5.0 * self.rbx * self.rby * self.rax + self.lambda5() * (self.rbx * self.cxy + self.rby * self.cxx)) }
    fn tu1y_22s(&self) -> f64 { if !self.damp { return self.t1y_22s(); } self.r4 * SQRT3 * (self.lambda7() * 5.0 * self.rbx * self.rby * self.ray + self.lambda5() * (self.rbx * self.cyy + self.rby * self.cyx)) }
    fn tu1z_22s(&self) -> f64 { if !self.damp { return self.t1z_22s(); } self.r4 * SQRT3 * (self.lambda7() * 5.0 * self.rbx * self.rby * self.raz + self.lambda5() * (self.rbx * self.czy + self.rby * self.czx)) }
}

// Field accumulation
impl Interactor {
    /// Accumulates into both sites the fields produced by the permanent
    /// moments of the other site. Undamped.
    ///
    /// `r12` points from `pol1` to `pol2`.
    pub fn field_perm(&mut self, r12: Vector3<f64>, pol1: &mut PolarSite, pol2: &mut PolarSite) {
        self.init_pair(r12);

        // Fields generated by rank-0 m'poles
        pol1.fp.x += self.t1x_00() * pol2.q00;
        pol1.fp.y += self.t1y_00() * pol2.q00;
        pol1.fp.z += self.t1z_00() * pol2.q00;

        pol2.fp.x += self.t00_1x() * pol1.q00;
        pol2.fp.y += self.t00_1y() * pol1.q00;
        pol2.fp.z += self.t00_1z() * pol1.q00;

        // Fields generated by rank-1 m'poles
        if pol2.rank > 0 {
            pol1.fp.x += self.t1x_1x() * pol2.q1x + self.t1x_1y() * pol2.q1y + self.t1x_1z() * pol2.q1z;
            pol1.fp.y += self.t1y_1x() * pol2.q1x + self.t1y_1y() * pol2.q1y + self.t1y_1z() * pol2.q1z;
            pol1.fp.z += self.t1z_1x() * pol2.q1x + self.t1z_1y() * pol2.q1y + self.t1z_1z() * pol2.q1z;
        }
        if pol1.rank > 0 {
            pol2.fp.x += self.t1x_1x() * pol1.q1x + self.t1y_1x() * pol1.q1y + self.t1z_1x() * pol1.q1z;
            pol2.fp.y += self.t1x_1y() * pol1.q1x + self.t1y_1y() * pol1.q1y + self.t1z_1y() * pol1.q1z;
            pol2.fp.z += self.t1x_1z() * pol1.q1x + self.t1y_1z() * pol1.q1y + self.t1z_1z() * pol1.q1z;
        }

        // Fields generated by rank-2 m'poles
        if pol2.rank > 1 {
            pol1.fp.x += self.t1x_20() * pol2.q20
                + self.t1x_21c() * pol2.q21c
                + self.t1x_21s() * pol2.q21s
                + self.t1x_22c() * pol2.q22c
                + self.t1x_22s() * pol2.q22s;
            pol1.fp.y += self.t1y_20() * pol2.q20
                + self.t1y_21c() * pol2.q21c
                + self.t1y_21s() * pol2.q21s
                + self.t1y_22c() * pol2.q22c
                + self.t1y_22s() * pol2.q22s;
            pol1.fp.z += self.t1z_20() * pol2.q20
                + self.t1z_21c() * pol2.q21c
                + self.t1z_21s() * pol2.q21s
                + self.t1z_22c() * pol2.q22c
                + self.t1z_22s() * pol2.q22s;
        }
        if pol1.rank > 1 {
            pol2.fp.x += self.t20_1x() * pol1.q20
                + self.t21c_1x() * pol1.q21c
                + self.t21s_1x() * pol1.q21s
                + self.t22c_1x() * pol1.q22c
                + self.t22s_1x() * pol1.q22s;
            pol2.fp.y += self.t20_1y() * pol1.q20
                + self.t21c_1y() * pol1.q21c
                + self.t21s_1y() * pol1.q21s
                + self.t22c_1y() * pol1.q22c
                + self.t22s_1y() * pol1.q22s;
            pol2.fp.z += self.t20_1z() * pol1.q20
                + self.t21c_1z() * pol1.q21c
                + self.t21s_1z() * pol1.q21s
                + self.t22c_1z() * pol1.q22c
                + self.t22s_1z() * pol1.q22s;
        }
    }

    /// Accumulates into both sites the fields produced by the induced
    /// dipole of the other site, Thole-damped inside the damping window.
    ///
    /// `r12` points from `pol1` to `pol2`.
    pub fn field_indu(&mut self, r12: Vector3<f64>, pol1: &mut PolarSite, pol2: &mut PolarSite) {
        self.init_pair(r12);
        self.init_thole(pol1, pol2);
        self.accumulate_field_indu(pol1, pol2);
    }

    /// Same as [`Interactor::field_indu`], but without minimum-imaging:
    /// the displacement is taken directly between the stored positions.
    /// Used by molecular-polarizability probes.
    pub fn field_indu_alpha(&mut self, pol1: &mut PolarSite, pol2: &mut PolarSite) {
        self.init_pair(pol2.pos - pol1.pos);
        self.init_thole(pol1, pol2);
        self.accumulate_field_indu(pol1, pol2);
    }

    fn accumulate_field_indu(&mut self, pol1: &mut PolarSite, pol2: &mut PolarSite) {
        pol1.fu.x += self.tu1x_1x() * pol2.u1.x + self.tu1x_1y() * pol2.u1.y + self.tu1x_1z() * pol2.u1.z;
        pol1.fu.y += self.tu1y_1x() * pol2.u1.x + self.tu1y_1y() * pol2.u1.y + self.tu1y_1z() * pol2.u1.z;
        pol1.fu.z += self.tu1z_1x() * pol2.u1.x + self.tu1z_1y() * pol2.u1.y + self.tu1z_1z() * pol2.u1.z;

        pol2.fu.x += self.tu1x_1x() * pol1.u1.x + self.tu1y_1x() * pol1.u1.y + self.tu1z_1x() * pol1.u1.z;
        pol2.fu.y += self.tu1x_1y() * pol1.u1.x + self.tu1y_1y() * pol1.u1.y + self.tu1z_1y() * pol1.u1.z;
        pol2.fu.z += self.tu1x_1z() * pol1.u1.x + self.tu1y_1z() * pol1.u1.y + self.tu1z_1z() * pol1.u1.z;
    }
}

// Energy evaluation
impl Interactor {
    /// Permanent-permanent energy plus half the induced-coupling energy of
    /// an inter-segment pair; the ½ accounts for the work spent polarizing.
    ///
    /// Adds the permanent part to the EP accumulator and the induction part
    /// to EU_INTER. `r12` points from `pol1` to `pol2`.
    pub fn energy_inter(
        &mut self,
        r12: Vector3<f64>,
        pol1: &mut PolarSite,
        pol2: &mut PolarSite,
    ) -> Energy {
        self.init_pair(r12);
        self.init_thole(pol1, pol2);

        let e = self.energy_perm(pol1, pol2);
        let u = 0.5 * self.energy_indu(pol1, pol2);

        self.ep += e;
        self.eu_inter += u;
        e + u
    }

    /// Half the induced-coupling energy of an intra-segment pair, added to
    /// the EU_INTRA accumulator. `r12` points from `pol1` to `pol2`.
    pub fn energy_intra(
        &mut self,
        r12: Vector3<f64>,
        pol1: &mut PolarSite,
        pol2: &mut PolarSite,
    ) -> Energy {
        self.init_pair(r12);
        self.init_thole(pol1, pol2);

        let u = 0.5 * self.energy_indu(pol1, pol2);
        self.eu_intra += u;
        u
    }

    /// Permanent-permanent interaction energy with the registers loaded.
    fn energy_perm(&self, pol1: &PolarSite, pol2: &PolarSite) -> Energy {
        let mut e = 0.0;

        e += pol1.q00 * self.t00_00() * pol2.q00;

        if pol1.rank > 0 {
            e += pol1.q1x * self.t1x_00() * pol2.q00;
            e += pol1.q1y * self.t1y_00() * pol2.q00;
            e += pol1.q1z * self.t1z_00() * pol2.q00;
        }
        if pol2.rank > 0 {
            e += pol1.q00 * self.t00_1x() * pol2.q1x;
            e += pol1.q00 * self.t00_1y() * pol2.q1y;
            e += pol1.q00 * self.t00_1z() * pol2.q1z;
        }

        if pol1.rank > 1 {
            e += pol1.q20 * self.t20_00() * pol2.q00;
            e += pol1.q21c * self.t21c_00() * pol2.q00;
            e += pol1.q21s * self.t21s_00() * pol2.q00;
            e += pol1.q22c * self.t22c_00() * pol2.q00;
            e += pol1.q22s * self.t22s_00() * pol2.q00;
        }
        if pol2.rank > 1 {
            e += pol1.q00 * self.t00_20() * pol2.q20;
            e += pol1.q00 * self.t00_21c() * pol2.q21c;
            e += pol1.q00 * self.t00_21s() * pol2.q21s;
            e += pol1.q00 * self.t00_22c() * pol2.q22c;
            e += pol1.q00 * self.t00_22s() * pol2.q22s;
        }

        if pol1.rank > 0 && pol2.rank > 0 {
            e += pol1.q1x * self.t1x_1x() * pol2.q1x;
            e += pol1.q1x * self.t1x_1y() * pol2.q1y;
            e += pol1.q1x * self.t1x_1z() * pol2.q1z;
            e += pol1.q1y * self.t1y_1x() * pol2.q1x;
            e += pol1.q1y * self.t1y_1y() * pol2.q1y;
            e += pol1.q1y * self.t1y_1z() * pol2.q1z;
            e += pol1.q1z * self.t1z_1x() * pol2.q1x;
            e += pol1.q1z * self.t1z_1y() * pol2.q1y;
            e += pol1.q1z * self.t1z_1z() * pol2.q1z;
        }

        if pol1.rank > 1 && pol2.rank > 0 {
            e += pol1.q20 * self.t20_1x() * pol2.q1x;
            e += pol1.q20 * self.t20_1y() * pol2.q1y;
            e += pol1.q20 * self.t20_1z() * pol2.q1z;
            e += pol1.q21c * self.t21c_1x() * pol2.q1x;
            e += pol1.q21c * self.t21c_1y() * pol2.q1y;
            e += pol1.q21c * self.t21c_1z() * pol2.q1z;
            e += pol1.q21s * self.t21s_1x() * pol2.q1x;
            e += pol1.q21s * self.t21s_1y() * pol2.q1y;
            e += pol1.q21s * self.t21s_1z() * pol2.q1z;
            e += pol1.q22c * self.t22c_1x() * pol2.q1x;
            e += pol1.q22c * self.t22c_1y() * pol2.q1y;
            e += pol1.q22c * self.t22c_1z() * pol2.q1z;
            e += pol1.q22s * self.t22s_1x() * pol2.q1x;
            e += pol1.q22s * self.t22s_1y() * pol2.q1y;
            e += pol1.q22s * self.t22s_1z() * pol2.q1z;
        }
        if pol1.rank > 0 && pol2.rank > 1 {
            e += pol1.q1x * self.t1x_20() * pol2.q20;
            e += pol1.q1y * self.t1y_20() * pol2.q20;
            e += pol1.q1z * self.t1z_20() * pol2.q20;
            e += pol1.q1x * self.t1x_21c() * pol2.q21c;
            e += pol1.q1y * self.t1y_21c() * pol2.q21c;
            e += pol1.q1z * self.t1z_21c() * pol2.q21c;
            e += pol1.q1x * self.t1x_21s() * pol2.q21s;
            e += pol1.q1y * self.t1y_21s() * pol2.q21s;
            e += pol1.q1z * self.t1z_21s() * pol2.q21s;
            e += pol1.q1x * self.t1x_22c() * pol2.q22c;
            e += pol1.q1y * self.t1y_22c() * pol2.q22c;
            e += pol1.q1z * self.t1z_22c() * pol2.q22c;
            e += pol1.q1x * self.t1x_22s() * pol2.q22s;
            e += pol1.q1y * self.t1y_22s() * pol2.q22s;
            e += pol1.q1z * self.t1z_22s() * pol2.q22s;
        }

        if pol1.rank > 1 && pol2.rank > 1 {
            e += pol1.q20 * self.t20_20() * pol2.q20;
            e += pol1.q21c * self.t21c_21c() * pol2.q21c;
            e += pol1.q21s * self.t21s_21s() * pol2.q21s;
            e += pol1.q22c * self.t22c_22c() * pol2.q22c;
            e += pol1.q22s * self.t22s_22s() * pol2.q22s;

            e += pol1.q20 * self.t20_21c() * pol2.q21c;
            e += pol1.q20 * self.t20_21s() * pol2.q21s;
            e += pol1.q20 * self.t20_22c() * pol2.q22c;
            e += pol1.q20 * self.t20_22s() * pol2.q22s;
            e += pol1.q21c * self.t21c_20() * pol2.q20;
            e += pol1.q21s * self.t21s_20() * pol2.q20;
            e += pol1.q22c * self.t22c_20() * pol2.q20;
            e += pol1.q22s * self.t22s_20() * pol2.q20;

            e += pol1.q21c * self.t21c_21s() * pol2.q21s;
            e += pol1.q21c * self.t21c_22c() * pol2.q22c;
            e += pol1.q21c * self.t21c_22s() * pol2.q22s;
            e += pol1.q21s * self.t21s_21c() * pol2.q21c;
            e += pol1.q22c * self.t22c_21c() * pol2.q21c;
            e += pol1.q22s * self.t22s_21c() * pol2.q21c;

            e += pol1.q21s * self.t21s_22c() * pol2.q22c;
            e += pol1.q21s * self.t21s_22s() * pol2.q22s;
            e += pol1.q22c * self.t22c_21s() * pol2.q21s;
            e += pol1.q22s * self.t22s_21s() * pol2.q21s;

            e += pol1.q22s * self.t22s_22c() * pol2.q22c;
            e += pol1.q22c * self.t22c_22s() * pol2.q22s;
        }

        e
    }

    /// Coupling energy between permanent moments and induced dipoles with
    /// the registers loaded, without the ½ polarization-work factor.
    fn energy_indu(&self, pol1: &PolarSite, pol2: &PolarSite) -> Energy {
        let mut u = 0.0;

        u += pol1.u1.x * self.tu1x_00() * pol2.q00;
        u += pol1.u1.y * self.tu1y_00() * pol2.q00;
        u += pol1.u1.z * self.tu1z_00() * pol2.q00;

        u += pol1.q00 * self.tu00_1x() * pol2.u1.x;
        u += pol1.q00 * self.tu00_1y() * pol2.u1.y;
        u += pol1.q00 * self.tu00_1z() * pol2.u1.z;

        if pol1.rank > 0 {
            u += pol1.q1x * self.tu1x_1x() * pol2.u1.x;
            u += pol1.q1x * self.tu1x_1y() * pol2.u1.y;
            u += pol1.q1x * self.tu1x_1z() * pol2.u1.z;
            u += pol1.q1y * self.tu1y_1x() * pol2.u1.x;
            u += pol1.q1y * self.tu1y_1y() * pol2.u1.y;
            u += pol1.q1y * self.tu1y_1z() * pol2.u1.z;
            u += pol1.q1z * self.tu1z_1x() * pol2.u1.x;
            u += pol1.q1z * self.tu1z_1y() * pol2.u1.y;
            u += pol1.q1z * self.tu1z_1z() * pol2.u1.z;
        }
        if pol2.rank > 0 {
            u += pol1.u1.x * self.tu1x_1x() * pol2.q1x;
            u += pol1.u1.x * self.tu1x_1y() * pol2.q1y;
            u += pol1.u1.x * self.tu1x_1z() * pol2.q1z;
            u += pol1.u1.y * self.tu1y_1x() * pol2.q1x;
            u += pol1.u1.y * self.tu1y_1y() * pol2.q1y;
            u += pol1.u1.y * self.tu1y_1z() * pol2.q1z;
            u += pol1.u1.z * self.tu1z_1x() * pol2.q1x;
            u += pol1.u1.z * self.tu1z_1y() * pol2.q1y;
            u += pol1.u1.z * self.tu1z_1z() * pol2.q1z;
        }

        if pol1.rank > 1 {
            u += pol1.q20 * self.tu20_1x() * pol2.u1.x;
            u += pol1.q20 * self.tu20_1y() * pol2.u1.y;
            u += pol1.q20 * self.tu20_1z() * pol2.u1.z;
            u += pol1.q21c * self.tu21c_1x() * pol2.u1.x;
            u += pol1.q21c * self.tu21c_1y() * pol2.u1.y;
            u += pol1.q21c * self.tu21c_1z() * pol2.u1.z;
            u += pol1.q21s * self.tu21s_1x() * pol2.u1.x;
            u += pol1.q21s * self.tu21s_1y() * pol2.u1.y;
            u += pol1.q21s * self.tu21s_1z() * pol2.u1.z;
            u += pol1.q22c * self.tu22c_1x() * pol2.u1.x;
            u += pol1.q22c * self.tu22c_1y() * pol2.u1.y;
            u += pol1.q22c * self.tu22c_1z() * pol2.u1.z;
            u += pol1.q22s * self.tu22s_1x() * pol2.u1.x;
            u += pol1.q22s * self.tu22s_1y() * pol2.u1.y;
            u += pol1.q22s * self.tu22s_1z() * pol2.u1.z;
        }
        if pol2.rank > 1 {
            u += pol1.u1.x * self.tu1x_20() * pol2.q20;
            u += pol1.u1.x * self.tu1x_21c() * pol2.q21c;
            u += pol1.u1.x * self.tu1x_21s() * pol2.q21s;
            u += pol1.u1.x * self.tu1x_22c() * pol2.q22c;
            u += pol1.u1.x * self.tu1x_22s() * pol2.q22s;
            u += pol1.u1.y * self.tu1y_20() * pol2.q20;
            u += pol1.u1.y * self.tu1y_21c() * pol2.q21c;
            u += pol1.u1.y * self.tu1y_21s() * pol2.q21s;
            u += pol1.u1.y * self.tu1y_22c() * pol2.q22c;
            u += pol1.u1.y * self.tu1y_22s() * pol2.q22s;
            u += pol1.u1.z * self.tu1z_20() * pol2.q20;
            u += pol1.u1.z * self.tu1z_21c() * pol2.q21c;
            u += pol1.u1.z * self.tu1z_21s() * pol2.q21s;
            u += pol1.u1.z * self.tu1z_22c() * pol2.q22c;
            u += pol1.u1.z * self.tu1z_22s() * pol2.q22s;
        }

        u
    }
}

// Potential and field probes
impl Interactor {
    /// Potential of the permanent moments of `pol` at point `r`.
    pub fn potential_perm(&mut self, r: Vector3<f64>, pol: &PolarSite) -> f64 {
        self.init_pair(pol.pos - r);

        let mut phi = self.t00_00() * pol.q00;

        if pol.rank > 0 {
            phi += self.t00_1x() * pol.q1x;
            phi += self.t00_1y() * pol.q1y;
            phi += self.t00_1z() * pol.q1z;
        }
        if pol.rank > 1 {
            phi += self.t00_20() * pol.q20;
            phi += self.t00_21c() * pol.q21c;
            phi += self.t00_21s() * pol.q21s;
            phi += self.t00_22c() * pol.q22c;
            phi += self.t00_22s() * pol.q22s;
        }
        phi
    }

    /// Field of the permanent moments of `pol` at point `r`.
    pub fn field_perm_esf(&mut self, r: Vector3<f64>, pol: &PolarSite) -> Vector3<f64> {
        self.init_pair(pol.pos - r);

        let mut f = Vector3::new(
            self.t1x_00() * pol.q00,
            self.t1y_00() * pol.q00,
            self.t1z_00() * pol.q00,
        );

        if pol.rank > 0 {
            f.x += self.t1x_1x() * pol.q1x + self.t1x_1y() * pol.q1y + self.t1x_1z() * pol.q1z;
            f.y += self.t1y_1x() * pol.q1x + self.t1y_1y() * pol.q1y + self.t1y_1z() * pol.q1z;
            f.z += self.t1z_1x() * pol.q1x + self.t1z_1y() * pol.q1y + self.t1z_1z() * pol.q1z;
        }
        if pol.rank > 1 {
            f.x += self.t1x_20() * pol.q20
                + self.t1x_21c() * pol.q21c
                + self.t1x_21s() * pol.q21s
                + self.t1x_22c() * pol.q22c
                + self.t1x_22s() * pol.q22s;
            f.y += self.t1y_20() * pol.q20
                + self.t1y_21c() * pol.q21c
                + self.t1y_21s() * pol.q21s
                + self.t1y_22c() * pol.q22c
                + self.t1y_22s() * pol.q22s;
            f.z += self.t1z_20() * pol.q20
                + self.t1z_21c() * pol.q21c
                + self.t1z_21s() * pol.q21s
                + self.t1z_22c() * pol.q22c
                + self.t1z_22s() * pol.q22s;
        }
        f
    }
}

impl std::fmt::Debug for Interactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interactor")
            .field("a", &self.a)
            .field("EP", &self.ep)
            .field("EU_INTER", &self.eu_inter)
            .field("EU_INTRA", &self.eu_intra)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use multipoles::ChargeState;

    fn create_site(id: usize, q: Vec<f64>, rank: usize, pos: Vector3<f64>) -> PolarSite {
        let mut site = PolarSite::new(id, "C", rank, pos);
        site.set_qs(q, ChargeState::Neutral);
        site.set_ps(1e-3, ChargeState::Neutral);
        site.charge(ChargeState::Neutral).unwrap();
        site
    }

    #[test]
    fn test_charge_charge_energy() {
        let mut actor = Interactor::new(0.0);
        let mut p1 = create_site(1, vec![1.0], 0, Vector3::zeros());
        let mut p2 = create_site(2, vec![-1.0], 0, Vector3::new(0.0, 0.0, 1.0));

        let r12 = p2.pos - p1.pos;
        let e = actor.energy_inter(r12, &mut p1, &mut p2);
        assert!((e - (-1.0)).abs() < 1e-12);
        assert!((actor.ep() - (-1.0)).abs() < 1e-12);
        assert_eq!(actor.eu_inter(), 0.0);
    }

    #[test]
    fn test_energy_symmetric_under_site_swap() {
        let mut actor = Interactor::new(0.39);
        let mut p1 = create_site(
            1,
            vec![0.3, 0.01, -0.02, 0.05, 0.1, -0.02, 0.03, 0.04, -0.05],
            2,
            Vector3::new(0.1, -0.2, 0.3),
        );
        let mut p2 = create_site(
            2,
            vec![-0.3, -0.03, 0.01, 0.02, -0.1, 0.05, -0.01, 0.02, 0.03],
            2,
            Vector3::new(0.8, 0.4, -0.5),
        );
        p1.u1 = Vector3::new(1e-4, -2e-4, 3e-4);
        p2.u1 = Vector3::new(-2e-4, 1e-4, 1e-4);

        let r12 = p2.pos - p1.pos;
        let e12 = actor.energy_inter(r12, &mut p1, &mut p2);
        let e21 = actor.energy_inter(-r12, &mut p2, &mut p1);
        assert!((e12 - e21).abs() <= 1e-12 * e12.abs().max(1.0));
    }

    #[test]
    fn test_field_reciprocity_charges() {
        // Two equal charges push each other apart with opposite fields.
        let mut actor = Interactor::new(0.0);
        let mut p1 = create_site(1, vec![1.0], 0, Vector3::zeros());
        let mut p2 = create_site(2, vec![1.0], 0, Vector3::new(0.0, 0.0, 2.0));

        actor.field_perm(p2.pos - p1.pos, &mut p1, &mut p2);
        assert!((p1.fp + p2.fp).norm() < 1e-14);
        assert!((p1.fp.z - 0.25).abs() < 1e-14);
    }

    #[test]
    fn test_permanent_energy_scales_quadratically() {
        let q1 = vec![0.4, 0.02, -0.01, 0.03];
        let q2 = vec![-0.4, 0.01, 0.02, -0.03];

        let mut actor = Interactor::new(0.0);
        let mut p1 = create_site(1, q1.clone(), 1, Vector3::zeros());
        let mut p2 = create_site(2, q2.clone(), 1, Vector3::new(0.0, 0.7, 0.7));
        let r12 = p2.pos - p1.pos;
        actor.energy_inter(r12, &mut p1, &mut p2);
        let ep = actor.ep();

        let double = |qs: &[f64]| qs.iter().map(|q| 2.0 * q).collect::<Vec<f64>>();
        let mut actor2 = Interactor::new(0.0);
        let mut d1 = create_site(1, double(&q1), 1, Vector3::zeros());
        let mut d2 = create_site(2, double(&q2), 1, Vector3::new(0.0, 0.7, 0.7));
        actor2.energy_inter(r12, &mut d1, &mut d2);

        assert!((actor2.ep() - 4.0 * ep).abs() < 1e-12 * ep.abs().max(1.0));
    }

    #[test]
    fn test_dipole_charge_energy() {
        // Ideal dipole of 1 e nm along z, probe charge +1 e at 2 nm on axis:
        // E = p q / R² in internal units.
        let mut actor = Interactor::new(0.0);
        let mut dip = create_site(1, vec![0.0, 0.0, 0.0, 1.0], 1, Vector3::zeros());
        let mut chg = create_site(2, vec![1.0], 0, Vector3::new(0.0, 0.0, 2.0));

        let e = actor.energy_inter(chg.pos - dip.pos, &mut dip, &mut chg);
        assert!((e - 0.25).abs() < 1e-12);

        let mut actor2 = Interactor::new(0.0);
        let e_swapped = actor2.energy_inter(dip.pos - chg.pos, &mut chg, &mut dip);
        assert!((e - e_swapped).abs() < 1e-12);
    }

    #[test]
    fn test_thole_guard_matches_undamped() {
        // At large separation a·u³ is far beyond the guard, so damped and
        // undamped kernels must agree bitwise.
        let pos2 = Vector3::new(0.0, 0.0, 3.0);
        let mut damped = Interactor::new(0.39);
        let mut plain = Interactor::new(0.0);

        let mut p1 = create_site(1, vec![1.0], 0, Vector3::zeros());
        let mut p2 = create_site(2, vec![-1.0], 0, pos2);
        p1.u1 = Vector3::new(0.0, 0.0, 1e-4);
        p2.u1 = Vector3::new(0.0, 0.0, -1e-4);

        let r12 = p2.pos - p1.pos;
        let e_damped = damped.energy_inter(r12, &mut p1, &mut p2);
        let e_plain = plain.energy_inter(r12, &mut p1, &mut p2);
        assert_eq!(e_damped, e_plain);
    }

    #[test]
    fn test_damping_reduces_close_coupling() {
        // Close pair well inside the damping window: the damped induced
        // field must be weaker than the undamped one.
        let pos2 = Vector3::new(0.0, 0.0, 0.15);
        let mut p1 = create_site(1, vec![0.0], 0, Vector3::zeros());
        let mut p2 = create_site(2, vec![0.0], 0, pos2);
        p1.u1 = Vector3::new(0.0, 0.0, 1e-3);
        p2.u1 = Vector3::new(0.0, 0.0, 1e-3);

        let r12 = p2.pos - p1.pos;
        let mut damped = Interactor::new(0.39);
        damped.field_indu(r12, &mut p1, &mut p2);
        let fu_damped = p1.fu;

        p1.reset_field_u();
        p2.reset_field_u();
        let mut plain = Interactor::new(0.0);
        plain.field_indu(r12, &mut p1, &mut p2);

        assert!(fu_damped.norm() < p1.fu.norm());
    }

    #[test]
    fn test_potential_perm_charge() {
        let mut actor = Interactor::new(0.0);
        let pol = create_site(1, vec![2.0], 0, Vector3::new(0.0, 0.0, 4.0));
        let phi = actor.potential_perm(Vector3::zeros(), &pol);
        assert!((phi - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_field_perm_esf_charge() {
        let mut actor = Interactor::new(0.0);
        let pol = create_site(1, vec![1.0], 0, Vector3::new(0.0, 0.0, 2.0));
        let f = actor.field_perm_esf(Vector3::zeros(), &pol);
        // e12 points towards the site, so the field of a positive charge
        // points along +z here with magnitude q/R².
        assert!((f - Vector3::new(0.0, 0.0, 0.25)).norm() < 1e-12);
    }

    #[test]
    fn test_energy_intra_accumulates_separately() {
        // Intra-segment pairs only contribute induced-coupling energy, and
        // it lands in its own accumulator.
        let mut actor = Interactor::new(0.0);
        let mut p1 = create_site(1, vec![1.0], 0, Vector3::zeros());
        let mut p2 = create_site(2, vec![-1.0], 0, Vector3::new(0.0, 0.0, 0.5));
        p1.u1 = Vector3::new(0.0, 0.0, 2e-4);

        let r12 = p2.pos - p1.pos;
        let u = actor.energy_intra(r12, &mut p1, &mut p2);

        // U = ½ · U1z · T1z_00 · q2 with T1z_00 = raz/R².
        assert!((u - 0.5 * 2e-4 * 4.0 * (-1.0)).abs() < 1e-15);
        assert_eq!(actor.eu_intra(), u);
        assert_eq!(actor.ep(), 0.0);
        assert_eq!(actor.eu_inter(), 0.0);
    }

    #[test]
    fn test_field_indu_alpha_matches_field_indu_without_pbc() {
        let build = || {
            let mut p1 = create_site(1, vec![0.0], 0, Vector3::zeros());
            let mut p2 = create_site(2, vec![0.0], 0, Vector3::new(0.2, 0.1, 0.3));
            p1.u1 = Vector3::new(1e-4, 0.0, -1e-4);
            p2.u1 = Vector3::new(0.0, 2e-4, 0.0);
            (p1, p2)
        };

        let mut actor = Interactor::new(0.39);
        let (mut a1, mut a2) = build();
        actor.field_indu_alpha(&mut a1, &mut a2);

        let (mut b1, mut b2) = build();
        let r12 = b2.pos - b1.pos;
        actor.field_indu(r12, &mut b1, &mut b2);

        assert_eq!(a1.fu, b1.fu);
        assert_eq!(a2.fu, b2.fu);
    }

    #[test]
    fn test_reset_energy() {
        let mut actor = Interactor::new(0.0);
        let mut p1 = create_site(1, vec![1.0], 0, Vector3::zeros());
        let mut p2 = create_site(2, vec![1.0], 0, Vector3::new(1.0, 0.0, 0.0));
        actor.energy_inter(p2.pos - p1.pos, &mut p1, &mut p2);
        assert!(actor.ep() != 0.0);
        actor.reset_energy();
        assert_eq!(actor.ep(), 0.0);
        assert_eq!(actor.eu_inter(), 0.0);
        assert_eq!(actor.eu_intra(), 0.0);
    }
}
