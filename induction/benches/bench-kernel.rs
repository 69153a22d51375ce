use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use nalgebra::Vector3;

use induction::Interactor;
use multipoles::{ChargeState, PolarSite};

fn create_site(id: usize, pos: Vector3<f64>) -> PolarSite {
    let mut site = PolarSite::new(id, "C", 2, pos);
    site.set_qs(
        vec![-0.38, -0.0002, 0.24, 0.66, -0.72, 0.0005, -0.0004, 0.45, -0.51],
        ChargeState::Neutral,
    );
    site.set_ps(1.75e-3, ChargeState::Neutral);
    site.charge(ChargeState::Neutral).unwrap();
    site
}

fn kernel_evaluation(c: &mut Criterion) {
    let mut actor = Interactor::new(0.39);
    let mut pol1 = create_site(1, Vector3::zeros());
    let mut pol2 = create_site(2, Vector3::new(0.3, 0.4, 0.2));
    pol1.u1 = Vector3::new(1e-4, -2e-4, 3e-4);
    pol2.u1 = Vector3::new(-1e-4, 2e-4, -3e-4);
    let r12 = pol2.pos - pol1.pos;

    let mut group = c.benchmark_group("Kernel Evaluation");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    group.bench_function("Interactor::energy_inter() rank 2 pair", |b| {
        b.iter(|| actor.energy_inter(r12, &mut pol1, &mut pol2))
    });

    group.bench_function("Interactor::field_perm() rank 2 pair", |b| {
        b.iter(|| {
            actor.field_perm(r12, &mut pol1, &mut pol2);
            pol1.reset_field_p();
            pol2.reset_field_p();
        })
    });

    group.bench_function("Interactor::field_indu() rank 2 pair", |b| {
        b.iter(|| {
            actor.field_indu(r12, &mut pol1, &mut pol2);
            pol1.reset_field_u();
            pol2.reset_field_u();
        })
    });
}

criterion_group!(benches, kernel_evaluation);
criterion_main!(benches);
