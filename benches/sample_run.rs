use criterion::{criterion_group, criterion_main, Criterion};
use epitrace::{Controls, Simulation};

static POPULATION: f64 = 5000.0;
static SEED: u64 = 123;
static DAYS: usize = 60;

fn sample_run() -> Simulation {
    let mut controls = Controls::default();
    controls
        .set_controls([("population", POPULATION), ("p_have_watch", 0.1)])
        .expect("failed to set controls");
    let mut simulation = Simulation::new(controls, SEED).expect("failed to build simulation");
    for day in 1..=DAYS {
        simulation.step(day).expect("failed to step");
    }
    simulation
}

fn reset_only(simulation: &mut Simulation) {
    simulation.clear_statistics();
    simulation.reset().expect("failed to reset");
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("sample run", |bencher| {
        bencher.iter_with_large_drop(sample_run)
    });

    let mut simulation = sample_run();
    c.bench_function("reset", |bencher| bencher.iter(|| reset_only(&mut simulation)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
