use epitrace::{
    Controls, IsolationReason, PersonId, SimError, Simulation, StatKind, Status,
};

fn controls(overrides: &[(&str, f64)]) -> Controls {
    let mut controls = Controls::default();
    controls.set_control("population", 4000.0).unwrap();
    controls.set_controls(overrides.iter().copied()).unwrap();
    controls
}

fn rank(status: Status) -> u8 {
    match status {
        Status::NonInfected => 0,
        Status::Infected => 1,
        Status::Recovered | Status::Dead => 2,
    }
}

#[test]
fn households_partition_the_population() {
    for seed in [1, 2, 3] {
        let sim = Simulation::new(controls(&[]), seed).unwrap();
        let households = &sim.graph().households;
        let mut next = 0;
        for (index, members) in households.iter().enumerate() {
            assert_eq!(members.start, next);
            assert!(!members.is_empty());
            for id in members.clone() {
                assert_eq!(sim.person(PersonId(id)).unwrap().household, index);
            }
            next = members.end;
        }
        assert_eq!(next, 4000);
    }
}

#[test]
fn initial_infections_are_every_thousandth_id() {
    for seed in [0, 7, 99] {
        let sim = Simulation::new(controls(&[]), seed).unwrap();
        let infected: Vec<usize> = sim
            .people()
            .iter()
            .filter(|person| person.status == Status::Infected)
            .map(|person| person.id.index())
            .collect();
        assert_eq!(infected, vec![1000, 2000, 3000]);
        assert_eq!(sim.daily_counts(0).unwrap().newly_infected, 3);
    }
}

#[test]
fn statuses_only_move_forward_and_totals_are_conserved() {
    let mut sim = Simulation::new(
        controls(&[("p_infect_friend", 0.1), ("p_infect_stranger", 0.1)]),
        5,
    )
    .unwrap();
    let mut previous: Vec<Status> = sim.people().iter().map(|person| person.status).collect();
    for day in 1..=60 {
        let summary = sim.step(day).unwrap();
        assert_eq!(summary.counts.total(), 4000);
        let current: Vec<Status> = sim.people().iter().map(|person| person.status).collect();
        for (before, after) in previous.iter().zip(&current) {
            assert!(rank(*before) <= rank(*after), "{before:?} -> {after:?}");
            if before.is_removed() {
                assert_eq!(before, after);
            }
        }
        previous = current;
    }
}

#[test]
fn isolation_starts_after_the_configured_delay() {
    let delay = 3;
    let mut sim = Simulation::new(
        controls(&[
            ("p_infect_friend", 0.1),
            ("p_have_watch", 0.3),
            ("test_to_isolate", delay as f64),
        ]),
        11,
    )
    .unwrap();
    let snapshot = |sim: &Simulation| -> Vec<(Option<usize>, IsolationReason)> {
        (0..sim.population())
            .map(|id| {
                let person = sim.person(PersonId(id)).unwrap();
                (person.isolated_on, person.isolation_reason)
            })
            .collect()
    };
    let mut previous = snapshot(&sim);
    let mut saw_symptom = false;
    let mut saw_watch = false;
    for day in 1..=60 {
        sim.step(day).unwrap();
        let current = snapshot(&sim);
        for (before, after) in previous.iter().zip(&current) {
            if before == after {
                continue;
            }
            match after.1 {
                IsolationReason::BySymptom => {
                    saw_symptom = true;
                    assert_eq!(after.0, Some(day + delay));
                }
                IsolationReason::ByWatch => {
                    saw_watch = true;
                    assert_eq!(after.0, Some(day));
                }
                IsolationReason::None => panic!("isolation without a reason"),
            }
        }
        previous = current;
    }
    assert!(saw_symptom);
    assert!(saw_watch);
}

#[test]
fn testing_respects_daily_capacity() {
    let mut sim = Simulation::new(
        controls(&[
            ("p_infect_friend", 0.2),
            ("p_infect_stranger", 0.2),
            ("tests_per_day", 3.0),
            ("p_test", 1.0),
        ]),
        2,
    )
    .unwrap();
    let mut tested_any = false;
    for day in 1..=40 {
        let summary = sim.step(day).unwrap();
        assert!(summary.tested <= 3);
        assert!(summary.isolated_by_symptom <= summary.tested);
        tested_any |= summary.tested > 0;
    }
    assert!(tested_any);
}

#[test]
fn recovery_is_certain_on_day_eleven() {
    let mut controls = controls(&[("min_days_sick", 10.0), ("p_die", 0.0), ("p_recover", 1.0)]);
    controls.set_control("population", 2000.0).unwrap();
    let mut sim = Simulation::new(controls, 3).unwrap();
    for day in 1..=10 {
        sim.step(day).unwrap();
    }
    assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Infected);
    sim.step(11).unwrap();
    assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Recovered);
}

#[test]
fn zero_infection_probabilities_mean_no_spread() {
    for population in [1500.0, 4000.0, 12000.0] {
        let mut controls = controls(&[
            ("p_infect_family", 0.0),
            ("p_infect_friend", 0.0),
            ("p_infect_stranger", 0.0),
            ("friends_per_day", 8.0),
            ("strangers_per_day", 20.0),
        ]);
        controls.set_control("population", population).unwrap();
        let mut sim = Simulation::new(controls, 1).unwrap();
        for day in 1..=25 {
            assert_eq!(sim.step(day).unwrap().new_infected, 0);
        }
    }
}

#[test]
fn no_tests_means_no_symptom_isolation() {
    let mut sim = Simulation::new(
        controls(&[("tests_per_day", 0.0), ("p_infect_friend", 0.1)]),
        4,
    )
    .unwrap();
    for day in 1..=50 {
        sim.step(day).unwrap();
        assert_eq!(sim.daily_counts(day).unwrap().isolated_by_symptom, 0);
    }
}

#[test]
fn same_seed_same_trajectory() {
    let run = |seed: u64| {
        let mut sim = Simulation::new(controls(&[]), seed).unwrap();
        (1..=30)
            .map(|day| sim.step(day).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(8), run(8));
    assert_ne!(run(8), run(9));
}

#[test]
fn samples_aggregate_into_cumulative_means() {
    let mut sim = Simulation::new(controls(&[]), 6).unwrap();
    let mut totals = Vec::new();
    for sample in 0..3 {
        if sample > 0 {
            sim.reset().unwrap();
        }
        assert_eq!(sim.sample(), Some(sample));
        for day in 1..=10 {
            sim.step(day).unwrap();
        }
        totals.push(
            (0..=10)
                .map(|day| sim.daily_counts(day).unwrap().newly_infected)
                .sum::<usize>(),
        );
    }
    let series = sim
        .cumulative_mean_series(StatKind::NewlyInfected, 10)
        .unwrap();
    let expected = totals.iter().sum::<usize>() as f64 / 3.0;
    approx::assert_relative_eq!(series[10], expected);
    approx::assert_relative_eq!(series[0], 3.0);
}

#[test]
fn clearing_statistics_restarts_the_sample_index() {
    let mut sim = Simulation::with_capacity(controls(&[]), 6, 2, 50).unwrap();
    sim.step(1).unwrap();
    sim.reset().unwrap();
    assert!(matches!(
        sim.reset(),
        Err(SimError::CapacityExceeded { what: "sample", .. })
    ));
    sim.clear_statistics();
    sim.reset().unwrap();
    assert_eq!(sim.sample(), Some(0));
    assert_eq!(sim.stats().get(StatKind::NewlyInfected, 1, 0).unwrap(), 0);
    assert_eq!(sim.stats().get(StatKind::NewlyInfected, 0, 1).unwrap(), 0);
}
