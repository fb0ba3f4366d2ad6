//! The engine facade. A [`Simulation`] owns the controls, the current sample's world (people,
//! contact graph and random stream) and the run statistics. Drivers call [`Simulation::reset`]
//! to start a sample and [`Simulation::step`] once per day.
//!
//! ```rust
//! use epitrace::{Controls, Simulation};
//!
//! let mut controls = Controls::default();
//! controls.set_control("population", 3000.0).unwrap();
//! let mut sim = Simulation::new(controls, 42).unwrap();
//! for day in 1..=5 {
//!     let summary = sim.step(day).unwrap();
//!     assert_eq!(summary.counts.total(), 3000);
//! }
//! ```
use log::{debug, trace};
use serde::Serialize;

use crate::controls::Controls;
use crate::error::SimError;
use crate::infection_manager::resolve_recovery_and_death;
use crate::network::ContactGraph;
use crate::population::{
    grid_columns, position_of, IsolationReason, Person, PersonId, PersonSnapshot, Status,
    StatusCounts,
};
use crate::random::SimRng;
use crate::stats::{DailyCounts, RunStats, StatKind, DEFAULT_MAX_DAYS, DEFAULT_MAX_SAMPLES};
use crate::testing_manager::{run_testing, TestingOutcome};
use crate::transmission_manager::spread_infection;

/// Initial infections are placed at every `SEED_STRIDE`-th id, starting at `SEED_STRIDE`.
pub const SEED_STRIDE: usize = 1000;

/// Everything that is rebuilt on reset.
#[derive(Debug, Clone)]
pub(crate) struct World {
    pub(crate) people: Vec<Person>,
    pub(crate) graph: ContactGraph,
    pub(crate) rng: SimRng,
    columns: usize,
}

impl World {
    fn build(controls: &Controls, base_seed: u64, sample: usize) -> Self {
        let population = controls.population();
        let mut rng = SimRng::for_sample(base_seed, sample);
        let graph = ContactGraph::build(
            &mut rng,
            population,
            controls.household_size(),
            controls.friend_radius(),
            controls.n_friends(),
        );

        let mut people = vec![Person::default(); population];
        for (household, members) in graph.households.iter().enumerate() {
            for id in members {
                people[id].household = household;
            }
        }

        let picks = |rng: &mut SimRng, p: f64| {
            let amount = (population as f64 * p).floor() as usize;
            rng.subset_indices(population, amount)
        };
        for id in picks(&mut rng, controls.p_show_symptoms()) {
            people[id].symptomatic = true;
        }
        for id in picks(&mut rng, controls.p_service_worker()) {
            people[id].service_worker = true;
        }
        for id in picks(&mut rng, controls.p_have_watch()) {
            people[id].has_watch = true;
        }
        for id in seed_ids(population) {
            people[id].infect(0);
        }

        World {
            people,
            graph,
            rng,
            columns: grid_columns(population),
        }
    }

    pub(crate) fn population(&self) -> usize {
        self.people.len()
    }

    pub(crate) fn infected_ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.people
            .iter()
            .enumerate()
            .filter(|(_, person)| person.is_infected())
            .map(|(id, _)| PersonId(id))
    }
}

/// The ids infected at the start of every sample: `SEED_STRIDE, 2 * SEED_STRIDE, ...` below
/// `population`.
pub fn seed_ids(population: usize) -> impl Iterator<Item = usize> {
    (SEED_STRIDE..population).step_by(SEED_STRIDE)
}

/// What happened on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: usize,
    pub new_infected: usize,
    pub recovered_or_dead: usize,
    pub tested: usize,
    pub isolated_by_symptom: usize,
    pub isolated_by_watch: usize,
    pub non_isolated_infected: usize,
    pub counts: StatusCounts,
}

/// The counter panel: who is sick, who is in isolation, and the day's infection ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayCounts {
    pub infected: usize,
    pub isolated_by_symptom: usize,
    pub isolated_by_watch: usize,
    pub dead: usize,
    pub recovered: usize,
    /// `100 * new_infected / (non-isolated infected + 0.01)`
    pub infection_ratio: f64,
}

pub struct Simulation {
    controls: Controls,
    base_seed: u64,
    world: World,
    stats: RunStats,
    sample: Option<usize>,
    clear_on_reset: bool,
    new_infected: usize,
    recovered_or_dead: usize,
    total_infected: usize,
}

impl Simulation {
    /// Builds an engine with the default statistics capacity and runs the first reset.
    pub fn new(controls: Controls, base_seed: u64) -> Result<Self, SimError> {
        Self::with_capacity(controls, base_seed, DEFAULT_MAX_SAMPLES, DEFAULT_MAX_DAYS)
    }

    pub fn with_capacity(
        controls: Controls,
        base_seed: u64,
        max_samples: usize,
        max_days: usize,
    ) -> Result<Self, SimError> {
        controls.validate()?;
        let stats = RunStats::new(max_samples, max_days);
        stats.check_sample(0)?;
        stats.check_day(0)?;
        let world = World::build(&controls, base_seed, 0);
        let mut simulation = Simulation {
            controls,
            base_seed,
            world,
            stats,
            sample: None,
            clear_on_reset: false,
            new_infected: 0,
            recovered_or_dead: 0,
            total_infected: 0,
        };
        simulation.install(0, None)?;
        Ok(simulation)
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Replaces the controls. Takes effect for the population and graph on the next reset;
    /// probabilities and daily contact parameters apply from the next step.
    pub fn set_controls(&mut self, controls: Controls) -> Result<(), SimError> {
        controls.validate()?;
        self.controls = controls;
        Ok(())
    }

    pub fn set_control(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        self.controls.set_control(name, value)
    }

    pub fn set_control_text(&mut self, name: &str, text: &str) -> Result<(), SimError> {
        self.controls.set_control_text(name, text)
    }

    /// Starts the next sample. The new world is built aside and swapped in only once the
    /// sample index is known to fit the statistics store.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.controls.validate()?;
        let sample = match (self.clear_on_reset, self.sample) {
            (true, _) | (false, None) => 0,
            (false, Some(previous)) => previous + 1,
        };
        self.stats.check_sample(sample)?;
        self.stats.check_day(0)?;
        let world = World::build(&self.controls, self.base_seed, sample);
        self.install(sample, Some(world))
    }

    fn install(&mut self, sample: usize, world: Option<World>) -> Result<(), SimError> {
        if self.clear_on_reset {
            self.clear_on_reset = false;
            self.stats.clear();
        }
        if let Some(world) = world {
            self.world = world;
        }
        let seeded = seed_ids(self.world.population()).count();
        self.stats.set(StatKind::NewlyInfected, sample, 0, seeded)?;
        self.sample = Some(sample);
        self.total_infected = seeded;
        self.new_infected = 0;
        self.recovered_or_dead = 0;
        debug!(
            "reset sample {sample}: {} people, {} households, {seeded} seeded",
            self.world.population(),
            self.world.graph.households.len()
        );
        Ok(())
    }

    /// Zeroes the statistics and restarts the sample index at the next reset.
    pub fn clear_statistics(&mut self) {
        self.clear_on_reset = true;
    }

    /// Runs recovery and death, testing, then spread for `day`, and records the day's
    /// statistics.
    pub fn step(&mut self, day: usize) -> Result<DaySummary, SimError> {
        let sample = self
            .sample
            .ok_or_else(|| SimError::from("step called before the first reset"))?;
        self.stats.check_day(day)?;

        trace!("day {day}: recovery and death");
        let removed = resolve_recovery_and_death(&mut self.world, &self.controls, day);
        self.stats
            .set(StatKind::RecoveredOrDead, sample, day, removed)?;
        self.recovered_or_dead = removed;

        trace!("day {day}: testing");
        let TestingOutcome {
            tested,
            isolated_by_symptom,
            isolated_by_watch,
        } = run_testing(&mut self.world, &self.controls, day);
        self.stats
            .set(StatKind::IsolatedBySymptom, sample, day, isolated_by_symptom)?;
        self.stats
            .set(StatKind::IsolatedByWatch, sample, day, isolated_by_watch)?;

        trace!("day {day}: spread");
        let new_infected = spread_infection(&mut self.world, &self.controls, day);
        self.stats
            .add(StatKind::NewlyInfected, sample, day, new_infected)?;
        self.new_infected = new_infected;
        self.total_infected += new_infected;

        let non_isolated_infected = self
            .world
            .people
            .iter()
            .filter(|person| person.is_infected() && !person.is_isolated(day))
            .count();
        self.stats
            .set(StatKind::NonIsolatedInfected, sample, day, non_isolated_infected)?;

        let summary = DaySummary {
            day,
            new_infected,
            recovered_or_dead: removed,
            tested,
            isolated_by_symptom,
            isolated_by_watch,
            non_isolated_infected,
            counts: self.status_counts(),
        };
        debug!("sample {sample} {summary:?}");
        Ok(summary)
    }

    /// Per-individual status, flags and grid position.
    pub fn people(&self) -> Vec<PersonSnapshot> {
        self.world
            .people
            .iter()
            .enumerate()
            .map(|(index, person)| {
                let id = PersonId(index);
                PersonSnapshot {
                    id,
                    status: person.status,
                    service_worker: person.service_worker,
                    isolated: person.isolated_on.is_some(),
                    isolation_reason: person.isolation_reason,
                    position: position_of(id, self.world.columns),
                }
            })
            .collect()
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.world.people.get(id.index())
    }

    pub fn population(&self) -> usize {
        self.world.population()
    }

    pub fn graph(&self) -> &ContactGraph {
        &self.world.graph
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.world.people)
    }

    /// The recorded counters of the current sample for `day`.
    pub fn daily_counts(&self, day: usize) -> Result<DailyCounts, SimError> {
        let sample = self.sample.unwrap_or(0);
        self.stats.daily_counts(sample, day)
    }

    /// Cumulative mean of `kind` over every sample since the last clear, days
    /// `0..=through_day`.
    pub fn cumulative_mean_series(
        &self,
        kind: StatKind,
        through_day: usize,
    ) -> Result<Vec<f64>, SimError> {
        self.stats
            .cumulative_mean_series(kind, self.sample.unwrap_or(0), through_day)
    }

    pub fn display_counts(&self, day: usize) -> DisplayCounts {
        let mut display = DisplayCounts {
            infected: 0,
            isolated_by_symptom: 0,
            isolated_by_watch: 0,
            dead: 0,
            recovered: 0,
            infection_ratio: 0.0,
        };
        let mut non_isolated_infected = 0;
        for person in &self.world.people {
            match person.status {
                Status::Infected => {
                    display.infected += 1;
                    if !person.is_isolated(day) {
                        non_isolated_infected += 1;
                    } else if person.isolation_reason == IsolationReason::BySymptom {
                        display.isolated_by_symptom += 1;
                    } else if person.isolation_reason == IsolationReason::ByWatch {
                        display.isolated_by_watch += 1;
                    }
                }
                Status::Dead => display.dead += 1,
                Status::Recovered => display.recovered += 1,
                Status::NonInfected => {}
            }
        }
        display.infection_ratio =
            100.0 * self.new_infected as f64 / (non_isolated_infected as f64 + 0.01);
        display
    }

    /// New infections of the last step.
    pub fn new_infected(&self) -> usize {
        self.new_infected
    }

    /// Removals of the last step.
    pub fn recovered_or_dead(&self) -> usize {
        self.recovered_or_dead
    }

    /// Everyone infected during the current sample, seeds included.
    pub fn total_infected(&self) -> usize {
        self.total_infected
    }

    /// Index of the current sample.
    pub fn sample(&self) -> Option<usize> {
        self.sample
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_controls(population: f64) -> Controls {
        let mut controls = Controls::default();
        controls.set_control("population", population).unwrap();
        controls
    }

    #[test]
    fn seeds_every_thousandth_id() {
        assert_eq!(seed_ids(999).count(), 0);
        assert_eq!(seed_ids(1000).count(), 0);
        assert_eq!(seed_ids(1001).collect::<Vec<_>>(), vec![1000]);
        assert_eq!(seed_ids(3500).collect::<Vec<_>>(), vec![1000, 2000, 3000]);
    }

    #[test]
    fn new_runs_the_first_reset() {
        let sim = Simulation::new(small_controls(2500.0), 1).unwrap();
        assert_eq!(sim.sample(), Some(0));
        assert_eq!(sim.population(), 2500);
        assert_eq!(sim.total_infected(), 2);
        assert_eq!(sim.daily_counts(0).unwrap().newly_infected, 2);
        assert_eq!(sim.status_counts().infected, 2);
    }

    #[test]
    fn flags_are_drawn_by_fraction() {
        let mut controls = small_controls(1000.0);
        controls
            .set_controls([
                ("p_show_symptoms", 0.5),
                ("p_service_worker", 0.1),
                ("p_have_watch", 0.25),
            ])
            .unwrap();
        let sim = Simulation::new(controls, 3).unwrap();
        let people = &sim.world.people;
        assert_eq!(people.iter().filter(|p| p.symptomatic).count(), 500);
        assert_eq!(people.iter().filter(|p| p.service_worker).count(), 100);
        assert_eq!(people.iter().filter(|p| p.has_watch).count(), 250);
    }

    #[test]
    fn reset_advances_the_sample_until_capacity() {
        let mut sim = Simulation::with_capacity(small_controls(200.0), 1, 2, 10).unwrap();
        sim.reset().unwrap();
        assert_eq!(sim.sample(), Some(1));
        assert!(matches!(
            sim.reset(),
            Err(SimError::CapacityExceeded { what: "sample", .. })
        ));
        assert_eq!(sim.sample(), Some(1));

        sim.clear_statistics();
        sim.reset().unwrap();
        assert_eq!(sim.sample(), Some(0));
    }

    #[test]
    fn failed_reset_keeps_the_world() {
        let mut sim = Simulation::with_capacity(small_controls(300.0), 1, 1, 10).unwrap();
        let before = sim.people();
        sim.set_control("population", 50.0).unwrap();
        assert!(sim.reset().is_err());
        assert_eq!(sim.people(), before);
    }

    #[test]
    fn step_beyond_max_days_fails() {
        let mut sim = Simulation::with_capacity(small_controls(200.0), 1, 2, 10).unwrap();
        assert!(sim.step(9).is_ok());
        assert!(matches!(
            sim.step(10),
            Err(SimError::CapacityExceeded { what: "day", .. })
        ));
    }

    #[test]
    fn rejected_controls_are_not_applied() {
        let mut sim = Simulation::new(small_controls(200.0), 1).unwrap();
        assert!(sim.set_control_text("p_die", "abc").is_err());
        let mut bad = sim.controls().clone();
        assert!(bad.set_control("p_die", 3.0).is_err());
        assert_eq!(sim.controls(), &small_controls(200.0));
    }

    #[test]
    fn display_ratio_uses_the_last_step() {
        let mut sim = Simulation::new(small_controls(2000.0), 9).unwrap();
        let display = sim.display_counts(0);
        assert_eq!(display.infected, 1);
        assert!(display.infection_ratio.abs() < f64::EPSILON);
        sim.step(1).unwrap();
        let display = sim.display_counts(1);
        let expected = 100.0 * sim.new_infected() as f64
            / ((sim.status_counts().infected - display.isolated_by_symptom - display.isolated_by_watch)
                as f64
                + 0.01);
        assert!((display.infection_ratio - expected).abs() < 1e-9);
    }
}
