//! Testing, isolation and watch contact tracing.
//!
//! Each day a share of the symptomatic, not yet isolated infected people is tested (bounded by
//! the daily test capacity) and isolated after the test-to-isolate delay. People alerted by a
//! watch are isolated the same day. Everyone newly isolated then warns the contacts their
//! watch recorded; those contacts are isolated on the next testing round.
use log::trace;

use crate::controls::Controls;
use crate::population::{IsolationReason, PersonId};
use crate::simulation::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestingOutcome {
    pub tested: usize,
    pub isolated_by_symptom: usize,
    pub isolated_by_watch: usize,
}

/// Number of tests available for `candidates` people.
pub fn test_capacity(candidates: usize, p_test: f64, tests_per_day: usize) -> usize {
    let wanted = (p_test * candidates as f64).ceil() as usize;
    wanted.min(tests_per_day)
}

pub(crate) fn run_testing(world: &mut World, controls: &Controls, day: usize) -> TestingOutcome {
    let days_till_symptoms = controls.days_till_symptoms();
    let candidates: Vec<PersonId> = world
        .infected_ids()
        .filter(|id| {
            let person = &world.people[id.index()];
            person.symptomatic
                && person.isolated_on.is_none()
                && person
                    .days_sick(day)
                    .is_some_and(|days| days > days_till_symptoms)
        })
        .collect();

    let capacity = test_capacity(candidates.len(), controls.p_test(), controls.tests_per_day());
    let tested: Vec<PersonId> = world
        .rng
        .subset_indices(candidates.len(), capacity)
        .into_iter()
        .map(|index| candidates[index])
        .collect();

    // Negative tests are not isolated.
    let isolate_from = day.saturating_add(controls.test_to_isolate());
    let mut newly_isolated: Vec<PersonId> = Vec::with_capacity(tested.len());
    for &id in &tested {
        let person = &mut world.people[id.index()];
        if person.is_infected() {
            person.isolate(isolate_from, IsolationReason::BySymptom);
            newly_isolated.push(id);
        }
    }
    let isolated_by_symptom = newly_isolated.len();

    let mut isolated_by_watch = 0;
    for (index, person) in world.people.iter_mut().enumerate() {
        if person.needs_test != 0 {
            person.isolate(day, IsolationReason::ByWatch);
            newly_isolated.push(PersonId(index));
            isolated_by_watch += 1;
        }
    }

    newly_isolated.sort_unstable();
    newly_isolated.dedup();
    trace_contacts(world, &newly_isolated);

    trace!(
        "day {day}: {} candidates, tested {}, isolated {isolated_by_symptom} by symptom and \
         {isolated_by_watch} by watch",
        candidates.len(),
        tested.len()
    );
    TestingOutcome {
        tested: tested.len(),
        isolated_by_symptom,
        isolated_by_watch,
    }
}

/// Flags the recorded contacts of every newly isolated person for testing, then clears the
/// isolated people's own alerts.
fn trace_contacts(world: &mut World, newly_isolated: &[PersonId]) {
    for &id in newly_isolated {
        if let Some(contacts) = world.graph.pending.take(id) {
            trace!("{id} warns {} contacts", contacts.len());
            for contact in contacts {
                world.people[contact.index()].needs_test += 1;
            }
        }
    }
    for &id in newly_isolated {
        world.people[id.index()].needs_test = 0;
    }
}
