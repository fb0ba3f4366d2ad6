//! Spread of infection through households, friends and strangers.
use log::trace;

use crate::controls::Controls;
use crate::network::StrangerReach;
use crate::population::PersonId;
use crate::simulation::World;

/// Infects `candidates` with probability `p` each, skipping anyone no longer susceptible.
/// Returns the newly infected ids.
fn expose(
    world: &mut World,
    candidates: impl IntoIterator<Item = PersonId>,
    p: f64,
    day: usize,
) -> Vec<PersonId> {
    let mut infected = Vec::new();
    for id in candidates {
        let person = &mut world.people[id.index()];
        if person.is_susceptible() && world.rng.chance(p) {
            person.infect(day);
            infected.push(id);
        }
    }
    infected
}

/// Runs one day of transmission and returns the number of new infections.
///
/// The spreaders are everyone infected and not yet isolated at the start of the stage. They
/// are visited in id order; each exposes their household, a Poisson number of friends, and a
/// fresh sample of strangers. New infections take effect immediately, so they are no longer
/// susceptible to later exposures on the same day, but they do not spread until tomorrow.
pub(crate) fn spread_infection(world: &mut World, controls: &Controls, day: usize) -> usize {
    let spreaders: Vec<PersonId> = world
        .infected_ids()
        .filter(|id| !world.people[id.index()].is_isolated(day))
        .collect();
    let ordinary = StrangerReach {
        radius: controls.stranger_radius(),
        count: controls.strangers_per_day(),
    };
    let service = StrangerReach {
        radius: controls.service_stranger_radius(),
        count: controls.service_strangers_per_day(),
    };

    let mut new_infected = 0;
    for &spreader in &spreaders {
        let (household, service_worker, has_watch) = {
            let person = &world.people[spreader.index()];
            (person.household, person.service_worker, person.has_watch)
        };

        let members = world.graph.households.members(household).map(PersonId);
        let mut infected = expose(world, members, controls.p_infect_family(), day);

        let n_today = world.rng.poisson(controls.friends_per_day());
        let friends = world.graph.friends.friends_of(spreader);
        let friends_today = world.rng.choose_from(friends, n_today);
        infected.extend(expose(world, friends_today, controls.p_infect_friend(), day));

        let reach = if service_worker { service } else { ordinary };
        let strangers = world
            .graph
            .sample_strangers(&mut world.rng, spreader, household, reach);
        infected.extend(expose(world, strangers, controls.p_infect_stranger(), day));

        if has_watch {
            world.graph.pending.record(spreader, infected.iter().copied());
        }
        new_infected += infected.len();
    }

    trace!(
        "day {day}: {} spreaders infected {new_infected}",
        spreaders.len()
    );
    new_infected
}
