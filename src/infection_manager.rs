//! Disease progression: ends infections by recovery or death.
use log::trace;

use crate::controls::Controls;
use crate::population::Status;
use crate::simulation::World;

/// Anyone still infected after this many days dies.
pub const MAX_SICK_DAYS: usize = 20;

/// Resolves recovery and death for `day` and returns how many people were removed.
///
/// People sick for more than [`MAX_SICK_DAYS`] die. Everyone else sick for more than
/// `min_days_sick` days dies with probability `p_die`, and otherwise recovers with
/// probability `p_recover`.
pub(crate) fn resolve_recovery_and_death(world: &mut World, controls: &Controls, day: usize) -> usize {
    let min_days_sick = controls.min_days_sick();
    let (p_die, p_recover) = (controls.p_die(), controls.p_recover());
    let mut died = 0;
    let mut recovered = 0;

    for person in world.people.iter_mut().filter(|person| person.is_infected()) {
        let Some(days_sick) = person.days_sick(day) else {
            continue;
        };
        if days_sick > MAX_SICK_DAYS {
            person.status = Status::Dead;
            died += 1;
        } else if days_sick > min_days_sick {
            if world.rng.chance(p_die) {
                person.status = Status::Dead;
                died += 1;
            } else if world.rng.chance(p_recover) {
                person.status = Status::Recovered;
                recovered += 1;
            }
        }
    }

    trace!("day {day}: {recovered} recovered, {died} died");
    died + recovered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::PersonId;
    use crate::{Controls, Simulation};

    fn simulation(overrides: &[(&str, f64)]) -> Simulation {
        let mut controls = Controls::default();
        controls.set_control("population", 2000.0).unwrap();
        controls
            .set_controls(overrides.iter().copied())
            .unwrap();
        Simulation::new(controls, 17).unwrap()
    }

    #[test]
    fn certain_recovery_after_min_days() {
        let mut sim = simulation(&[
            ("min_days_sick", 10.0),
            ("p_die", 0.0),
            ("p_recover", 1.0),
            ("p_infect_family", 0.0),
            ("p_infect_friend", 0.0),
            ("p_infect_stranger", 0.0),
        ]);
        for day in 1..=10 {
            sim.step(day).unwrap();
            assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Infected);
        }
        let summary = sim.step(11).unwrap();
        assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Recovered);
        assert_eq!(summary.recovered_or_dead, 1);
    }

    #[test]
    fn long_illness_is_fatal() {
        let mut sim = simulation(&[
            ("min_days_sick", 100.0),
            ("p_infect_family", 0.0),
            ("p_infect_friend", 0.0),
            ("p_infect_stranger", 0.0),
        ]);
        for day in 1..=20 {
            sim.step(day).unwrap();
        }
        assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Infected);
        sim.step(21).unwrap();
        assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Dead);
    }

    #[test]
    fn certain_death_wins_over_recovery() {
        let mut sim = simulation(&[
            ("min_days_sick", 0.0),
            ("p_die", 1.0),
            ("p_recover", 1.0),
            ("p_infect_family", 0.0),
            ("p_infect_friend", 0.0),
            ("p_infect_stranger", 0.0),
        ]);
        sim.step(1).unwrap();
        assert_eq!(sim.person(PersonId(1000)).unwrap().status, Status::Dead);
        assert_eq!(sim.recovered_or_dead(), 1);
    }
}
