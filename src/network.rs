//! The contact graph: households, stable friend sets, per-exposure stranger samples, and the
//! contacts each watch owner has infected but not yet reported.
//!
//! Individuals live on a line of ids; "nearby" always means a window of ids around a person.
//! Households are contiguous runs of ids. Friend sets are drawn once per reset and stored in a
//! flat arena. Strangers are never stored: a fresh sample is drawn for each exposure.
use std::ops::{Range, RangeInclusive};

use indexmap::IndexSet;
use log::trace;

use crate::population::PersonId;
use crate::random::SimRng;
use crate::HashMap;

/// The ids within `radius` of `id`, clipped to the population.
pub fn window(id: usize, radius: usize, population: usize) -> RangeInclusive<usize> {
    let low = id.saturating_sub(radius);
    let high = id.saturating_add(radius).min(population.saturating_sub(1));
    low..=high
}

/// A partition of `0..population` into consecutive households.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Households {
    /// Start of every household, followed by the population size.
    starts: Vec<usize>,
}

impl Households {
    /// Draws household sizes as `max(1, Poisson(mean))` until everyone is covered. The last
    /// household is cut short at the population boundary.
    pub fn build(rng: &mut SimRng, population: usize, mean_size: f64) -> Self {
        let mut starts = Vec::with_capacity(population / mean_size.max(1.0) as usize + 2);
        let mut next = 0;
        while next < population {
            starts.push(next);
            let size = rng.poisson(mean_size).max(1);
            next = (next + size).min(population);
        }
        starts.push(population);
        trace!("built {} households for {population} people", starts.len() - 1);
        Households { starts }
    }

    pub fn len(&self) -> usize {
        self.starts.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ids of household `household`.
    pub fn members(&self, household: usize) -> Range<usize> {
        self.starts[household]..self.starts[household + 1]
    }

    pub fn household_of(&self, id: PersonId) -> usize {
        self.starts.partition_point(|&start| start <= id.index()) - 1
    }

    /// Iterates over every household's id range in order.
    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.starts.windows(2).map(|pair| pair[0]..pair[1])
    }
}

/// Friend sets stored back to back: person `i` owns `friends[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendArena {
    offsets: Vec<usize>,
    friends: Vec<PersonId>,
}

impl FriendArena {
    /// For every person, picks `min(n_friends, candidates)` ids uniformly from the window of
    /// `radius` around them, minus their household. Each set is stored sorted.
    pub fn build(
        rng: &mut SimRng,
        households: &Households,
        radius: usize,
        n_friends: usize,
    ) -> Self {
        let population = households.starts.last().copied().unwrap_or(0);
        let mut offsets = Vec::with_capacity(population + 1);
        let per_person = n_friends.min(radius.saturating_mul(2));
        let mut friends = Vec::with_capacity(population.saturating_mul(per_person).min(1 << 24));
        let mut candidates: Vec<usize> = Vec::new();
        offsets.push(0);

        for household in households.iter() {
            for id in household.clone() {
                candidates.clear();
                candidates.extend(window(id, radius, population).filter(|j| !household.contains(j)));
                let start = friends.len();
                friends.extend(
                    rng.subset_indices(candidates.len(), n_friends)
                        .into_iter()
                        .map(|index| PersonId(candidates[index])),
                );
                friends[start..].sort_unstable();
                offsets.push(friends.len());
            }
        }

        FriendArena { offsets, friends }
    }

    pub fn friends_of(&self, id: PersonId) -> &[PersonId] {
        &self.friends[self.offsets[id.index()]..self.offsets[id.index() + 1]]
    }

    pub fn is_friend(&self, id: PersonId, other: PersonId) -> bool {
        self.friends_of(id).binary_search(&other).is_ok()
    }

    /// Total number of stored friendships.
    pub fn len(&self) -> usize {
        self.friends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }
}

/// Radius and head count of a stranger sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrangerReach {
    pub radius: usize,
    pub count: usize,
}

/// Contacts each watch owner infected, in the order they were infected, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct PendingContacts {
    by_owner: HashMap<PersonId, IndexSet<PersonId>>,
}

impl PendingContacts {
    pub fn record(&mut self, owner: PersonId, contacts: impl IntoIterator<Item = PersonId>) {
        let mut contacts = contacts.into_iter().peekable();
        if contacts.peek().is_none() {
            return;
        }
        self.by_owner.entry(owner).or_default().extend(contacts);
    }

    /// Removes and returns the owner's pending contacts.
    pub fn take(&mut self, owner: PersonId) -> Option<IndexSet<PersonId>> {
        self.by_owner.remove(&owner)
    }

    pub fn contacts_of(&self, owner: PersonId) -> Option<&IndexSet<PersonId>> {
        self.by_owner.get(&owner)
    }

    /// Number of owners with pending contacts.
    pub fn owners(&self) -> usize {
        self.by_owner.len()
    }
}

/// The full contact graph of one sample.
#[derive(Debug, Clone)]
pub struct ContactGraph {
    pub households: Households,
    pub friends: FriendArena,
    pub pending: PendingContacts,
    population: usize,
}

impl ContactGraph {
    pub fn build(
        rng: &mut SimRng,
        population: usize,
        mean_household_size: f64,
        friend_radius: usize,
        n_friends: usize,
    ) -> Self {
        let households = Households::build(rng, population, mean_household_size);
        let friends = FriendArena::build(rng, &households, friend_radius, n_friends);
        ContactGraph {
            households,
            friends,
            pending: PendingContacts::default(),
            population,
        }
    }

    pub fn population(&self) -> usize {
        self.population
    }

    /// Draws up to `reach.count` distinct ids from the window around `id`, skipping the
    /// household and the friend set. Returns fewer when the window runs out.
    pub fn sample_strangers(
        &self,
        rng: &mut SimRng,
        id: PersonId,
        household: usize,
        reach: StrangerReach,
    ) -> Vec<PersonId> {
        let household = self.households.members(household);
        let nearby = window(id.index(), reach.radius, self.population);
        let requested = reach.count.min(nearby.end() + 1 - nearby.start());
        let candidates = nearby
            .filter(|j| !household.contains(j))
            .map(PersonId)
            .filter(|&other| !self.friends.is_friend(id, other));
        rng.choose_from_iter(candidates, requested)
    }
}
