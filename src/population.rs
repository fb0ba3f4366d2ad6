//! Per-individual state. A [`Person`] is one row of the population table; the table is rebuilt
//! from scratch on every reset.
use std::fmt;

use serde::Serialize;

/// Index of an individual, `0..population`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PersonId(pub usize);

impl PersonId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Status {
    #[default]
    NonInfected,
    Infected,
    Recovered,
    Dead,
}

impl Status {
    /// Recovered and Dead are terminal.
    pub fn is_removed(self) -> bool {
        matches!(self, Status::Recovered | Status::Dead)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum IsolationReason {
    #[default]
    None,
    BySymptom,
    ByWatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub status: Status,
    pub infection_day: Option<usize>,
    pub household: usize,
    pub service_worker: bool,
    pub has_watch: bool,
    pub symptomatic: bool,
    /// First day in isolation; `None` until an isolation is scheduled.
    pub isolated_on: Option<usize>,
    pub isolation_reason: IsolationReason,
    /// Watch alerts received since the last testing round.
    pub needs_test: u32,
}

impl Default for Person {
    fn default() -> Self {
        Person {
            status: Status::NonInfected,
            infection_day: None,
            household: 0,
            service_worker: false,
            has_watch: false,
            symptomatic: false,
            isolated_on: None,
            isolation_reason: IsolationReason::None,
            needs_test: 0,
        }
    }
}

impl Person {
    pub fn is_infected(&self) -> bool {
        self.status == Status::Infected
    }

    pub fn is_susceptible(&self) -> bool {
        self.status == Status::NonInfected
    }

    /// Days since infection, or `None` if never infected.
    pub fn days_sick(&self, day: usize) -> Option<usize> {
        self.infection_day.map(|onset| day.saturating_sub(onset))
    }

    /// True once the isolation day has arrived.
    pub fn is_isolated(&self, day: usize) -> bool {
        self.isolated_on.is_some_and(|from_day| from_day <= day)
    }

    pub fn infect(&mut self, day: usize) {
        self.status = Status::Infected;
        self.infection_day = Some(day);
    }

    pub fn isolate(&mut self, from_day: usize, reason: IsolationReason) {
        self.isolated_on = Some(from_day);
        self.isolation_reason = reason;
    }
}

/// Scatter-plot coordinates of an individual, laid out in a grid roughly 11 wide by 3 high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

/// Number of grid columns for `population` individuals.
pub fn grid_columns(population: usize) -> usize {
    const WIDTH: f64 = 11.0;
    const HEIGHT: f64 = 3.0;
    let columns = ((population as f64 / HEIGHT / WIDTH).sqrt() * WIDTH).round() as usize;
    columns.max(1)
}

pub fn position_of(id: PersonId, columns: usize) -> Position {
    Position {
        x: id.index() % columns,
        y: id.index() / columns,
    }
}

/// What a renderer needs to draw one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonSnapshot {
    pub id: PersonId,
    pub status: Status,
    pub service_worker: bool,
    pub isolated: bool,
    pub isolation_reason: IsolationReason,
    pub position: Position,
}

/// Totals by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub non_infected: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl StatusCounts {
    pub fn tally<'a>(people: impl IntoIterator<Item = &'a Person>) -> Self {
        let mut counts = StatusCounts::default();
        for person in people {
            match person.status {
                Status::NonInfected => counts.non_infected += 1,
                Status::Infected => counts.infected += 1,
                Status::Recovered => counts.recovered += 1,
                Status::Dead => counts.dead += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.non_infected + self.infected + self.recovered + self.dead
    }
}
