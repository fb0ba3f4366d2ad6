//! An agent-based SIR engine with testing, isolation and watch contact tracing.
//!
//! A population of individuals lives on a line of ids, grouped into households and linked to
//! nearby friends. Each simulated day runs three stages in order:
//! * recovery and death of people who have been sick long enough,
//! * testing of symptomatic cases, isolation, and contact tracing through watches,
//! * spread of infection to household members, friends and strangers.
//!
//! The [`Simulation`] facade owns the [`Controls`], the current sample's population and
//! contact graph, and the run statistics, which are aggregated across repeated samples. The
//! `epitrace` binary drives batches of samples from JSON controls and scenario scripts and
//! writes CSV reports (see [`runner`]).
pub mod controls;
pub mod error;
pub mod hashing;
pub mod infection_manager;
pub mod log;
pub mod network;
pub mod population;
pub mod random;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod stats;
pub mod testing_manager;
pub mod transmission_manager;

pub use controls::{ControlId, Controls};
pub use error::SimError;
pub use hashing::{HashMap, HashSet};
pub use population::{IsolationReason, Person, PersonId, Status, StatusCounts};
pub use scenario::Scenario;
pub use simulation::{DaySummary, DisplayCounts, Simulation};
pub use stats::{DailyCounts, RunStats, StatKind};

// Re-exports
pub use rand;

// Logging macros
pub use crate::log::{debug, error, info, trace, warn};
