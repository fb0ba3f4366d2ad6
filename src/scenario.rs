//! Scenario scripts: a titled sequence of phases, each overriding some controls for a number
//! of days.
//!
//! ```json
//! {
//!   "title": "Relaxed SIP",
//!   "phases": [
//!     { "days": 20, "controls": {} },
//!     { "days": 40, "controls": { "friends_per_day": 0.5, "strangers_per_day": 0 } },
//!     { "days": 60, "controls": { "friends_per_day": 2, "strangers_per_day": 3 } }
//!   ]
//! }
//! ```
//!
//! Phase overrides accumulate: phase `k` runs with the base controls plus the overrides of
//! phases `0..=k`. The sample ends when the last phase runs out of days.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::controls::{ControlValue, Controls};
use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioPhase {
    pub days: usize,
    #[serde(default)]
    pub controls: BTreeMap<String, ControlValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    pub title: String,
    pub phases: Vec<ScenarioPhase>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the phase lengths and that every override names a real control with a valid
    /// value. The population is fixed per sample, so only the first phase may set it.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.phases.is_empty() {
            return Err(SimError::ScenarioError(format!(
                "scenario `{}` has no phases",
                self.title
            )));
        }
        let mut controls = Controls::default();
        for (index, phase) in self.phases.iter().enumerate() {
            if phase.days == 0 {
                return Err(SimError::ScenarioError(format!(
                    "phase {index} of scenario `{}` lasts zero days",
                    self.title
                )));
            }
            if index > 0 && phase.controls.contains_key("population") {
                return Err(SimError::ScenarioError(format!(
                    "phase {index} of scenario `{}` changes the population mid-sample",
                    self.title
                )));
            }
            controls.apply_overrides(&phase.controls)?;
        }
        Ok(())
    }

    /// Days covered by all phases together.
    pub fn total_days(&self) -> usize {
        self.phases.iter().map(|phase| phase.days).sum()
    }

    /// The phase running on `day` (days count from 1), or `None` once the script is over.
    pub fn phase_at(&self, day: usize) -> Option<usize> {
        if day == 0 {
            return Some(0);
        }
        let mut last_day = 0;
        for (index, phase) in self.phases.iter().enumerate() {
            last_day += phase.days;
            if day <= last_day {
                return Some(index);
            }
        }
        None
    }

    /// The controls in force during phase `index`.
    pub fn controls_for_phase(&self, base: &Controls, index: usize) -> Result<Controls, SimError> {
        let mut controls = base.clone();
        for phase in self.phases.iter().take(index + 1) {
            controls.apply_overrides(&phase.controls)?;
        }
        Ok(controls)
    }
}
