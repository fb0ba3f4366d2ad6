//! Run statistics: one counter per `(kind, sample, day)` in a fixed-capacity store that survives
//! resets until it is cleared, plus the cumulative-mean views used for the run-level curves.
use serde::Serialize;
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::SimError;

pub const DEFAULT_MAX_SAMPLES: usize = 20;
pub const DEFAULT_MAX_DAYS: usize = 500;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    NewlyInfected,
    NonIsolatedInfected,
    IsolatedBySymptom,
    IsolatedByWatch,
    RecoveredOrDead,
}

/// The five counters of one sample and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DailyCounts {
    pub newly_infected: usize,
    pub non_isolated_infected: usize,
    pub isolated_by_symptom: usize,
    pub isolated_by_watch: usize,
    pub recovered_or_dead: usize,
}

impl DailyCounts {
    pub fn get(&self, kind: StatKind) -> usize {
        match kind {
            StatKind::NewlyInfected => self.newly_infected,
            StatKind::NonIsolatedInfected => self.non_isolated_infected,
            StatKind::IsolatedBySymptom => self.isolated_by_symptom,
            StatKind::IsolatedByWatch => self.isolated_by_watch,
            StatKind::RecoveredOrDead => self.recovered_or_dead,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    max_samples: usize,
    max_days: usize,
    /// Laid out `[kind][sample][day]`.
    values: Vec<usize>,
}

impl Default for RunStats {
    fn default() -> Self {
        RunStats::new(DEFAULT_MAX_SAMPLES, DEFAULT_MAX_DAYS)
    }
}

impl RunStats {
    pub fn new(max_samples: usize, max_days: usize) -> Self {
        RunStats {
            max_samples,
            max_days,
            values: vec![0; StatKind::COUNT * max_samples * max_days],
        }
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn max_days(&self) -> usize {
        self.max_days
    }

    pub fn check_sample(&self, sample: usize) -> Result<(), SimError> {
        if sample >= self.max_samples {
            return Err(SimError::CapacityExceeded {
                what: "sample",
                index: sample,
                capacity: self.max_samples,
            });
        }
        Ok(())
    }

    pub fn check_day(&self, day: usize) -> Result<(), SimError> {
        if day >= self.max_days {
            return Err(SimError::CapacityExceeded {
                what: "day",
                index: day,
                capacity: self.max_days,
            });
        }
        Ok(())
    }

    fn offset(&self, kind: StatKind, sample: usize, day: usize) -> Result<usize, SimError> {
        self.check_sample(sample)?;
        self.check_day(day)?;
        Ok((kind as usize * self.max_samples + sample) * self.max_days + day)
    }

    pub fn get(&self, kind: StatKind, sample: usize, day: usize) -> Result<usize, SimError> {
        Ok(self.values[self.offset(kind, sample, day)?])
    }

    pub fn set(
        &mut self,
        kind: StatKind,
        sample: usize,
        day: usize,
        value: usize,
    ) -> Result<(), SimError> {
        let offset = self.offset(kind, sample, day)?;
        self.values[offset] = value;
        Ok(())
    }

    pub fn add(
        &mut self,
        kind: StatKind,
        sample: usize,
        day: usize,
        value: usize,
    ) -> Result<(), SimError> {
        let offset = self.offset(kind, sample, day)?;
        self.values[offset] += value;
        Ok(())
    }

    /// Zeroes every counter.
    pub fn clear(&mut self) {
        self.values.fill(0);
    }

    pub fn daily_counts(&self, sample: usize, day: usize) -> Result<DailyCounts, SimError> {
        Ok(DailyCounts {
            newly_infected: self.get(StatKind::NewlyInfected, sample, day)?,
            non_isolated_infected: self.get(StatKind::NonIsolatedInfected, sample, day)?,
            isolated_by_symptom: self.get(StatKind::IsolatedBySymptom, sample, day)?,
            isolated_by_watch: self.get(StatKind::IsolatedByWatch, sample, day)?,
            recovered_or_dead: self.get(StatKind::RecoveredOrDead, sample, day)?,
        })
    }

    fn series(&self, kind: StatKind, sample: usize) -> &[usize] {
        let start = (kind as usize * self.max_samples + sample) * self.max_days;
        &self.values[start..start + self.max_days]
    }

    /// For each day in `0..=through_day`, the running sum of `kind` averaged over samples
    /// `0..=last_sample`.
    pub fn cumulative_mean_series(
        &self,
        kind: StatKind,
        last_sample: usize,
        through_day: usize,
    ) -> Result<Vec<f64>, SimError> {
        self.check_sample(last_sample)?;
        self.check_day(through_day)?;
        let samples = last_sample + 1;
        let mut totals = vec![0usize; through_day + 1];
        for sample in 0..samples {
            let mut running = 0;
            for (day, value) in self.series(kind, sample)[..=through_day].iter().enumerate() {
                running += value;
                totals[day] += running;
            }
        }
        Ok(totals
            .into_iter()
            .map(|total| total as f64 / samples as f64)
            .collect())
    }

    /// The last point of [`RunStats::cumulative_mean_series`].
    pub fn cumulative_mean(
        &self,
        kind: StatKind,
        last_sample: usize,
        through_day: usize,
    ) -> Result<f64, SimError> {
        let series = self.cumulative_mean_series(kind, last_sample, through_day)?;
        Ok(series.last().copied().unwrap_or(0.0))
    }

    /// Every kind, in declaration order.
    pub fn kinds() -> impl Iterator<Item = StatKind> {
        StatKind::iter()
    }
}
