//! The control parameters of a run. Controls are a plain value object described by an explicit,
//! ordered schema ([`SCHEMA`]): every control has a name, a kind that fixes its domain, and a
//! default. Updates are all-or-nothing: a rejected update leaves every previous value in place.
//!
//! Controls can be loaded from a JSON object of `name: value` pairs, where each value is either
//! a number or numeric text:
//!
//! ```json
//! { "population": 5000, "p_infect_friend": 0.03, "tests_per_day": "250" }
//! ```
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::SimError;

pub const CONTROL_COUNT: usize = 22;

/// Identifies one control. The discriminant is the control's position in [`SCHEMA`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    Population,
    MinDaysSick,
    PRecover,
    PDie,
    PInfectFamily,
    PInfectFriend,
    PInfectStranger,
    HouseholdSize,
    NFriends,
    FriendsPerDay,
    FriendRadius,
    StrangersPerDay,
    StrangerRadius,
    PServiceWorker,
    ServiceStrangersPerDay,
    ServiceStrangerRadius,
    DaysTillSymptoms,
    PShowSymptoms,
    PTest,
    TestsPerDay,
    PHaveWatch,
    TestToIsolate,
}

impl ControlId {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ControlSpec {
        &SCHEMA[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The domain of a control's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// A whole number of at least one.
    PositiveCount,
    /// A non-negative whole number.
    Count,
    /// A real number in `[0, 1]`.
    Probability,
    /// A non-negative finite real, used as a Poisson mean.
    Rate,
}

impl ControlKind {
    fn check(self, value: f64) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("{value} is not a finite number"));
        }
        match self {
            ControlKind::PositiveCount if value < 1.0 || value.fract() != 0.0 => {
                Err(format!("{value} is not a whole number of at least 1"))
            }
            ControlKind::Count if value < 0.0 || value.fract() != 0.0 => {
                Err(format!("{value} is not a non-negative whole number"))
            }
            ControlKind::Probability if !(0.0..=1.0).contains(&value) => {
                Err(format!("{value} is not a probability in [0, 1]"))
            }
            ControlKind::Rate if value < 0.0 => Err(format!("{value} is not a non-negative rate")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub id: ControlId,
    pub name: &'static str,
    pub kind: ControlKind,
    pub default: f64,
}

const fn control(id: ControlId, name: &'static str, kind: ControlKind, default: f64) -> ControlSpec {
    ControlSpec {
        id,
        name,
        kind,
        default,
    }
}

/// Every control in schema order.
pub static SCHEMA: [ControlSpec; CONTROL_COUNT] = [
    control(ControlId::Population, "population", ControlKind::PositiveCount, 20000.0),
    control(ControlId::MinDaysSick, "min_days_sick", ControlKind::Count, 10.0),
    control(ControlId::PRecover, "p_recover", ControlKind::Probability, 0.54),
    control(ControlId::PDie, "p_die", ControlKind::Probability, 0.04),
    control(ControlId::PInfectFamily, "p_infect_family", ControlKind::Probability, 0.05),
    control(ControlId::PInfectFriend, "p_infect_friend", ControlKind::Probability, 0.02),
    control(ControlId::PInfectStranger, "p_infect_stranger", ControlKind::Probability, 0.02),
    control(ControlId::HouseholdSize, "household_size", ControlKind::Rate, 3.0),
    control(ControlId::NFriends, "n_friends", ControlKind::Count, 10.0),
    control(ControlId::FriendsPerDay, "friends_per_day", ControlKind::Rate, 2.0),
    control(ControlId::FriendRadius, "friend_radius", ControlKind::Count, 30.0),
    control(ControlId::StrangersPerDay, "strangers_per_day", ControlKind::Count, 3.0),
    control(ControlId::StrangerRadius, "stranger_radius", ControlKind::Count, 50.0),
    control(ControlId::PServiceWorker, "p_service_worker", ControlKind::Probability, 0.05),
    control(ControlId::ServiceStrangersPerDay, "service_strangers_per_day", ControlKind::Count, 10.0),
    control(ControlId::ServiceStrangerRadius, "service_stranger_radius", ControlKind::Count, 30.0),
    control(ControlId::DaysTillSymptoms, "days_till_symptoms", ControlKind::Count, 5.0),
    control(ControlId::PShowSymptoms, "p_show_symptoms", ControlKind::Probability, 0.75),
    control(ControlId::PTest, "p_test", ControlKind::Probability, 0.90),
    control(ControlId::TestsPerDay, "tests_per_day", ControlKind::Count, 2000.0),
    control(ControlId::PHaveWatch, "p_have_watch", ControlKind::Probability, 0.001),
    control(ControlId::TestToIsolate, "test_to_isolate", ControlKind::Count, 2.0),
];

/// Looks a control up by name.
pub fn lookup(name: &str) -> Result<&'static ControlSpec, SimError> {
    SCHEMA
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| SimError::config(name, "no such control"))
}

/// A control value as it appears in a JSON file: a number, or text holding a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Number(f64),
    Text(String),
}

impl ControlValue {
    pub fn resolve(&self, name: &str) -> Result<f64, SimError> {
        match self {
            ControlValue::Number(value) => Ok(*value),
            ControlValue::Text(text) => parse_control_text(name, text),
        }
    }
}

impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        ControlValue::Number(value)
    }
}

fn parse_control_text(name: &str, text: &str) -> Result<f64, SimError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| SimError::config(name, format!("`{text}` is not a number")))
}

/// A full set of control values.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    values: [f64; CONTROL_COUNT],
}

impl Default for Controls {
    fn default() -> Self {
        let mut values = [0.0; CONTROL_COUNT];
        for spec in &SCHEMA {
            values[spec.id.index()] = spec.default;
        }
        Controls { values }
    }
}

impl Controls {
    pub fn get(&self, id: ControlId) -> f64 {
        self.values[id.index()]
    }

    /// Iterates over `(name, value)` in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        SCHEMA
            .iter()
            .map(move |spec| (spec.name, self.values[spec.id.index()]))
    }

    /// Applies a batch of named values. Either every value is accepted or none is.
    pub fn set_controls<'a, I>(&mut self, values: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut staged = self.values;
        for (name, value) in values {
            let spec = lookup(name)?;
            spec.kind
                .check(value)
                .map_err(|reason| SimError::config(name, reason))?;
            staged[spec.id.index()] = value;
        }
        self.values = staged;
        Ok(())
    }

    pub fn set_control(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        self.set_controls([(name, value)])
    }

    /// Sets a control from text, e.g. the contents of an edit box.
    pub fn set_control_text(&mut self, name: &str, text: &str) -> Result<(), SimError> {
        let value = parse_control_text(name, text)?;
        self.set_control(name, value)
    }

    /// Applies a set of JSON-style overrides, all-or-nothing.
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, ControlValue>,
    ) -> Result<(), SimError> {
        let resolved = overrides
            .iter()
            .map(|(name, value)| Ok((name.as_str(), value.resolve(name)?)))
            .collect::<Result<Vec<_>, SimError>>()?;
        self.set_controls(resolved)
    }

    /// Parses controls from a JSON object. Missing names keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let overrides: BTreeMap<String, ControlValue> = serde_json::from_str(json)?;
        let mut controls = Controls::default();
        controls.apply_overrides(&overrides)?;
        Ok(controls)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks every value against its domain.
    pub fn validate(&self) -> Result<(), SimError> {
        for spec in &SCHEMA {
            spec.kind
                .check(self.values[spec.id.index()])
                .map_err(|reason| SimError::config(spec.name, reason))?;
        }
        Ok(())
    }

    fn count(&self, id: ControlId) -> usize {
        self.get(id) as usize
    }

    pub fn population(&self) -> usize {
        self.count(ControlId::Population)
    }

    pub fn min_days_sick(&self) -> usize {
        self.count(ControlId::MinDaysSick)
    }

    pub fn p_recover(&self) -> f64 {
        self.get(ControlId::PRecover)
    }

    pub fn p_die(&self) -> f64 {
        self.get(ControlId::PDie)
    }

    pub fn p_infect_family(&self) -> f64 {
        self.get(ControlId::PInfectFamily)
    }

    pub fn p_infect_friend(&self) -> f64 {
        self.get(ControlId::PInfectFriend)
    }

    pub fn p_infect_stranger(&self) -> f64 {
        self.get(ControlId::PInfectStranger)
    }

    pub fn household_size(&self) -> f64 {
        self.get(ControlId::HouseholdSize)
    }

    pub fn n_friends(&self) -> usize {
        self.count(ControlId::NFriends)
    }

    pub fn friends_per_day(&self) -> f64 {
        self.get(ControlId::FriendsPerDay)
    }

    pub fn friend_radius(&self) -> usize {
        self.count(ControlId::FriendRadius)
    }

    pub fn strangers_per_day(&self) -> usize {
        self.count(ControlId::StrangersPerDay)
    }

    pub fn stranger_radius(&self) -> usize {
        self.count(ControlId::StrangerRadius)
    }

    pub fn p_service_worker(&self) -> f64 {
        self.get(ControlId::PServiceWorker)
    }

    pub fn service_strangers_per_day(&self) -> usize {
        self.count(ControlId::ServiceStrangersPerDay)
    }

    pub fn service_stranger_radius(&self) -> usize {
        self.count(ControlId::ServiceStrangerRadius)
    }

    pub fn days_till_symptoms(&self) -> usize {
        self.count(ControlId::DaysTillSymptoms)
    }

    pub fn p_show_symptoms(&self) -> f64 {
        self.get(ControlId::PShowSymptoms)
    }

    pub fn p_test(&self) -> f64 {
        self.get(ControlId::PTest)
    }

    pub fn tests_per_day(&self) -> usize {
        self.count(ControlId::TestsPerDay)
    }

    pub fn p_have_watch(&self) -> f64 {
        self.get(ControlId::PHaveWatch)
    }

    pub fn test_to_isolate(&self) -> usize {
        self.count(ControlId::TestToIsolate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn schema_is_in_id_order() {
        for (index, spec) in SCHEMA.iter().enumerate() {
            assert_eq!(spec.id.index(), index, "{} is out of place", spec.name);
        }
        assert_eq!(SCHEMA[0].name, "population");
        assert_eq!(SCHEMA[CONTROL_COUNT - 1].name, "test_to_isolate");
    }

    #[test]
    fn defaults_are_valid() {
        let controls = Controls::default();
        controls.validate().unwrap();
        assert_eq!(controls.population(), 20000);
        assert_eq!(controls.tests_per_day(), 2000);
        assert!((controls.p_have_watch() - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn set_control_by_name() {
        let mut controls = Controls::default();
        controls.set_control("n_friends", 4.0).unwrap();
        assert_eq!(controls.n_friends(), 4);
        controls.set_control_text("p_test", " 0.5 ").unwrap();
        assert!((controls.p_test() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_domain_values() {
        let mut controls = Controls::default();
        let cases = [
            ("population", 0.0),
            ("population", 2.5),
            ("n_friends", -1.0),
            ("min_days_sick", 1.5),
            ("p_die", 1.5),
            ("p_recover", -0.1),
            ("friends_per_day", -0.5),
            ("household_size", f64::NAN),
            ("tests_per_day", f64::INFINITY),
        ];
        for (name, value) in cases {
            match controls.set_control(name, value) {
                Err(SimError::ConfigError { field, .. }) => assert_eq!(field, name),
                other => panic!("{name} = {value} was not rejected: {other:?}"),
            }
        }
        assert_eq!(controls, Controls::default());
    }

    #[test]
    fn rejects_unknown_names_and_text() {
        let mut controls = Controls::default();
        assert!(matches!(
            controls.set_control("p_fly", 0.1),
            Err(SimError::ConfigError { .. })
        ));
        match controls.set_control_text("p_test", "lots") {
            Err(SimError::ConfigError { field, reason }) => {
                assert_eq!(field, "p_test");
                assert!(reason.contains("lots"));
            }
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn batch_update_is_all_or_nothing() {
        let mut controls = Controls::default();
        let result = controls.set_controls([
            ("p_infect_family", 0.2),
            ("n_friends", 3.0),
            ("p_test", 7.0),
        ]);
        assert!(result.is_err());
        assert_eq!(controls, Controls::default());

        controls
            .set_controls([("p_infect_family", 0.2), ("n_friends", 3.0)])
            .unwrap();
        assert!((controls.p_infect_family() - 0.2).abs() < f64::EPSILON);
        assert_eq!(controls.n_friends(), 3);
    }

    #[test]
    fn loads_from_json() {
        let controls = Controls::from_json_str(
            r#"{ "population": 5000, "p_infect_friend": 0.03, "tests_per_day": "250" }"#,
        )
        .unwrap();
        assert_eq!(controls.population(), 5000);
        assert_eq!(controls.tests_per_day(), 250);
        assert!((controls.p_infect_friend() - 0.03).abs() < f64::EPSILON);
        assert_eq!(controls.n_friends(), 10);
    }

    #[test]
    fn loads_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "min_days_sick": 7 }}"#).unwrap();
        let controls = Controls::from_json_file(file.path()).unwrap();
        assert_eq!(controls.min_days_sick(), 7);
    }

    #[test]
    fn json_errors_are_reported() {
        assert!(matches!(
            Controls::from_json_str("[1, 2]"),
            Err(SimError::JsonError(_))
        ));
        assert!(matches!(
            Controls::from_json_str(r#"{ "p_die": 2 }"#),
            Err(SimError::ConfigError { .. })
        ));
    }

    #[test]
    fn iterates_in_schema_order() {
        let names: Vec<&str> = Controls::default().iter().map(|(name, _)| name).collect();
        let expected: Vec<&str> = SCHEMA.iter().map(|spec| spec.name).collect();
        assert_eq!(names, expected);
    }
}
