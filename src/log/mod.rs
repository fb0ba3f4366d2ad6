//! Diagnostic logging for the engine. This is separate from _reporting_ (see
//! [`crate::report`]), which records simulation output.
//!
//! The module re-exports the five `log` macros. Pipeline stages emit `trace!`, resets and day
//! summaries `debug!`, and the batch runner `info!` per finished sample.
//!
//! Logging is off until something turns it on, either the `--log-level` option of the
//! `epitrace` binary or the functions here:
//!
//! ```rust
//! use epitrace::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! set_log_level(LevelFilter::Info);
//! // Follow the contact tracing fan-out in detail.
//! set_module_filter("epitrace::testing_manager", LevelFilter::Trace);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;

use crate::error::SimError;

static LOG_STATE: LazyLock<Mutex<LogState>> = LazyLock::new(Mutex::default);

/// The installed logging setup: one global level plus per-module overrides keyed by module
/// path (e.g. `"epitrace::network"`). There is a single instance behind `LOG_STATE`.
#[derive(Debug)]
pub(in crate::log) struct LogState {
    pub(in crate::log) level: LevelFilter,
    pub(in crate::log) module_levels: BTreeMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    handle: Option<Handle>,
}

impl Default for LogState {
    fn default() -> Self {
        Self {
            level: LevelFilter::Off,
            module_levels: BTreeMap::new(),

            #[cfg(feature = "logging")]
            handle: None,
        }
    }
}

impl LogState {
    fn update(&mut self, change: impl FnOnce(&mut Self) -> bool) {
        if change(self) {
            self.install();
        }
    }
}

/// A parsed `--log-level` value: a bare level (`"info"`), `module=level` pairs
/// (`"epitrace::network=trace"`), or a comma separated mix of both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSpec {
    pub level: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogSpec {
    type Err = SimError;

    fn from_str(text: &str) -> Result<Self, SimError> {
        let mut spec = LogSpec::default();
        for item in text.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            match item.split_once('=') {
                Some((module, level)) => {
                    spec.modules
                        .push((module.trim().to_string(), parse_level(level)?));
                }
                None => spec.level = Some(parse_level(item)?),
            }
        }
        Ok(spec)
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, SimError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| SimError::config("log_level", format!("unknown log level `{level}`")))
}

fn log_state() -> MutexGuard<'static, LogState> {
    // A panic while holding the lock leaves plain data behind; keep using it.
    LOG_STATE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Turns on every message. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns logging off. Same as `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for modules without an override.
pub fn set_log_level(level: LevelFilter) {
    log_state().update(|state| {
        state.level = level;
        true
    });
}

pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    set_module_filters(&[(module_path, level)]);
}

/// Installs several module overrides with a single logger reconfiguration.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    log_state().update(|state| {
        let mut changed = false;
        for &(module, level) in module_filters {
            changed |= state.module_levels.insert(module.to_string(), level) != Some(level);
        }
        changed
    });
}

/// Drops a module override; the global level applies to that module again.
pub fn remove_module_filter(module_path: &str) {
    log_state().update(|state| state.module_levels.remove(module_path).is_some());
}

/// Parses and applies a `--log-level` value. Module overrides only take effect under an
/// enabled root, so a global level of `Off` is raised to `Error` when overrides are given.
pub fn apply_log_spec(text: &str) -> Result<(), SimError> {
    let spec: LogSpec = text.parse()?;
    log_state().update(|state| {
        if let Some(level) = spec.level {
            state.level = level;
        }
        if !spec.modules.is_empty() && state.level == LevelFilter::Off {
            state.level = LevelFilter::Error;
        }
        for (module, level) in &spec.modules {
            state.module_levels.insert(module.clone(), *level);
        }
        true
    });
    for (module, level) in &spec.modules {
        println!("Logging enabled for {module} at level {level}");
    }
    Ok(())
}
