//! Without the `logging` feature no logger is installed; only the `log` crate's max level is
//! tracked so that disabled macros stay cheap.
use log::LevelFilter;

use crate::log::LogState;

impl LogState {
    pub(in crate::log) fn install(&mut self) {
        let most_verbose = self
            .module_levels
            .values()
            .copied()
            .fold(self.level, LevelFilter::max);
        log::set_max_level(most_verbose);
    }
}
