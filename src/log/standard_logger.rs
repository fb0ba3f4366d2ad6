use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogState;

const APPENDER: &str = "stderr";

// Wall-clock time, colored level, module path
const PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} {M} - {m}{n}";

impl LogState {
    fn config(&self) -> Result<Config, log4rs::config::runtime::ConfigErrors> {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        let loggers = self
            .module_levels
            .iter()
            .map(|(module, level)| Logger::builder().build(module.as_str(), *level));
        Config::builder()
            .appender(Appender::builder().build(APPENDER, Box::new(console)))
            .loggers(loggers)
            .build(Root::builder().appender(APPENDER).build(self.level))
    }

    /// Installs the console logger on first use and reconfigures it afterwards.
    pub(in crate::log) fn install(&mut self) {
        let config = match self.config() {
            Ok(config) => config,
            Err(errors) => {
                eprintln!("invalid log configuration: {errors}");
                return;
            }
        };
        if let Some(handle) = &self.handle {
            handle.set_config(config);
            return;
        }
        match log4rs::init_config(config) {
            Ok(handle) => self.handle = Some(handle),
            Err(error) => eprintln!("could not install the logger: {error}"),
        }
    }
}
