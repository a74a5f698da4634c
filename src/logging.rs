//! Logging setup for the application.

use crate::config::{AppConfig, GlobalLogLevel};
use env_logger::{Builder, Env};
use log::LevelFilter;

impl From<&GlobalLogLevel> for LevelFilter {
    fn from(level: &GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

/// Initializes the logger from `RUST_LOG` and the configured global level.
///
/// The solver's per-cell tracing is noisy, so `mapgen_core::runner` stays at
/// `info` unless the global level asks for `trace`.
pub fn init_logger(config: &AppConfig) {
    let global_level = LevelFilter::from(&config.global_log_level);

    let env = Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);

    builder.filter_level(global_level);
    if global_level < LevelFilter::Trace {
        builder.filter_module("mapgen_core::runner", global_level.min(LevelFilter::Info));
    }

    builder.init();

    log::debug!(
        "Logger initialized with global log level: {:?}",
        config.global_log_level
    );
}
