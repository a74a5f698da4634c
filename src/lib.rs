//! Bar Forge application library.
//!
//! Configuration, logging, output and the seed survey for the `bar-forge`
//! binary. Map generation itself lives in `mapgen-core`.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod survey;

pub use config::AppConfig;
pub use error::AppError;

// Re-export the entry point so the binary stays a thin shim
pub use crate::app::main;
