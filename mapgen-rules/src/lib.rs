//! Pattern library definitions and loaders for the bar layout solver.
//!
//! A library is read once from a JSON or RON resource and then passed by
//! reference to every generation run.

use thiserror::Error;

pub mod formats;
pub mod loader;
pub mod types;

pub use types::{
    Direction, LibraryError, Pattern, PatternId, PatternLibrary, DEFAULT_GRID_EXTENT,
    MAX_NUM_PATTERNS,
};

/// Errors that can occur while loading a pattern library.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading the resource failed.
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    /// The content is not valid JSON/RON or does not match the expected shape.
    #[error("Failed to parse pattern format (e.g., JSON/RON): {0}")]
    ParseError(String),
    /// The content parsed but describes an unusable pattern.
    #[error("Invalid pattern data: {0}")]
    InvalidData(String),
    /// The parsed patterns do not form a valid library.
    #[error("Invalid pattern library: {0}")]
    Library(#[from] LibraryError),
    /// No parser is registered for the file extension.
    #[error("Unsupported pattern file format: {0}")]
    UnsupportedFormat(String),
    /// Parsing needs a cargo feature that was compiled out.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}
