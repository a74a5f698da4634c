//! Serde records shared by every text format.
//!
//! Both JSON and RON describe the same shape, so the parsers only differ in
//! the deserializer they hand the content to.

use crate::{
    types::DEFAULT_GRID_EXTENT, Direction, LoadError, Pattern, PatternId, PatternLibrary,
};
use serde::Deserialize;
use std::collections::BTreeSet;

const fn default_extent() -> usize {
    DEFAULT_GRID_EXTENT
}

const fn unlimited() -> i64 {
    -1
}

/// Top-level structure of a pattern configuration file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawLibrary {
    #[serde(default = "default_extent", alias = "max_rows")]
    rows: usize,
    #[serde(default = "default_extent", alias = "max_cols")]
    cols: usize,
    patterns: Vec<RawPattern>,
}

/// One pattern record as written in the file.
#[derive(Debug, Clone, Deserialize)]
struct RawPattern {
    pat: Vec<String>,
    #[serde(default)]
    connections: Vec<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    any_connection: bool,
    #[serde(default)]
    edge_only: bool,
    /// `-1` means unlimited.
    #[serde(default = "unlimited")]
    max_count: i64,
}

impl RawPattern {
    fn into_pattern(self, index: usize) -> Result<Pattern, LoadError> {
        let mut connections = BTreeSet::new();
        for name in &self.connections {
            match Direction::from_name(name) {
                Some(direction) => {
                    connections.insert(direction);
                }
                None => log::warn!("Pattern {index}: ignoring unknown connection '{name}'"),
            }
        }

        let max_count = match self.max_count {
            -1 => None,
            n if n < 0 => {
                return Err(LoadError::InvalidData(format!(
                    "Pattern {index}: max_count must be -1 or non-negative, got {n}"
                )))
            }
            n => Some(u32::try_from(n).map_err(|_| {
                LoadError::InvalidData(format!("Pattern {index}: max_count {n} is too large"))
            })?),
        };

        Ok(Pattern {
            id: PatternId(index),
            pat: self.pat,
            connections,
            required: self.required,
            any_connection: self.any_connection,
            edge_only: self.edge_only,
            max_count,
        })
    }
}

impl RawLibrary {
    /// Converts the raw records into a validated library.
    pub(crate) fn into_library(self) -> Result<PatternLibrary, LoadError> {
        let patterns = self
            .patterns
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_pattern(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PatternLibrary::new(self.rows, self.cols, patterns)?)
    }
}
