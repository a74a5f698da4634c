use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Upper bound on the number of patterns a library may hold.
///
/// Possibility sets are allocated at this fixed width, so a library with more
/// patterns cannot be represented.
pub const MAX_NUM_PATTERNS: usize = 64;

/// Default solver grid extent when a configuration omits `rows`/`cols`.
pub const DEFAULT_GRID_EXTENT: usize = 3;

/// Represents a unique identifier for a pattern.
///
/// Used as an index into the pattern list and into possibility bit vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub usize);

/// One of the four connector directions of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards row 0.
    North,
    /// Towards the last column.
    East,
    /// Towards the last row.
    South,
    /// Towards column 0.
    West,
}

impl Direction {
    /// All directions in a fixed order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Returns the direction pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Row and column offset of the neighbor in this direction.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }

    /// Parses a connector name as it appears in pattern configuration files.
    ///
    /// Accepts the single letter form (`"N"`) and the full name (`"North"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "N" | "North" => Some(Self::North),
            "E" | "East" => Some(Self::East),
            "S" | "South" => Some(Self::South),
            "W" | "West" => Some(Self::West),
            _ => None,
        }
    }

    /// Single letter name used in configuration files.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::East => "E",
            Self::South => "S",
            Self::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A template tile used by the layout solver.
///
/// Patterns are immutable once loaded. Per-run use budgets live in the solver,
/// never here, so one library can drive any number of runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Index of this pattern inside its library.
    pub id: PatternId,
    /// Square character block rendered for a cell collapsed to this pattern.
    pub pat: Vec<String>,
    /// Directions in which this pattern opens onto its neighbor.
    pub connections: BTreeSet<Direction>,
    /// The solver seeds this pattern before the main loop.
    pub required: bool,
    /// Wildcard: compatible with every neighbor in every direction.
    pub any_connection: bool,
    /// May only occupy border cells.
    pub edge_only: bool,
    /// Maximum number of placements per run, `None` for unlimited.
    pub max_count: Option<u32>,
}

impl Pattern {
    /// Creates an unrestricted pattern with the given block and connectors.
    pub fn new(id: usize, pat: &[&str], connections: &[Direction]) -> Self {
        Self {
            id: PatternId(id),
            pat: pat.iter().map(|row| (*row).to_owned()).collect(),
            connections: connections.iter().copied().collect(),
            required: false,
            any_connection: false,
            edge_only: false,
            max_count: None,
        }
    }

    /// Marks the pattern as required with the given placement budget.
    #[must_use]
    pub const fn required(mut self, max_count: Option<u32>) -> Self {
        self.required = true;
        self.max_count = max_count;
        self
    }

    /// Restricts the pattern to border cells.
    #[must_use]
    pub const fn edge_only(mut self) -> Self {
        self.edge_only = true;
        self
    }

    /// Makes the pattern a wildcard for compatibility checks.
    #[must_use]
    pub const fn any_connection(mut self) -> Self {
        self.any_connection = true;
        self
    }

    /// Caps the number of placements per run.
    #[must_use]
    pub const fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Returns true if the pattern opens in `direction`.
    pub fn connects(&self, direction: Direction) -> bool {
        self.connections.contains(&direction)
    }

    /// Side length of the (square) character block.
    pub fn block_size(&self) -> usize {
        self.pat.len()
    }

    /// Checks whether `self` may sit next to `other`, with `other` lying in
    /// `direction` from `self`.
    ///
    /// Wildcards are always compatible. Otherwise both sides must agree: either
    /// both open towards each other or neither does.
    pub fn is_compatible_with(&self, other: &Self, direction: Direction) -> bool {
        if self.any_connection || other.any_connection {
            return true;
        }
        self.connects(direction) == other.connects(direction.opposite())
    }
}

/// Errors that can occur while assembling a `PatternLibrary`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// The library has no patterns at all.
    #[error("Pattern library must contain at least one pattern.")]
    Empty,
    /// More patterns than fit in a possibility set.
    #[error("Pattern library holds {0} patterns, at most {MAX_NUM_PATTERNS} are supported.")]
    TooManyPatterns(usize),
    /// Solver grid dimensions must be positive.
    #[error("Solver grid dimensions must be positive, got {rows}x{cols}.")]
    InvalidDimensions {
        /// Configured row count.
        rows: usize,
        /// Configured column count.
        cols: usize,
    },
    /// A pattern block is empty or not square.
    #[error("Pattern {0} is not a non-empty square block.")]
    MalformedBlock(usize),
    /// A pattern block differs in size from the first pattern.
    #[error("Pattern {index} is {found} wide but the library uses {expected}.")]
    InconsistentBlockSize {
        /// Index of the offending pattern.
        index: usize,
        /// Block size of pattern 0.
        expected: usize,
        /// Block size of the offending pattern.
        found: usize,
    },
}

/// The full set of patterns plus the default solver grid extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternLibrary {
    /// Default number of solver cell rows.
    pub rows: usize,
    /// Default number of solver cell columns.
    pub cols: usize,
    patterns: Vec<Pattern>,
}

impl PatternLibrary {
    /// Creates a validated library.
    ///
    /// Pattern ids are reassigned to match list positions. A required pattern
    /// without a finite budget is legal but logged, since the solver will try
    /// to seed it exactly once.
    pub fn new(rows: usize, cols: usize, mut patterns: Vec<Pattern>) -> Result<Self, LibraryError> {
        if rows == 0 || cols == 0 {
            return Err(LibraryError::InvalidDimensions { rows, cols });
        }
        if patterns.is_empty() {
            return Err(LibraryError::Empty);
        }
        if patterns.len() > MAX_NUM_PATTERNS {
            return Err(LibraryError::TooManyPatterns(patterns.len()));
        }

        let expected = patterns[0].block_size();
        for (index, pattern) in patterns.iter_mut().enumerate() {
            pattern.id = PatternId(index);
            let size = pattern.block_size();
            if size == 0 || pattern.pat.iter().any(|row| row.chars().count() != size) {
                return Err(LibraryError::MalformedBlock(index));
            }
            if size != expected {
                return Err(LibraryError::InconsistentBlockSize {
                    index,
                    expected,
                    found: size,
                });
            }
            if pattern.required && pattern.max_count.is_none() {
                log::warn!(
                    "Required pattern {index} has no max_count, consider setting it to 1"
                );
            }
        }

        Ok(Self {
            rows,
            cols,
            patterns,
        })
    }

    /// All patterns in library order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Looks up a pattern by id.
    pub fn get(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(id.0)
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Always false for a validated library.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Side length of every pattern block.
    pub fn block_size(&self) -> usize {
        self.patterns.first().map_or(0, Pattern::block_size)
    }
}
