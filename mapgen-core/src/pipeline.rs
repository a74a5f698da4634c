//! Seeded generation: layout, fixtures, validation, rerolls.
//!
//! A seed string fully determines the result. Each attempt draws its layout
//! and placement randomness from streams keyed by the seed and attempt index,
//! so a rejected attempt never disturbs the next one.

use crate::ascii::AsciiGrid;
use crate::carve::{carve, CarveConfig};
use crate::placement::{place_required, PlacementError};
use crate::playability::{validate_routing, PlayabilityReport, RoutingError};
use crate::runner::{self, WfcConfig};
use crate::seed::{GenerationSession, Stage};
use crate::WfcError;
use log::{debug, info, warn};
use mapgen_rules::PatternLibrary;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Attempts per layout source before giving up.
pub const DEFAULT_REROLL_ATTEMPTS: usize = 25;

/// Smallest accepted output side.
pub const MIN_DIMENSION: usize = 7;

/// Seed used when the caller passes an empty one.
pub const DEFAULT_SEED: &str = "seed";

/// Which generator produces the raw layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayoutSource {
    /// Constraint propagation over the pattern library.
    Wfc,
    /// Carve-and-repair, no library needed.
    #[default]
    Carve,
}

impl LayoutSource {
    const fn stage(self) -> Stage {
        match self {
            Self::Wfc => Stage::WfcLayout,
            Self::Carve => Stage::Layout,
        }
    }
}

impl fmt::Display for LayoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wfc => "wfc",
            Self::Carve => "carve",
        })
    }
}

/// Broad floor-plan flavor, picked from the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Archetype {
    OpenHall,
    MultiRoom,
    BackRoom,
    LoopRing,
}

impl Archetype {
    /// Buckets a seed hash: 40% open hall, 35% multi-room, 15% back room,
    /// 10% loop ring.
    pub const fn from_hash(hash: u64) -> Self {
        match hash % 100 {
            0..=39 => Self::OpenHall,
            40..=74 => Self::MultiRoom,
            75..=89 => Self::BackRoom,
            _ => Self::LoopRing,
        }
    }

    /// Wall segments to carve into a `rows` x `cols` room.
    pub fn num_walls(self, rows: usize, cols: usize, hash: u64) -> usize {
        let base = (rows * cols / 100).max(1);
        // hash % 3 always fits.
        let jitter = (hash % 3) as usize;
        match self {
            Self::OpenHall => (base + jitter).saturating_sub(1).max(1),
            Self::MultiRoom => base + 2 + jitter,
            Self::BackRoom => base + 1 + jitter,
            Self::LoopRing => base + 3 + jitter,
        }
    }

    /// Tables to place; open plans get more seating.
    pub const fn table_count(self) -> usize {
        match self {
            Self::OpenHall => 3,
            Self::MultiRoom | Self::BackRoom => 2,
            Self::LoopRing => 1,
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenHall => "OpenHall",
            Self::MultiRoom => "MultiRoom",
            Self::BackRoom => "BackRoom",
            Self::LoopRing => "LoopRing",
        })
    }
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationContext {
    /// Output rows.
    pub rows: usize,
    /// Output columns.
    pub cols: usize,
    /// Preferred layout generator; seed prefixes override it.
    pub layout_source: LayoutSource,
    /// Attempts per layout source.
    pub reroll_attempts: usize,
    /// Retry with carving once constraint propagation runs out of attempts.
    pub fallback_to_carve: bool,
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 20,
            layout_source: LayoutSource::default(),
            reroll_attempts: DEFAULT_REROLL_ATTEMPTS,
            fallback_to_carve: true,
        }
    }
}

impl GenerationContext {
    /// Default settings at a given size.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Rejects sizes below the minimum and a zero attempt budget.
    pub fn validate(&self) -> Result<(), MapGenError> {
        if self.rows < MIN_DIMENSION || self.cols < MIN_DIMENSION {
            return Err(MapGenError::InvalidContext(format!(
                "grid must be at least {MIN_DIMENSION}x{MIN_DIMENSION}, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.reroll_attempts == 0 {
            return Err(MapGenError::InvalidContext(
                "reroll_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// An accepted map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAscii {
    /// The validated grid.
    pub grid: AsciiGrid,
    /// Flavor picked from the seed.
    pub archetype: Archetype,
    /// Generator that produced the accepted layout.
    pub layout_source: LayoutSource,
    /// Attempts consumed across every layout source tried.
    pub attempts: usize,
    /// Seed after prefix stripping.
    pub seed: String,
}

/// Why one attempt was rejected.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    /// The solver stopped before finishing the layout.
    #[error("layout failed: {0}")]
    Layout(#[from] WfcError),
    /// Fixtures did not fit.
    #[error("placement failed: {0}")]
    Placement(#[from] PlacementError),
    /// Structural checks failed.
    #[error("validation failed: {0}")]
    Validation(PlayabilityReport),
    /// Customers cannot reach the register.
    #[error("routing failed: {0}")]
    Routing(RoutingError),
}

/// Errors returned by [`generate_ascii`].
#[derive(Debug, Error)]
pub enum MapGenError {
    /// The context asks for something impossible.
    #[error("Invalid generation context: {0}")]
    InvalidContext(String),
    /// Constraint-propagation layout was requested without a pattern library.
    #[error("Constraint-propagation layout needs a pattern library")]
    MissingPatternLibrary,
    /// The pattern library cannot drive the solver.
    #[error("Solver setup failed: {0}")]
    Wfc(#[from] WfcError),
    /// Every attempt was rejected.
    #[error("No playable map for seed '{seed}' after {attempts} attempts; last failure: {last_failure}")]
    RerollsExhausted {
        seed: String,
        attempts: usize,
        last_failure: String,
    },
}

/// Calls `attempt_fn` with attempt indices `0..max_attempts` until it succeeds.
///
/// # Returns
///
/// * `Ok((value, calls))` with the first success and how many calls it took.
/// * `Err(failures)` with every rejection, in order, once the budget is spent.
pub fn reroll<T, F>(max_attempts: usize, mut attempt_fn: F) -> Result<(T, usize), Vec<AttemptFailure>>
where
    F: FnMut(usize) -> Result<T, AttemptFailure>,
{
    let mut failures = Vec::new();
    for attempt in 0..max_attempts {
        match attempt_fn(attempt) {
            Ok(value) => return Ok((value, attempt + 1)),
            Err(failure) => failures.push(failure),
        }
    }
    Err(failures)
}

/// Splits a layout-forcing prefix off a seed.
///
/// `"wfc:"` forces constraint propagation, `"simple:"` and `"carve:"` force
/// carving. An empty remainder becomes [`DEFAULT_SEED`].
pub fn split_seed_prefix(seed: &str) -> (Option<LayoutSource>, String) {
    let (forced, rest) = if let Some(rest) = seed.strip_prefix("wfc:") {
        (Some(LayoutSource::Wfc), rest)
    } else if let Some(rest) = seed
        .strip_prefix("simple:")
        .or_else(|| seed.strip_prefix("carve:"))
    {
        (Some(LayoutSource::Carve), rest)
    } else {
        (None, seed)
    };
    let normalized = if rest.is_empty() { DEFAULT_SEED } else { rest };
    (forced, normalized.to_string())
}

/// Generates a validated map for `seed`.
///
/// # Arguments
///
/// * `seed` - Any string; an optional layout prefix is honored and stripped.
/// * `ctx` - Output size, layout preference and attempt budget.
/// * `library` - Required when the layout resolves to constraint propagation.
///
/// # Errors
///
/// Returns [`MapGenError::RerollsExhausted`] when no attempt passes
/// validation, including after the carve fallback if it is enabled.
pub fn generate_ascii(
    seed: &str,
    ctx: &GenerationContext,
    library: Option<&PatternLibrary>,
) -> Result<GeneratedAscii, MapGenError> {
    ctx.validate()?;

    let (forced, normalized) = split_seed_prefix(seed);
    let source = forced.unwrap_or(ctx.layout_source);
    let session = GenerationSession::new(normalized);
    let archetype = Archetype::from_hash(session.seed_hash());
    info!(
        "Generating {}x{} map for seed '{}' ({archetype}, {source} layout)",
        ctx.rows,
        ctx.cols,
        session.seed()
    );

    if source == LayoutSource::Wfc {
        match library {
            None => return Err(MapGenError::MissingPatternLibrary),
            Some(lib) if lib.is_empty() => return Err(WfcError::EmptyLibrary.into()),
            Some(_) => {}
        }
    }

    let mut attempts = 0;
    let mut outcome = run_attempts(&session, ctx, archetype, source, library, &mut attempts);

    if outcome.is_err() && source == LayoutSource::Wfc && ctx.fallback_to_carve {
        warn!(
            "Constraint-propagation layout failed {} attempts for seed '{}', falling back to carving",
            ctx.reroll_attempts,
            session.seed()
        );
        outcome = run_attempts(&session, ctx, archetype, LayoutSource::Carve, library, &mut attempts);
    }

    match outcome {
        Ok((grid, used_source)) => {
            info!(
                "Accepted map for seed '{}' after {attempts} attempts",
                session.seed()
            );
            Ok(GeneratedAscii {
                grid,
                archetype,
                layout_source: used_source,
                attempts,
                seed: session.seed().to_string(),
            })
        }
        Err(failures) => Err(MapGenError::RerollsExhausted {
            seed: session.seed().to_string(),
            attempts,
            last_failure: failures
                .last()
                .map_or_else(|| "no attempt ran".to_string(), ToString::to_string),
        }),
    }
}

fn run_attempts(
    session: &GenerationSession,
    ctx: &GenerationContext,
    archetype: Archetype,
    source: LayoutSource,
    library: Option<&PatternLibrary>,
    attempts: &mut usize,
) -> Result<(AsciiGrid, LayoutSource), Vec<AttemptFailure>> {
    let result = reroll(ctx.reroll_attempts, |attempt| {
        let mut session = session.clone();
        session.set_attempt(attempt);
        let outcome = attempt_once(&session, ctx, archetype, source, library);
        if let Err(failure) = &outcome {
            warn!(
                "Attempt {attempt} ({source}) for seed '{}' rejected: {failure}",
                session.seed()
            );
        }
        outcome
    });
    match result {
        Ok((grid, calls)) => {
            *attempts += calls;
            Ok((grid, source))
        }
        Err(failures) => {
            *attempts += failures.len();
            Err(failures)
        }
    }
}

fn attempt_once(
    session: &GenerationSession,
    ctx: &GenerationContext,
    archetype: Archetype,
    source: LayoutSource,
    library: Option<&PatternLibrary>,
) -> Result<AsciiGrid, AttemptFailure> {
    let mut grid = match (source, library) {
        (LayoutSource::Wfc, Some(lib)) => wfc_layout(session, ctx, lib)?,
        _ => carve_layout(session, ctx, archetype),
    };
    grid.normalize_dims(ctx.rows, ctx.cols);
    debug!("Layout stage done for attempt {}", session.attempt());

    let mut rng = session.rng(Stage::Place);
    place_required(&mut grid, archetype.table_count(), &mut rng)?;
    let grid = decorate(grid);

    match validate_routing(&grid) {
        Ok(()) => Ok(grid),
        Err(RoutingError::Structural(report)) => Err(AttemptFailure::Validation(report)),
        Err(other) => Err(AttemptFailure::Routing(other)),
    }
}

fn carve_layout(session: &GenerationSession, ctx: &GenerationContext, archetype: Archetype) -> AsciiGrid {
    let walls = archetype.num_walls(ctx.rows, ctx.cols, session.seed_hash());
    let config = CarveConfig::new(ctx.cols, ctx.rows).with_walls(walls);
    let mut rng = session.rng(LayoutSource::Carve.stage());
    carve(&config, &mut rng)
}

/// Runs the solver on enough cells to cover the output, then keeps only the
/// structure of the rendered blocks.
fn wfc_layout(
    session: &GenerationSession,
    ctx: &GenerationContext,
    library: &PatternLibrary,
) -> Result<AsciiGrid, WfcError> {
    let block = library.block_size().max(1);
    let config = WfcConfig::builder()
        .rows(ctx.rows.div_ceil(block))
        .cols(ctx.cols.div_ceil(block))
        .seed(session.stage_seed(LayoutSource::Wfc.stage()))
        .build();
    let outcome = runner::run(library, &config)?;
    if outcome.stats.contradictions > 0 {
        debug!(
            "Solver left {} contradictions for validation to judge",
            outcome.stats.contradictions
        );
    }
    let mut grid = outcome.lines;
    grid.normalize_dims(ctx.rows, ctx.cols);
    grid.scrub_to_layout_only();
    Ok(grid)
}

/// Decoration stage; accepted grids pass through unchanged for now.
fn decorate(grid: AsciiGrid) -> AsciiGrid {
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_seed_prefixes() {
        assert_eq!(split_seed_prefix("wfc:abc"), (Some(LayoutSource::Wfc), "abc".to_string()));
        assert_eq!(split_seed_prefix("simple:abc"), (Some(LayoutSource::Carve), "abc".to_string()));
        assert_eq!(split_seed_prefix("carve:x"), (Some(LayoutSource::Carve), "x".to_string()));
        assert_eq!(split_seed_prefix("plain"), (None, "plain".to_string()));
        assert_eq!(split_seed_prefix(""), (None, DEFAULT_SEED.to_string()));
        assert_eq!(split_seed_prefix("wfc:"), (Some(LayoutSource::Wfc), DEFAULT_SEED.to_string()));
    }

    #[test]
    fn test_archetype_buckets() {
        assert_eq!(Archetype::from_hash(0), Archetype::OpenHall);
        assert_eq!(Archetype::from_hash(139), Archetype::OpenHall);
        assert_eq!(Archetype::from_hash(40), Archetype::MultiRoom);
        assert_eq!(Archetype::from_hash(274), Archetype::MultiRoom);
        assert_eq!(Archetype::from_hash(75), Archetype::BackRoom);
        assert_eq!(Archetype::from_hash(89), Archetype::BackRoom);
        assert_eq!(Archetype::from_hash(90), Archetype::LoopRing);
        assert_eq!(Archetype::from_hash(99), Archetype::LoopRing);
    }

    #[test]
    fn test_wall_budget() {
        // 20x20 gives a base of 4.
        assert_eq!(Archetype::OpenHall.num_walls(20, 20, 0), 3);
        assert_eq!(Archetype::OpenHall.num_walls(20, 20, 2), 5);
        assert_eq!(Archetype::MultiRoom.num_walls(20, 20, 1), 7);
        assert_eq!(Archetype::BackRoom.num_walls(20, 20, 3), 5);
        assert_eq!(Archetype::LoopRing.num_walls(20, 20, 5), 9);
        // Small rooms still get one wall.
        assert_eq!(Archetype::OpenHall.num_walls(7, 7, 0), 1);
    }

    #[test]
    fn test_context_validation() {
        assert!(GenerationContext::default().validate().is_ok());
        assert!(GenerationContext::new(7, 7).validate().is_ok());
        assert!(matches!(
            GenerationContext::new(6, 20).validate(),
            Err(MapGenError::InvalidContext(_))
        ));
        let ctx = GenerationContext {
            reroll_attempts: 0,
            ..GenerationContext::default()
        };
        assert!(matches!(ctx.validate(), Err(MapGenError::InvalidContext(_))));
    }

    #[test]
    fn test_reroll_stops_at_first_success() {
        let calls = Cell::new(0);
        let result = reroll(10, |attempt| {
            calls.set(calls.get() + 1);
            if attempt == 2 {
                Ok("done")
            } else {
                Err(AttemptFailure::Placement(PlacementError::NoRoutablePair))
            }
        });
        assert_eq!(result.ok(), Some(("done", 3)));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_reroll_is_bounded() {
        let calls = Cell::new(0);
        let result: Result<((), usize), _> = reroll(4, |_| {
            calls.set(calls.get() + 1);
            Err(AttemptFailure::Placement(PlacementError::EmptyGrid))
        });
        assert_eq!(result.err().map(|f| f.len()), Some(4));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_wfc_needs_library() {
        let result = generate_ascii("wfc:abc", &GenerationContext::default(), None);
        assert!(matches!(result, Err(MapGenError::MissingPatternLibrary)));
    }

    #[test]
    fn test_carve_seed_generates_playable_map() {
        let map = generate_ascii("carve:unit", &GenerationContext::default(), None).unwrap();
        assert_eq!(map.layout_source, LayoutSource::Carve);
        assert_eq!(map.seed, "unit");
        assert_eq!(map.grid.dims(), (20, 20));
        assert!(validate_routing(&map.grid).is_ok());
        assert!(map.attempts >= 1 && map.attempts <= DEFAULT_REROLL_ATTEMPTS);
    }
}
