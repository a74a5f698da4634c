//! Core library for procedural bar floor plans.
//!
//! Two layout sources feed one pipeline: a constraint-propagation solver over
//! connector-tagged pattern blocks, and a random carve-and-repair generator.
//! Fixtures are placed on the layout and the result is validated before it
//! is accepted, with deterministic rerolls on failure.

use propagator::PropagationError;
use thiserror::Error;

/// Shared character grid and structural repairs.
pub mod ascii;
/// Carve-and-repair layout generator.
pub mod carve;
/// Cell selection strategies for the solver.
pub mod entropy;
/// Generic 2D grid structures and the possibility grid.
pub mod grid;
/// Seeded generation with rerolls and layout fallback.
pub mod pipeline;
/// Required fixture placement.
pub mod placement;
/// Playability and customer routing checks.
pub mod playability;
/// Constraint propagation logic and traits.
pub mod propagator;
/// Precomputed pattern compatibility.
pub mod rules;
/// The constraint-propagation solver.
pub mod runner;
/// Seed hashing and per-stage random streams.
pub mod seed;
/// Legend bytes and fixture kinds.
pub mod symbols;

pub use crate::ascii::AsciiGrid;
pub use crate::entropy::EntropyCalculator;
pub use crate::grid::{Grid, PossibilityGrid};
pub use crate::pipeline::{generate_ascii, GeneratedAscii, GenerationContext, LayoutSource, MapGenError};
pub use crate::placement::PlacementError;
pub use crate::playability::{validate_ascii, validate_routing, PlayabilityReport, RoutingError};
pub use crate::propagator::ConstraintPropagator;
pub use crate::runner::{run, WfcConfig};

/// Errors that can occur during a solver run.
#[derive(Error, Debug)]
pub enum WfcError {
    /// An error related to grid dimensions or accessing grid data.
    #[error("Grid error: {0}")]
    GridError(String),
    /// The pattern library has no patterns to place.
    #[error("Pattern library is empty")]
    EmptyLibrary,
    /// The main loop ran past its iteration cap.
    #[error("Maximum iterations ({0}) reached")]
    MaxIterationsReached(u64),
    /// An error occurred during the constraint propagation phase.
    #[error("Propagation error: {0}")]
    Propagation(#[from] PropagationError),
    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    InternalError(String),
}
