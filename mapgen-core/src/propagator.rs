//! Constraint propagation logic and traits.

pub mod bfs;

pub use bfs::BfsPropagator;

use crate::grid::{Grid, PossibilityGrid};
use std::fmt::Debug;
use thiserror::Error;

/// Errors that can occur during the constraint propagation phase.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropagationError {
    /// A queued coordinate lies outside the grid.
    #[error("Propagation started from out of bounds cell ({0}, {1})")]
    OutOfBounds(usize, usize),
    /// An internal error within the propagation logic.
    #[error("Internal propagation error: {0}")]
    InternalError(String),
}

/// What a propagation pass did to the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Number of times a cell lost at least one possibility.
    pub cells_narrowed: usize,
    /// Cells left with no possibility at all, as `(row, col)`.
    pub contradictions: Vec<(usize, usize)>,
}

/// Trait defining the interface for a constraint propagation algorithm.
///
/// Implementors narrow the possibility sets of open cells after some cells
/// changed. Collapsed cells are never modified. A cell that loses every
/// possibility is reported in the outcome rather than aborting the pass.
pub trait ConstraintPropagator: Debug {
    /// Propagates constraints starting from a list of initially updated cells.
    ///
    /// # Arguments
    ///
    /// * `grid` - A mutable reference to the possibility grid to update.
    /// * `updated_coords` - `(row, col)` of cells that were initially changed.
    /// * `collapsed` - Marks cells whose pattern is fixed.
    fn propagate(
        &mut self,
        grid: &mut PossibilityGrid,
        updated_coords: Vec<(usize, usize)>,
        collapsed: &Grid<bool>,
    ) -> Result<PropagationOutcome, PropagationError>;
}
