//! Next-cell selection for the solver.

use crate::grid::{Grid, PossibilityGrid};
use std::fmt::Debug;

/// Picks the next cell to collapse.
pub trait EntropyCalculator: Debug {
    /// Returns the open cell with the lowest entropy, visiting candidates in
    /// `visit_order` (flat indices) so ties go to the earliest visited.
    ///
    /// Returns `None` once every cell is collapsed.
    #[must_use]
    fn find_lowest_entropy(
        &self,
        grid: &PossibilityGrid,
        collapsed: &Grid<bool>,
        visit_order: &[usize],
    ) -> Option<(usize, usize)>;
}

/// Entropy measured as the raw number of remaining possibilities.
///
/// Cells with zero or one option count as lowest, so contradictions and
/// forced cells are settled before any random choice is made.
#[derive(Debug, Clone, Default)]
pub struct LeastChoicesEntropy;

impl LeastChoicesEntropy {
    pub const fn new() -> Self {
        Self
    }
}

impl EntropyCalculator for LeastChoicesEntropy {
    fn find_lowest_entropy(
        &self,
        grid: &PossibilityGrid,
        collapsed: &Grid<bool>,
        visit_order: &[usize],
    ) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for &index in visit_order {
            if collapsed.at(index).copied().unwrap_or(true) {
                continue;
            }
            let Some(cell) = grid.at(index) else {
                continue;
            };
            let choices = cell.count_ones();
            if best.map_or(true, |(_, fewest)| choices < fewest) {
                best = Some((index, choices));
                if choices == 0 {
                    break;
                }
            }
        }
        best.map(|(index, _)| grid.coords(index))
    }
}
