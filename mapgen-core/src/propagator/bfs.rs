use crate::{
    grid::{Grid, PossibilityGrid},
    propagator::{ConstraintPropagator, PropagationError, PropagationOutcome},
    rules::CompatibilityTable,
};
use mapgen_rules::{Direction, Pattern};
use std::collections::VecDeque;

/// Breadth-first propagator over the four grid neighbors.
#[derive(Debug, Clone)]
pub struct BfsPropagator {
    table: CompatibilityTable,
}

impl BfsPropagator {
    /// Creates a propagator for the given pattern list.
    pub fn new(patterns: &[Pattern]) -> Self {
        Self {
            table: CompatibilityTable::new(patterns),
        }
    }

    /// Compatibility table used for pruning.
    pub const fn table(&self) -> &CompatibilityTable {
        &self.table
    }
}

impl ConstraintPropagator for BfsPropagator {
    fn propagate(
        &mut self,
        grid: &mut PossibilityGrid,
        updated_coords: Vec<(usize, usize)>,
        collapsed: &Grid<bool>,
    ) -> Result<PropagationOutcome, PropagationError> {
        let mut outcome = PropagationOutcome::default();
        let mut queue: VecDeque<(usize, usize)> = updated_coords.into();

        while let Some((row, col)) = queue.pop_front() {
            let source = grid
                .get(row, col)
                .cloned()
                .ok_or(PropagationError::OutOfBounds(row, col))?;
            // A contradiction supports nothing; pruning from it would wipe its neighbors.
            if source.not_any() {
                continue;
            }

            for direction in Direction::ALL {
                let Some((nr, nc)) = grid.neighbor(row, col, direction) else {
                    continue;
                };
                if collapsed.get(nr, nc).copied().unwrap_or(true) {
                    continue;
                }

                let supported = self.table.supported_by(&source, direction);
                let neighbor = grid
                    .get_mut(nr, nc)
                    .ok_or(PropagationError::OutOfBounds(nr, nc))?;
                if neighbor.not_any() {
                    // Already a contradiction, reported when it happened.
                    continue;
                }

                let mut changed = false;
                let allowed: Vec<usize> = neighbor.iter_ones().collect();
                for pattern in allowed {
                    if !supported[pattern] {
                        neighbor.set(pattern, false);
                        changed = true;
                    }
                }

                if changed {
                    outcome.cells_narrowed += 1;
                    if neighbor.not_any() {
                        log::trace!("Cell ({nr}, {nc}) lost its last possibility");
                        outcome.contradictions.push((nr, nc));
                    } else {
                        queue.push_back((nr, nc));
                    }
                }
            }
        }

        Ok(outcome)
    }
}
