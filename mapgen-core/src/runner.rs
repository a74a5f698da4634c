//! The constraint-propagation solver over pattern blocks.

use crate::{
    ascii::AsciiGrid,
    entropy::{EntropyCalculator, LeastChoicesEntropy},
    grid::{Grid, PossibilityGrid},
    propagator::{BfsPropagator, ConstraintPropagator},
    symbols::{EMPTY, UNKNOWN},
    WfcError,
};
use log::{debug, error, info, trace, warn};
use mapgen_rules::{PatternId, PatternLibrary};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Configuration options for a solver run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WfcConfig {
    /// Solver grid rows; the library default when `None`.
    pub rows: Option<usize>,
    /// Solver grid columns; the library default when `None`.
    pub cols: Option<usize>,
    /// Seed of the run's random stream.
    pub seed: u64,
    /// Main-loop iteration cap; one iteration per cell when `None`.
    pub max_iterations: Option<u64>,
}

impl WfcConfig {
    /// Creates a new builder for `WfcConfig`.
    pub fn builder() -> WfcConfigBuilder {
        WfcConfigBuilder::default()
    }
}

/// Builder for `WfcConfig`.
#[derive(Debug, Default)]
pub struct WfcConfigBuilder {
    config: WfcConfig,
}

impl WfcConfigBuilder {
    /// Sets the number of solver rows.
    #[must_use]
    pub const fn rows(mut self, rows: usize) -> Self {
        self.config.rows = Some(rows);
        self
    }

    /// Sets the number of solver columns.
    #[must_use]
    pub const fn cols(mut self, cols: usize) -> Self {
        self.config.cols = Some(cols);
        self
    }

    /// Sets the seed for the random number generator.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the maximum number of main-loop iterations allowed.
    #[must_use]
    pub const fn max_iterations(mut self, max: u64) -> Self {
        self.config.max_iterations = Some(max);
        self
    }

    /// Builds the `WfcConfig` instance.
    pub fn build(self) -> WfcConfig {
        self.config
    }
}

/// Counters describing how a run went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Main-loop iterations performed.
    pub iterations: u64,
    /// Cells that lost every possibility during propagation or cleanup.
    pub contradictions: usize,
    /// Cells collapsed through the fallback instead of a legal choice.
    pub forced_placements: usize,
    /// Required placements that found no eligible cell.
    pub missing_required: usize,
}

/// A finished run.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Rendered character blocks.
    pub lines: AsciiGrid,
    /// Pattern chosen per cell, `None` for contradictions.
    pub assignments: Grid<Option<PatternId>>,
    /// Run counters.
    pub stats: SolveStats,
}

/// State of one constraint-propagation run.
///
/// Owns its random stream, visit order and a private copy of every pattern's
/// remaining budget. The library itself is only read.
#[derive(Debug)]
pub struct WaveCollapse<'a> {
    library: &'a PatternLibrary,
    grid: PossibilityGrid,
    collapsed: Grid<bool>,
    collapsed_count: usize,
    budgets: Vec<Option<u32>>,
    visit_order: Vec<usize>,
    rng: ChaCha8Rng,
    propagator: Box<dyn ConstraintPropagator + 'a>,
    entropy: Box<dyn EntropyCalculator + 'a>,
    max_iterations: u64,
    stats: SolveStats,
}

impl<'a> WaveCollapse<'a> {
    /// Prepares a run with the default propagator and cell selection.
    pub fn new(library: &'a PatternLibrary, config: &WfcConfig) -> Result<Self, WfcError> {
        Self::with_components(
            library,
            config,
            Box::new(BfsPropagator::new(library.patterns())),
            Box::new(LeastChoicesEntropy::new()),
        )
    }

    /// Prepares a run with explicit strategy components.
    pub fn with_components(
        library: &'a PatternLibrary,
        config: &WfcConfig,
        propagator: Box<dyn ConstraintPropagator + 'a>,
        entropy: Box<dyn EntropyCalculator + 'a>,
    ) -> Result<Self, WfcError> {
        let rows = config.rows.unwrap_or(library.rows);
        let cols = config.cols.unwrap_or(library.cols);
        if rows == 0 || cols == 0 {
            return Err(WfcError::GridError(format!(
                "solver grid must be non-empty, got {rows}x{cols}"
            )));
        }
        if library.is_empty() {
            return Err(WfcError::EmptyLibrary);
        }

        let total = rows * cols;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut visit_order: Vec<usize> = (0..total).collect();
        visit_order.shuffle(&mut rng);

        Ok(Self {
            library,
            grid: PossibilityGrid::all_possible(rows, cols),
            collapsed: Grid::new(rows, cols),
            collapsed_count: 0,
            budgets: library.patterns().iter().map(|p| p.max_count).collect(),
            visit_order,
            rng,
            propagator,
            entropy,
            max_iterations: config.max_iterations.unwrap_or(total as u64),
            stats: SolveStats::default(),
        })
    }

    /// Solver grid rows.
    pub const fn rows(&self) -> usize {
        self.grid.rows
    }

    /// Solver grid columns.
    pub const fn cols(&self) -> usize {
        self.grid.cols
    }

    /// Current possibility sets.
    pub const fn possibilities(&self) -> &PossibilityGrid {
        &self.grid
    }

    /// Remaining per-run budget of a pattern, `None` for unlimited.
    pub fn remaining_budget(&self, id: PatternId) -> Option<u32> {
        self.budgets.get(id.0).copied().flatten()
    }

    /// Counters so far.
    pub const fn stats(&self) -> SolveStats {
        self.stats
    }

    /// True once every cell is collapsed.
    pub fn is_complete(&self) -> bool {
        self.collapsed_count == self.grid.len()
    }

    /// Runs every phase until the grid is fully collapsed.
    ///
    /// Contradictions are logged and counted, never raised. The only errors
    /// are a blown iteration cap or an internal inconsistency.
    pub fn run(&mut self) -> Result<SolveStats, WfcError> {
        info!(
            "Starting WFC run on a {}x{} grid with {} patterns",
            self.rows(),
            self.cols(),
            self.library.len()
        );

        self.initial_cleanup();
        debug!("Initial cleanup complete");

        self.place_required()?;
        debug!("Required patterns placed");

        // Walls go after required patterns since a required pattern may itself be edge-only.
        self.place_edge_decorations()?;
        debug!(
            "Edge decorations placed, {}/{} cells collapsed",
            self.collapsed_count,
            self.grid.len()
        );

        while !self.is_complete() {
            self.stats.iterations += 1;
            if self.stats.iterations > self.max_iterations {
                error!(
                    "WFC exceeded {} iterations with {} cells still open",
                    self.max_iterations,
                    self.grid.len() - self.collapsed_count
                );
                return Err(WfcError::MaxIterationsReached(self.max_iterations));
            }

            self.shuffle_visit_order();
            let Some((row, col)) =
                self.entropy
                    .find_lowest_entropy(&self.grid, &self.collapsed, &self.visit_order)
            else {
                return Err(WfcError::InternalError(
                    "open cells remain but none was selectable".to_string(),
                ));
            };

            let before = self.collapsed_count;
            self.collapse(row, col)?;
            if self.collapsed_count != before + 1 {
                return Err(WfcError::InternalError(format!(
                    "collapsing ({row}, {col}) did not close exactly one cell"
                )));
            }
        }

        if self.stats.contradictions > 0 {
            warn!(
                "WFC finished with {} contradictions and {} forced placements",
                self.stats.contradictions, self.stats.forced_placements
            );
        } else {
            info!("WFC completed in {} iterations", self.stats.iterations);
        }
        Ok(self.stats)
    }

    fn shuffle_visit_order(&mut self) {
        self.visit_order.shuffle(&mut self.rng);
    }

    fn budget_allows(&self, pattern: usize) -> bool {
        !matches!(self.budgets.get(pattern), Some(Some(0)) | None)
    }

    fn is_collapsed(&self, row: usize, col: usize) -> bool {
        self.collapsed.get(row, col).copied().unwrap_or(false)
    }

    fn allows(&self, row: usize, col: usize, pattern: usize) -> bool {
        self.grid
            .get(row, col)
            .and_then(|cell| cell.get(pattern).map(|bit| *bit))
            .unwrap_or(false)
    }

    /// A pattern may go here if its edge rule, budget and possibility bit allow it.
    fn eligible(&self, row: usize, col: usize, pattern: usize) -> bool {
        let Some(p) = self.library.patterns().get(pattern) else {
            return false;
        };
        if p.edge_only && !self.grid.is_border(row, col) {
            return false;
        }
        self.budget_allows(pattern) && self.allows(row, col, pattern)
    }

    fn initial_cleanup(&mut self) {
        let num_patterns = self.library.len();
        let patterns = self.library.patterns();
        for index in 0..self.grid.len() {
            let (row, col) = self.grid.coords(index);
            let border = self.grid.is_border(row, col);
            let banned = self.grid.border_sides(row, col);
            let Some(cell) = self.grid.at_mut(index) else {
                continue;
            };
            cell[num_patterns..].fill(false);
            for (bit, pattern) in patterns.iter().enumerate() {
                let keep = if border {
                    !banned.iter().any(|side| pattern.connects(*side))
                } else {
                    !pattern.edge_only
                };
                if !keep {
                    cell.set(bit, false);
                }
            }
        }
    }

    fn place_required(&mut self) -> Result<(), WfcError> {
        let required: Vec<(usize, Option<u32>)> = self
            .library
            .patterns()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.required)
            .map(|(index, p)| (index, p.max_count))
            .collect();

        for (pattern, max_count) in required {
            let wanted = max_count.unwrap_or(1);
            let mut placed = 0;
            for _ in 0..wanted {
                let target = self.visit_order.iter().copied().find(|&index| {
                    let (row, col) = self.grid.coords(index);
                    !self.is_collapsed(row, col) && self.eligible(row, col, pattern)
                });
                self.shuffle_visit_order();
                let Some(index) = target else {
                    break;
                };
                let (row, col) = self.grid.coords(index);
                self.place_pattern(row, col, pattern)?;
                placed += 1;
            }
            if placed < wanted {
                warn!("Placed required pattern {pattern} {placed} of {wanted} times");
                self.stats.missing_required += (wanted - placed) as usize;
            }
        }
        Ok(())
    }

    fn place_edge_decorations(&mut self) -> Result<(), WfcError> {
        let edge_patterns: Vec<usize> = self
            .library
            .patterns()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.edge_only)
            .map(|(index, _)| index)
            .collect();
        if edge_patterns.is_empty() {
            return Ok(());
        }

        for index in 0..self.grid.len() {
            let (row, col) = self.grid.coords(index);
            if !self.grid.is_border(row, col) || self.is_collapsed(row, col) {
                continue;
            }
            if let Some(&pattern) = edge_patterns
                .iter()
                .find(|&&pattern| self.eligible(row, col, pattern))
            {
                self.place_pattern(row, col, pattern)?;
            }
        }
        Ok(())
    }

    fn collapse(&mut self, row: usize, col: usize) -> Result<(), WfcError> {
        let options: Vec<usize> = self
            .grid
            .get(row, col)
            .map(|cell| cell.iter_ones().collect())
            .unwrap_or_default();
        let legal: Vec<usize> = options
            .iter()
            .copied()
            .filter(|&pattern| self.budget_allows(pattern))
            .collect();

        if let Some(&pattern) = legal.choose(&mut self.rng) {
            trace!("Collapsing ({row}, {col}) to pattern {pattern} of {} options", legal.len());
            return self.place_pattern(row, col, pattern);
        }

        if options.is_empty() {
            error!("Contradiction at ({row}, {col}): no pattern fits");
        } else {
            warn!("Cell ({row}, {col}) can only take patterns whose budget is spent");
        }
        self.force_fallback(row, col)
    }

    /// Places pattern 0, or the first pattern with budget left, ignoring
    /// neighbor compatibility. With every budget spent the cell is closed empty.
    fn force_fallback(&mut self, row: usize, col: usize) -> Result<(), WfcError> {
        self.stats.forced_placements += 1;
        let fallback = (0..self.library.len()).find(|&pattern| self.budget_allows(pattern));
        match fallback {
            Some(pattern) => {
                warn!("Forcing pattern {pattern} at ({row}, {col})");
                if let Some(cell) = self.grid.get_mut(row, col) {
                    cell.set(pattern, true);
                }
                self.place_pattern(row, col, pattern)
            }
            None => {
                warn!("Every pattern budget is spent, leaving ({row}, {col}) empty");
                if let Some(cell) = self.grid.get_mut(row, col) {
                    cell.fill(false);
                }
                self.mark_collapsed(row, col);
                Ok(())
            }
        }
    }

    fn mark_collapsed(&mut self, row: usize, col: usize) {
        if let Some(flag) = self.collapsed.get_mut(row, col) {
            if *flag {
                warn!("Cell ({row}, {col}) was already collapsed");
            } else {
                *flag = true;
                self.collapsed_count += 1;
            }
        }
    }

    /// Fixes a cell to one pattern, spends budget and propagates.
    fn place_pattern(&mut self, row: usize, col: usize, pattern: usize) -> Result<(), WfcError> {
        if !self.eligible(row, col, pattern) {
            warn!("Placing pattern {pattern} at ({row}, {col}) although it is not eligible");
        }

        self.mark_collapsed(row, col);
        let cell = self
            .grid
            .get_mut(row, col)
            .ok_or_else(|| WfcError::GridError(format!("cell ({row}, {col}) out of bounds")))?;
        cell.fill(false);
        cell.set(pattern, true);

        let mut exhausted = false;
        if let Some(Some(budget)) = self.budgets.get_mut(pattern) {
            *budget = budget.saturating_sub(1);
            exhausted = *budget == 0;
        }
        if exhausted {
            self.retire_pattern(pattern);
        }

        let outcome = self
            .propagator
            .propagate(&mut self.grid, vec![(row, col)], &self.collapsed)?;
        for (cr, cc) in &outcome.contradictions {
            error!("Contradiction at ({cr}, {cc}) after placing pattern {pattern} at ({row}, {col})");
        }
        self.stats.contradictions += outcome.contradictions.len();
        Ok(())
    }

    /// Clears a spent pattern from every open cell.
    fn retire_pattern(&mut self, pattern: usize) {
        debug!("Pattern {pattern} budget exhausted, removing it from open cells");
        for index in 0..self.grid.len() {
            if self.collapsed.at(index).copied().unwrap_or(true) {
                continue;
            }
            if let Some(cell) = self.grid.at_mut(index) {
                if cell[pattern] {
                    cell.set(pattern, false);
                    if cell.not_any() {
                        let (row, col) = self.grid.coords(index);
                        error!("Contradiction at ({row}, {col}) after pattern {pattern} ran out");
                        self.stats.contradictions += 1;
                    }
                }
            }
        }
    }

    /// Pattern per cell; `None` for contradictions and open cells.
    pub fn assignments(&self) -> Grid<Option<PatternId>> {
        let mut out = Grid::new(self.rows(), self.cols());
        for index in 0..self.grid.len() {
            let Some(cell) = self.grid.at(index) else {
                continue;
            };
            if cell.count_ones() == 1 && self.collapsed.at(index).copied().unwrap_or(false) {
                if let Some(slot) = out.at_mut(index) {
                    *slot = cell.first_one().map(PatternId);
                }
            }
        }
        out
    }

    /// Renders every cell as its pattern block.
    ///
    /// Contradictions render as floor blocks and undecided cells as `?` blocks.
    pub fn to_lines(&self) -> AsciiGrid {
        let size = self.library.block_size();
        let patterns = self.library.patterns();
        let mut lines = Vec::with_capacity(self.rows() * size);
        for row in 0..self.rows() {
            for block_row in 0..size {
                let mut line = Vec::with_capacity(self.cols() * size);
                for col in 0..self.cols() {
                    let cell = self.grid.get(row, col);
                    let count = cell.map_or(0, |c| c.count_ones());
                    let chosen = cell
                        .and_then(|c| c.first_one())
                        .and_then(|bit| patterns.get(bit));
                    match (count, chosen) {
                        (1, Some(pattern)) => {
                            let text = pattern.pat.get(block_row).map_or("", String::as_str);
                            line.extend(text.bytes());
                        }
                        (0, _) | (1, None) => line.extend(std::iter::repeat(EMPTY).take(size)),
                        _ => line.extend(std::iter::repeat(UNKNOWN).take(size)),
                    }
                }
                lines.push(String::from_utf8_lossy(&line).into_owned());
            }
        }
        AsciiGrid::from_lines(&lines)
    }
}

/// Runs the solver to completion and renders the result.
///
/// # Arguments
///
/// * `library` - Patterns to place; only read.
/// * `config` - Grid size, seed and iteration cap.
///
/// # Returns
///
/// * `Ok(SolveOutcome)` once every cell is collapsed, even if some
///   contradictions were forced through.
/// * `Err(WfcError)` on a bad configuration or a blown iteration cap.
pub fn run(library: &PatternLibrary, config: &WfcConfig) -> Result<SolveOutcome, WfcError> {
    let mut solver = WaveCollapse::new(library, config)?;
    let stats = solver.run()?;
    Ok(SolveOutcome {
        lines: solver.to_lines(),
        assignments: solver.assignments(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapgen_rules::{Direction, Pattern};

    fn library(patterns: Vec<Pattern>, rows: usize, cols: usize) -> PatternLibrary {
        PatternLibrary::new(rows, cols, patterns).unwrap()
    }

    fn room(id: usize) -> Pattern {
        Pattern::new(id, &["..", ".."], &Direction::ALL)
    }

    fn solid(id: usize) -> Pattern {
        Pattern::new(id, &["##", "##"], &[])
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = WfcConfig::builder()
            .rows(4)
            .cols(6)
            .seed(9)
            .max_iterations(100)
            .build();
        assert_eq!(config.rows, Some(4));
        assert_eq!(config.cols, Some(6));
        assert_eq!(config.seed, 9);
        assert_eq!(config.max_iterations, Some(100));
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let lib = library(vec![room(0)], 2, 2);
        let config = WfcConfig::builder().rows(0).build();
        assert!(matches!(
            WaveCollapse::new(&lib, &config),
            Err(WfcError::GridError(_))
        ));
    }

    #[test]
    fn test_initial_cleanup_bans_off_grid_connectors() {
        let lib = library(vec![room(0), solid(1)], 3, 3);
        let mut solver = WaveCollapse::new(&lib, &WfcConfig::default()).unwrap();
        solver.initial_cleanup();
        // Border cells cannot open off the grid, so only the solid block is left.
        let border = solver.possibilities().get(0, 1).unwrap();
        assert_eq!(border.iter_ones().collect::<Vec<_>>(), vec![1]);
        let interior = solver.possibilities().get(1, 1).unwrap();
        assert_eq!(interior.iter_ones().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_edge_only_kept_off_interior() {
        let wall = Pattern::new(1, &["##", ".."], &[Direction::South]).edge_only();
        let lib = library(vec![room(0), wall], 3, 3);
        let mut solver = WaveCollapse::new(&lib, &WfcConfig::default()).unwrap();
        solver.initial_cleanup();
        assert!(!solver.possibilities().get(1, 1).unwrap()[1]);
        assert!(solver.possibilities().get(0, 1).unwrap()[1]);
    }

    #[test]
    fn test_run_collapses_every_cell() {
        let lib = library(vec![room(0), solid(1)], 4, 5);
        let outcome = run(&lib, &WfcConfig::builder().seed(7).build()).unwrap();
        assert!(outcome.assignments.iter().all(Option::is_some));
        assert_eq!(outcome.lines.dims(), (8, 10));
        assert_eq!(outcome.stats.contradictions, 0);
    }

    #[test]
    fn test_same_seed_same_output() {
        let lib = library(vec![room(0), solid(1)], 5, 5);
        let config = WfcConfig::builder().seed(1234).build();
        let first = run(&lib, &config).unwrap();
        let second = run(&lib, &config).unwrap();
        assert_eq!(first.lines, second.lines);
    }

    #[test]
    fn test_required_pattern_is_placed_up_to_budget() {
        let origin = Pattern::new(2, &["..", ".0"], &Direction::ALL).required(Some(2));
        let lib = library(vec![room(0), solid(1), origin], 5, 5);
        let outcome = run(&lib, &WfcConfig::builder().seed(3).build()).unwrap();
        let placed = outcome
            .assignments
            .iter()
            .filter(|a| **a == Some(PatternId(2)))
            .count();
        assert_eq!(placed, 2);
        assert_eq!(outcome.stats.missing_required, 0);
    }

    #[test]
    fn test_spent_budget_falls_back_without_overspending() {
        // The plug opens east but nothing opens west, so its east neighbor
        // always ends up with no option and has to be forced.
        let plug = Pattern::new(1, &["..", ".."], &[Direction::East]).required(Some(1));
        let lib = library(vec![solid(0), plug], 1, 3);
        for seed in 0..8 {
            let outcome = run(&lib, &WfcConfig::builder().seed(seed).build()).unwrap();
            let plugs: Vec<usize> = outcome
                .assignments
                .iter()
                .enumerate()
                .filter(|(_, a)| **a == Some(PatternId(1)))
                .map(|(index, _)| index)
                .collect();
            assert_eq!(plugs.len(), 1, "seed {seed}");
            assert_eq!(outcome.stats.forced_placements, 1, "seed {seed}");
            assert!(outcome.stats.contradictions >= 1, "seed {seed}");

            let forced = outcome.assignments.at(plugs[0] + 1).copied().flatten();
            assert_eq!(forced, Some(PatternId(0)), "seed {seed}");
        }
    }

    #[test]
    fn test_fallback_leaves_cell_empty_when_every_budget_is_spent() {
        let lib = library(vec![solid(0).with_max_count(1)], 1, 2);
        let outcome = run(&lib, &WfcConfig::builder().seed(2).build()).unwrap();
        assert_eq!(outcome.stats.forced_placements, 1);
        assert_eq!(outcome.assignments.iter().filter(|a| a.is_some()).count(), 1);
    }

    #[test]
    fn test_iteration_cap() {
        let lib = library(vec![room(0), solid(1)], 4, 4);
        let config = WfcConfig::builder().seed(1).max_iterations(2).build();
        let mut solver = WaveCollapse::new(&lib, &config).unwrap();
        assert!(matches!(
            solver.run(),
            Err(WfcError::MaxIterationsReached(2))
        ));
    }

    #[test]
    fn test_render_marks_undecided_cells() {
        let lib = library(vec![room(0), solid(1)], 1, 2);
        let solver = WaveCollapse::new(&lib, &WfcConfig::default()).unwrap();
        assert_eq!(solver.to_lines().to_lines(), vec!["????", "????"]);
    }
}
