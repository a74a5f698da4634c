//! Character grids and the structural utilities every stage shares.
//!
//! Rows may have different lengths until [`AsciiGrid::normalize_dims`] runs.
//! Reads outside a row or outside the grid see a wall.

use crate::grid::Grid;
use crate::symbols::{self, EMPTY, ORIGIN, WALL};
use mapgen_rules::Direction;
use std::collections::VecDeque;
use std::fmt;

/// A `(row, col)` position.
pub type Cell = (usize, usize);

/// Safety cap for the pocket repair fixpoint loop.
const MAX_POCKET_PASSES: usize = 100;

/// A rectangular-ish grid of legend bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AsciiGrid {
    lines: Vec<Vec<u8>>,
}

impl AsciiGrid {
    /// Builds a grid from text lines.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|line| line.as_ref().as_bytes().to_vec())
                .collect(),
        }
    }

    /// Builds a grid from newline separated text.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(|line| line.as_bytes().to_vec()).collect(),
        }
    }

    /// Builds a `rows` x `cols` grid filled with `fill`.
    pub fn filled(rows: usize, cols: usize, fill: u8) -> Self {
        Self {
            lines: vec![vec![fill; cols]; rows],
        }
    }

    /// Converts a dense byte grid.
    pub fn from_grid(grid: &Grid<u8>) -> Self {
        Self {
            lines: grid.data.chunks(grid.cols.max(1)).map(<[u8]>::to_vec).collect(),
        }
    }

    /// Rows as owned strings.
    pub fn to_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Raw rows.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// Row count and the length of the longest row.
    pub fn dims(&self) -> (usize, usize) {
        let width = self.lines.iter().map(Vec::len).max().unwrap_or(0);
        (self.lines.len(), width)
    }

    /// True when the position exists in its row.
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        self.lines.get(row).is_some_and(|line| col < line.len())
    }

    /// Byte at a position, `WALL` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.lines
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .unwrap_or(WALL)
    }

    /// Writes a byte; out of bounds writes are ignored and return false.
    pub fn set(&mut self, row: usize, col: usize, ch: u8) -> bool {
        match self.lines.get_mut(row).and_then(|line| line.get_mut(col)) {
            Some(slot) => {
                *slot = ch;
                true
            }
            None => false,
        }
    }

    /// Neighbor position in `direction`, if it is in bounds.
    pub fn step(&self, (row, col): Cell, direction: Direction) -> Option<Cell> {
        let (dr, dc) = direction.offset();
        let next = (row.checked_add_signed(dr)?, col.checked_add_signed(dc)?);
        self.in_bounds(next.0, next.1).then_some(next)
    }

    /// Number of occurrences of `ch`.
    pub fn count(&self, ch: u8) -> usize {
        self.lines.iter().flatten().filter(|&&b| b == ch).count()
    }

    /// First position holding `ch` in row-major order.
    pub fn find(&self, ch: u8) -> Option<Cell> {
        self.cells().find(|&(r, c)| self.get(r, c) == ch)
    }

    /// Every in-bounds position in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.lines
            .iter()
            .enumerate()
            .flat_map(|(r, line)| (0..line.len()).map(move |c| (r, c)))
    }

    /// Shortest 4-neighbor path from `start` to `goal`, both inclusive.
    ///
    /// The start cell is always entered; every other step must land on a byte
    /// accepted by `walkable`.
    pub fn bfs_path<F>(&self, start: Cell, goal: Cell, walkable: F) -> Option<Vec<Cell>>
    where
        F: Fn(u8) -> bool,
    {
        let (rows, cols) = self.dims();
        if !self.in_bounds(start.0, start.1) || !self.in_bounds(goal.0, goal.1) {
            return None;
        }

        let mut parent: Grid<Option<Cell>> = Grid::new(rows, cols);
        let mut visited: Grid<bool> = Grid::new(rows, cols);
        let mut queue = VecDeque::from([start]);
        if let Some(seen) = visited.get_mut(start.0, start.1) {
            *seen = true;
        }

        while let Some(current) = queue.pop_front() {
            if current == goal {
                break;
            }
            for direction in Direction::ALL {
                let Some(next) = self.step(current, direction) else {
                    continue;
                };
                if !walkable(self.get(next.0, next.1)) {
                    continue;
                }
                let Some(seen) = visited.get_mut(next.0, next.1) else {
                    continue;
                };
                if *seen {
                    continue;
                }
                *seen = true;
                if let Some(link) = parent.get_mut(next.0, next.1) {
                    *link = Some(current);
                }
                queue.push_back(next);
            }
        }

        if !visited.get(goal.0, goal.1).copied().unwrap_or(false) {
            return None;
        }

        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = parent.get(current.0, current.1).copied().flatten()?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Number of cells reachable from `start` over bytes accepted by `walkable`.
    pub fn flood_count<F>(&self, start: Cell, walkable: F) -> usize
    where
        F: Fn(u8) -> bool,
    {
        let (rows, cols) = self.dims();
        let mut visited: Grid<bool> = Grid::new(rows, cols);
        let mut queue = VecDeque::from([start]);
        if let Some(seen) = visited.get_mut(start.0, start.1) {
            *seen = true;
        }
        let mut count = 0;
        while let Some(current) = queue.pop_front() {
            count += 1;
            for direction in Direction::ALL {
                let Some(next) = self.step(current, direction) else {
                    continue;
                };
                if !walkable(self.get(next.0, next.1)) {
                    continue;
                }
                if let Some(seen) = visited.get_mut(next.0, next.1) {
                    if !*seen {
                        *seen = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        count
    }

    /// Crops or pads to exactly `rows` x `cols`, padding with floor.
    pub fn normalize_dims(&mut self, rows: usize, cols: usize) {
        self.lines.resize_with(rows, Vec::new);
        for line in &mut self.lines {
            line.resize(cols, EMPTY);
        }
    }

    /// Leaves exactly one origin marker.
    ///
    /// Extra origins after the first (row-major) become floor. With no origin,
    /// the center is used unless it is a wall, in which case the first floor
    /// cell is used. A grid with no floor still gets its center marked.
    pub fn ensure_single_origin(&mut self) {
        let (rows, cols) = self.dims();
        if rows == 0 || cols == 0 {
            return;
        }

        let mut found = false;
        for line in &mut self.lines {
            for ch in line.iter_mut().filter(|ch| **ch == ORIGIN) {
                if found {
                    *ch = EMPTY;
                } else {
                    found = true;
                }
            }
        }
        if found {
            return;
        }

        let center = (rows / 2, cols / 2);
        if symbols::is_wall(self.get(center.0, center.1)) {
            if let Some((r, c)) = self.find(EMPTY) {
                self.set(r, c, ORIGIN);
                return;
            }
        }
        self.set(center.0, center.1, ORIGIN);
    }

    /// Reduces the grid to walls, floor and origin.
    ///
    /// Unknown markers, whitespace and fixture bytes all become floor.
    pub fn scrub_to_layout_only(&mut self) {
        for ch in self.lines.iter_mut().flatten() {
            if !symbols::is_structural(*ch) {
                *ch = EMPTY;
            }
        }
    }

    /// Opens a wall next to every walkable interior cell that has no walkable
    /// neighbor, trying down, right, up, then left.
    ///
    /// Outer rows and columns are never opened. Repeats until nothing changes
    /// or the pass cap is reached.
    pub fn remove_1x1_rooms(&mut self) {
        let (rows, cols) = self.dims();
        if rows <= 2 || cols <= 2 {
            return;
        }

        let mut changed = true;
        let mut passes = 0;
        while changed && passes < MAX_POCKET_PASSES {
            changed = false;
            passes += 1;
            for r in 1..rows - 1 {
                for c in 1..cols - 1 {
                    if !symbols::is_walkable_for_routing(self.get(r, c)) {
                        continue;
                    }
                    let open_neighbors = [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)]
                        .iter()
                        .filter(|&&(nr, nc)| symbols::is_walkable_for_routing(self.get(nr, nc)))
                        .count();
                    if open_neighbors > 0 {
                        continue;
                    }
                    let candidates = [
                        (r + 1 < rows - 1, (r + 1, c)),
                        (c + 1 < cols - 1, (r, c + 1)),
                        (r > 1, (r - 1, c)),
                        (c > 1, (r, c - 1)),
                    ];
                    if let Some(&(_, (wr, wc))) = candidates
                        .iter()
                        .find(|(interior, (wr, wc))| *interior && symbols::is_wall(self.get(*wr, *wc)))
                    {
                        self.set(wr, wc, EMPTY);
                        changed = true;
                    }
                }
            }
        }
        if changed {
            log::warn!("1x1 pocket repair stopped after {MAX_POCKET_PASSES} passes");
        }
    }
}

impl fmt::Display for AsciiGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            f.write_str(&String::from_utf8_lossy(line))?;
        }
        Ok(())
    }
}
