//! Carve-and-repair room generator.
//!
//! Starts from an open room, drops straight wall segments in from the outer
//! wall, then repairs the result into a single connected floor area with one
//! entrance on the south side and an origin marker near the center.

use crate::ascii::{AsciiGrid, Cell};
use crate::grid::Grid;
use crate::symbols::{EMPTY, ORIGIN, WALL};
use log::{debug, trace, warn};
use rand::Rng;
use std::collections::VecDeque;

/// Floor regions smaller than this are filled in.
pub const MIN_ROOM_SIZE: usize = 15;

/// Shortest wall segment dropped in from the outer wall.
const MIN_WALL_LENGTH: usize = 3;

/// Dimensions and wall budget for one carved room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarveConfig {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Number of wall segments to drop in.
    pub num_walls: usize,
}

impl CarveConfig {
    /// Room of the given size with the default wall count, `(width + height) / 8`.
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            num_walls: (width + height) / 8,
        }
    }

    /// Overrides the wall count.
    #[must_use]
    pub const fn with_walls(mut self, num_walls: usize) -> Self {
        self.num_walls = num_walls;
        self
    }
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self::new(20, 20)
    }
}

/// Generates a room.
///
/// Rooms narrower or shorter than 5 have no interior to drop walls into, so
/// they come back as a walled box with an entrance and origin only.
pub fn carve<R: Rng + ?Sized>(config: &CarveConfig, rng: &mut R) -> AsciiGrid {
    let CarveConfig {
        width,
        height,
        num_walls,
    } = *config;
    let mut grid = AsciiGrid::filled(height, width, EMPTY);
    if width == 0 || height == 0 {
        return grid;
    }
    add_boundary_wall(&mut grid);

    if width >= 5 && height >= 5 {
        for _ in 0..num_walls {
            drop_wall_segment(&mut grid, rng);
        }
    } else {
        debug!("Room {width}x{height} too small for interior walls");
    }

    thin_wall_blobs(&mut grid);
    widen_narrow_corridors(&mut grid);
    remove_floating_walls(&mut grid);
    remove_small_regions(&mut grid, MIN_ROOM_SIZE);
    grid.remove_1x1_rooms();
    merge_regions(&mut grid);
    make_entrance(&mut grid);
    place_origin(&mut grid);
    grid
}

fn add_boundary_wall(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    for r in 0..rows {
        grid.set(r, 0, WALL);
        grid.set(r, cols - 1, WALL);
    }
    for c in 0..cols {
        grid.set(0, c, WALL);
        grid.set(rows - 1, c, WALL);
    }
}

/// Drops one straight segment in from a random side.
fn drop_wall_segment<R: Rng + ?Sized>(grid: &mut AsciiGrid, rng: &mut R) {
    let (rows, cols) = grid.dims();
    let edge = rng.gen_range(0..=3);
    let span = if edge < 2 { rows } else { cols };
    let max_len = (span / 2).max(MIN_WALL_LENGTH);
    let length = rng.gen_range(MIN_WALL_LENGTH..=max_len);

    match edge {
        0 => {
            let col = rng.gen_range(2..=cols - 3);
            for r in (1..rows - 1).take(length) {
                grid.set(r, col, WALL);
            }
        }
        1 => {
            let col = rng.gen_range(2..=cols - 3);
            for r in (1..rows - 1).rev().take(length) {
                grid.set(r, col, WALL);
            }
        }
        2 => {
            let row = rng.gen_range(2..=rows - 3);
            for c in (1..cols - 1).take(length) {
                grid.set(row, c, WALL);
            }
        }
        _ => {
            let row = rng.gen_range(2..=rows - 3);
            for c in (1..cols - 1).rev().take(length) {
                grid.set(row, c, WALL);
            }
        }
    }
    trace!("Dropped wall segment of length {length} from edge {edge}");
}

/// Interior cells of a grid, row-major.
fn interior(rows: usize, cols: usize) -> impl Iterator<Item = Cell> {
    (1..rows.saturating_sub(1)).flat_map(move |r| (1..cols.saturating_sub(1)).map(move |c| (r, c)))
}

/// Clears interior walls that sit inside a thick block.
///
/// A wall with three or more wall neighbors, or one completing a 2x2 wall
/// square, becomes floor.
fn thin_wall_blobs(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    let cap = rows * cols;
    let is_wall = |g: &AsciiGrid, r: usize, c: usize| g.get(r, c) == WALL;

    for _ in 0..cap {
        let mut changed = false;
        for (r, c) in interior(rows, cols) {
            if !is_wall(grid, r, c) {
                continue;
            }
            let up = is_wall(grid, r - 1, c);
            let down = is_wall(grid, r + 1, c);
            let left = is_wall(grid, r, c - 1);
            let right = is_wall(grid, r, c + 1);
            let neighbors = [up, down, left, right].iter().filter(|&&w| w).count();

            let square = (up && left && is_wall(grid, r - 1, c - 1))
                || (up && right && is_wall(grid, r - 1, c + 1))
                || (down && left && is_wall(grid, r + 1, c - 1))
                || (down && right && is_wall(grid, r + 1, c + 1));

            if neighbors >= 3 || square {
                grid.set(r, c, EMPTY);
                changed = true;
            }
        }
        if !changed {
            return;
        }
    }
    warn!("Wall thinning did not settle after {cap} passes");
}

/// Opens one flanking wall beside every 1-wide corridor cell.
///
/// Horizontal flanks are checked first; the outer wall is only opened when
/// the other flank is also outer.
fn widen_narrow_corridors(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    let cap = rows * cols;

    for _ in 0..cap {
        let mut changed = false;
        for (r, c) in interior(rows, cols) {
            if grid.get(r, c) != EMPTY {
                continue;
            }
            if grid.get(r, c - 1) == WALL && grid.get(r, c + 1) == WALL {
                if c - 1 > 0 {
                    changed |= grid.set(r, c - 1, EMPTY);
                } else if c + 1 < cols - 1 {
                    changed |= grid.set(r, c + 1, EMPTY);
                }
                continue;
            }
            if grid.get(r - 1, c) == WALL && grid.get(r + 1, c) == WALL {
                if r - 1 > 0 {
                    changed |= grid.set(r - 1, c, EMPTY);
                } else if r + 1 < rows - 1 {
                    changed |= grid.set(r + 1, c, EMPTY);
                }
            }
        }
        if !changed {
            return;
        }
    }
    warn!("Corridor widening did not settle after {cap} passes");
}

/// Clears interior walls not connected to the outer wall.
fn remove_floating_walls(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    let mut anchored: Grid<bool> = Grid::new(rows, cols);
    let mut queue = VecDeque::new();

    for (r, c) in grid.cells() {
        let on_edge = r == 0 || c == 0 || r + 1 == rows || c + 1 == cols;
        if on_edge && grid.get(r, c) == WALL {
            if let Some(flag) = anchored.get_mut(r, c) {
                *flag = true;
            }
            queue.push_back((r, c));
        }
    }

    while let Some((r, c)) = queue.pop_front() {
        for next in neighbors4(grid, (r, c)) {
            if grid.get(next.0, next.1) != WALL {
                continue;
            }
            if let Some(flag) = anchored.get_mut(next.0, next.1) {
                if !*flag {
                    *flag = true;
                    queue.push_back(next);
                }
            }
        }
    }

    let mut removed = 0;
    for (r, c) in interior(rows, cols) {
        if grid.get(r, c) == WALL && !anchored.get(r, c).copied().unwrap_or(false) {
            grid.set(r, c, EMPTY);
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Removed {removed} floating wall cells");
    }
}

/// Fills floor regions smaller than `min_size` with wall.
fn remove_small_regions(grid: &mut AsciiGrid, min_size: usize) {
    let (_, regions) = label_regions(grid);
    for (label, cells) in regions.iter().enumerate() {
        if cells.len() >= min_size {
            continue;
        }
        trace!("Filling floor region {label} of {} cells", cells.len());
        fill(grid, cells);
    }
}

fn fill(grid: &mut AsciiGrid, cells: &[Cell]) {
    for &(r, c) in cells {
        grid.set(r, c, WALL);
    }
}

/// Labels 4-connected floor regions in row-major discovery order.
///
/// Returns the label per cell and the cells of each region.
pub fn label_regions(grid: &AsciiGrid) -> (Grid<Option<usize>>, Vec<Vec<Cell>>) {
    let (rows, cols) = grid.dims();
    let mut labels: Grid<Option<usize>> = Grid::new(rows, cols);
    let mut regions: Vec<Vec<Cell>> = Vec::new();

    for start in grid.cells() {
        if grid.get(start.0, start.1) != EMPTY || labels.get(start.0, start.1).copied().flatten().is_some() {
            continue;
        }
        let label = regions.len();
        let mut cells = Vec::new();
        let mut queue = VecDeque::from([start]);
        if let Some(slot) = labels.get_mut(start.0, start.1) {
            *slot = Some(label);
        }
        while let Some(cell) = queue.pop_front() {
            cells.push(cell);
            for next in neighbors4(grid, cell) {
                if grid.get(next.0, next.1) != EMPTY {
                    continue;
                }
                if let Some(slot) = labels.get_mut(next.0, next.1) {
                    if slot.is_none() {
                        *slot = Some(label);
                        queue.push_back(next);
                    }
                }
            }
        }
        regions.push(cells);
    }
    (labels, regions)
}

/// Joins floor regions until one remains.
///
/// Each round opens a single wall cell between the first region and another
/// one, searching right, left, up, then down from each cell of the first
/// region. Regions separated by thicker walls cannot be joined that way, so
/// once no door is left every region but the largest is filled in.
fn merge_regions(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    let cap = rows * cols;

    for _ in 0..cap {
        let (labels, regions) = label_regions(grid);
        if regions.len() <= 1 {
            return;
        }
        let other = |r: usize, c: usize| labels.get(r, c).copied().flatten().is_some_and(|l| l != 0);

        let door = regions[0].iter().find_map(|&(r, c)| {
            let wall = |r: usize, c: usize| grid.get(r, c) == WALL;
            if c + 2 < cols && wall(r, c + 1) && other(r, c + 2) {
                return Some((r, c + 1));
            }
            if c >= 2 && wall(r, c - 1) && other(r, c - 2) {
                return Some((r, c - 1));
            }
            if r >= 2 && wall(r - 1, c) && other(r - 2, c) {
                return Some((r - 1, c));
            }
            if r + 2 < rows && wall(r + 1, c) && other(r + 2, c) {
                return Some((r + 1, c));
            }
            None
        });

        match door {
            Some((r, c)) => {
                trace!("Opening door at ({r}, {c}) between floor regions");
                grid.set(r, c, EMPTY);
            }
            None => {
                warn!(
                    "{} floor regions remain with no single-wall door between them, keeping the largest",
                    regions.len()
                );
                keep_largest_region(grid, &regions);
                return;
            }
        }
    }
    warn!("Region merging did not settle after {cap} rounds");
}

fn keep_largest_region(grid: &mut AsciiGrid, regions: &[Vec<Cell>]) {
    let largest = regions
        .iter()
        .enumerate()
        .max_by_key(|(index, cells)| (cells.len(), std::cmp::Reverse(*index)))
        .map(|(index, _)| index);
    for (index, cells) in regions.iter().enumerate() {
        if Some(index) != largest {
            fill(grid, cells);
        }
    }
}

/// Opens the first south wall cell that has floor directly above it.
fn make_entrance(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    if rows < 2 {
        return;
    }
    let bottom = rows - 1;
    let entrance = (1..cols.saturating_sub(1))
        .find(|&c| grid.get(bottom, c) == WALL && grid.get(bottom - 1, c) == EMPTY);
    match entrance {
        Some(c) => {
            grid.set(bottom, c, EMPTY);
        }
        None => debug!("No spot for a south entrance"),
    }
}

/// Marks the center as origin, or the nearest floor cell if the center is a
/// wall.
fn place_origin(grid: &mut AsciiGrid) {
    let (rows, cols) = grid.dims();
    let center = (rows / 2, cols / 2);
    if grid.get(center.0, center.1) != WALL {
        grid.set(center.0, center.1, ORIGIN);
        return;
    }
    let nearest = grid
        .cells()
        .filter(|&(r, c)| grid.get(r, c) == EMPTY)
        .min_by_key(|&(r, c)| (r.abs_diff(center.0) + c.abs_diff(center.1), r, c));
    match nearest {
        Some((r, c)) => {
            grid.set(r, c, ORIGIN);
        }
        None => warn!("Room has no floor for an origin"),
    }
}

fn neighbors4(grid: &AsciiGrid, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
    mapgen_rules::Direction::ALL
        .into_iter()
        .filter_map(move |direction| grid.step(cell, direction))
}
