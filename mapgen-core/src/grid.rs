//! Row-major grids and per-cell possibility sets.

use bitvec::prelude::*;
use mapgen_rules::{Direction, MAX_NUM_PATTERNS};

/// Dense row-major 2D storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    pub rows: usize,
    pub cols: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

impl<T> Grid<T> {
    /// Returns an immutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.index(row, col).and_then(|idx| self.data.get(idx))
    }

    /// Returns a mutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.index(row, col)
            .and_then(move |idx| self.data.get_mut(idx))
    }

    /// Calculates the 1D index for the given coordinates.
    /// Returns None if the coordinates are out of bounds.
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    /// Inverse of [`Grid::index`].
    pub const fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a grid with no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at a flat index.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Mutable cell at a flat index.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }

    /// Iterates cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Coordinates of the neighbor in `direction`, if it lies inside the grid.
    pub fn neighbor(&self, row: usize, col: usize, direction: Direction) -> Option<(usize, usize)> {
        let (dr, dc) = direction.offset();
        let nr = row.checked_add_signed(dr)?;
        let nc = col.checked_add_signed(dc)?;
        (nr < self.rows && nc < self.cols).then_some((nr, nc))
    }

    /// True if the cell touches any side of the grid.
    pub const fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.rows || col + 1 == self.cols
    }

    /// Sides of the grid this cell touches.
    pub fn border_sides(&self, row: usize, col: usize) -> Vec<Direction> {
        let mut sides = Vec::with_capacity(2);
        if row == 0 {
            sides.push(Direction::North);
        }
        if row + 1 == self.rows {
            sides.push(Direction::South);
        }
        if col == 0 {
            sides.push(Direction::West);
        }
        if col + 1 == self.cols {
            sides.push(Direction::East);
        }
        sides
    }
}

/// Per-cell set of still-legal pattern indices.
pub type PossibilityGrid = Grid<BitVec>;

impl PossibilityGrid {
    /// Creates a grid where every cell allows every bit of a
    /// `MAX_NUM_PATTERNS`-wide possibility set.
    pub fn all_possible(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, bitvec![1; MAX_NUM_PATTERNS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_row_major_for_rectangles() {
        let grid: Grid<u8> = Grid::new(2, 5);
        assert_eq!(grid.index(1, 3), Some(8));
        assert_eq!(grid.coords(8), (1, 3));
        assert_eq!(grid.index(2, 0), None);
        assert_eq!(grid.index(0, 5), None);
    }

    #[test]
    fn test_neighbors_stay_in_bounds() {
        let grid: Grid<u8> = Grid::new(3, 4);
        assert_eq!(grid.neighbor(0, 0, Direction::North), None);
        assert_eq!(grid.neighbor(0, 0, Direction::West), None);
        assert_eq!(grid.neighbor(0, 0, Direction::East), Some((0, 1)));
        assert_eq!(grid.neighbor(2, 3, Direction::South), None);
        assert_eq!(grid.neighbor(2, 3, Direction::North), Some((1, 3)));
    }

    #[test]
    fn test_border_sides() {
        let grid: Grid<u8> = Grid::new(3, 3);
        assert_eq!(grid.border_sides(0, 0), vec![Direction::North, Direction::West]);
        assert!(grid.border_sides(1, 1).is_empty());
        assert!(grid.is_border(2, 1));
        assert!(!grid.is_border(1, 1));
    }

    #[test]
    fn test_all_possible_width() {
        let grid = PossibilityGrid::all_possible(2, 2);
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|cell| cell.count_ones() == MAX_NUM_PATTERNS));
    }
}
