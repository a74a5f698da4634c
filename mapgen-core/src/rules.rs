//! Pairwise pattern compatibility derived from connectors.

use bitvec::prelude::*;
use mapgen_rules::{Direction, Pattern, MAX_NUM_PATTERNS};

/// Precomputed pattern compatibility for each direction.
///
/// Stores, for every direction and source pattern, the set of patterns that
/// may sit next to it in that direction. Derived once per library from the
/// connector rules in [`Pattern::is_compatible_with`].
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    num_patterns: usize,
    /// Indexing: `direction_index * num_patterns + source`.
    supported: Vec<BitVec>,
}

const fn direction_index(direction: Direction) -> usize {
    match direction {
        Direction::North => 0,
        Direction::East => 1,
        Direction::South => 2,
        Direction::West => 3,
    }
}

impl CompatibilityTable {
    /// Builds the table for a pattern list.
    pub fn new(patterns: &[Pattern]) -> Self {
        let num_patterns = patterns.len();
        let mut supported = Vec::with_capacity(Direction::ALL.len() * num_patterns);
        for direction in Direction::ALL {
            for source in patterns {
                let mut row = bitvec![0; MAX_NUM_PATTERNS];
                for (index, target) in patterns.iter().enumerate() {
                    if source.is_compatible_with(target, direction) {
                        row.set(index, true);
                    }
                }
                supported.push(row);
            }
        }
        Self {
            num_patterns,
            supported,
        }
    }

    /// Number of patterns covered.
    pub const fn num_patterns(&self) -> usize {
        self.num_patterns
    }

    /// Checks if `target` may sit in `direction` from `source`.
    ///
    /// Returns `false` if either index is out of range.
    #[inline]
    pub fn check(&self, source: usize, target: usize, direction: Direction) -> bool {
        self.row(source, direction)
            .and_then(|row| row.get(target).map(|bit| *bit))
            .unwrap_or(false)
    }

    /// Patterns allowed in `direction` from `source`.
    pub fn row(&self, source: usize, direction: Direction) -> Option<&BitVec> {
        if source >= self.num_patterns {
            return None;
        }
        self.supported
            .get(direction_index(direction) * self.num_patterns + source)
    }

    /// Union of allowed neighbors over every pattern set in `sources`.
    pub fn supported_by(&self, sources: &BitSlice, direction: Direction) -> BitVec {
        let mut union = bitvec![0; MAX_NUM_PATTERNS];
        for source in sources.iter_ones() {
            if let Some(row) = self.row(source, direction) {
                for target in row.iter_ones() {
                    union.set(target, true);
                }
            }
        }
        union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<Pattern> {
        vec![
            Pattern::new(0, &["..."], &Direction::ALL),
            Pattern::new(1, &["###"], &[]),
            Pattern::new(2, &["#.#"], &[Direction::North, Direction::South]),
        ]
    }

    #[test]
    fn test_check_matches_connector_rules() {
        let table = CompatibilityTable::new(&patterns());
        assert!(table.check(0, 0, Direction::East));
        assert!(table.check(1, 1, Direction::East));
        assert!(!table.check(0, 1, Direction::East));
        assert!(table.check(2, 0, Direction::North));
        assert!(!table.check(2, 0, Direction::East));
        assert!(table.check(2, 1, Direction::East));
        assert!(!table.check(5, 0, Direction::East));
    }

    #[test]
    fn test_supported_by_unions_rows() {
        let table = CompatibilityTable::new(&patterns());
        let mut sources = bitvec![0; MAX_NUM_PATTERNS];
        sources.set(0, true);
        sources.set(1, true);
        let union = table.supported_by(&sources, Direction::South);
        // 0 supports 0 and 2 southwards, 1 supports only 1.
        assert_eq!(union.iter_ones().collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
