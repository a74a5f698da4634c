//! Structural playability checks on finished grids.

use crate::ascii::{AsciiGrid, Cell};
use crate::placement::queue_strip;
use crate::symbols::{self, CUST_SPAWNER, EMPTY, ORIGIN, REGISTER, REQUIRED_SYMBOLS};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Whether a failure could be fixed in place or needs a fresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailureClass {
    /// Could be patched without regenerating. Not produced by any check yet.
    Repairable,
    /// Only a reroll helps.
    RerollOnly,
}

/// What was wrong with a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailureKind {
    /// No `'0'` on the grid.
    MissingOrigin,
    /// More than one `'0'`.
    MultipleOrigins,
    /// A required fixture symbol is absent.
    MissingRequiredEntity,
    /// Non-wall tiles split into pieces joined at most diagonally.
    DisconnectedWalkable4Neighbor,
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Failure {
    pub kind: FailureKind,
    pub classification: FailureClass,
    pub message: String,
}

impl Failure {
    fn reroll(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            classification: FailureClass::RerollOnly,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every failure found on a grid, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlayabilityReport {
    pub failures: Vec<Failure>,
}

impl PlayabilityReport {
    /// True when no check failed.
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// True if any failure has this kind.
    pub fn has(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|failure| failure.kind == kind)
    }
}

impl fmt::Display for PlayabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok() {
            return f.write_str("ok");
        }
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Checks origin count, required fixtures and 4-neighbor connectivity.
///
/// Every violation is reported, not only the first.
pub fn validate_ascii(grid: &AsciiGrid) -> PlayabilityReport {
    let mut report = PlayabilityReport::default();

    match grid.count(ORIGIN) {
        0 => report.failures.push(Failure::reroll(
            FailureKind::MissingOrigin,
            "missing origin marker '0'",
        )),
        1 => {}
        _ => report.failures.push(Failure::reroll(
            FailureKind::MultipleOrigins,
            "multiple origin markers '0' found",
        )),
    }

    for (symbol, label) in REQUIRED_SYMBOLS {
        if grid.count(symbol) == 0 {
            report.failures.push(Failure::reroll(
                FailureKind::MissingRequiredEntity,
                format!("missing required symbol: {label}"),
            ));
        }
    }

    if !is_connected_4_neighbor(grid) {
        report.failures.push(Failure::reroll(
            FailureKind::DisconnectedWalkable4Neighbor,
            "walkable tiles are not connected under 4-neighbor adjacency",
        ));
    }

    report
}

/// True if every non-wall tile is reachable from the first one.
///
/// Grids with no walkable tile count as connected.
pub fn is_connected_4_neighbor(grid: &AsciiGrid) -> bool {
    let mut walkable = grid
        .cells()
        .filter(|&(r, c)| symbols::is_walkable_ascii(grid.get(r, c)));
    let Some(start) = walkable.next() else {
        return true;
    };
    let total = 1 + walkable.count();
    grid.flood_count(start, symbols::is_walkable_ascii) == total
}

/// Why customers could not reach the register.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The structural checks already failed.
    #[error("Structural validation failed: {0}")]
    Structural(PlayabilityReport),
    /// No `'C'` on the grid.
    #[error("No customer spawner on the grid")]
    MissingSpawner,
    /// No `'R'` on the grid.
    #[error("No register on the grid")]
    MissingRegister,
    /// A queue cell east of the register is off the grid or not floor.
    #[error("Register queue cell ({0}, {1}) is blocked")]
    QueueBlocked(usize, usize),
    /// The spawner cannot walk to the queue front.
    #[error("No walkable route from spawner {spawner:?} to queue front {queue_front:?}")]
    NoPath {
        /// Spawner cell.
        spawner: Cell,
        /// First queue cell.
        queue_front: Cell,
    },
}

/// Structural checks plus the customer route.
///
/// The register's queue strip must be in bounds and floor, and the spawner
/// must reach the first queue cell stepping only on floor and origin.
pub fn validate_routing(grid: &AsciiGrid) -> Result<(), RoutingError> {
    let report = validate_ascii(grid);
    if !report.ok() {
        return Err(RoutingError::Structural(report));
    }

    let spawner = grid.find(CUST_SPAWNER).ok_or(RoutingError::MissingSpawner)?;
    let register = grid.find(REGISTER).ok_or(RoutingError::MissingRegister)?;

    for (r, c) in queue_strip(register) {
        if !grid.in_bounds(r, c) || grid.get(r, c) != EMPTY {
            return Err(RoutingError::QueueBlocked(r, c));
        }
    }

    let queue_front = (register.0, register.1 + 1);
    grid.bfs_path(spawner, queue_front, symbols::is_walkable_for_routing)
        .map(|_| ())
        .ok_or(RoutingError::NoPath {
            spawner,
            queue_front,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "#########\n\
                        #0.....t#\n\
                        #.R...S.#\n\
                        #.....d.#\n\
                        #C..g.f+#\n\
                        #########";

    #[test]
    fn test_happy_path() {
        let grid = AsciiGrid::parse(GOOD);
        let report = validate_ascii(&grid);
        assert!(report.ok(), "{report}");
        assert_eq!(validate_routing(&grid), Ok(()));
    }

    #[test]
    fn test_happy_path_7x7() {
        let grid = AsciiGrid::parse(
            "#######\n\
             #0...t#\n\
             #R...S#\n\
             #.....#\n\
             #C.dgf#\n\
             #+....#\n\
             #######",
        );
        assert_eq!(grid.dims(), (7, 7));
        let report = validate_ascii(&grid);
        assert!(report.ok(), "{report}");
        assert!(report.failures.is_empty());
        assert_eq!(validate_routing(&grid), Ok(()));
    }

    #[test]
    fn test_missing_origin() {
        let grid = AsciiGrid::parse(
            "#######\n\
             #CRSdg#\n\
             #f+t..#\n\
             #.....#\n\
             #.....#\n\
             #.....#\n\
             #######",
        );
        let report = validate_ascii(&grid);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::MissingOrigin);
        assert_eq!(report.failures[0].classification, FailureClass::RerollOnly);
        assert_eq!(report.failures[0].message, "missing origin marker '0'");
    }

    #[test]
    fn test_multiple_origins() {
        let grid = AsciiGrid::parse(&GOOD.replacen('.', "0", 1));
        assert!(validate_ascii(&grid).has(FailureKind::MultipleOrigins));
    }

    #[test]
    fn test_diagonal_only_split_is_disconnected() {
        let grid = AsciiGrid::parse(
            "#######\n\
             #0CRS##\n\
             #dgf+##\n\
             #t###.#\n\
             #####.#\n\
             #######",
        );
        let report = validate_ascii(&grid);
        assert!(report.has(FailureKind::DisconnectedWalkable4Neighbor));
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_each_missing_symbol_reported() {
        let grid = AsciiGrid::parse(
            "#####\n\
             #0..#\n\
             #####",
        );
        let report = validate_ascii(&grid);
        let missing: Vec<&str> = report
            .failures
            .iter()
            .filter(|f| f.kind == FailureKind::MissingRequiredEntity)
            .map(|f| f.message.as_str())
            .collect();
        assert_eq!(missing.len(), REQUIRED_SYMBOLS.len());
        assert_eq!(missing[0], "missing required symbol: CustomerSpawner (C)");
        assert_eq!(missing[7], "missing required symbol: Table (t)");
    }

    #[test]
    fn test_out_of_row_reads_are_walls() {
        let grid = AsciiGrid::from_lines(&["..", "."]);
        assert!(is_connected_4_neighbor(&grid));
        let split = AsciiGrid::from_lines(&[".#.", "."]);
        assert!(!is_connected_4_neighbor(&split));
    }

    #[test]
    fn test_no_walkable_tiles_is_connected() {
        assert!(is_connected_4_neighbor(&AsciiGrid::parse("##\n##")));
        assert!(is_connected_4_neighbor(&AsciiGrid::default()));
    }

    #[test]
    fn test_routing_blocked_queue() {
        let grid = AsciiGrid::parse(&GOOD.replace(".R...S.", ".R.t.S."));
        assert_eq!(validate_routing(&grid), Err(RoutingError::QueueBlocked(2, 4)));
    }

    #[test]
    fn test_routing_queue_off_grid() {
        let grid = AsciiGrid::parse(
            "#########\n\
             #0.....t#\n\
             #.....SR#\n\
             #.....d.#\n\
             #C..g.f+#\n\
             #########",
        );
        assert!(matches!(validate_routing(&grid), Err(RoutingError::QueueBlocked(2, 8))));
    }

    #[test]
    fn test_routing_fixtures_block_path() {
        // Fixtures count as walkable for connectivity but not for customers.
        let grid = AsciiGrid::parse(
            "#########\n\
             #0.....t#\n\
             #.R...S.#\n\
             #ddddddd#\n\
             #C..g.f+#\n\
             #########",
        );
        assert!(validate_ascii(&grid).ok());
        assert!(matches!(validate_routing(&grid), Err(RoutingError::NoPath { .. })));
    }

    #[test]
    fn test_routing_reports_structural_failure() {
        let grid = AsciiGrid::parse(&GOOD.replace('0', "."));
        assert!(matches!(validate_routing(&grid), Err(RoutingError::Structural(_))));
    }
}
