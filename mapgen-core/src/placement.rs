//! Required fixture placement.
//!
//! Puts a register with a clear queue strip and a customer spawner that can
//! walk to the front of that queue, then scatters the remaining fixtures on
//! free floor away from the customer route.

use crate::ascii::{AsciiGrid, Cell};
use crate::grid::Grid;
use crate::symbols::{
    self, CUPBOARD, CUST_SPAWNER, EMPTY, FAST_FORWARD, QUEUE_LENGTH, REGISTER, SODA_MACHINE,
    SOPHIE, TABLE, TRASH,
};
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Register positions tried before giving up.
pub const MAX_REGISTER_TRIES: usize = 50;

/// Spawner positions tried per register position.
pub const MAX_SPAWNER_TRIES: usize = 150;

/// Fixtures placed after the register and spawner, in order.
const SINGLE_FIXTURES: [u8; 5] = [SODA_MACHINE, CUPBOARD, TRASH, FAST_FORWARD, SOPHIE];

/// Why a layout could not take its fixtures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The layout has no cells.
    #[error("Layout is empty")]
    EmptyGrid,
    /// No interior floor cell has a clear queue strip east of it.
    #[error("No register position with a clear queue strip")]
    NoRegisterCandidates,
    /// No spawner position reaches any tried queue front.
    #[error("No spawner position can reach a register queue")]
    NoRoutablePair,
    /// Free floor ran out before this fixture was placed.
    #[error("No free floor left for fixture '{0}'")]
    FixtureUnplaceable(char),
}

/// Where the customer route ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRoute {
    /// Register cell.
    pub register: Cell,
    /// Spawner cell.
    pub spawner: Cell,
    /// Walk from the spawner to the queue front, both inclusive.
    pub path: Vec<Cell>,
}

/// Places every required fixture on `grid`, with `table_count` tables.
///
/// Any fixture bytes already on the grid are cleared first and a single
/// origin is enforced. On error the grid may hold a partial placement and
/// should be discarded.
pub fn place_required<R: Rng + ?Sized>(
    grid: &mut AsciiGrid,
    table_count: usize,
    rng: &mut R,
) -> Result<CustomerRoute, PlacementError> {
    let (rows, cols) = grid.dims();
    if rows == 0 || cols == 0 {
        return Err(PlacementError::EmptyGrid);
    }

    grid.scrub_to_layout_only();
    grid.ensure_single_origin();

    let route = place_customer_route(grid, rng)?;
    debug!(
        "Register at {:?}, spawner at {:?}, route of {} cells",
        route.register,
        route.spawner,
        route.path.len()
    );

    let mut blocked: Grid<bool> = Grid::new(rows, cols);
    for cell in queue_strip(route.register).chain(route.path.iter().copied()) {
        if let Some(flag) = blocked.get_mut(cell.0, cell.1) {
            *flag = true;
        }
    }

    let tables = std::iter::repeat(TABLE).take(table_count);
    for symbol in SINGLE_FIXTURES.into_iter().chain(tables) {
        place_one(grid, symbol, &blocked, rng)?;
    }
    Ok(route)
}

/// The queue cells east of a register.
pub fn queue_strip((row, col): Cell) -> impl Iterator<Item = Cell> {
    (1..=QUEUE_LENGTH).map(move |offset| (row, col + offset))
}

fn place_customer_route<R: Rng + ?Sized>(
    grid: &mut AsciiGrid,
    rng: &mut R,
) -> Result<CustomerRoute, PlacementError> {
    let (rows, cols) = grid.dims();
    let last_register_col = cols.saturating_sub(QUEUE_LENGTH + 1);

    let mut registers: Vec<Cell> = (1..rows.saturating_sub(1))
        .flat_map(|r| (1..last_register_col).map(move |c| (r, c)))
        .filter(|&(r, c)| (0..=QUEUE_LENGTH).all(|offset| grid.get(r, c + offset) == EMPTY))
        .collect();
    if registers.is_empty() {
        return Err(PlacementError::NoRegisterCandidates);
    }
    registers.shuffle(rng);

    for &register in registers.iter().take(MAX_REGISTER_TRIES) {
        let queue_front = (register.0, register.1 + 1);
        let reserved = |cell: Cell| cell.0 == register.0 && (register.1..=register.1 + QUEUE_LENGTH).contains(&cell.1);

        let mut spawners: Vec<Cell> = (1..rows - 1)
            .flat_map(|r| (1..cols - 1).map(move |c| (r, c)))
            .filter(|&(r, c)| grid.get(r, c) == EMPTY && !reserved((r, c)))
            .collect();
        spawners.shuffle(rng);

        for &spawner in spawners.iter().take(MAX_SPAWNER_TRIES) {
            let mut scratch = grid.clone();
            scratch.set(register.0, register.1, REGISTER);
            scratch.set(spawner.0, spawner.1, CUST_SPAWNER);

            if let Some(path) = scratch.bfs_path(spawner, queue_front, symbols::is_walkable_for_routing) {
                *grid = scratch;
                return Ok(CustomerRoute {
                    register,
                    spawner,
                    path,
                });
            }
        }
        trace!("Register at {register:?} has no reachable spawner");
    }
    Err(PlacementError::NoRoutablePair)
}

/// Puts `symbol` on a random free, unblocked floor cell.
fn place_one<R: Rng + ?Sized>(
    grid: &mut AsciiGrid,
    symbol: u8,
    blocked: &Grid<bool>,
    rng: &mut R,
) -> Result<Cell, PlacementError> {
    let candidates: Vec<Cell> = grid
        .cells()
        .filter(|&(r, c)| grid.get(r, c) == EMPTY && !blocked.get(r, c).copied().unwrap_or(false))
        .collect();
    let &(r, c) = candidates
        .choose(rng)
        .ok_or(PlacementError::FixtureUnplaceable(char::from(symbol)))?;
    grid.set(r, c, symbol);
    Ok((r, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{ORIGIN, REQUIRED_SYMBOLS, WALL};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_room(rows: usize, cols: usize) -> AsciiGrid {
        let mut grid = AsciiGrid::filled(rows, cols, EMPTY);
        for r in 0..rows {
            grid.set(r, 0, WALL);
            grid.set(r, cols - 1, WALL);
        }
        for c in 0..cols {
            grid.set(0, c, WALL);
            grid.set(rows - 1, c, WALL);
        }
        grid
    }

    #[test]
    fn test_places_every_required_fixture() {
        let mut grid = open_room(10, 12);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let route = place_required(&mut grid, 2, &mut rng).unwrap();

        for (symbol, label) in REQUIRED_SYMBOLS {
            assert!(grid.count(symbol) >= 1, "missing {label}");
        }
        assert_eq!(grid.count(TABLE), 2);
        assert_eq!(grid.count(ORIGIN), 1);
        assert_eq!(grid.get(route.register.0, route.register.1), REGISTER);
        assert_eq!(grid.get(route.spawner.0, route.spawner.1), CUST_SPAWNER);
    }

    #[test]
    fn test_queue_strip_and_route_stay_clear() {
        for seed in 0..10 {
            let mut grid = open_room(9, 14);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let route = place_required(&mut grid, 3, &mut rng).unwrap();

            for (r, c) in queue_strip(route.register) {
                assert_eq!(grid.get(r, c), EMPTY, "seed {seed}");
            }
            for &(r, c) in &route.path[1..] {
                assert!(symbols::is_walkable_for_routing(grid.get(r, c)), "seed {seed}");
            }
            assert_eq!(route.path.first(), Some(&route.spawner));
            assert_eq!(route.path.last(), Some(&(route.register.0, route.register.1 + 1)));
        }
    }

    #[test]
    fn test_stale_fixtures_are_cleared() {
        let mut grid = open_room(8, 12);
        grid.set(2, 2, SODA_MACHINE);
        grid.set(3, 3, SODA_MACHINE);
        grid.set(4, 4, ORIGIN);
        grid.set(5, 5, ORIGIN);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        place_required(&mut grid, 1, &mut rng).unwrap();
        assert_eq!(grid.count(SODA_MACHINE), 1);
        assert_eq!(grid.count(ORIGIN), 1);
    }

    #[test]
    fn test_narrow_room_has_no_register_spot() {
        let mut grid = open_room(8, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            place_required(&mut grid, 1, &mut rng),
            Err(PlacementError::NoRegisterCandidates)
        );
    }

    #[test]
    fn test_cut_off_register_has_no_route() {
        // The only register row is walled off from every other floor cell.
        let mut grid = AsciiGrid::parse(
            "#######\n\
             #.....#\n\
             #######\n\
             #.0...#\n\
             #######",
        );
        grid.set(1, 5, WALL);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            place_required(&mut grid, 1, &mut rng),
            Err(PlacementError::NoRoutablePair)
        );
    }

    #[test]
    fn test_runs_out_of_floor() {
        let mut grid = open_room(4, 8);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = place_required(&mut grid, 30, &mut rng);
        assert!(matches!(result, Err(PlacementError::FixtureUnplaceable(_))));
    }

    #[test]
    fn test_empty_grid() {
        let mut grid = AsciiGrid::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(place_required(&mut grid, 1, &mut rng), Err(PlacementError::EmptyGrid));
    }
}
