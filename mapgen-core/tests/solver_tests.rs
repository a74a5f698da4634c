use mapgen_core::runner::{run, WaveCollapse};
use mapgen_core::symbols::UNKNOWN;
use mapgen_core::{WfcConfig, WfcError};
use mapgen_rules::{loader::load_from_file, Direction, Pattern, PatternId, PatternLibrary};
use proptest::prelude::*;
use std::path::PathBuf;

fn default_library() -> PatternLibrary {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../resources/map_generator_input.json");
    load_from_file(&path).expect("default pattern library should load")
}

fn uses(assignments: &mapgen_core::Grid<Option<PatternId>>, id: usize) -> usize {
    assignments.iter().filter(|a| **a == Some(PatternId(id))).count()
}

#[test]
fn test_default_library_fills_grid() {
    let library = default_library();
    let config = WfcConfig::builder().seed(99).build();
    let outcome = run(&library, &config).unwrap();

    let block = library.block_size();
    assert_eq!(outcome.lines.dims(), (library.rows * block, library.cols * block));
    assert_eq!(outcome.lines.count(UNKNOWN), 0);
}

#[test]
fn test_edge_only_patterns_stay_on_border() {
    let library = default_library();
    for seed in 0..8 {
        let config = WfcConfig::builder().rows(6).cols(9).seed(seed).build();
        let outcome = run(&library, &config).unwrap();
        for (index, assignment) in outcome.assignments.iter().enumerate() {
            let Some(id) = assignment else { continue };
            let (row, col) = outcome.assignments.coords(index);
            if library.get(*id).is_some_and(|p| p.edge_only) {
                assert!(outcome.assignments.is_border(row, col), "seed {seed} at ({row}, {col})");
            }
        }
    }
}

#[test]
fn test_required_origin_room_is_placed_once() {
    let library = default_library();
    let origin = library
        .patterns()
        .iter()
        .position(|p| p.required)
        .expect("default library has a required pattern");
    for seed in 0..8 {
        let config = WfcConfig::builder().seed(seed).build();
        let outcome = run(&library, &config).unwrap();
        assert_eq!(uses(&outcome.assignments, origin), 1, "seed {seed}");
        assert_eq!(outcome.stats.missing_required, 0);
    }
}

#[test]
fn test_budgets_do_not_leak_between_runs() {
    let library = default_library();
    let config = WfcConfig::builder().seed(5).build();
    let mut first = WaveCollapse::new(&library, &config).unwrap();
    first.run().unwrap();
    let second = WaveCollapse::new(&library, &config).unwrap();
    for pattern in library.patterns() {
        assert_eq!(second.remaining_budget(pattern.id), pattern.max_count);
    }
}

#[test]
fn test_rectangular_grid() {
    let library = PatternLibrary::new(
        2,
        2,
        vec![
            Pattern::new(0, &["."], &Direction::ALL),
            Pattern::new(1, &["#"], &[]),
        ],
    )
    .unwrap();
    let config = WfcConfig::builder().rows(3).cols(11).seed(1).build();
    let outcome = run(&library, &config).unwrap();
    assert_eq!(outcome.lines.dims(), (3, 11));
}

#[test]
fn test_iteration_cap_is_an_error() {
    let library = default_library();
    let config = WfcConfig::builder().seed(1).max_iterations(1).build();
    assert!(matches!(run(&library, &config), Err(WfcError::MaxIterationsReached(1))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_budgets_are_conserved(seed in any::<u64>(), rows in 2usize..9, cols in 2usize..9) {
        let library = default_library();
        let config = WfcConfig::builder().rows(rows).cols(cols).seed(seed).build();
        let outcome = run(&library, &config).unwrap();
        for pattern in library.patterns() {
            if let Some(max) = pattern.max_count {
                prop_assert!(uses(&outcome.assignments, pattern.id.0) <= max as usize);
            }
        }
    }

    #[test]
    fn prop_solver_is_deterministic(seed in any::<u64>()) {
        let library = default_library();
        let config = WfcConfig::builder().rows(5).cols(5).seed(seed).build();
        let a = run(&library, &config).unwrap();
        let b = run(&library, &config).unwrap();
        prop_assert_eq!(a.lines, b.lines);
        prop_assert_eq!(a.stats, b.stats);
    }
}
