//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the turn simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Save games and replays require the simulation to be fully
//! deterministic. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Colonies and players live in `BTreeMap`s and are processed in id order.
//!
//! - **System randomness**: The core never draws random numbers.
//!
//! - **Floating-point math**: All quantities are integers.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual pipeline steps (food, construction, morale)
//! 2. **Property tests**: Random setups must still produce deterministic outputs
//! 3. **Integration tests**: Full scenarios are reproducible
//! 4. **Parallel tests**: Running N games on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use colony_core::game::Game;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns simulated.
    pub turns: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `turns` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one turn
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use colony_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 10, || 0u64, |n| *n += 2, |n| *n);
/// result.assert_deterministic();
/// assert_eq!(result.hashes, vec![20, 20, 20]);
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..turns {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Advance a game one turn, panicking on a fatal error.
///
/// # Panics
///
/// Panics if turn processing fails.
pub fn advance(game: &mut Game) {
    if let Err(e) = game.new_turn() {
        panic!("turn {} failed: {e}", game.turn());
    }
}

/// Run a game setup twice and check the final state hashes match.
#[must_use]
pub fn verify_game_determinism<F>(setup_fn: F, turns: u32) -> bool
where
    F: Fn() -> Game,
{
    verify_determinism(2, turns, &setup_fn, advance, Game::state_hash).is_deterministic
}

/// Run N games on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_games<F>(setup_fn: F, games: usize, turns: u32) -> Vec<u64>
where
    F: Fn() -> Game + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..games)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..turns {
                        advance(&mut game);
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Compare two runs turn by turn and find the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(turn)` otherwise.
pub fn find_first_divergence<F>(setup_fn: F, turns: u32) -> Option<u32>
where
    F: Fn() -> Game,
{
    let mut game1 = setup_fn();
    let mut game2 = setup_fn();

    if game1.state_hash() != game2.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        advance(&mut game1);
        advance(&mut game2);

        if game1.state_hash() != game2.state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Verify that a save/load round trip preserves the game exactly, and that
/// the restored game keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, turns: u32) -> bool
where
    F: Fn() -> Game,
{
    let mut game = setup_fn();

    for _ in 0..turns {
        advance(&mut game);
    }

    let Ok(bytes) = game.serialize() else {
        return false;
    };
    let Ok(mut restored) = Game::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    advance(&mut game);
    advance(&mut restored);
    restored.state_hash() == game.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for colony testing.
pub mod strategies {
    use colony_core::buildings::BuildingType;
    use colony_core::construction::ConstructionTarget;
    use colony_core::goods::GoodsType;
    use colony_core::units::UnitType;
    use proptest::prelude::*;

    /// Any unit type that can work in a colony.
    pub fn arb_colonist_type() -> impl Strategy<Value = UnitType> {
        proptest::sample::select(
            UnitType::ALL
                .iter()
                .copied()
                .filter(|unit_type| unit_type.is_colonist())
                .collect::<Vec<_>>(),
        )
    }

    /// Any storable goods type.
    pub fn arb_storable_goods() -> impl Strategy<Value = GoodsType> {
        proptest::sample::select(GoodsType::STORABLE.to_vec())
    }

    /// Any building type.
    pub fn arb_building_type() -> impl Strategy<Value = BuildingType> {
        proptest::sample::select(BuildingType::ALL.to_vec())
    }

    /// Any construction target, including nothing.
    pub fn arb_construction_target() -> impl Strategy<Value = ConstructionTarget> {
        prop_oneof![
            Just(ConstructionTarget::None),
            arb_building_type().prop_map(ConstructionTarget::Building),
            proptest::sample::select(UnitType::ALL.to_vec()).prop_map(ConstructionTarget::Unit),
        ]
    }

    /// Goods amounts, including some beyond warehouse capacity.
    pub fn arb_goods_amount() -> impl Strategy<Value = u32> {
        0u32..400u32
    }

    /// An initial stock: a list of goods deliveries.
    pub fn arb_stock(max_entries: usize) -> impl Strategy<Value = Vec<(GoodsType, u32)>> {
        proptest::collection::vec((arb_storable_goods(), arb_goods_amount()), 0..max_entries)
    }

    /// A colony population: colonist types in arrival order.
    pub fn arb_population(max_colonists: usize) -> impl Strategy<Value = Vec<UnitType>> {
        proptest::collection::vec(arb_colonist_type(), 0..max_colonists)
    }
}
