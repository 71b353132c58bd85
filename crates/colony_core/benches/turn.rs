//! Turn processing benchmarks.
//!
//! Run with: `cargo bench -p colony_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use colony_core::prelude::*;
use colony_test_utils::fixtures::{game_with_colony, game_with_two_colonies};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// One turn of a single busy colony.
pub fn single_colony_turn(c: &mut Criterion) {
    let (mut base, id) = game_with_colony(8);
    if let Some(colony) = base.colony_mut(id) {
        colony.add_goods(GoodsType::Lumber, 60);
        colony.add_goods(GoodsType::Ore, 40);
        colony.add_goods(GoodsType::Horses, 20);
    }

    c.bench_function("new_turn/single_colony", |b| {
        b.iter_batched(
            || base.clone(),
            |mut game| black_box(game.new_turn()),
            BatchSize::SmallInput,
        )
    });
}

/// Fifty turns of two colonies, the typical headless run.
pub fn two_colonies_fifty_turns(c: &mut Criterion) {
    let base = game_with_two_colonies(5);

    c.bench_function("new_turn/two_colonies_x50", |b| {
        b.iter_batched(
            || base.clone(),
            |mut game| {
                for _ in 0..50 {
                    let _ = black_box(game.new_turn());
                }
                game.state_hash()
            },
            BatchSize::SmallInput,
        )
    });
}

/// Save and restore of a mid-game state.
pub fn save_restore(c: &mut Criterion) {
    let mut game = game_with_two_colonies(5);
    for _ in 0..20 {
        let _ = game.new_turn();
    }

    c.bench_function("persistence/serialize", |b| b.iter(|| black_box(game.serialize())));

    let bytes = game.serialize().unwrap_or_default();
    c.bench_function("persistence/deserialize", |b| {
        b.iter(|| black_box(Game::deserialize(&bytes)))
    });
}

criterion_group!(benches, single_colony_turn, two_colonies_fifty_turns, save_restore);
criterion_main!(benches);
