//! Save and restore tests.

use colony_core::prelude::*;
use colony_test_utils::determinism::{advance, run_parallel_games, verify_serialization_determinism};
use colony_test_utils::fixtures::{game_with_colony, game_with_two_colonies};

#[test]
fn test_save_restores_exact_state() {
    let mut game = game_with_two_colonies(4);
    for _ in 0..12 {
        advance(&mut game);
    }

    let bytes = game.serialize().unwrap();
    let restored = Game::deserialize(&bytes).unwrap();

    assert_eq!(restored, game);
    assert_eq!(restored.state_hash(), game.state_hash());
    assert_eq!(restored.turn(), 12);
}

#[test]
fn test_restored_game_continues_identically() {
    assert!(verify_serialization_determinism(|| game_with_two_colonies(3), 15));
}

#[test]
fn test_truncated_save_is_rejected() {
    let (game, _) = game_with_colony(2);
    let bytes = game.serialize().unwrap();

    let err = Game::deserialize(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, ColonyError::InvalidState(_)));
}

#[test]
fn test_dangling_tile_reference_is_rejected() {
    let (mut game, _) = game_with_colony(2);
    // Shrink the map under the colony
    *game.map_mut() = GridMap::new(2, 2, TerrainType::Plains);
    let bytes = game.serialize().unwrap();

    let err = Game::deserialize(&bytes).unwrap_err();
    assert!(matches!(err, ColonyError::UnresolvedReference(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_construction_target_persists_as_code() {
    let target = ConstructionTarget::Unit(UnitType::WagonTrain);
    let encoded = bincode::serialize(&target).unwrap();
    let code: i32 = bincode::deserialize(&encoded).unwrap();
    assert_eq!(code, target.code());
    assert!(code >= 1000);

    let none: i32 = bincode::deserialize(&bincode::serialize(&ConstructionTarget::None).unwrap()).unwrap();
    assert_eq!(none, -1);
}

#[test]
fn test_parallel_games_agree() {
    let hashes = run_parallel_games(|| game_with_two_colonies(5), 4, 25);
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
}
