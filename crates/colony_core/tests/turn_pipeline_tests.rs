//! End-to-end turn tests through the [`Game`] entry point.
//!
//! These drive whole turns on fixture games and check the observable
//! results: stock, units, construction progress and the message stream.

use colony_core::morale::{MoraleEvent, MoraleTracker};
use colony_core::prelude::*;
use colony_test_utils::determinism::advance;
use colony_test_utils::fixtures::{add_colonists, game_with_coastal_colony, game_with_colony, TEST_PLAYER};

fn count(report: &TurnReport, key: MessageKey) -> usize {
    report.messages.iter().filter(|m| m.key == key).count()
}

// =============================================================================
// Morale
// =============================================================================

#[test]
fn test_bells_turn_into_loyalty() {
    let (mut game, id) = game_with_colony(3);
    game.colony_mut(id).unwrap().add_bells(250);

    advance(&mut game);

    let colony = game.colony(id).unwrap();
    assert_eq!(colony.sons_of_liberty(), 83);
    assert_eq!(colony.morale().members(3), 2);
    assert_eq!(colony.tories(), 1);
    assert_eq!(colony.production_bonus(), 1);
}

#[test]
fn test_reaching_half_loyalty_is_announced_once() {
    let mut tracker = MoraleTracker::new();
    let mut sol50 = 0;

    for bells in [48, 3, 1, 1] {
        tracker.add_bells(bells, 1);
        tracker.update_sol(1);
        sol50 += tracker
            .recompute_bonus(2, false)
            .iter()
            .filter(|event| **event == MoraleEvent::Sol50)
            .count();
        tracker.remember();
    }

    assert_eq!(tracker.sons_of_liberty(), 53);
    assert_eq!(sol50, 1);
}

// =============================================================================
// Food and population
// =============================================================================

#[test]
fn test_food_surplus_spawns_colonist_on_tile() {
    let (mut game, id) = game_with_colony(1);
    game.colony_mut(id).unwrap().add_goods(GoodsType::Food, 199);

    let report = game.new_turn().unwrap();

    let colony = game.colony(id).unwrap();
    assert_eq!(count(&report, MessageKey::NewColonist), 1);
    assert_eq!(colony.tile_units().len(), 1);
    assert_eq!(colony.tile_units()[0].unit_type, UnitType::FreeColonist);
    assert!(colony.goods_count(GoodsType::Food) < 200);
    // Still one worker: the newcomer waits on the tile
    assert_eq!(colony.unit_count(), 1);
}

#[test]
fn test_empty_colony_is_removed() {
    let (mut game, id) = game_with_colony(0);

    let report = game.new_turn().unwrap();

    assert_eq!(report.abandoned, vec![id]);
    assert_eq!(report.outcomes.get(&id), Some(&TurnOutcome::Abandoned));
    assert!(game.colony(id).is_none());
}

#[test]
fn test_fed_colony_keeps_its_colonists() {
    let (mut game, id) = game_with_colony(3);
    for _ in 0..10 {
        let report = game.new_turn().unwrap();
        assert_eq!(count(&report, MessageKey::ColonistStarved), 0);
    }
    assert_eq!(game.colony(id).unwrap().unit_count(), 3);
}

#[test]
fn test_bred_horses_eat_food() {
    let (mut game, id) = game_with_colony(1);
    let colony = game.colony_mut(id).unwrap();
    colony.add_goods(GoodsType::Horses, 50);
    colony.add_goods(GoodsType::Food, 20);
    let production = colony.food_production();
    let consumption = colony.food_consumption();
    let bred = colony.horse_production();
    assert!(bred > 0);

    let report = game.new_turn().unwrap();

    let colony = game.colony(id).unwrap();
    assert_eq!(count(&report, MessageKey::NewColonist), 0);
    assert_eq!(colony.goods_count(GoodsType::Horses), 50 + bred);
    assert_eq!(
        colony.goods_count(GoodsType::Food),
        20 + production - consumption - bred
    );
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_missing_tools_hold_hammers_until_delivered() {
    let (mut game, id) = game_with_colony(3);
    let mut sink = Vec::new();
    let target = ConstructionTarget::Building(BuildingType::Blacksmith);
    assert!(game.set_currently_building(id, target, &mut sink).unwrap());

    let spec = game.spec().clone();
    game.colony_mut(id).unwrap().add_hammers(70, &spec, &mut sink);

    for _ in 0..3 {
        let report = game.new_turn().unwrap();
        assert_eq!(count(&report, MessageKey::ItemNeedTools), 1);
        assert_eq!(game.colony(id).unwrap().hammers(), 64);
    }

    game.colony_mut(id).unwrap().add_goods(GoodsType::Tools, 20);
    let report = game.new_turn().unwrap();

    let colony = game.colony(id).unwrap();
    assert_eq!(count(&report, MessageKey::BuildingReady), 1);
    assert_eq!(colony.building(BuildingType::Blacksmith).unwrap().level(), BuildingLevel::Shop);
    assert_eq!(colony.goods_count(GoodsType::Tools), 0);
    assert_eq!(colony.hammers(), 0);
}

#[test]
fn test_paying_for_construction_completes_next_turn() {
    let (mut game, id) = game_with_coastal_colony(2);
    game.player_mut(TEST_PLAYER).unwrap().gold = 5000;
    let price = game.price_for_building(id).unwrap();
    // 52 hammers for the docks at 20 gold each
    assert_eq!(price, 1040);
    let gold_before = game.player(TEST_PLAYER).unwrap().gold;

    game.pay_for_building(id).unwrap();
    assert_eq!(game.player(TEST_PLAYER).unwrap().gold, gold_before - price);

    let report = game.new_turn().unwrap();
    assert_eq!(count(&report, MessageKey::BuildingReady), 1);
    assert!(game.colony(id).unwrap().has_building(BuildingType::Docks));
}

#[test]
fn test_paying_without_gold_fails() {
    let (mut game, id) = game_with_coastal_colony(2);
    game.player_mut(TEST_PLAYER).unwrap().gold = 0;

    let err = game.pay_for_building(id).unwrap_err();
    assert!(matches!(err, ColonyError::InsufficientGold { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_wagon_train_built_from_paid_hammers() {
    let (mut game, id) = game_with_colony(3);
    let mut sink = Vec::new();
    let target = ConstructionTarget::Unit(UnitType::WagonTrain);
    assert!(game.set_currently_building(id, target, &mut sink).unwrap());
    game.pay_for_building(id).unwrap();

    let report = game.new_turn().unwrap();

    assert_eq!(count(&report, MessageKey::UnitReady), 1);
    let colony = game.colony(id).unwrap();
    assert!(colony
        .tile_units()
        .iter()
        .any(|unit| unit.unit_type == UnitType::WagonTrain));
}

// =============================================================================
// Warehouse
// =============================================================================

#[test]
fn test_overflow_is_wasted_and_reported() {
    let (mut game, id) = game_with_colony(2);
    game.colony_mut(id).unwrap().add_goods(GoodsType::Ore, 150);

    let report = game.new_turn().unwrap();

    let colony = game.colony(id).unwrap();
    assert_eq!(colony.goods_count(GoodsType::Ore), colony.warehouse_capacity());
    let waste: Vec<_> = report
        .messages
        .iter()
        .filter(|m| m.key == MessageKey::WarehouseWaste)
        .collect();
    assert_eq!(waste.len(), 1);
    assert_eq!(waste[0].param("amount"), Some("50"));
}

// =============================================================================
// Multiple colonies
// =============================================================================

#[test]
fn test_colonies_processed_in_id_order() {
    let (mut game, first) = game_with_colony(2);
    let tile = game.map().tile_at(1, 4).unwrap();
    let second = game.found_colony(TEST_PLAYER, "Second", tile).unwrap();
    add_colonists(&mut game, second, UnitType::FreeColonist, 2);
    game.colony_mut(first).unwrap().add_goods(GoodsType::Ore, 120);
    game.colony_mut(second).unwrap().add_goods(GoodsType::Ore, 120);

    let report = game.new_turn().unwrap();

    let order: Vec<ColonyId> = report
        .messages
        .iter()
        .filter(|m| m.key == MessageKey::WarehouseWaste)
        .map(|m| m.colony)
        .collect();
    assert_eq!(order, vec![first, second]);
    assert!(report.abandoned.is_empty());
}

#[test]
fn test_empty_colony_dissolves_beside_working_one() {
    let (mut game, first) = game_with_colony(2);
    let tile = game.map().tile_at(1, 4).unwrap();
    let second = game.found_colony(TEST_PLAYER, "Second", tile).unwrap();

    let report = game.new_turn().unwrap();

    assert_eq!(report.abandoned, vec![second]);
    assert!(matches!(report.outcomes.get(&first), Some(TurnOutcome::Processed(_))));
    assert_eq!(game.colonies().len(), 1);
}
