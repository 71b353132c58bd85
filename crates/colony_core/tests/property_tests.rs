//! Property tests for the turn pipeline invariants.

use colony_core::construction::{CompletionCheck, ConstructionQueue, Requirement};
use colony_core::morale::MoraleTracker;
use colony_core::population::{food_consumption, horse_breeding};
use colony_core::prelude::*;
use colony_test_utils::determinism::strategies::{arb_population, arb_stock};
use colony_test_utils::fixtures::{add_colonists, game_with_colony};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_loyalty_stays_in_bounds(bells in 0i32..5000, occupants in 1u32..30) {
        let mut tracker = MoraleTracker::new();
        tracker.add_bells(bells, occupants);
        tracker.update_sol(occupants);

        prop_assert!(tracker.sons_of_liberty() <= 100);
        prop_assert_eq!(tracker.members(occupants) + tracker.tories(), occupants);
        let _ = tracker.recompute_bonus(2, false);
        prop_assert!((-2..=2).contains(&tracker.production_bonus()));
    }

    #[test]
    fn prop_ai_bonus_never_negative(tories in 0u32..20, difficulty in 0i32..5) {
        let mut tracker = MoraleTracker::new();
        tracker.update_sol(tories.max(1));
        let _ = tracker.recompute_bonus(difficulty, true);
        prop_assert!(tracker.production_bonus() >= 0);
    }

    #[test]
    fn prop_horse_breeding_fits_warehouse(
        horses in 0u32..200,
        stables: bool,
        surplus in -50i32..50,
        capacity in 100u32..300,
    ) {
        let bred = horse_breeding(horses, stables, surplus, capacity);
        prop_assert!(bred <= capacity.saturating_sub(horses));
        prop_assert!(i64::from(bred) <= i64::from(surplus.max(0)) / 2);
    }

    #[test]
    fn prop_completion_runs_once_per_turn(
        hammers in 0u32..200,
        tools in 0u32..50,
        turn in 1u32..1000,
    ) {
        let mut queue = ConstructionQueue::new();
        queue.set_target(ConstructionTarget::Building(BuildingType::Docks));
        queue.add_hammers(hammers);
        let requirement = Some(Requirement { hammers: 52, tools: 20 });

        let first = queue.check_complete(turn, requirement, tools);
        prop_assert_ne!(first, CompletionCheck::AlreadyChecked);
        prop_assert_eq!(
            queue.check_complete(turn, requirement, tools),
            CompletionCheck::AlreadyChecked
        );
        prop_assert!(queue.hammers() <= hammers);
    }

    #[test]
    fn prop_stock_within_capacity_after_turn(
        population in arb_population(8),
        stock in arb_stock(8),
    ) {
        let (mut game, id) = game_with_colony(1);
        for &unit_type in &population {
            add_colonists(&mut game, id, unit_type, 1);
        }
        for &(goods, amount) in &stock {
            game.colony_mut(id).unwrap().add_goods(goods, amount);
        }

        game.new_turn().unwrap();

        let colony = game.colony(id).unwrap();
        let capacity = colony.warehouse_capacity();
        for goods in GoodsType::STORABLE {
            if goods != GoodsType::Food {
                prop_assert!(
                    colony.goods_count(goods) <= capacity,
                    "{goods:?}: {} > {capacity}",
                    colony.goods_count(goods)
                );
            }
        }
    }

    #[test]
    fn prop_colonists_never_vanish_while_fed(population in arb_population(6), turns in 1u32..15) {
        let (mut game, id) = game_with_colony(1);
        for &unit_type in &population {
            add_colonists(&mut game, id, unit_type, 1);
        }
        let before = game.colony(id).unwrap().occupant_count();
        game.colony_mut(id)
            .unwrap()
            .add_goods(GoodsType::Food, food_consumption(before) * turns);

        for _ in 0..turns {
            game.new_turn().unwrap();
        }

        prop_assert_eq!(game.colony(id).unwrap().occupant_count(), before);
    }
}
