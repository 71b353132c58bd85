//! Food settlement, colony growth and horse breeding rules.
//!
//! Pure functions over integers; the turn pipeline applies the results.

/// Food eaten per colonist per turn.
pub const FOOD_PER_COLONIST: u32 = 2;

/// Food stock that produces a new colonist.
pub const FOOD_FOR_NEW_COLONIST: u32 = 200;

/// Famine is announced when it is at most this many turns away.
pub const FAMINE_WARNING_TURNS: u32 = 3;

/// Horses needed before any breeding happens.
pub const MIN_BREEDING_HORSES: u32 = 2;

/// Food eaten per turn by `occupants` colonists.
#[must_use]
pub const fn food_consumption(occupants: u32) -> u32 {
    FOOD_PER_COLONIST * occupants
}

/// Outcome of feeding the colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodOutcome {
    /// Not enough food: one colonist dies and the stock is emptied.
    Starved,
    /// Everybody ate.
    Fed {
        /// Food left after eating.
        remaining: u32,
        /// Turns until famine, when close enough to warn about.
        famine_in: Option<u32>,
    },
}

/// Feed the colony from `stock`, given this turn's food `production`.
#[must_use]
pub fn settle_food(stock: u32, consumption: u32, production: u32) -> FoodOutcome {
    if consumption > stock {
        return FoodOutcome::Starved;
    }
    let remaining = stock - consumption;
    let famine_in = (consumption > production)
        .then(|| remaining / (consumption - production))
        .filter(|&turns| turns <= FAMINE_WARNING_TURNS);
    FoodOutcome::Fed {
        remaining,
        famine_in,
    }
}

/// Horses the herd could add this turn with unlimited food and space.
#[must_use]
pub fn potential_horse_breeding(horses: u32, has_stables: bool) -> u32 {
    if horses < MIN_BREEDING_HORSES {
        return 0;
    }
    let mut amount = horses / 10;
    if !has_stables {
        amount /= 2;
    }
    amount.max(1)
}

/// Horses actually bred this turn.
///
/// Breeding eats half of the food surplus at most and never overflows the
/// warehouse.
#[must_use]
pub fn horse_breeding(horses: u32, has_stables: bool, food_surplus: i32, capacity: u32) -> u32 {
    let free_space = capacity.saturating_sub(horses);
    let potential = potential_horse_breeding(horses, has_stables).min(free_space);
    (food_surplus / 2).min(potential as i32).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_famine_far_away_is_quiet() {
        assert_eq!(
            settle_food(150, 6, 4),
            FoodOutcome::Fed {
                remaining: 144,
                famine_in: None
            }
        );
    }

    #[test]
    fn test_famine_warning() {
        assert_eq!(
            settle_food(12, 6, 3),
            FoodOutcome::Fed {
                remaining: 6,
                famine_in: Some(2)
            }
        );
        assert_eq!(
            settle_food(6, 6, 0),
            FoodOutcome::Fed {
                remaining: 0,
                famine_in: Some(0)
            }
        );
    }

    #[test]
    fn test_starvation() {
        assert_eq!(settle_food(5, 6, 10), FoodOutcome::Starved);
    }

    #[test]
    fn test_surplus_never_warns() {
        assert_eq!(
            settle_food(10, 6, 8),
            FoodOutcome::Fed {
                remaining: 4,
                famine_in: None
            }
        );
    }

    #[test]
    fn test_horse_potential() {
        assert_eq!(potential_horse_breeding(1, true), 0);
        assert_eq!(potential_horse_breeding(2, false), 1);
        assert_eq!(potential_horse_breeding(50, false), 2);
        assert_eq!(potential_horse_breeding(50, true), 5);
    }

    #[test]
    fn test_horse_breeding_limits() {
        // Limited by half the surplus
        assert_eq!(horse_breeding(50, true, 4, 100), 2);
        // Limited by the herd
        assert_eq!(horse_breeding(50, true, 40, 100), 5);
        // Limited by warehouse space
        assert_eq!(horse_breeding(98, true, 40, 100), 2);
        assert_eq!(horse_breeding(120, true, 40, 100), 0);
        // Food deficit breeds nothing
        assert_eq!(horse_breeding(50, true, -6, 100), 0);
    }
}
