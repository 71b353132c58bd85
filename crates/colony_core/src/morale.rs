//! Sons of Liberty: bells, loyalty percentage and the production bonus.
//!
//! Bells accumulate from the town hall. Every [`BELLS_PER_REBEL`] bells turn
//! one colonist into a rebel; the rest are tories. The resulting percentage
//! drives a production bonus between -2 and +2.

use serde::{Deserialize, Serialize};

use crate::data::BELLS_PER_REBEL;

/// Loyalty transition worth telling the player about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoraleEvent {
    /// Loyalty rose into a new decile.
    SolIncrease {
        /// Previous percentage.
        old: u32,
        /// New percentage.
        new: u32,
    },
    /// Loyalty fell into a new decile.
    SolDecrease {
        /// Previous percentage.
        old: u32,
        /// New percentage.
        new: u32,
    },
    /// Loyalty reached 100%.
    Sol100,
    /// Loyalty reached 50%.
    Sol50,
    /// Tories crossed the very bad government threshold.
    VeryBadGovernment,
    /// Tories crossed the bad government threshold.
    BadGovernment,
    /// Government went from very bad to bad.
    GovernmentImprovedStillBad,
    /// Government is no longer bad.
    GovernmentImproved,
}

/// Bells, loyalty and the production bonus of one colony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoraleTracker {
    bells: u32,
    sons_of_liberty: u32,
    old_sons_of_liberty: u32,
    tories: u32,
    old_tories: u32,
    production_bonus: i32,
}

impl MoraleTracker {
    /// Create a tracker with no bells.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated bells.
    #[must_use]
    pub const fn bells(&self) -> u32 {
        self.bells
    }

    /// Loyalty percentage.
    #[must_use]
    pub const fn sons_of_liberty(&self) -> u32 {
        self.sons_of_liberty
    }

    /// Loyalty percentage at the end of last turn.
    #[must_use]
    pub const fn old_sons_of_liberty(&self) -> u32 {
        self.old_sons_of_liberty
    }

    /// Number of tories.
    #[must_use]
    pub const fn tories(&self) -> u32 {
        self.tories
    }

    /// Number of tories at the end of last turn.
    #[must_use]
    pub const fn old_tories(&self) -> u32 {
        self.old_tories
    }

    /// Tory percentage.
    #[must_use]
    pub const fn tory_percentage(&self) -> u32 {
        100 - self.sons_of_liberty
    }

    /// Signed production bonus.
    #[must_use]
    pub const fn production_bonus(&self) -> i32 {
        self.production_bonus
    }

    /// Rebels among `occupants` colonists.
    #[must_use]
    pub fn members(&self, occupants: u32) -> u32 {
        (self.bells / BELLS_PER_REBEL).min(occupants)
    }

    /// Add (or with a negative amount, remove) bells.
    ///
    /// Bells only accumulate while the rebels do not exceed the colonists by
    /// more than one. The total never drops below zero.
    pub fn add_bells(&mut self, amount: i32, occupants: u32) {
        if self.members(occupants) <= occupants + 1 {
            self.bells = (i64::from(self.bells) + i64::from(amount)).max(0) as u32;
        }
    }

    /// Scale the bells by `percent`.
    pub fn add_sol(&mut self, percent: i32) {
        let delta = i64::from(self.bells) * i64::from(percent) / 100;
        self.bells = (i64::from(self.bells) + delta).max(0) as u32;
    }

    /// Turn-end decay: everyone beyond the first two colonists costs a bell.
    pub fn decay(&mut self, occupants: u32) {
        self.bells = self.bells.saturating_sub(occupants.saturating_sub(2));
    }

    /// Recompute loyalty and tories. Does nothing for an empty colony.
    pub fn update_sol(&mut self, occupants: u32) {
        if occupants == 0 {
            return;
        }
        let membership = u64::from(self.bells) * 100 / (u64::from(BELLS_PER_REBEL) * u64::from(occupants));
        self.sons_of_liberty = membership.min(100) as u32;
        self.tories = occupants - self.members(occupants);
    }

    /// Recompute the production bonus and report threshold crossings
    /// relative to last turn.
    ///
    /// Computer players never suffer a negative bonus.
    pub fn recompute_bonus(&mut self, difficulty: i32, is_ai: bool) -> Vec<MoraleEvent> {
        let very_bad_government = 10 - difficulty;
        let bad_government = 6 - difficulty;
        let sol = self.sons_of_liberty;
        let old_sol = self.old_sons_of_liberty;
        let tories = self.tories as i32;
        let old_tories = self.old_tories as i32;
        let mut events = Vec::new();

        if sol / 10 != old_sol / 10 {
            if sol > old_sol {
                events.push(MoraleEvent::SolIncrease { old: old_sol, new: sol });
            } else {
                events.push(MoraleEvent::SolDecrease { old: old_sol, new: sol });
            }
        }

        let mut bonus = 0;
        if sol == 100 {
            bonus = 2;
            if old_sol < 100 {
                events.push(MoraleEvent::Sol100);
            }
        } else {
            if sol >= 50 {
                bonus += 1;
                if old_sol < 50 {
                    events.push(MoraleEvent::Sol50);
                }
            }
            if tories > very_bad_government {
                bonus -= 2;
                if old_tories <= very_bad_government {
                    events.push(MoraleEvent::VeryBadGovernment);
                }
            } else if tories > bad_government {
                bonus -= 1;
                if old_tories <= bad_government {
                    events.push(MoraleEvent::BadGovernment);
                } else if old_tories > very_bad_government {
                    events.push(MoraleEvent::GovernmentImprovedStillBad);
                }
            } else if old_tories > bad_government {
                events.push(MoraleEvent::GovernmentImproved);
            }
        }

        self.production_bonus = if is_ai { bonus.max(0) } else { bonus };
        events
    }

    /// Remember the current loyalty and tories for next turn's comparison.
    pub fn remember(&mut self) {
        self.old_sons_of_liberty = self.sons_of_liberty;
        self.old_tories = self.tories;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(bells: u32, occupants: u32) -> MoraleTracker {
        let mut morale = MoraleTracker::new();
        morale.add_bells(bells as i32, occupants);
        morale.update_sol(occupants);
        morale
    }

    #[test]
    fn test_loyalty_formula() {
        let morale = tracker(250, 3);
        assert_eq!(morale.sons_of_liberty(), 83);
        assert_eq!(morale.members(3), 2);
        assert_eq!(morale.tories(), 1);
        assert_eq!(morale.tory_percentage(), 17);
    }

    #[test]
    fn test_loyalty_clamped_at_100() {
        let morale = tracker(900, 2);
        assert_eq!(morale.sons_of_liberty(), 100);
        assert_eq!(morale.tories(), 0);
    }

    #[test]
    fn test_empty_colony_keeps_values() {
        let mut morale = tracker(250, 3);
        morale.update_sol(0);
        assert_eq!(morale.sons_of_liberty(), 83);
    }

    #[test]
    fn test_bells_floor_and_decay() {
        let mut morale = MoraleTracker::new();
        morale.add_bells(5, 1);
        morale.add_bells(-20, 1);
        assert_eq!(morale.bells(), 0);

        morale.add_bells(10, 5);
        morale.decay(5);
        assert_eq!(morale.bells(), 7);
        morale.decay(2);
        assert_eq!(morale.bells(), 7);
        morale.decay(30);
        assert_eq!(morale.bells(), 0);
    }

    #[test]
    fn test_add_sol_scales_bells() {
        let mut morale = MoraleTracker::new();
        morale.add_bells(200, 4);
        morale.add_sol(50);
        assert_eq!(morale.bells(), 300);
    }

    #[test]
    fn test_reaching_fifty_percent() {
        // 48% last turn
        let mut morale = tracker(48, 1);
        morale.recompute_bonus(2, false);
        morale.remember();

        morale.add_bells(3, 1);
        morale.update_sol(1);
        assert_eq!(morale.sons_of_liberty(), 51);
        let events = morale.recompute_bonus(2, false);
        assert_eq!(
            events,
            vec![
                MoraleEvent::SolIncrease { old: 48, new: 51 },
                MoraleEvent::Sol50
            ]
        );
        assert_eq!(morale.production_bonus(), 1);

        morale.remember();
        morale.add_bells(2, 1);
        morale.update_sol(1);
        assert!(morale.recompute_bonus(2, false).is_empty());
    }

    #[test]
    fn test_hundred_percent_overrides() {
        let mut morale = tracker(400, 4);
        let events = morale.recompute_bonus(2, false);
        assert!(events.contains(&MoraleEvent::Sol100));
        assert!(!events.contains(&MoraleEvent::Sol50));
        assert_eq!(morale.production_bonus(), 2);
    }

    #[test]
    fn test_government_penalties_are_exclusive() {
        // Difficulty 2: bad above 4 tories, very bad above 8
        let mut morale = tracker(0, 9);
        assert_eq!(morale.recompute_bonus(2, false), vec![MoraleEvent::VeryBadGovernment]);
        assert_eq!(morale.production_bonus(), -2);
        morale.remember();

        morale.update_sol(6);
        assert_eq!(
            morale.recompute_bonus(2, false),
            vec![MoraleEvent::GovernmentImprovedStillBad]
        );
        assert_eq!(morale.production_bonus(), -1);
        morale.remember();

        morale.update_sol(4);
        assert_eq!(morale.recompute_bonus(2, false), vec![MoraleEvent::GovernmentImproved]);
        assert_eq!(morale.production_bonus(), 0);
        morale.remember();

        morale.update_sol(5);
        assert_eq!(morale.recompute_bonus(2, false), vec![MoraleEvent::BadGovernment]);
        assert_eq!(morale.production_bonus(), -1);
    }

    #[test]
    fn test_ai_never_penalised() {
        let mut morale = tracker(0, 12);
        morale.recompute_bonus(2, true);
        assert_eq!(morale.production_bonus(), 0);
    }
}
