//! Construction queue: the single building upgrade or unit a colony is
//! working on.
//!
//! The queue only tracks the target, the accumulated hammers and the turn
//! the completion gate last ran. Cost tables live in the
//! [`Specification`](crate::data::Specification); the colony looks up the
//! [`Requirement`] and passes it in, then applies the outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buildings::BuildingType;
use crate::error::ColonyError;
use crate::turn::TurnNumber;
use crate::units::UnitType;

/// Offset separating unit codes from building codes in saves.
pub const BUILDING_UNIT_ADDITION: i32 = 1000;

/// Code of an empty construction target in saves.
pub const BUILDING_NOTHING: i32 = -1;

/// What a colony is building.
///
/// Persists as an integer: `-1` for nothing, the building index, or
/// `1000 +` the unit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ConstructionTarget {
    /// Nothing.
    #[default]
    None,
    /// The next level of a building.
    Building(BuildingType),
    /// A unit.
    Unit(UnitType),
}

impl ConstructionTarget {
    /// Integer code used in saves.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => BUILDING_NOTHING,
            Self::Building(building_type) => building_type.index() as i32,
            Self::Unit(unit_type) => BUILDING_UNIT_ADDITION + unit_type.index() as i32,
        }
    }

    /// Decode a save code.
    ///
    /// # Errors
    ///
    /// [`ColonyError::InvalidTargetCode`] for codes that name nothing.
    pub fn from_code(code: i32) -> Result<Self, ColonyError> {
        if code == BUILDING_NOTHING {
            return Ok(Self::None);
        }
        let decoded = if code >= BUILDING_UNIT_ADDITION {
            UnitType::from_index((code - BUILDING_UNIT_ADDITION) as usize).map(Self::Unit)
        } else if code >= 0 {
            BuildingType::from_index(code as usize).map(Self::Building)
        } else {
            None
        };
        decoded.ok_or(ColonyError::InvalidTargetCode(code))
    }

    /// Whether a target is set.
    #[must_use]
    pub const fn is_some(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl From<ConstructionTarget> for i32 {
    fn from(target: ConstructionTarget) -> Self {
        target.code()
    }
}

impl TryFrom<i32> for ConstructionTarget {
    type Error = ColonyError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl fmt::Display for ConstructionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("nothing"),
            Self::Building(building_type) => write!(f, "{building_type:?}"),
            Self::Unit(unit_type) => f.write_str(unit_type.name()),
        }
    }
}

/// Hammers and tools needed to finish the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    /// Hammers required.
    pub hammers: u32,
    /// Tools consumed on completion.
    pub tools: u32,
}

/// Current state of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionState {
    /// No target.
    Idle,
    /// Upgrading a building.
    Building {
        /// Building being upgraded.
        building_type: BuildingType,
        /// Hammers accumulated.
        progress: u32,
    },
    /// Building a unit.
    BuildingUnit {
        /// Unit being built.
        unit_type: UnitType,
        /// Hammers accumulated.
        progress: u32,
    },
}

/// Result of the once-per-turn completion gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCheck {
    /// The gate already ran this turn.
    AlreadyChecked,
    /// Nothing to complete.
    Idle,
    /// Not enough hammers yet.
    Accumulating {
        /// Hammers accumulated.
        hammers: u32,
        /// Hammers required.
        required: u32,
    },
    /// Enough hammers, not enough tools. Hammers are held at the requirement.
    MissingTools {
        /// Tools required.
        required: u32,
        /// Tools in stock.
        available: u32,
    },
    /// Both gates passed; the caller must consume the tools and call
    /// [`ConstructionQueue::finish`].
    Ready {
        /// Target to complete.
        target: ConstructionTarget,
        /// Tools to consume.
        tools: u32,
    },
}

/// The colony's construction queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructionQueue {
    target: ConstructionTarget,
    hammers: u32,
    last_checked: Option<TurnNumber>,
}

impl ConstructionQueue {
    /// Create an idle queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> ConstructionTarget {
        self.target
    }

    /// Hammers accumulated.
    #[must_use]
    pub const fn hammers(&self) -> u32 {
        self.hammers
    }

    /// Turn the completion gate last ran.
    #[must_use]
    pub const fn last_checked(&self) -> Option<TurnNumber> {
        self.last_checked
    }

    /// Change the target. Accumulated hammers carry over.
    pub fn set_target(&mut self, target: ConstructionTarget) {
        self.target = target;
    }

    /// Add hammers.
    pub fn add_hammers(&mut self, amount: u32) {
        self.hammers = self.hammers.saturating_add(amount);
    }

    /// Overwrite the hammer total.
    pub fn set_hammers(&mut self, hammers: u32) {
        self.hammers = hammers;
    }

    /// State view of the queue.
    #[must_use]
    pub const fn state(&self) -> ConstructionState {
        match self.target {
            ConstructionTarget::None => ConstructionState::Idle,
            ConstructionTarget::Building(building_type) => ConstructionState::Building {
                building_type,
                progress: self.hammers,
            },
            ConstructionTarget::Unit(unit_type) => ConstructionState::BuildingUnit {
                unit_type,
                progress: self.hammers,
            },
        }
    }

    /// Run the completion gate for `turn`.
    ///
    /// `requirement` is `None` when the target has no further level.
    pub fn check_complete(
        &mut self,
        turn: TurnNumber,
        requirement: Option<Requirement>,
        tools_on_hand: u32,
    ) -> CompletionCheck {
        if self.last_checked == Some(turn) {
            return CompletionCheck::AlreadyChecked;
        }
        self.last_checked = Some(turn);

        let Some(requirement) = requirement.filter(|_| self.target.is_some()) else {
            return CompletionCheck::Idle;
        };
        if self.hammers < requirement.hammers {
            return CompletionCheck::Accumulating {
                hammers: self.hammers,
                required: requirement.hammers,
            };
        }
        self.hammers = requirement.hammers;
        if tools_on_hand < requirement.tools {
            return CompletionCheck::MissingTools {
                required: requirement.tools,
                available: tools_on_hand,
            };
        }
        CompletionCheck::Ready {
            target: self.target,
            tools: requirement.tools,
        }
    }

    /// Reset the hammers after a completion.
    pub fn finish(&mut self) {
        self.hammers = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCKS: Requirement = Requirement {
        hammers: 52,
        tools: 20,
    };

    #[test]
    fn test_target_codes() {
        assert_eq!(ConstructionTarget::None.code(), -1);
        assert_eq!(ConstructionTarget::Building(BuildingType::TownHall).code(), 0);
        assert_eq!(ConstructionTarget::Building(BuildingType::Docks).code(), 13);
        assert_eq!(ConstructionTarget::Unit(UnitType::FreeColonist).code(), 1000);
        assert_eq!(ConstructionTarget::Unit(UnitType::Galleon).code(), 1017);

        for code in [-1, 0, 13, 15, 1000, 1013, 1020] {
            assert_eq!(ConstructionTarget::from_code(code).unwrap().code(), code);
        }
        assert!(ConstructionTarget::from_code(16).is_err());
        assert!(ConstructionTarget::from_code(-5).is_err());
        assert!(ConstructionTarget::from_code(1021).is_err());
    }

    #[test]
    fn test_state_view() {
        let mut queue = ConstructionQueue::new();
        assert_eq!(queue.state(), ConstructionState::Idle);
        queue.set_target(ConstructionTarget::Unit(UnitType::WagonTrain));
        queue.add_hammers(12);
        assert_eq!(
            queue.state(),
            ConstructionState::BuildingUnit {
                unit_type: UnitType::WagonTrain,
                progress: 12
            }
        );
    }

    #[test]
    fn test_missing_tools_caps_hammers() {
        let mut queue = ConstructionQueue::new();
        queue.set_target(ConstructionTarget::Building(BuildingType::Docks));
        queue.add_hammers(60);

        assert_eq!(
            queue.check_complete(1, Some(DOCKS), 0),
            CompletionCheck::MissingTools {
                required: 20,
                available: 0
            }
        );
        assert_eq!(queue.hammers(), 52);

        queue.add_hammers(5);
        assert!(matches!(
            queue.check_complete(2, Some(DOCKS), 19),
            CompletionCheck::MissingTools { .. }
        ));
        assert_eq!(queue.hammers(), 52);
    }

    #[test]
    fn test_once_per_turn() {
        let mut queue = ConstructionQueue::new();
        queue.set_target(ConstructionTarget::Building(BuildingType::Docks));
        queue.add_hammers(52);

        let first = queue.check_complete(7, Some(DOCKS), 20);
        assert_eq!(
            first,
            CompletionCheck::Ready {
                target: ConstructionTarget::Building(BuildingType::Docks),
                tools: 20
            }
        );
        queue.finish();
        assert_eq!(
            queue.check_complete(7, Some(DOCKS), 20),
            CompletionCheck::AlreadyChecked
        );
        assert_eq!(queue.hammers(), 0);
    }

    #[test]
    fn test_accumulating_and_idle() {
        let mut queue = ConstructionQueue::new();
        assert_eq!(queue.check_complete(1, Some(DOCKS), 0), CompletionCheck::Idle);

        queue.set_target(ConstructionTarget::Building(BuildingType::Docks));
        queue.add_hammers(10);
        assert_eq!(
            queue.check_complete(2, Some(DOCKS), 100),
            CompletionCheck::Accumulating {
                hammers: 10,
                required: 52
            }
        );
        assert_eq!(queue.check_complete(3, None, 100), CompletionCheck::Idle);
    }
}
