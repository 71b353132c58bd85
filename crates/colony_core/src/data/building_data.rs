//! Building cost tables.

use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingLevel, BuildingType};

/// Cost of reaching one building level.
///
/// # Example RON
///
/// ```ron
/// LevelData(name: "Blacksmith's Shop", hammers: 64, tools: 20, population: 1)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelData {
    /// Display name of the building at this level.
    pub name: String,

    /// Hammers needed to complete the level.
    #[serde(default)]
    pub hammers: u32,

    /// Tools consumed on completion.
    #[serde(default)]
    pub tools: u32,

    /// Colonists the colony needs before the level can be started.
    #[serde(default)]
    pub population: u32,
}

/// All levels of one building type.
///
/// `levels[0]` is the house level. A building whose house level costs no
/// hammers exists from the moment the colony is founded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingData {
    /// Building type this table describes.
    pub building_type: BuildingType,

    /// Levels in build order.
    pub levels: Vec<LevelData>,
}

impl BuildingData {
    /// Level the building starts at in a new colony.
    #[must_use]
    pub fn initial_level(&self) -> BuildingLevel {
        match self.levels.first() {
            Some(first) if first.hammers == 0 => BuildingLevel::House,
            _ => BuildingLevel::NotBuilt,
        }
    }

    /// Cost of the level after `current`, if there is one.
    #[must_use]
    pub fn next_level(&self, current: BuildingLevel) -> Option<&LevelData> {
        self.levels.get(current.as_u32() as usize)
    }

    /// Highest level that can be reached.
    #[must_use]
    pub fn max_level(&self) -> BuildingLevel {
        match self.levels.len() {
            0 => BuildingLevel::NotBuilt,
            1 => BuildingLevel::House,
            2 => BuildingLevel::Shop,
            _ => BuildingLevel::Factory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(name: &str, hammers: u32, tools: u32, population: u32) -> LevelData {
        LevelData {
            name: name.to_string(),
            hammers,
            tools,
            population,
        }
    }

    #[test]
    fn test_initial_level() {
        let free = BuildingData {
            building_type: BuildingType::Carpenter,
            levels: vec![level("Carpenter's House", 0, 0, 1), level("Lumber Mill", 52, 0, 3)],
        };
        assert_eq!(free.initial_level(), BuildingLevel::House);

        let paid = BuildingData {
            building_type: BuildingType::Docks,
            levels: vec![level("Docks", 52, 0, 1)],
        };
        assert_eq!(paid.initial_level(), BuildingLevel::NotBuilt);
        assert_eq!(paid.max_level(), BuildingLevel::House);
    }

    #[test]
    fn test_next_level_lookup() {
        let data = BuildingData {
            building_type: BuildingType::Stockade,
            levels: vec![
                level("Stockade", 64, 0, 3),
                level("Fort", 120, 100, 4),
                level("Fortress", 320, 100, 8),
            ],
        };
        assert_eq!(data.next_level(BuildingLevel::NotBuilt).unwrap().name, "Stockade");
        assert_eq!(data.next_level(BuildingLevel::Shop).unwrap().hammers, 320);
        assert!(data.next_level(BuildingLevel::Factory).is_none());
    }
}
