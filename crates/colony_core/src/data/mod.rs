//! Specification data: building level tables, unit build costs and game
//! options.
//!
//! All structs are designed to be deserialized from RON files. The classic
//! rule set is also available in code through [`Specification::classic`].
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `colony_tools`.

mod building_data;
mod unit_data;

use serde::{Deserialize, Serialize};

pub use building_data::{BuildingData, LevelData};
pub use unit_data::{UnitData, UnitRequirement};

use crate::buildings::{BuildingLevel, BuildingType};
use crate::error::{ColonyError, Result};
use crate::units::UnitType;

/// Bells needed to turn one colonist into a rebel.
pub const BELLS_PER_REBEL: u32 = 100;

/// Tunable game options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Gold per missing hammer when paying for construction.
    pub hammer_price: u32,
    /// Markup on the market price of missing tools, in percent.
    pub tool_price_markup_percent: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            hammer_price: 20,
            tool_price_markup_percent: 110,
        }
    }
}

/// The complete rule tables a game runs with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specification {
    /// Game options.
    #[serde(default)]
    pub options: GameOptions,

    /// One entry per building type.
    pub buildings: Vec<BuildingData>,

    /// Buildable units.
    #[serde(default)]
    pub units: Vec<UnitData>,
}

impl Specification {
    /// Parse a specification from RON.
    ///
    /// # Errors
    ///
    /// [`ColonyError::DataParseError`] if the text is not a valid
    /// specification.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| ColonyError::DataParseError(e.to_string()))
    }

    /// Render the specification as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ColonyError::InvalidState(format!("Failed to write specification: {e}")))
    }

    /// Cost table for a building type.
    #[must_use]
    pub fn building(&self, building_type: BuildingType) -> Option<&BuildingData> {
        self.buildings
            .iter()
            .find(|data| data.building_type == building_type)
    }

    /// Construction data for a unit type, if it can be built.
    #[must_use]
    pub fn unit(&self, unit_type: UnitType) -> Option<&UnitData> {
        self.units.iter().find(|data| data.unit_type == unit_type)
    }

    /// Check completeness and consistency.
    ///
    /// # Errors
    ///
    /// [`ColonyError::InvalidSpecification`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<()> {
        for building_type in BuildingType::ALL {
            let count = self
                .buildings
                .iter()
                .filter(|data| data.building_type == building_type)
                .count();
            if count != 1 {
                return Err(ColonyError::InvalidSpecification(format!(
                    "{building_type:?} must be defined exactly once, found {count}"
                )));
            }
        }

        for data in &self.buildings {
            if data.levels.is_empty() || data.levels.len() > 3 {
                return Err(ColonyError::InvalidSpecification(format!(
                    "{:?} must have 1 to 3 levels, found {}",
                    data.building_type,
                    data.levels.len()
                )));
            }
            if let Some((index, _)) = data
                .levels
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, level)| level.hammers == 0)
            {
                return Err(ColonyError::InvalidSpecification(format!(
                    "{:?} level {} costs no hammers",
                    data.building_type,
                    index + 1
                )));
            }
        }

        for (i, data) in self.units.iter().enumerate() {
            if data.hammers == 0 {
                return Err(ColonyError::InvalidSpecification(format!(
                    "{:?} has no hammer cost",
                    data.unit_type
                )));
            }
            if self.units[..i].iter().any(|u| u.unit_type == data.unit_type) {
                return Err(ColonyError::InvalidSpecification(format!(
                    "{:?} is defined twice",
                    data.unit_type
                )));
            }
            if let Some(req) = data.requires {
                let reachable = self
                    .building(req.building)
                    .is_some_and(|b| req.level != BuildingLevel::NotBuilt && b.max_level() >= req.level);
                if !reachable {
                    return Err(ColonyError::InvalidSpecification(format!(
                        "{:?} requires an unreachable {:?} level",
                        data.unit_type, req.building
                    )));
                }
            }
        }

        Ok(())
    }

    /// The classic rule set.
    #[must_use]
    pub fn classic() -> Self {
        use BuildingType as B;

        let building = |building_type, levels: &[(&str, u32, u32, u32)]| BuildingData {
            building_type,
            levels: levels
                .iter()
                .map(|&(name, hammers, tools, population)| LevelData {
                    name: name.to_string(),
                    hammers,
                    tools,
                    population,
                })
                .collect(),
        };

        let buildings = vec![
            building(B::TownHall, &[("Town Hall", 0, 0, 1)]),
            building(
                B::Carpenter,
                &[("Carpenter's House", 0, 0, 1), ("Lumber Mill", 52, 0, 3)],
            ),
            building(
                B::Blacksmith,
                &[
                    ("Blacksmith's House", 0, 0, 1),
                    ("Blacksmith's Shop", 64, 20, 1),
                    ("Iron Works", 240, 100, 8),
                ],
            ),
            building(
                B::Tobacconist,
                &[
                    ("Tobacconist's House", 0, 0, 1),
                    ("Tobacconist's Shop", 64, 20, 1),
                    ("Cigar Factory", 160, 100, 8),
                ],
            ),
            building(
                B::Weaver,
                &[
                    ("Weaver's House", 0, 0, 1),
                    ("Weaver's Shop", 64, 20, 1),
                    ("Textile Mill", 160, 100, 8),
                ],
            ),
            building(
                B::Distiller,
                &[
                    ("Distiller's House", 0, 0, 1),
                    ("Rum Distillery", 64, 20, 1),
                    ("Rum Factory", 160, 100, 8),
                ],
            ),
            building(
                B::FurTrader,
                &[
                    ("Fur Trader's House", 0, 0, 1),
                    ("Fur Trading Post", 64, 20, 1),
                    ("Fur Factory", 160, 100, 8),
                ],
            ),
            building(
                B::Armory,
                &[
                    ("Armory", 52, 0, 1),
                    ("Magazine", 120, 50, 1),
                    ("Arsenal", 240, 100, 8),
                ],
            ),
            building(B::Church, &[("Chapel", 0, 0, 1), ("Church", 52, 0, 3)]),
            building(
                B::Schoolhouse,
                &[
                    ("Schoolhouse", 64, 30, 4),
                    ("College", 160, 50, 8),
                    ("University", 240, 100, 10),
                ],
            ),
            building(
                B::Stockade,
                &[
                    ("Stockade", 64, 0, 3),
                    ("Fort", 120, 100, 4),
                    ("Fortress", 320, 100, 8),
                ],
            ),
            building(
                B::Warehouse,
                &[("Warehouse", 80, 0, 1), ("Warehouse Expansion", 80, 20, 1)],
            ),
            building(B::Stables, &[("Stables", 64, 0, 1)]),
            building(
                B::Docks,
                &[
                    ("Docks", 52, 0, 1),
                    ("Drydock", 80, 50, 4),
                    ("Shipyard", 240, 100, 8),
                ],
            ),
            building(
                B::PrintingPress,
                &[("Printing Press", 52, 20, 1), ("Newspaper", 120, 50, 4)],
            ),
            building(B::CustomHouse, &[("Custom House", 150, 50, 3)]),
        ];

        let shipyard = Some(UnitRequirement {
            building: B::Docks,
            level: BuildingLevel::Factory,
        });
        let unit = |unit_type, hammers, tools, requires| UnitData {
            unit_type,
            hammers,
            tools,
            requires,
            requires_independence: false,
        };

        let units = vec![
            unit(UnitType::WagonTrain, 40, 0, None),
            unit(
                UnitType::Artillery,
                192,
                40,
                Some(UnitRequirement {
                    building: B::Armory,
                    level: BuildingLevel::House,
                }),
            ),
            unit(UnitType::Caravel, 128, 40, shipyard),
            unit(UnitType::Merchantman, 192, 80, shipyard),
            unit(UnitType::Galleon, 320, 100, shipyard),
            unit(UnitType::Privateer, 256, 120, shipyard),
            unit(UnitType::Frigate, 512, 200, shipyard),
            UnitData {
                unit_type: UnitType::ManOWar,
                hammers: 640,
                tools: 300,
                requires: shipyard,
                requires_independence: true,
            },
        ];

        Self {
            options: GameOptions::default(),
            buildings,
            units,
        }
    }
}

impl Default for Specification {
    fn default() -> Self {
        Self::classic()
    }
}
