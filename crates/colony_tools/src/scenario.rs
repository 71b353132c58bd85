//! Scenario loading and configuration.
//!
//! Scenarios define the initial game state for headless runs: the map,
//! the players and the colonies with their colonists, stock and build
//! targets.

use std::path::Path;

use colony_core::buildings::BuildingType;
use colony_core::construction::ConstructionTarget;
use colony_core::data::Specification;
use colony_core::error::ColonyError;
use colony_core::game::Game;
use colony_core::goods::GoodsType;
use colony_core::map::{GridMap, TerrainType, TileId};
use colony_core::messages::ColonyMessage;
use colony_core::owner::{FoundingFather, NationId, Player, PlayerId};
use colony_core::units::UnitType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A coordinate lies outside the map.
    #[error("({x}, {y}) is outside the {width}x{height} map")]
    OffMap {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Map width.
        width: u32,
        /// Map height.
        height: u32,
    },
    /// The simulation rejected the setup.
    #[error("Invalid scenario setup: {0}")]
    Setup(#[from] ColonyError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Turns to run when the command line does not say otherwise.
    #[serde(default = "default_turns")]
    pub turns: u32,
    /// Map layout.
    pub map: MapSetup,
    /// Players.
    pub players: Vec<PlayerSetup>,
    /// Colonies, founded in order.
    #[serde(default)]
    pub colonies: Vec<ColonySetup>,
}

fn default_turns() -> u32 {
    20
}

/// Map dimensions and terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSetup {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Terrain of every tile not listed in `tiles` or `ocean_columns`.
    pub terrain: TerrainType,
    /// Columns turned into ocean.
    #[serde(default)]
    pub ocean_columns: Vec<u32>,
    /// Individual terrain overrides.
    #[serde(default)]
    pub tiles: Vec<TerrainPatch>,
}

/// One tile with non-default terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPatch {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Terrain.
    pub terrain: TerrainType,
}

/// A player and its standing with the crown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Player id referenced by colonies.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Nation claiming tiles.
    pub nation: u32,
    /// Starting gold.
    #[serde(default)]
    pub gold: u32,
    /// Tax rate in percent.
    #[serde(default)]
    pub tax_rate: u32,
    /// Computer controlled.
    #[serde(default)]
    pub ai: bool,
    /// Elected founding fathers.
    #[serde(default)]
    pub fathers: Vec<FoundingFather>,
    /// Goods under a crown boycott.
    #[serde(default)]
    pub boycotts: Vec<GoodsType>,
}

impl PlayerSetup {
    /// Create a player with no gold or fathers.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, nation: u32) -> Self {
        Self {
            id,
            name: name.into(),
            nation,
            gold: 0,
            tax_rate: 0,
            ai: false,
            fathers: Vec::new(),
            boycotts: Vec::new(),
        }
    }

    fn to_player(&self) -> Player {
        let mut player = Player::new(PlayerId(self.id), self.name.clone(), NationId(self.nation))
            .with_gold(self.gold)
            .with_tax_rate(self.tax_rate)
            .with_ai(self.ai);
        for &father in &self.fathers {
            player = player.with_father(father);
        }
        player.boycotts.extend(self.boycotts.iter().copied());
        player
    }
}

/// What a scenario colony starts building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildSetup {
    /// Nothing.
    Nothing,
    /// The next level of a building.
    Building(BuildingType),
    /// A unit.
    Unit(UnitType),
}

impl From<BuildSetup> for ConstructionTarget {
    fn from(setup: BuildSetup) -> Self {
        match setup {
            BuildSetup::Nothing => Self::None,
            BuildSetup::Building(building_type) => Self::Building(building_type),
            BuildSetup::Unit(unit_type) => Self::Unit(unit_type),
        }
    }
}

/// A colony founded at scenario start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonySetup {
    /// Colony name.
    pub name: String,
    /// Owning player id.
    pub owner: u32,
    /// Centre tile (x, y).
    pub position: (u32, u32),
    /// Colonists, placed automatically in this order.
    #[serde(default)]
    pub colonists: Vec<UnitType>,
    /// Starting stock.
    #[serde(default)]
    pub goods: Vec<(GoodsType, u32)>,
    /// Initial build target; the founding default is kept when absent.
    #[serde(default)]
    pub building: Option<BuildSetup>,
    /// Goods the custom house exports, with the amount to keep.
    #[serde(default)]
    pub exports: Vec<(GoodsType, u32)>,
}

impl ColonySetup {
    /// Create a colony setup with `colonists` free colonists.
    #[must_use]
    pub fn new(name: impl Into<String>, owner: u32, position: (u32, u32), colonists: usize) -> Self {
        Self {
            name: name.into(),
            owner,
            position,
            colonists: vec![UnitType::FreeColonist; colonists],
            goods: Vec::new(),
            building: None,
            exports: Vec::new(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Single Colony".to_string(),
            description: "One inland colony of three colonists".to_string(),
            turns: default_turns(),
            map: MapSetup {
                width: 10,
                height: 10,
                terrain: TerrainType::Plains,
                ocean_columns: vec![0],
                tiles: vec![TerrainPatch {
                    x: 6,
                    y: 4,
                    terrain: TerrainType::MixedForest,
                }],
            },
            players: vec![PlayerSetup {
                gold: 1000,
                ..PlayerSetup::new(0, "Dutch", 0)
            }],
            colonies: vec![ColonySetup::new("Jamestown", 0, (5, 4), 3)],
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Two players sharing a coast, each with a colony.
    #[must_use]
    pub fn coastal_rivals() -> Self {
        let mut english = ColonySetup::new("Plymouth", 1, (1, 8), 4);
        english.goods = vec![(GoodsType::Lumber, 60), (GoodsType::Tools, 20)];

        let mut dutch = ColonySetup::new("New Amsterdam", 0, (1, 2), 5);
        dutch.colonists.push(UnitType::ExpertFisherman);
        dutch.building = Some(BuildSetup::Unit(UnitType::WagonTrain));

        Self {
            name: "Coastal Rivals".to_string(),
            description: "Two coastal colonies of competing nations".to_string(),
            turns: 40,
            map: MapSetup {
                width: 12,
                height: 12,
                terrain: TerrainType::Grassland,
                ocean_columns: vec![0],
                tiles: vec![
                    TerrainPatch {
                        x: 2,
                        y: 2,
                        terrain: TerrainType::ConiferForest,
                    },
                    TerrainPatch {
                        x: 2,
                        y: 8,
                        terrain: TerrainType::Hills,
                    },
                ],
            },
            players: vec![
                PlayerSetup {
                    gold: 500,
                    ..PlayerSetup::new(0, "Dutch", 0)
                },
                PlayerSetup {
                    gold: 800,
                    fathers: vec![FoundingFather::LaSalle],
                    ai: true,
                    ..PlayerSetup::new(1, "English", 1)
                },
            ],
            colonies: vec![dutch, english],
        }
    }

    /// Build the map described by this scenario.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::OffMap`] for terrain patches outside the map.
    pub fn build_map(&self) -> Result<GridMap, ScenarioError> {
        let setup = &self.map;
        let mut map = GridMap::new(setup.width, setup.height, setup.terrain);

        let ocean = setup
            .ocean_columns
            .iter()
            .flat_map(|&x| (0..setup.height).map(move |y| TerrainPatch {
                x,
                y,
                terrain: TerrainType::Ocean,
            }));
        for patch in ocean.chain(setup.tiles.iter().copied()) {
            let tile = self.tile_at(&map, (patch.x, patch.y))?;
            map.set_terrain(tile, patch.terrain)?;
        }
        Ok(map)
    }

    fn tile_at(&self, map: &GridMap, (x, y): (u32, u32)) -> Result<TileId, ScenarioError> {
        map.tile_at(x, y).ok_or(ScenarioError::OffMap {
            x,
            y,
            width: self.map.width,
            height: self.map.height,
        })
    }

    /// Create the initial game state.
    ///
    /// Messages raised while placing colonists and choosing build targets
    /// are returned alongside the game.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::OffMap`] for positions outside the map, or
    /// [`ScenarioError::Setup`] when the core rejects a colony (unknown
    /// owner, tile already settled).
    pub fn build(&self, spec: Specification) -> Result<(Game, Vec<ColonyMessage>), ScenarioError> {
        let map = self.build_map()?;
        let mut game = Game::new(spec, map);
        for setup in &self.players {
            game.add_player(setup.to_player());
        }

        let mut messages = Vec::new();
        for setup in &self.colonies {
            let tile = self.tile_at(game.map(), setup.position)?;
            let id = game.found_colony(PlayerId(setup.owner), &setup.name, tile)?;

            for &unit_type in &setup.colonists {
                game.add_unit(id, unit_type, &mut messages)?;
            }
            if let Some(building) = setup.building {
                game.set_currently_building(id, building.into(), &mut messages)?;
            }

            let colony = game.colony_mut(id).ok_or(ColonyError::ColonyNotFound(id.0))?;
            for &(goods, amount) in &setup.goods {
                colony.add_goods(goods, amount);
            }
            for &(goods, keep) in &setup.exports {
                colony.set_exports(goods, true);
                colony.set_export_level(goods, keep);
            }
            debug!(colony = %id, name = %setup.name, units = colony.unit_count(), "Scenario colony ready");
        }

        info!(
            scenario = %self.name,
            players = self.players.len(),
            colonies = game.colonies().len(),
            "Scenario built"
        );
        Ok((game, messages))
    }
}
