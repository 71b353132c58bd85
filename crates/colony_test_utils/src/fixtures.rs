//! Test fixtures and helpers.
//!
//! Pre-built maps, players and games for consistent testing.
//!
//! The standard map is 10x10 plains with an ocean column on the west edge,
//! a hill at (5, 3) and a mixed forest at (6, 4). Inland colonies go on
//! (5, 4); coastal colonies on (1, 4).

use colony_core::colony::ColonyId;
use colony_core::data::Specification;
use colony_core::game::Game;
use colony_core::map::{GridMap, TerrainType, TileId};
use colony_core::owner::{NationId, Player, PlayerId};
use colony_core::units::UnitType;
use serde::de::DeserializeOwned;

/// Player used by every fixture game.
pub const TEST_PLAYER: PlayerId = PlayerId(0);

/// Gold the fixture player starts with.
pub const TEST_GOLD: u32 = 1000;

/// Map coordinates of the inland colony site.
pub const INLAND_SITE: (u32, u32) = (5, 4);

/// Map coordinates of the coastal colony site.
pub const COASTAL_SITE: (u32, u32) = (1, 4);

/// Parse RON test data, panicking with the parse error.
///
/// # Panics
///
/// Panics if `text` does not parse.
#[must_use]
pub fn from_ron<T: DeserializeOwned>(text: &str) -> T {
    match ron::from_str(text) {
        Ok(value) => value,
        Err(e) => panic!("invalid test RON: {e}"),
    }
}

/// The classic rule set.
#[must_use]
pub fn test_spec() -> Specification {
    Specification::classic()
}

/// A human player with [`TEST_GOLD`] gold.
#[must_use]
pub fn test_player() -> Player {
    Player::new(TEST_PLAYER, "Dutch", NationId(0)).with_gold(TEST_GOLD)
}

/// The standard 10x10 test map.
#[must_use]
pub fn test_map() -> GridMap {
    let mut map = GridMap::new(10, 10, TerrainType::Plains);
    for y in 0..10 {
        if let Some(tile) = map.tile_at(0, y) {
            let _ = map.set_terrain(tile, TerrainType::Ocean);
        }
    }
    if let Some(tile) = map.tile_at(5, 3) {
        let _ = map.set_terrain(tile, TerrainType::Hills);
    }
    if let Some(tile) = map.tile_at(6, 4) {
        let _ = map.set_terrain(tile, TerrainType::MixedForest);
    }
    map
}

/// Tile id at map coordinates on the standard map.
///
/// # Panics
///
/// Panics if the coordinates are off the map.
#[must_use]
pub fn tile(map: &GridMap, (x, y): (u32, u32)) -> TileId {
    match map.tile_at(x, y) {
        Some(tile) => tile,
        None => panic!("({x}, {y}) is off the test map"),
    }
}

/// A game on the standard map with the test player and no colonies.
#[must_use]
pub fn empty_game() -> Game {
    let mut game = Game::new(test_spec(), test_map());
    game.add_player(test_player());
    game
}

/// Found a colony at `site` and fill it with `colonists` free colonists.
///
/// # Panics
///
/// Panics if the colony cannot be founded.
pub fn found_with_colonists(game: &mut Game, name: &str, site: (u32, u32), colonists: usize) -> ColonyId {
    let tile = tile(game.map(), site);
    let colony = match game.found_colony(TEST_PLAYER, name, tile) {
        Ok(id) => id,
        Err(e) => panic!("fixture colony failed: {e}"),
    };
    add_colonists(game, colony, UnitType::FreeColonist, colonists);
    tracing::debug!(colony = colony.0, colonists, "Fixture colony founded");
    colony
}

/// Add `count` units of a type to a colony, placed automatically.
///
/// # Panics
///
/// Panics if the colony does not exist.
pub fn add_colonists(game: &mut Game, colony: ColonyId, unit_type: UnitType, count: usize) {
    let mut sink = Vec::new();
    for _ in 0..count {
        if let Err(e) = game.add_unit(colony, unit_type, &mut sink) {
            panic!("fixture unit failed: {e}");
        }
    }
}

/// A game with one inland colony of `colonists` free colonists.
#[must_use]
pub fn game_with_colony(colonists: usize) -> (Game, ColonyId) {
    let mut game = empty_game();
    let colony = found_with_colonists(&mut game, "Jamestown", INLAND_SITE, colonists);
    (game, colony)
}

/// A game with one coastal colony of `colonists` free colonists.
#[must_use]
pub fn game_with_coastal_colony(colonists: usize) -> (Game, ColonyId) {
    let mut game = empty_game();
    let colony = found_with_colonists(&mut game, "New Amsterdam", COASTAL_SITE, colonists);
    (game, colony)
}

/// A game with an inland and a coastal colony, used by multi-colony tests.
#[must_use]
pub fn game_with_two_colonies(colonists: usize) -> Game {
    let mut game = empty_game();
    found_with_colonists(&mut game, "Jamestown", INLAND_SITE, colonists);
    found_with_colonists(&mut game, "New Amsterdam", COASTAL_SITE, colonists);
    game
}
