//! Map collaborator: terrain, adjacency, tile claims and exploration.
//!
//! The colony only needs a narrow view of the map, expressed by the
//! [`GameMap`] trait. [`GridMap`] is a minimal rectangular implementation
//! with 8-neighbour adjacency used by tests and headless scenarios.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ColonyError, Result};
use crate::goods::GoodsType;
use crate::owner::{NationId, PlayerId};

/// Unique identifier for a map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// Terrain of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    /// Plains.
    Plains,
    /// Grassland.
    Grassland,
    /// Prairie.
    Prairie,
    /// Savannah.
    Savannah,
    /// Marsh.
    Marsh,
    /// Swamp.
    Swamp,
    /// Desert.
    Desert,
    /// Tundra.
    Tundra,
    /// Arctic.
    Arctic,
    /// Hills.
    Hills,
    /// Mountains.
    Mountains,
    /// Mixed forest.
    MixedForest,
    /// Conifer forest.
    ConiferForest,
    /// Ocean.
    Ocean,
}

impl TerrainType {
    /// Whether this terrain is water.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Ocean)
    }

    /// Goods produced per turn by an unskilled worker.
    #[must_use]
    pub const fn potential(self, goods: GoodsType) -> u32 {
        use GoodsType as G;
        match (self, goods) {
            (Self::Plains, G::Food) => 5,
            (Self::Plains, G::Cotton) => 2,
            (Self::Grassland, G::Food) => 3,
            (Self::Grassland, G::Tobacco) => 3,
            (Self::Prairie, G::Food) => 3,
            (Self::Prairie, G::Cotton) => 3,
            (Self::Savannah, G::Food) => 4,
            (Self::Savannah, G::Sugar) => 3,
            (Self::Marsh, G::Food) => 3,
            (Self::Marsh, G::Tobacco) => 2,
            (Self::Marsh, G::Ore) => 2,
            (Self::Swamp, G::Food) => 3,
            (Self::Swamp, G::Sugar) => 2,
            (Self::Swamp, G::Ore) => 2,
            (Self::Desert, G::Food) => 2,
            (Self::Desert, G::Cotton) => 1,
            (Self::Desert, G::Ore) => 2,
            (Self::Tundra, G::Food) => 3,
            (Self::Tundra, G::Ore) => 2,
            (Self::Hills, G::Food) => 4,
            (Self::Hills, G::Ore) => 4,
            (Self::Mountains, G::Ore) => 4,
            (Self::Mountains, G::Silver) => 1,
            (Self::MixedForest, G::Food) => 3,
            (Self::MixedForest, G::Furs) => 3,
            (Self::MixedForest, G::Lumber) => 6,
            (Self::ConiferForest, G::Food) => 2,
            (Self::ConiferForest, G::Furs) => 2,
            (Self::ConiferForest, G::Lumber) => 6,
            (Self::Ocean, G::Food) => 4,
            _ => 0,
        }
    }

    /// Goods produced by a colony centre on this terrain besides food.
    #[must_use]
    pub const fn secondary_goods(self) -> Option<GoodsType> {
        match self {
            Self::Plains | Self::Prairie => Some(GoodsType::Cotton),
            Self::Grassland | Self::Marsh => Some(GoodsType::Tobacco),
            Self::Savannah | Self::Swamp => Some(GoodsType::Sugar),
            Self::Desert | Self::Tundra | Self::Hills | Self::Mountains => Some(GoodsType::Ore),
            Self::MixedForest | Self::ConiferForest => Some(GoodsType::Furs),
            Self::Arctic | Self::Ocean => None,
        }
    }
}

/// Who claims a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileClaim {
    /// Nobody.
    #[default]
    Unclaimed,
    /// A European nation.
    European(NationId),
    /// A native nation.
    Native(NationId),
}

/// Everything the colony needs to know about a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileInfo {
    /// Tile identifier.
    pub id: TileId,
    /// Terrain.
    pub terrain: TerrainType,
    /// Current claim.
    pub claim: TileClaim,
}

/// Narrow map interface consumed by colonies.
pub trait GameMap {
    /// Look up a tile.
    fn tile(&self, id: TileId) -> Option<&TileInfo>;

    /// Tiles adjacent to `id`, in a fixed order.
    fn neighbours(&self, id: TileId) -> Vec<TileId>;

    /// Change the claim on a tile.
    fn claim_tile(&mut self, id: TileId, claim: TileClaim) -> Result<()>;

    /// Mark the tiles within `radius` of `centre` as explored by `player`.
    fn explore_around(&mut self, player: PlayerId, centre: TileId, radius: u32);
}

/// Rectangular map with 8-neighbour adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridMap {
    width: u32,
    height: u32,
    tiles: Vec<TileInfo>,
    explored: BTreeMap<PlayerId, BTreeSet<TileId>>,
}

/// Neighbour offsets: N, NE, E, SE, S, SW, W, NW.
const DIRECTIONS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

impl GridMap {
    /// Create a map filled with a single terrain.
    #[must_use]
    pub fn new(width: u32, height: u32, terrain: TerrainType) -> Self {
        let tiles = (0..width * height)
            .map(|i| TileInfo {
                id: TileId(i),
                terrain,
                claim: TileClaim::Unclaimed,
            })
            .collect();
        Self {
            width,
            height,
            tiles,
            explored: BTreeMap::new(),
        }
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile at grid coordinates.
    #[must_use]
    pub fn tile_at(&self, x: u32, y: u32) -> Option<TileId> {
        (x < self.width && y < self.height).then(|| TileId(y * self.width + x))
    }

    /// Grid coordinates of a tile.
    #[must_use]
    pub fn coords(&self, id: TileId) -> Option<(u32, u32)> {
        self.contains(id)
            .then(|| (id.0 % self.width, id.0 / self.width))
    }

    /// Whether the tile exists.
    #[must_use]
    pub fn contains(&self, id: TileId) -> bool {
        (id.0 as usize) < self.tiles.len()
    }

    /// Change the terrain of a tile.
    pub fn set_terrain(&mut self, id: TileId, terrain: TerrainType) -> Result<()> {
        let tile = self
            .tiles
            .get_mut(id.0 as usize)
            .ok_or(ColonyError::TileNotFound(id.0))?;
        tile.terrain = terrain;
        Ok(())
    }

    /// Whether `player` has explored the tile.
    #[must_use]
    pub fn is_explored(&self, player: PlayerId, id: TileId) -> bool {
        self.explored
            .get(&player)
            .is_some_and(|tiles| tiles.contains(&id))
    }

    fn tiles_within(&self, centre: TileId, radius: u32) -> Vec<TileId> {
        let Some((cx, cy)) = self.coords(centre) else {
            return Vec::new();
        };
        let r = i64::from(radius);
        let mut result = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                if let Some(id) = self.offset(cx, cy, dx, dy) {
                    result.push(id);
                }
            }
        }
        result
    }

    fn offset(&self, x: u32, y: u32, dx: i64, dy: i64) -> Option<TileId> {
        let nx = i64::from(x) + dx;
        let ny = i64::from(y) + dy;
        if nx < 0 || ny < 0 || nx >= i64::from(self.width) || ny >= i64::from(self.height) {
            return None;
        }
        self.tile_at(nx as u32, ny as u32)
    }
}

impl GameMap for GridMap {
    fn tile(&self, id: TileId) -> Option<&TileInfo> {
        self.tiles.get(id.0 as usize)
    }

    fn neighbours(&self, id: TileId) -> Vec<TileId> {
        let Some((x, y)) = self.coords(id) else {
            return Vec::new();
        };
        DIRECTIONS
            .iter()
            .filter_map(|&(dx, dy)| self.offset(x, y, dx, dy))
            .collect()
    }

    fn claim_tile(&mut self, id: TileId, claim: TileClaim) -> Result<()> {
        let tile = self
            .tiles
            .get_mut(id.0 as usize)
            .ok_or(ColonyError::TileNotFound(id.0))?;
        tile.claim = claim;
        Ok(())
    }

    fn explore_around(&mut self, player: PlayerId, centre: TileId, radius: u32) {
        let tiles = self.tiles_within(centre, radius);
        self.explored.entry(player).or_default().extend(tiles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbours_interior_and_corner() {
        let map = GridMap::new(5, 5, TerrainType::Plains);
        let centre = map.tile_at(2, 2).unwrap();
        assert_eq!(map.neighbours(centre).len(), 8);

        let corner = map.tile_at(0, 0).unwrap();
        let around = map.neighbours(corner);
        assert_eq!(around.len(), 3);
        assert!(around.contains(&map.tile_at(1, 1).unwrap()));
    }

    #[test]
    fn test_tile_lookup_bounds() {
        let map = GridMap::new(3, 2, TerrainType::Hills);
        assert!(map.tile_at(3, 0).is_none());
        assert_eq!(map.coords(TileId(4)), Some((1, 1)));
        assert!(map.tile(TileId(6)).is_none());
    }

    #[test]
    fn test_claim_and_explore() {
        let mut map = GridMap::new(4, 4, TerrainType::Grassland);
        let tile = map.tile_at(1, 1).unwrap();
        map.claim_tile(tile, TileClaim::European(NationId(2))).unwrap();
        assert_eq!(
            map.tile(tile).unwrap().claim,
            TileClaim::European(NationId(2))
        );
        assert!(map
            .claim_tile(TileId(99), TileClaim::Unclaimed)
            .is_err());

        map.explore_around(PlayerId(0), tile, 1);
        assert!(map.is_explored(PlayerId(0), map.tile_at(2, 2).unwrap()));
        assert!(!map.is_explored(PlayerId(0), map.tile_at(3, 3).unwrap()));
        assert!(!map.is_explored(PlayerId(1), tile));
    }

    #[test]
    fn test_terrain_tables() {
        assert_eq!(TerrainType::MixedForest.potential(GoodsType::Lumber), 6);
        assert_eq!(TerrainType::Mountains.potential(GoodsType::Food), 0);
        assert_eq!(TerrainType::Ocean.secondary_goods(), None);
        assert!(TerrainType::Ocean.is_water());
    }
}
