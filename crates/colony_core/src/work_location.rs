//! Work locations: the buildings and tiles a colonist can work.
//!
//! [`WorkLocation`] is a closed set of two variants sharing the
//! [`WorkSite`] capability trait. Locations never point back at their
//! colony; whatever colony state they need arrives as a [`LocationContext`].

use serde::{Deserialize, Serialize};

use crate::buildings::Building;
use crate::error::Result;
use crate::goods::{GoodsLedger, GoodsType};
use crate::map::{TerrainType, TileClaim, TileId};
use crate::turn::TurnNumber;
use crate::units::{Unit, UnitId, UnitType};

/// Colony state a work location needs to compute its production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationContext {
    /// Signed morale production bonus, applied per worker.
    pub production_bonus: i32,
    /// Whether the colony has built docks.
    pub has_docks: bool,
}

/// Index of a work location within its colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkLocationId(pub u32);

/// Shared capabilities of buildings and worked tiles.
pub trait WorkSite {
    /// Whether `unit` could start working here.
    fn can_accept(&self, unit: &Unit, ctx: LocationContext) -> bool;

    /// Goods produced next turn given the current stock.
    fn production_of(&self, goods: GoodsType, ctx: LocationContext, stock: &GoodsLedger) -> u32;

    /// Units working here.
    fn units(&self) -> &[Unit];

    /// Number of units working here.
    fn unit_count(&self) -> usize {
        self.units().len()
    }

    /// Place a unit here, handing it back if it is refused.
    fn add_unit(&mut self, unit: Unit, ctx: LocationContext) -> std::result::Result<(), Unit>;

    /// Take a unit out.
    fn remove_unit(&mut self, id: UnitId) -> Option<Unit>;

    /// Apply this location's production and consumption for `turn`.
    ///
    /// Input goods are taken from `ledger`; outputs are returned for the
    /// colony to route. A second call with the same turn does nothing.
    fn new_turn(
        &mut self,
        turn: TurnNumber,
        ctx: LocationContext,
        ledger: &mut GoodsLedger,
    ) -> Result<Vec<(GoodsType, u32)>>;
}

// ============================================================================
// Worked tile
// ============================================================================

/// A map tile assigned to the colony.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkedTile {
    tile: TileId,
    terrain: TerrainType,
    claim: TileClaim,
    is_center: bool,
    worker: Option<Unit>,
    work_type: GoodsType,
    last_production: Option<TurnNumber>,
}

impl WorkedTile {
    /// A neighbouring tile that can hold one worker.
    #[must_use]
    pub const fn new(tile: TileId, terrain: TerrainType, claim: TileClaim) -> Self {
        Self {
            tile,
            terrain,
            claim,
            is_center: false,
            worker: None,
            work_type: GoodsType::Food,
            last_production: None,
        }
    }

    /// The colony centre tile, which works itself.
    #[must_use]
    pub const fn center(tile: TileId, terrain: TerrainType, claim: TileClaim) -> Self {
        Self {
            tile,
            terrain,
            claim,
            is_center: true,
            worker: None,
            work_type: GoodsType::Food,
            last_production: None,
        }
    }

    /// Map tile.
    #[must_use]
    pub const fn tile(&self) -> TileId {
        self.tile
    }

    /// Terrain.
    #[must_use]
    pub const fn terrain(&self) -> TerrainType {
        self.terrain
    }

    /// Claim on the tile as seen at founding.
    #[must_use]
    pub const fn claim(&self) -> TileClaim {
        self.claim
    }

    /// Whether this is the colony centre.
    #[must_use]
    pub const fn is_center(&self) -> bool {
        self.is_center
    }

    /// Goods the worker is producing.
    #[must_use]
    pub const fn work_type(&self) -> GoodsType {
        self.work_type
    }

    /// Change what the worker produces.
    pub fn set_work_type(&mut self, goods: GoodsType) {
        self.work_type = goods;
    }

    /// Whether the owner may put workers on this tile.
    ///
    /// Native land is off limits unless the owner can take it for free.
    #[must_use]
    pub const fn is_usable(&self, ignore_native_claims: bool) -> bool {
        match self.claim {
            TileClaim::Unclaimed | TileClaim::European(_) => true,
            TileClaim::Native(_) => ignore_native_claims,
        }
    }

    /// What `unit_type` would produce of `goods` here.
    #[must_use]
    pub fn potential_for(&self, unit_type: UnitType, goods: GoodsType, ctx: LocationContext) -> u32 {
        apply_bonus(unit_type.tile_productivity(goods, self.terrain), ctx)
    }

    /// The goods `unit_type` would produce most of here. Ties go to the
    /// goods declared first.
    #[must_use]
    pub fn best_work_type(&self, unit_type: UnitType) -> GoodsType {
        let mut best = (GoodsType::Food, unit_type.tile_productivity(GoodsType::Food, self.terrain));
        for goods in GoodsType::STORABLE {
            let amount = unit_type.tile_productivity(goods, self.terrain);
            if amount > best.1 {
                best = (goods, amount);
            }
        }
        best.0
    }

    /// Place a unit producing a specific goods type.
    pub fn add_worker_for(
        &mut self,
        unit: Unit,
        goods: GoodsType,
        ctx: LocationContext,
    ) -> std::result::Result<(), Unit> {
        if !self.can_accept(&unit, ctx) {
            return Err(unit);
        }
        self.work_type = goods;
        self.worker = Some(unit);
        Ok(())
    }

    fn base_production(&self, goods: GoodsType) -> u32 {
        if self.is_center {
            if goods == GoodsType::Food || self.terrain.secondary_goods() == Some(goods) {
                return self.terrain.potential(goods);
            }
            return 0;
        }
        match &self.worker {
            Some(unit) if self.work_type == goods => {
                unit.unit_type.tile_productivity(goods, self.terrain)
            }
            _ => 0,
        }
    }
}

/// The morale bonus only touches goods the tile actually yields.
fn apply_bonus(base: u32, ctx: LocationContext) -> u32 {
    if base == 0 {
        return 0;
    }
    (base as i32 + ctx.production_bonus).max(0) as u32
}

impl WorkSite for WorkedTile {
    fn can_accept(&self, unit: &Unit, ctx: LocationContext) -> bool {
        !self.is_center
            && self.worker.is_none()
            && unit.is_colonist()
            && (!self.terrain.is_water() || ctx.has_docks)
    }

    fn production_of(&self, goods: GoodsType, ctx: LocationContext, _stock: &GoodsLedger) -> u32 {
        apply_bonus(self.base_production(goods), ctx)
    }

    fn units(&self) -> &[Unit] {
        match &self.worker {
            Some(unit) => std::slice::from_ref(unit),
            None => &[],
        }
    }

    fn add_unit(&mut self, unit: Unit, ctx: LocationContext) -> std::result::Result<(), Unit> {
        let goods = self.best_work_type(unit.unit_type);
        self.add_worker_for(unit, goods, ctx)
    }

    fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        if self.worker.as_ref().is_some_and(|unit| unit.id == id) {
            return self.worker.take();
        }
        None
    }

    fn new_turn(
        &mut self,
        turn: TurnNumber,
        ctx: LocationContext,
        ledger: &mut GoodsLedger,
    ) -> Result<Vec<(GoodsType, u32)>> {
        if self.last_production == Some(turn) {
            return Ok(Vec::new());
        }
        self.last_production = Some(turn);

        let mut produced = Vec::new();
        if self.is_center {
            produced.push((GoodsType::Food, self.production_of(GoodsType::Food, ctx, ledger)));
            if let Some(secondary) = self.terrain.secondary_goods() {
                produced.push((secondary, self.production_of(secondary, ctx, ledger)));
            }
        } else if self.worker.is_some() {
            produced.push((
                self.work_type,
                self.production_of(self.work_type, ctx, ledger),
            ));
        }
        produced.retain(|&(_, amount)| amount > 0);
        tracing::trace!(tile = self.tile.0, ?produced, "Tile production");
        Ok(produced)
    }
}

// ============================================================================
// Closed variant
// ============================================================================

/// A building or a worked tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkLocation {
    /// A colony building.
    Building(Building),
    /// A tile around the colony.
    Tile(WorkedTile),
}

impl WorkLocation {
    /// The building, if this is one.
    #[must_use]
    pub const fn as_building(&self) -> Option<&Building> {
        match self {
            Self::Building(building) => Some(building),
            Self::Tile(_) => None,
        }
    }

    /// Mutable building, if this is one.
    pub fn as_building_mut(&mut self) -> Option<&mut Building> {
        match self {
            Self::Building(building) => Some(building),
            Self::Tile(_) => None,
        }
    }

    /// The tile, if this is one.
    #[must_use]
    pub const fn as_tile(&self) -> Option<&WorkedTile> {
        match self {
            Self::Tile(tile) => Some(tile),
            Self::Building(_) => None,
        }
    }

    /// Mutable tile, if this is one.
    pub fn as_tile_mut(&mut self) -> Option<&mut WorkedTile> {
        match self {
            Self::Tile(tile) => Some(tile),
            Self::Building(_) => None,
        }
    }

    fn site(&self) -> &dyn WorkSite {
        match self {
            Self::Building(building) => building,
            Self::Tile(tile) => tile,
        }
    }

    fn site_mut(&mut self) -> &mut dyn WorkSite {
        match self {
            Self::Building(building) => building,
            Self::Tile(tile) => tile,
        }
    }
}

impl WorkSite for WorkLocation {
    fn can_accept(&self, unit: &Unit, ctx: LocationContext) -> bool {
        self.site().can_accept(unit, ctx)
    }

    fn production_of(&self, goods: GoodsType, ctx: LocationContext, stock: &GoodsLedger) -> u32 {
        self.site().production_of(goods, ctx, stock)
    }

    fn units(&self) -> &[Unit] {
        self.site().units()
    }

    fn add_unit(&mut self, unit: Unit, ctx: LocationContext) -> std::result::Result<(), Unit> {
        self.site_mut().add_unit(unit, ctx)
    }

    fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        self.site_mut().remove_unit(id)
    }

    fn new_turn(
        &mut self,
        turn: TurnNumber,
        ctx: LocationContext,
        ledger: &mut GoodsLedger,
    ) -> Result<Vec<(GoodsType, u32)>> {
        self.site_mut().new_turn(turn, ctx, ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::{BuildingLevel, BuildingType};
    use crate::owner::NationId;

    fn colonist(id: u32, unit_type: UnitType) -> Unit {
        Unit::new(UnitId(id), unit_type)
    }

    #[test]
    fn test_center_tile_works_itself() {
        let mut center = WorkedTile::center(TileId(0), TerrainType::Plains, TileClaim::Unclaimed);
        assert!(!center.can_accept(&colonist(0, UnitType::FreeColonist), LocationContext::default()));

        let mut ledger = GoodsLedger::new();
        let produced = center
            .new_turn(1, LocationContext::default(), &mut ledger)
            .unwrap();
        assert_eq!(produced, vec![(GoodsType::Food, 5), (GoodsType::Cotton, 2)]);
    }

    #[test]
    fn test_ocean_needs_docks() {
        let tile = WorkedTile::new(TileId(1), TerrainType::Ocean, TileClaim::Unclaimed);
        let unit = colonist(0, UnitType::ExpertFisherman);
        assert!(!tile.can_accept(&unit, LocationContext::default()));
        let docks = LocationContext {
            production_bonus: 0,
            has_docks: true,
        };
        assert!(tile.can_accept(&unit, docks));
        assert_eq!(tile.potential_for(unit.unit_type, GoodsType::Food, docks), 8);
    }

    #[test]
    fn test_bonus_only_when_base_positive() {
        let mut tile = WorkedTile::new(TileId(1), TerrainType::Hills, TileClaim::Unclaimed);
        let ctx = LocationContext {
            production_bonus: 2,
            has_docks: false,
        };
        tile.add_worker_for(colonist(0, UnitType::FreeColonist), GoodsType::Ore, ctx)
            .unwrap();
        let ledger = GoodsLedger::new();
        assert_eq!(tile.production_of(GoodsType::Ore, ctx, &ledger), 6);
        assert_eq!(tile.production_of(GoodsType::Lumber, ctx, &ledger), 0);

        let penalty = LocationContext {
            production_bonus: -2,
            has_docks: false,
        };
        assert_eq!(tile.production_of(GoodsType::Ore, penalty, &ledger), 2);
    }

    #[test]
    fn test_best_work_type() {
        let tile = WorkedTile::new(TileId(1), TerrainType::MixedForest, TileClaim::Unclaimed);
        assert_eq!(tile.best_work_type(UnitType::FreeColonist), GoodsType::Lumber);
        assert_eq!(tile.best_work_type(UnitType::ExpertFurTrapper), GoodsType::Furs);
        assert_eq!(tile.best_work_type(UnitType::ExpertFarmer), GoodsType::Food);
    }

    #[test]
    fn test_native_claims() {
        let tile = WorkedTile::new(TileId(1), TerrainType::Plains, TileClaim::Native(NationId(9)));
        assert!(!tile.is_usable(false));
        assert!(tile.is_usable(true));
    }

    #[test]
    fn test_variant_dispatch() {
        let mut location = WorkLocation::Building(Building::new(
            BuildingType::Carpenter,
            BuildingLevel::House,
        ));
        let ctx = LocationContext::default();
        assert!(location.add_unit(colonist(3, UnitType::FreeColonist), ctx).is_ok());
        assert_eq!(location.unit_count(), 1);
        assert!(location.as_tile().is_none());
        assert_eq!(location.remove_unit(UnitId(3)).map(|u| u.id), Some(UnitId(3)));
        assert_eq!(location.unit_count(), 0);
    }
}
