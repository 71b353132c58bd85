//! The colony aggregate.
//!
//! A [`Colony`] exclusively owns its work locations (the centre tile, the
//! surrounding tiles and one building per type), its warehouse, its
//! construction queue and its morale tracker. Collaborators it does not own
//! (the owner, the map, the notification sink) are passed into each call.
//!
//! Per-turn processing lives in [`crate::turn`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buildings::{Building, BuildingLevel, BuildingType};
use crate::construction::{ConstructionQueue, ConstructionTarget, Requirement};
use crate::data::Specification;
use crate::error::{ColonyError, Result};
use crate::goods::{GoodsLedger, GoodsType, WarehouseSettings};
use crate::map::{GameMap, TileClaim, TileId};
use crate::messages::{emit, ColonyMessage, MessageKey, MessageType, NotificationSink, Subject};
use crate::morale::MoraleTracker;
use crate::owner::{FoundingFather, Owner, PlayerId, RebellionState};
use crate::population;
use crate::units::{Unit, UnitId, UnitType};
use crate::work_location::{LocationContext, WorkLocation, WorkLocationId, WorkSite, WorkedTile};

/// Base warehouse capacity without a warehouse building.
pub const BASE_WAREHOUSE_CAPACITY: u32 = 100;

/// Capacity added per warehouse level.
pub const WAREHOUSE_CAPACITY_PER_LEVEL: u32 = 100;

/// Unique identifier for a colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColonyId(pub u32);

impl fmt::Display for ColonyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "colony#{}", self.0)
    }
}

/// Where an added unit ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Working in a location.
    Working(WorkLocationId),
    /// Waiting on the colony tile (non-colonists).
    OnTile,
    /// No location would take the unit; it is handed back.
    Unplaced(Unit),
}

/// Anything that can be put into a colony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locatable {
    /// A unit.
    Unit(Unit),
    /// Goods.
    Goods(GoodsType, u32),
    /// Something the colony cannot hold, described by name.
    Other(String),
}

/// A settlement and everything it owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colony {
    pub(crate) id: ColonyId,
    pub(crate) name: String,
    pub(crate) owner: PlayerId,
    pub(crate) tile: Option<TileId>,
    pub(crate) work_locations: Vec<WorkLocation>,
    pub(crate) goods: GoodsLedger,
    pub(crate) warehouse: WarehouseSettings,
    pub(crate) construction: ConstructionQueue,
    pub(crate) morale: MoraleTracker,
    pub(crate) land_locked: bool,
    pub(crate) observed_unit_count: Option<u32>,
    pub(crate) tile_units: Vec<Unit>,
}

impl Colony {
    /// Found a colony on `tile`.
    ///
    /// Explores around the tile, claims the centre and every unclaimed
    /// neighbour for the owner's nation, creates the worked tiles and the
    /// buildings, and starts building docks (or a warehouse when no
    /// neighbour is water).
    ///
    /// # Errors
    ///
    /// [`ColonyError::TileNotFound`] for an unknown tile and
    /// [`ColonyError::InvalidSpecification`] when a building type has no
    /// cost table.
    pub fn found(
        id: ColonyId,
        name: impl Into<String>,
        owner: &dyn Owner,
        tile: TileId,
        map: &mut dyn GameMap,
        spec: &Specification,
    ) -> Result<Self> {
        let name = name.into();
        let center = *map.tile(tile).ok_or(ColonyError::TileNotFound(tile.0))?;
        let own_claim = TileClaim::European(owner.nation());

        map.explore_around(owner.id(), tile, 1);
        map.claim_tile(tile, own_claim)?;

        let mut work_locations = vec![WorkLocation::Tile(WorkedTile::center(
            tile,
            center.terrain,
            own_claim,
        ))];
        let mut land_locked = true;
        for neighbour in map.neighbours(tile) {
            let info = *map
                .tile(neighbour)
                .ok_or(ColonyError::TileNotFound(neighbour.0))?;
            if info.terrain.is_water() {
                land_locked = false;
            }
            let claim = if info.claim == TileClaim::Unclaimed {
                map.claim_tile(neighbour, own_claim)?;
                own_claim
            } else {
                info.claim
            };
            work_locations.push(WorkLocation::Tile(WorkedTile::new(
                neighbour,
                info.terrain,
                claim,
            )));
        }

        for building_type in BuildingType::ALL {
            let data = spec.building(building_type).ok_or_else(|| {
                ColonyError::InvalidSpecification(format!("{building_type:?} is not defined"))
            })?;
            work_locations.push(WorkLocation::Building(Building::new(
                building_type,
                data.initial_level(),
            )));
        }

        let mut construction = ConstructionQueue::new();
        construction.set_target(ConstructionTarget::Building(if land_locked {
            BuildingType::Warehouse
        } else {
            BuildingType::Docks
        }));

        info!(colony = id.0, name = %name, tile = tile.0, land_locked, "Colony founded");

        Ok(Self {
            id,
            name,
            owner: owner.id(),
            tile: Some(tile),
            work_locations,
            goods: GoodsLedger::new(),
            warehouse: WarehouseSettings::new(),
            construction,
            morale: MoraleTracker::new(),
            land_locked,
            observed_unit_count: None,
            tile_units: Vec::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Colony identifier.
    #[must_use]
    pub const fn id(&self) -> ColonyId {
        self.id
    }

    /// Colony name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Map tile the colony stands on.
    #[must_use]
    pub const fn tile(&self) -> Option<TileId> {
        self.tile
    }

    /// Detach the colony from (or re-anchor it to) a map tile.
    pub fn set_tile(&mut self, tile: Option<TileId>) {
        self.tile = tile;
    }

    /// Whether no neighbouring tile is water.
    #[must_use]
    pub const fn is_land_locked(&self) -> bool {
        self.land_locked
    }

    /// Mark the colony as observed from outside with a known unit count.
    /// Observed colonies are not processed.
    pub fn set_observed_unit_count(&mut self, count: Option<u32>) {
        self.observed_unit_count = count;
    }

    /// Whether the colony is only observed from outside.
    #[must_use]
    pub const fn is_observed(&self) -> bool {
        self.observed_unit_count.is_some()
    }

    /// All work locations: tiles first, then buildings in declaration order.
    #[must_use]
    pub fn work_locations(&self) -> &[WorkLocation] {
        &self.work_locations
    }

    /// A work location by id.
    #[must_use]
    pub fn work_location(&self, id: WorkLocationId) -> Option<&WorkLocation> {
        self.work_locations.get(id.0 as usize)
    }

    /// Goods in the warehouse.
    #[must_use]
    pub const fn goods(&self) -> &GoodsLedger {
        &self.goods
    }

    /// Warehouse thresholds and export settings.
    #[must_use]
    pub const fn warehouse(&self) -> &WarehouseSettings {
        &self.warehouse
    }

    /// Construction queue.
    #[must_use]
    pub const fn construction(&self) -> &ConstructionQueue {
        &self.construction
    }

    /// Morale tracker.
    #[must_use]
    pub const fn morale(&self) -> &MoraleTracker {
        &self.morale
    }

    /// Units waiting on the colony tile.
    #[must_use]
    pub fn tile_units(&self) -> &[Unit] {
        &self.tile_units
    }

    /// Put a non-working unit on the colony tile.
    pub fn add_tile_unit(&mut self, unit: Unit) {
        self.tile_units.push(unit);
    }

    // ========================================================================
    // Locations
    // ========================================================================

    /// The building of a type.
    #[must_use]
    pub fn building(&self, building_type: BuildingType) -> Option<&Building> {
        self.work_locations
            .iter()
            .filter_map(WorkLocation::as_building)
            .find(|b| b.building_type() == building_type)
    }

    pub(crate) fn building_mut(&mut self, building_type: BuildingType) -> Option<&mut Building> {
        self.work_locations
            .iter_mut()
            .filter_map(WorkLocation::as_building_mut)
            .find(|b| b.building_type() == building_type)
    }

    pub(crate) fn building_location(&self, building_type: BuildingType) -> Option<usize> {
        self.work_locations.iter().position(|location| {
            location
                .as_building()
                .is_some_and(|b| b.building_type() == building_type)
        })
    }

    /// Whether a building of the type has been constructed.
    #[must_use]
    pub fn has_building(&self, building_type: BuildingType) -> bool {
        self.building(building_type).is_some_and(Building::is_built)
    }

    /// The building whose workers produce `goods`.
    #[must_use]
    pub fn building_for_producing(&self, goods: GoodsType) -> Option<&Building> {
        self.work_locations
            .iter()
            .filter_map(WorkLocation::as_building)
            .find(|b| b.building_type().output() == Some(goods))
    }

    /// The building whose workers consume `goods`.
    #[must_use]
    pub fn building_for_consuming(&self, goods: GoodsType) -> Option<&Building> {
        self.work_locations
            .iter()
            .filter_map(WorkLocation::as_building)
            .find(|b| b.building_type().input() == Some(goods))
    }

    /// The worked tile on a map tile.
    #[must_use]
    pub fn colony_tile(&self, tile: TileId) -> Option<&WorkedTile> {
        self.work_locations
            .iter()
            .filter_map(WorkLocation::as_tile)
            .find(|t| t.tile() == tile)
    }

    /// Whether the colony has any fortification.
    #[must_use]
    pub fn has_stockade(&self) -> bool {
        self.has_building(BuildingType::Stockade)
    }

    /// Context handed to work locations.
    #[must_use]
    pub fn location_context(&self) -> LocationContext {
        LocationContext {
            production_bonus: self.morale.production_bonus(),
            has_docks: self.has_building(BuildingType::Docks),
        }
    }

    // ========================================================================
    // Units
    // ========================================================================

    /// Units working in the colony, in work location order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.work_locations.iter().flat_map(|location| location.units())
    }

    /// Working units of one type.
    pub fn units_of_type(&self, unit_type: UnitType) -> impl Iterator<Item = &Unit> {
        self.units().filter(move |unit| unit.unit_type == unit_type)
    }

    /// Number of colonists working in the colony.
    #[must_use]
    pub fn occupant_count(&self) -> u32 {
        self.work_locations
            .iter()
            .map(|location| location.unit_count() as u32)
            .sum()
    }

    /// Population as seen by the rest of the game: the observed count for
    /// colonies seen from outside, otherwise the occupants.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.observed_unit_count
            .unwrap_or_else(|| self.occupant_count())
    }

    /// The unit that defends the colony.
    ///
    /// # Errors
    ///
    /// [`ColonyError::NoUnits`] when nobody works in the colony.
    pub fn defending_unit(&self) -> Result<&Unit> {
        self.units().next().ok_or_else(|| ColonyError::NoUnits {
            colony: self.name.clone(),
        })
    }

    /// Where a colonist added without an explicit location would go.
    ///
    /// Tries the usable vacant tile where the unit grows the most food,
    /// then the first building with room, then any location with room.
    #[must_use]
    pub fn vacant_work_location_for(&self, unit: &Unit, owner: &dyn Owner) -> Option<WorkLocationId> {
        let ctx = self.location_context();
        let minuit = owner.has_father(FoundingFather::PeterMinuit);
        let usable = |location: &WorkLocation| match location {
            WorkLocation::Tile(tile) => tile.is_usable(minuit) && tile.can_accept(unit, ctx),
            WorkLocation::Building(building) => building.can_accept(unit, ctx),
        };

        let best_tile = self
            .work_locations
            .iter()
            .enumerate()
            .filter(|&(_, location)| usable(location))
            .filter_map(|(i, location)| location.as_tile().map(|tile| (i, tile)))
            .map(|(i, tile)| (i, tile.potential_for(unit.unit_type, GoodsType::Food, ctx)))
            .fold(None, |best: Option<(usize, u32)>, (i, food)| match best {
                Some((_, best_food)) if best_food >= food => best,
                _ => Some((i, food)),
            });
        if let Some((i, food)) = best_tile {
            if food > 0 {
                return Some(WorkLocationId(i as u32));
            }
        }

        self.work_locations
            .iter()
            .position(|location| location.as_building().is_some() && usable(location))
            .or_else(|| self.work_locations.iter().position(|location| usable(location)))
            .map(|i| WorkLocationId(i as u32))
    }

    /// Add a unit, choosing its work location automatically.
    ///
    /// Non-colonists wait on the colony tile. A colonist nobody can take is
    /// handed back with an advisory message.
    pub fn add_unit(
        &mut self,
        unit: Unit,
        owner: &dyn Owner,
        sink: &mut dyn NotificationSink,
    ) -> Placement {
        if !unit.is_colonist() {
            debug!(colony = self.id.0, unit = unit.id.0, "Unit placed on colony tile");
            self.tile_units.push(unit);
            self.update_population(owner);
            return Placement::OnTile;
        }

        let Some(location) = self.vacant_work_location_for(&unit, owner) else {
            warn!(
                colony = self.id.0,
                unit = unit.id.0,
                "Could not find a work location for unit"
            );
            emit(
                sink,
                self.message(MessageType::Warning, MessageKey::NoWorkLocation)
                    .with_param("unit", unit.unit_type.name())
                    .with_subject(Subject::Unit(unit.id)),
            );
            return Placement::Unplaced(unit);
        };
        self.add_unit_at(unit, location, owner)
    }

    /// Add a unit to a specific work location.
    pub fn add_unit_at(&mut self, unit: Unit, location: WorkLocationId, owner: &dyn Owner) -> Placement {
        let ctx = self.location_context();
        let minuit = owner.has_father(FoundingFather::PeterMinuit);
        let Some(target) = self.work_locations.get_mut(location.0 as usize) else {
            return Placement::Unplaced(unit);
        };
        let result = match target {
            WorkLocation::Tile(tile) if !tile.is_usable(minuit) => Err(unit),
            WorkLocation::Tile(tile) => {
                let goods = if tile.potential_for(unit.unit_type, GoodsType::Food, ctx) > 0 {
                    GoodsType::Food
                } else {
                    tile.best_work_type(unit.unit_type)
                };
                tile.add_worker_for(unit, goods, ctx)
            }
            WorkLocation::Building(building) => building.add_unit(unit, ctx),
        };
        match result {
            Ok(()) => {
                debug!(colony = self.id.0, location = location.0, "Unit placed");
                self.update_population(owner);
                Placement::Working(location)
            }
            Err(unit) => Placement::Unplaced(unit),
        }
    }

    /// Remove a unit from its work location or the colony tile.
    pub fn remove_unit(&mut self, id: UnitId, owner: &dyn Owner) -> Option<Unit> {
        for location in &mut self.work_locations {
            if let Some(unit) = location.remove_unit(id) {
                self.update_population(owner);
                return Some(unit);
            }
        }
        let index = self.tile_units.iter().position(|unit| unit.id == id)?;
        Some(self.tile_units.remove(index))
    }

    /// Add anything to the colony. Returns a unit that could not be placed.
    pub fn add(
        &mut self,
        item: Locatable,
        owner: &dyn Owner,
        sink: &mut dyn NotificationSink,
    ) -> Option<Unit> {
        match item {
            Locatable::Unit(unit) => match self.add_unit(unit, owner, sink) {
                Placement::Unplaced(unit) => Some(unit),
                Placement::Working(_) | Placement::OnTile => None,
            },
            Locatable::Goods(goods, amount) => {
                self.add_goods(goods, amount);
                None
            }
            Locatable::Other(what) => {
                warn!(colony = self.id.0, item = %what, "Tried to add an unrecognized item");
                emit(
                    sink,
                    self.message(MessageType::Warning, MessageKey::UnrecognizedItem)
                        .with_param("item", what),
                );
                None
            }
        }
    }

    pub(crate) fn take_first_occupant(&mut self) -> Option<Unit> {
        let location = self
            .work_locations
            .iter_mut()
            .find(|location| location.unit_count() > 0)?;
        let id = location.units().first()?.id;
        location.remove_unit(id)
    }

    /// Apply population-driven effects after units come or go.
    ///
    /// With La Salle, every colony of three or more gets a free stockade.
    pub fn update_population(&mut self, owner: &dyn Owner) {
        if self.occupant_count() >= 3 && owner.has_father(FoundingFather::LaSalle) {
            let colony = self.id.0;
            if let Some(stockade) = self.building_mut(BuildingType::Stockade) {
                if !stockade.is_built() {
                    stockade.set_level(BuildingLevel::House);
                    info!(colony, "Stockade raised by La Salle");
                }
            }
        }
    }

    // ========================================================================
    // Goods
    // ========================================================================

    /// Amount of goods in stock.
    #[must_use]
    pub fn goods_count(&self, goods: GoodsType) -> u32 {
        self.goods.count(goods)
    }

    /// Add goods to the warehouse.
    pub fn add_goods(&mut self, goods: GoodsType, amount: u32) {
        self.goods.add(goods, amount);
    }

    /// Take goods out of the warehouse.
    ///
    /// # Errors
    ///
    /// [`ColonyError::InsufficientGoods`] when the stock is too small.
    pub fn remove_goods(&mut self, goods: GoodsType, amount: u32) -> Result<()> {
        self.goods.remove(goods, amount)
    }

    /// Storage limit for every goods type except food.
    #[must_use]
    pub fn warehouse_capacity(&self) -> u32 {
        let level = self
            .building(BuildingType::Warehouse)
            .map_or(0, |b| b.level().as_u32());
        BASE_WAREHOUSE_CAPACITY + WAREHOUSE_CAPACITY_PER_LEVEL * level
    }

    /// Whether the custom house exports a goods type.
    #[must_use]
    pub fn exports(&self, goods: GoodsType) -> bool {
        self.warehouse.exports(goods)
    }

    /// Enable or disable exports of a goods type.
    pub fn set_exports(&mut self, goods: GoodsType, value: bool) {
        self.warehouse.set_exports(goods, value);
    }

    /// Stock the custom house keeps.
    #[must_use]
    pub fn export_level(&self, goods: GoodsType) -> u32 {
        self.warehouse.export_level(goods)
    }

    /// Set the stock the custom house keeps.
    pub fn set_export_level(&mut self, goods: GoodsType, level: u32) {
        self.warehouse.set_export_level(goods, level);
    }

    /// Low warning level.
    #[must_use]
    pub fn low_level(&self, goods: GoodsType) -> u32 {
        self.warehouse.low_level(goods)
    }

    /// Set the low warning level.
    pub fn set_low_level(&mut self, goods: GoodsType, level: u32) {
        self.warehouse.set_low_level(goods, level);
    }

    /// High warning level.
    #[must_use]
    pub fn high_level(&self, goods: GoodsType) -> u32 {
        self.warehouse.high_level(goods)
    }

    /// Set the high warning level.
    pub fn set_high_level(&mut self, goods: GoodsType, level: u32) {
        self.warehouse.set_high_level(goods, level);
    }

    // ========================================================================
    // Production
    // ========================================================================

    /// Goods produced next turn, summed over all work locations.
    ///
    /// Horses are bred rather than produced; see
    /// [`Colony::horse_production`].
    #[must_use]
    pub fn production_of(&self, goods: GoodsType) -> u32 {
        if goods == GoodsType::Horses {
            return self.horse_production();
        }
        let ctx = self.location_context();
        self.work_locations
            .iter()
            .map(|location| location.production_of(goods, ctx, &self.goods))
            .sum()
    }

    /// Food grown next turn.
    #[must_use]
    pub fn food_production(&self) -> u32 {
        self.production_of(GoodsType::Food)
    }

    /// Food eaten next turn.
    #[must_use]
    pub fn food_consumption(&self) -> u32 {
        population::food_consumption(self.occupant_count())
    }

    /// Horses bred next turn.
    #[must_use]
    pub fn horse_production(&self) -> u32 {
        let surplus = self.food_production() as i32 - self.food_consumption() as i32;
        population::horse_breeding(
            self.goods.count(GoodsType::Horses),
            self.has_building(BuildingType::Stables),
            surplus,
            self.warehouse_capacity(),
        )
    }

    /// Production minus what the colony itself uses up next turn.
    #[must_use]
    pub fn production_net_of(&self, goods: GoodsType) -> i32 {
        let produced = self.production_of(goods) as i32;
        let used = if goods == GoodsType::Food {
            self.food_consumption() + self.horse_production()
        } else {
            let ctx = self.location_context();
            self.building_for_consuming(goods)
                .map_or(0, |b| b.input_demand(ctx).min(self.goods.count(goods)))
        };
        produced - used as i32
    }

    // ========================================================================
    // Morale
    // ========================================================================

    /// Add bells; see [`MoraleTracker::add_bells`].
    pub fn add_bells(&mut self, amount: i32) {
        let occupants = self.occupant_count();
        self.morale.add_bells(amount, occupants);
    }

    /// Scale the bells by a percentage.
    pub fn add_sol(&mut self, percent: i32) {
        self.morale.add_sol(percent);
    }

    /// Loyalty percentage.
    #[must_use]
    pub const fn sons_of_liberty(&self) -> u32 {
        self.morale.sons_of_liberty()
    }

    /// Number of tories.
    #[must_use]
    pub const fn tories(&self) -> u32 {
        self.morale.tories()
    }

    /// Signed production bonus.
    #[must_use]
    pub const fn production_bonus(&self) -> i32 {
        self.morale.production_bonus()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// What the colony is building.
    #[must_use]
    pub const fn currently_building(&self) -> ConstructionTarget {
        self.construction.target()
    }

    /// Hammers accumulated.
    #[must_use]
    pub const fn hammers(&self) -> u32 {
        self.construction.hammers()
    }

    /// Hammers and tools needed for the current target, if it can progress.
    #[must_use]
    pub fn current_requirement(&self, spec: &Specification) -> Option<Requirement> {
        match self.construction.target() {
            ConstructionTarget::None => None,
            ConstructionTarget::Building(building_type) => {
                let data = spec.building(building_type)?;
                let level = self.building(building_type)?.next_level(data)?;
                Some(Requirement {
                    hammers: level.hammers,
                    tools: level.tools,
                })
            }
            ConstructionTarget::Unit(unit_type) => spec.unit(unit_type).map(|data| Requirement {
                hammers: data.hammers,
                tools: data.tools,
            }),
        }
    }

    /// Display name of a target: the next level of a building, or the unit.
    #[must_use]
    pub fn target_name(&self, target: ConstructionTarget, spec: &Specification) -> String {
        match target {
            ConstructionTarget::Building(building_type) => spec
                .building(building_type)
                .and_then(|data| {
                    let building = self.building(building_type)?;
                    building
                        .next_level(data)
                        .map(|level| level.name.clone())
                        .or_else(|| Some(building.name(data).to_string()))
                })
                .unwrap_or_else(|| target.to_string()),
            other => other.to_string(),
        }
    }

    /// Whether the colony may build a unit type.
    #[must_use]
    pub fn can_build_unit(&self, unit_type: UnitType, spec: &Specification, owner: &dyn Owner) -> bool {
        let Some(data) = spec.unit(unit_type) else {
            return false;
        };
        if data.requires_independence && owner.rebellion_state() != RebellionState::Independent {
            return false;
        }
        data.requires.map_or(true, |req| {
            self.building(req.building)
                .is_some_and(|b| b.level() >= req.level)
        })
    }

    /// Every unit type the colony may build, in specification order.
    #[must_use]
    pub fn buildable_units(&self, spec: &Specification, owner: &dyn Owner) -> Vec<UnitType> {
        spec.units
            .iter()
            .map(|data| data.unit_type)
            .filter(|&unit_type| self.can_build_unit(unit_type, spec, owner))
            .collect()
    }

    /// Select a new construction target.
    ///
    /// A building at its last level, a building needing more colonists, or
    /// a unit the colony cannot build is refused with a warning. Returns
    /// whether the target was accepted.
    pub fn set_currently_building(
        &mut self,
        target: ConstructionTarget,
        spec: &Specification,
        owner: &dyn Owner,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        match target {
            ConstructionTarget::None => {}
            ConstructionTarget::Building(building_type) => {
                let Some(data) = spec.building(building_type) else {
                    return false;
                };
                let Some(building) = self.building(building_type) else {
                    return false;
                };
                let Some(next) = building.next_level(data) else {
                    emit(
                        sink,
                        self.message(MessageType::Warning, MessageKey::AlreadyBuilt)
                            .with_param("building", building.name(data)),
                    );
                    return false;
                };
                if next.population > self.occupant_count() {
                    emit(
                        sink,
                        self.message(MessageType::Warning, MessageKey::BuildNeedPop)
                            .with_param("building", &next.name),
                    );
                    return false;
                }
            }
            ConstructionTarget::Unit(unit_type) => {
                if !self.can_build_unit(unit_type, spec, owner) {
                    emit(sink, self.message(MessageType::Warning, MessageKey::CannotBuild));
                    return false;
                }
            }
        }
        debug!(colony = self.id.0, target = %target, "Construction target set");
        self.construction.set_target(target);
        true
    }

    /// Add hammers to the construction queue.
    ///
    /// With no target, or a building that needs more colonists or has no
    /// further level, a warning is emitted and the hammers are lost.
    pub fn add_hammers(&mut self, amount: u32, spec: &Specification, sink: &mut dyn NotificationSink) {
        match self.construction.target() {
            ConstructionTarget::None => {
                emit(sink, self.message(MessageType::Warning, MessageKey::CannotBuild));
                return;
            }
            ConstructionTarget::Building(building_type) => {
                let Some(data) = spec.building(building_type) else {
                    return;
                };
                let Some(building) = self.building(building_type) else {
                    return;
                };
                match building.next_level(data) {
                    Some(next) if next.population > self.occupant_count() => {
                        emit(
                            sink,
                            self.message(MessageType::Warning, MessageKey::BuildNeedPop)
                                .with_param("building", &next.name),
                        );
                        return;
                    }
                    Some(_) => {}
                    None => {
                        emit(
                            sink,
                            self.message(MessageType::Warning, MessageKey::AlreadyBuilt)
                                .with_param("building", building.name(data)),
                        );
                        return;
                    }
                }
            }
            ConstructionTarget::Unit(_) => {}
        }
        self.construction.add_hammers(amount);
    }

    fn remaining_costs(&self, spec: &Specification) -> (u32, u32) {
        self.current_requirement(spec).map_or((0, 0), |req| {
            (
                req.hammers.saturating_sub(self.construction.hammers()),
                req.tools.saturating_sub(self.goods.count(GoodsType::Tools)),
            )
        })
    }

    /// Gold needed to finish the current target right now.
    #[must_use]
    pub fn price_for_building(&self, spec: &Specification, owner: &dyn Owner) -> u32 {
        let (hammers, tools) = self.remaining_costs(spec);
        hammers * spec.options.hammer_price
            + owner.bid_price(GoodsType::Tools, tools) * spec.options.tool_price_markup_percent / 100
    }

    /// Buy the missing hammers and tools for the current target.
    ///
    /// # Errors
    ///
    /// [`ColonyError::InsufficientGold`] when the owner cannot afford
    /// [`Colony::price_for_building`]; nothing is bought in that case.
    pub fn pay_for_building(&mut self, spec: &Specification, owner: &mut dyn Owner) -> Result<()> {
        let price = self.price_for_building(spec, owner);
        if price > owner.gold() {
            return Err(ColonyError::InsufficientGold {
                required: price,
                available: owner.gold(),
            });
        }
        let Some(requirement) = self.current_requirement(spec) else {
            return Ok(());
        };
        let (hammers, tools) = self.remaining_costs(spec);
        if hammers > 0 {
            owner.spend_gold(hammers * spec.options.hammer_price)?;
        }
        if tools > 0 {
            owner.buy(GoodsType::Tools, tools)?;
            self.goods.add(GoodsType::Tools, tools);
        }
        let total = self.construction.hammers().max(requirement.hammers);
        self.construction.set_hammers(total);
        info!(colony = self.id.0, price, "Paid for construction");
        Ok(())
    }

    pub(crate) fn message(&self, message_type: MessageType, key: MessageKey) -> ColonyMessage {
        ColonyMessage::new(self.id, message_type, key).with_param("colony", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GridMap, TerrainType};
    use crate::owner::{NationId, Player};
    use crate::units::UnitIdAllocator;

    struct Fixture {
        spec: Specification,
        map: GridMap,
        player: Player,
        ids: UnitIdAllocator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                spec: Specification::classic(),
                map: GridMap::new(5, 5, TerrainType::Plains),
                player: Player::new(PlayerId(0), "Dutch", NationId(0)).with_gold(1000),
                ids: UnitIdAllocator::new(),
            }
        }

        fn found(&mut self) -> Colony {
            let tile = self.map.tile_at(2, 2).unwrap();
            Colony::found(ColonyId(0), "Jamestown", &self.player, tile, &mut self.map, &self.spec)
                .unwrap()
        }

        fn unit(&mut self, unit_type: UnitType) -> Unit {
            Unit::new(self.ids.allocate(), unit_type)
        }
    }

    #[test]
    fn test_found_claims_and_builds() {
        let mut fx = Fixture::new();
        let colony = fx.found();

        assert_eq!(colony.work_locations().len(), 9 + BuildingType::ALL.len());
        assert!(colony.work_locations()[0].as_tile().unwrap().is_center());
        assert!(colony.is_land_locked());
        assert_eq!(
            colony.currently_building(),
            ConstructionTarget::Building(BuildingType::Warehouse)
        );
        assert!(colony.has_building(BuildingType::TownHall));
        assert!(!colony.has_building(BuildingType::Docks));

        let claim = TileClaim::European(NationId(0));
        for neighbour in fx.map.neighbours(colony.tile().unwrap()) {
            assert_eq!(fx.map.tile(neighbour).unwrap().claim, claim);
        }
        assert!(fx.map.is_explored(PlayerId(0), fx.map.tile_at(3, 3).unwrap()));
    }

    #[test]
    fn test_coastal_colony_builds_docks() {
        let mut fx = Fixture::new();
        let sea = fx.map.tile_at(1, 1).unwrap();
        fx.map.set_terrain(sea, TerrainType::Ocean).unwrap();
        let colony = fx.found();
        assert!(!colony.is_land_locked());
        assert_eq!(
            colony.currently_building(),
            ConstructionTarget::Building(BuildingType::Docks)
        );
    }

    #[test]
    fn test_found_keeps_foreign_claims() {
        let mut fx = Fixture::new();
        let native = fx.map.tile_at(3, 2).unwrap();
        fx.map.claim_tile(native, TileClaim::Native(NationId(7))).unwrap();
        let colony = fx.found();
        assert_eq!(
            colony.colony_tile(native).unwrap().claim(),
            TileClaim::Native(NationId(7))
        );
    }

    #[test]
    fn test_vacancy_prefers_food_tile() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let mut sink = Vec::new();

        let unit = fx.unit(UnitType::FreeColonist);
        let placement = colony.add_unit(unit, &fx.player, &mut sink);
        let Placement::Working(id) = placement else {
            panic!("unit should be placed");
        };
        let tile = colony.work_location(id).unwrap().as_tile().unwrap();
        assert!(!tile.is_center());
        assert_eq!(tile.work_type(), GoodsType::Food);
        assert_eq!(colony.food_production(), 10);
    }

    #[test]
    fn test_vacancy_falls_back_to_buildings() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let mut sink = Vec::new();

        // Eight neighbour tiles, then buildings in declaration order
        for _ in 0..8 {
            let unit = fx.unit(UnitType::FreeColonist);
            colony.add_unit(unit, &fx.player, &mut sink);
        }
        let unit = fx.unit(UnitType::FreeColonist);
        let Placement::Working(id) = colony.add_unit(unit, &fx.player, &mut sink) else {
            panic!("unit should be placed");
        };
        assert_eq!(
            colony.work_location(id).unwrap().as_building().unwrap().building_type(),
            BuildingType::TownHall
        );
        assert_eq!(colony.occupant_count(), 9);
    }

    #[test]
    fn test_native_land_needs_peter_minuit() {
        let mut fx = Fixture::new();
        for (x, y) in [(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)] {
            let tile = fx.map.tile_at(x, y).unwrap();
            fx.map.claim_tile(tile, TileClaim::Native(NationId(5))).unwrap();
        }
        let mut colony = fx.found();
        let unit = fx.unit(UnitType::FreeColonist);
        let id = colony.vacant_work_location_for(&unit, &fx.player).unwrap();
        assert!(colony.work_location(id).unwrap().as_building().is_some());

        let minuit = fx.player.clone().with_father(FoundingFather::PeterMinuit);
        let id = colony.vacant_work_location_for(&unit, &minuit).unwrap();
        assert!(colony.work_location(id).unwrap().as_tile().is_some());
    }

    #[test]
    fn test_non_colonists_wait_on_tile() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let wagon = fx.unit(UnitType::WagonTrain);
        assert_eq!(colony.add_unit(wagon, &fx.player, &mut Vec::new()), Placement::OnTile);
        assert_eq!(colony.tile_units().len(), 1);
        assert_eq!(colony.occupant_count(), 0);
    }

    #[test]
    fn test_unrecognized_item() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let mut sink = Vec::new();
        assert!(colony
            .add(Locatable::Other("treasure".into()), &fx.player, &mut sink)
            .is_none());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].key, MessageKey::UnrecognizedItem);

        colony.add(Locatable::Goods(GoodsType::Ore, 30), &fx.player, &mut sink);
        assert_eq!(colony.goods_count(GoodsType::Ore), 30);
    }

    #[test]
    fn test_la_salle_raises_stockade() {
        let mut fx = Fixture::new();
        fx.player = fx.player.clone().with_father(FoundingFather::LaSalle);
        let mut colony = fx.found();
        for _ in 0..2 {
            let unit = fx.unit(UnitType::FreeColonist);
            colony.add_unit(unit, &fx.player, &mut Vec::new());
        }
        assert!(!colony.has_stockade());
        let unit = fx.unit(UnitType::FreeColonist);
        colony.add_unit(unit, &fx.player, &mut Vec::new());
        assert!(colony.has_stockade());
    }

    #[test]
    fn test_defending_unit() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let err = colony.defending_unit().unwrap_err();
        assert!(matches!(err, ColonyError::NoUnits { .. }));
        assert!(err.is_fatal());

        let unit = fx.unit(UnitType::VeteranSoldier);
        let id = unit.id;
        colony.add_unit(unit, &fx.player, &mut Vec::new());
        assert_eq!(colony.defending_unit().unwrap().id, id);

        assert!(colony.remove_unit(id, &fx.player).is_some());
        assert!(colony.defending_unit().is_err());
    }

    #[test]
    fn test_warehouse_capacity_follows_level() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        assert_eq!(colony.warehouse_capacity(), 100);
        colony.building_mut(BuildingType::Warehouse).unwrap().upgrade();
        assert_eq!(colony.warehouse_capacity(), 200);
        colony.building_mut(BuildingType::Warehouse).unwrap().upgrade();
        assert_eq!(colony.warehouse_capacity(), 300);
    }

    #[test]
    fn test_set_currently_building_rules() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let mut sink = Vec::new();

        // Stockade needs three colonists
        assert!(!colony.set_currently_building(
            ConstructionTarget::Building(BuildingType::Stockade),
            &fx.spec,
            &fx.player,
            &mut sink
        ));
        assert_eq!(sink.last().unwrap().key, MessageKey::BuildNeedPop);

        // Town hall has a single level
        assert!(!colony.set_currently_building(
            ConstructionTarget::Building(BuildingType::TownHall),
            &fx.spec,
            &fx.player,
            &mut sink
        ));
        assert_eq!(sink.last().unwrap().key, MessageKey::AlreadyBuilt);

        // Ships need a shipyard
        assert!(!colony.set_currently_building(
            ConstructionTarget::Unit(UnitType::Caravel),
            &fx.spec,
            &fx.player,
            &mut sink
        ));

        assert!(colony.set_currently_building(
            ConstructionTarget::Unit(UnitType::WagonTrain),
            &fx.spec,
            &fx.player,
            &mut sink
        ));
        assert_eq!(
            colony.currently_building(),
            ConstructionTarget::Unit(UnitType::WagonTrain)
        );
    }

    #[test]
    fn test_add_hammers_without_target_is_noop() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let mut sink = Vec::new();
        colony.set_currently_building(ConstructionTarget::None, &fx.spec, &fx.player, &mut sink);
        colony.add_hammers(10, &fx.spec, &mut sink);
        assert_eq!(colony.hammers(), 0);
        assert_eq!(sink.last().unwrap().key, MessageKey::CannotBuild);
    }

    #[test]
    fn test_buildable_units() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        assert_eq!(
            colony.buildable_units(&fx.spec, &fx.player),
            vec![UnitType::WagonTrain]
        );

        colony.building_mut(BuildingType::Armory).unwrap().upgrade();
        for _ in 0..3 {
            colony.building_mut(BuildingType::Docks).unwrap().upgrade();
        }
        let units = colony.buildable_units(&fx.spec, &fx.player);
        assert!(units.contains(&UnitType::Artillery));
        assert!(units.contains(&UnitType::Frigate));
        assert!(!units.contains(&UnitType::ManOWar));

        fx.player.rebellion = RebellionState::DeclaredIndependence;
        assert!(!colony
            .buildable_units(&fx.spec, &fx.player)
            .contains(&UnitType::ManOWar));

        fx.player.rebellion = RebellionState::Independent;
        assert!(colony
            .buildable_units(&fx.spec, &fx.player)
            .contains(&UnitType::ManOWar));
    }

    #[test]
    fn test_price_and_pay_for_building() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        // Warehouse: 80 hammers, no tools
        colony.construction.add_hammers(30);
        assert_eq!(colony.price_for_building(&fx.spec, &fx.player), 50 * 20);

        fx.player.gold = 999;
        let err = colony.pay_for_building(&fx.spec, &mut fx.player).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(fx.player.gold, 999);
        assert_eq!(colony.hammers(), 30);

        fx.player.gold = 1000;
        colony.pay_for_building(&fx.spec, &mut fx.player).unwrap();
        assert_eq!(fx.player.gold, 0);
        assert_eq!(colony.hammers(), 80);
    }

    #[test]
    fn test_pay_buys_missing_tools() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        colony.construction.set_target(ConstructionTarget::Unit(UnitType::Artillery));
        colony.building_mut(BuildingType::Armory).unwrap().upgrade();
        colony.construction.add_hammers(192);
        colony.add_goods(GoodsType::Tools, 30);

        // 10 tools at 2 gold with a 110% markup
        assert_eq!(colony.price_for_building(&fx.spec, &fx.player), 22);
        colony.pay_for_building(&fx.spec, &mut fx.player).unwrap();
        assert_eq!(colony.goods_count(GoodsType::Tools), 40);
        assert_eq!(fx.player.gold, 980);
    }

    #[test]
    fn test_net_production() {
        let mut fx = Fixture::new();
        let mut colony = fx.found();
        let unit = fx.unit(UnitType::FreeColonist);
        colony.add_unit(unit, &fx.player, &mut Vec::new());
        // Centre 5 + worker 5 - 2 eaten
        assert_eq!(colony.production_net_of(GoodsType::Food), 8);

        let carpenter = colony.building_location(BuildingType::Carpenter).unwrap();
        let unit = fx.unit(UnitType::FreeColonist);
        colony.add_unit_at(unit, WorkLocationId(carpenter as u32), &fx.player);
        colony.add_goods(GoodsType::Lumber, 2);
        assert_eq!(colony.production_net_of(GoodsType::Lumber), -2);
        assert_eq!(colony.production_of(GoodsType::Hammers), 2);
    }
}
