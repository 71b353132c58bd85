//! Colony buildings.
//!
//! Every colony owns one [`Building`] per [`BuildingType`], created at
//! founding. A building starts either unbuilt or at house level, depending
//! on whether its first level costs hammers, and is upgraded one level at
//! a time by the construction queue.
//!
//! # Production
//!
//! Each worker contributes its productivity for the building's output plus
//! the colony production bonus, floored at zero. Town hall and church add
//! one base point. Buildings that transform an input are limited by the
//! input in stock, and factory level turns the same input into 50% more
//! output.

use serde::{Deserialize, Serialize};

use crate::data::{BuildingData, LevelData};
use crate::error::Result;
use crate::goods::{GoodsLedger, GoodsType};
use crate::turn::TurnNumber;
use crate::units::{Unit, UnitId};
use crate::work_location::{LocationContext, WorkSite};

/// Maximum number of workers in a production building.
pub const WORKER_CAPACITY: usize = 3;

/// Every building type, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Produces bells.
    TownHall,
    /// Turns lumber into hammers.
    Carpenter,
    /// Turns ore into tools.
    Blacksmith,
    /// Turns tobacco into cigars.
    Tobacconist,
    /// Turns cotton into cloth.
    Weaver,
    /// Turns sugar into rum.
    Distiller,
    /// Turns furs into coats.
    FurTrader,
    /// Turns tools into muskets.
    Armory,
    /// Produces crosses.
    Church,
    /// Hosts teachers.
    Schoolhouse,
    /// Defensive walls.
    Stockade,
    /// Raises warehouse capacity.
    Warehouse,
    /// Speeds up horse breeding.
    Stables,
    /// Allows ocean tiles to be worked; higher levels repair and build ships.
    Docks,
    /// Helps bell production.
    PrintingPress,
    /// Exports goods automatically.
    CustomHouse,
}

impl BuildingType {
    /// All building types in declaration order.
    pub const ALL: [Self; 16] = [
        Self::TownHall,
        Self::Carpenter,
        Self::Blacksmith,
        Self::Tobacconist,
        Self::Weaver,
        Self::Distiller,
        Self::FurTrader,
        Self::Armory,
        Self::Church,
        Self::Schoolhouse,
        Self::Stockade,
        Self::Warehouse,
        Self::Stables,
        Self::Docks,
        Self::PrintingPress,
        Self::CustomHouse,
    ];

    /// Position of this type in [`BuildingType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look a type up by its index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Goods produced by workers in this building.
    #[must_use]
    pub const fn output(self) -> Option<GoodsType> {
        match self {
            Self::TownHall => Some(GoodsType::Bells),
            Self::Carpenter => Some(GoodsType::Hammers),
            Self::Blacksmith => Some(GoodsType::Tools),
            Self::Tobacconist => Some(GoodsType::Cigars),
            Self::Weaver => Some(GoodsType::Cloth),
            Self::Distiller => Some(GoodsType::Rum),
            Self::FurTrader => Some(GoodsType::Coats),
            Self::Armory => Some(GoodsType::Muskets),
            Self::Church => Some(GoodsType::Crosses),
            _ => None,
        }
    }

    /// Goods consumed to produce the output.
    #[must_use]
    pub const fn input(self) -> Option<GoodsType> {
        match self {
            Self::Carpenter => Some(GoodsType::Lumber),
            Self::Blacksmith => Some(GoodsType::Ore),
            Self::Tobacconist => Some(GoodsType::Tobacco),
            Self::Weaver => Some(GoodsType::Cotton),
            Self::Distiller => Some(GoodsType::Sugar),
            Self::FurTrader => Some(GoodsType::Furs),
            Self::Armory => Some(GoodsType::Tools),
            _ => None,
        }
    }

    /// Output produced without any worker.
    #[must_use]
    pub const fn base_production(self) -> u32 {
        match self {
            Self::TownHall | Self::Church => 1,
            _ => 0,
        }
    }

    /// Number of workers the building can hold.
    #[must_use]
    pub const fn worker_capacity(self) -> usize {
        if self.output().is_some() || matches!(self, Self::Schoolhouse) {
            WORKER_CAPACITY
        } else {
            0
        }
    }
}

/// Construction level of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum BuildingLevel {
    /// Not constructed yet.
    #[default]
    NotBuilt,
    /// First level.
    House,
    /// Second level.
    Shop,
    /// Third level.
    Factory,
}

impl BuildingLevel {
    /// Numeric level, 0 for unbuilt.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// The level after this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotBuilt => Some(Self::House),
            Self::House => Some(Self::Shop),
            Self::Shop => Some(Self::Factory),
            Self::Factory => None,
        }
    }
}

/// A building in a colony.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    building_type: BuildingType,
    level: BuildingLevel,
    units: Vec<Unit>,
    last_production: Option<TurnNumber>,
}

impl Building {
    /// Create an empty building at the given level.
    #[must_use]
    pub const fn new(building_type: BuildingType, level: BuildingLevel) -> Self {
        Self {
            building_type,
            level,
            units: Vec::new(),
            last_production: None,
        }
    }

    /// Type of the building.
    #[must_use]
    pub const fn building_type(&self) -> BuildingType {
        self.building_type
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> BuildingLevel {
        self.level
    }

    /// Whether the building has been constructed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.level != BuildingLevel::NotBuilt
    }

    /// Display name of the current level, or of the first level if unbuilt.
    #[must_use]
    pub fn name<'a>(&self, data: &'a BuildingData) -> &'a str {
        let index = self.level.as_u32().saturating_sub(1) as usize;
        data.levels.get(index).map_or("", |level| level.name.as_str())
    }

    /// Cost table entry for the next level.
    #[must_use]
    pub fn next_level<'a>(&self, data: &'a BuildingData) -> Option<&'a LevelData> {
        data.next_level(self.level)
    }

    /// Whether another level can still be built.
    #[must_use]
    pub fn can_build_next(&self, data: &BuildingData) -> bool {
        self.level.next().is_some() && self.next_level(data).is_some()
    }

    /// Raise the building one level. Does nothing at factory level.
    pub fn upgrade(&mut self) {
        if let Some(next) = self.level.next() {
            self.level = next;
        }
    }

    /// Set the level directly.
    pub fn set_level(&mut self, level: BuildingLevel) {
        self.level = level;
    }

    /// Output before the input limit, for the current workers.
    fn raw_output(&self, ctx: LocationContext) -> u32 {
        let Some(output) = self.building_type.output() else {
            return 0;
        };
        if !self.is_built() {
            return 0;
        }
        let workers: i32 = self
            .units
            .iter()
            .map(|unit| (unit.unit_type.building_productivity(output) + ctx.production_bonus).max(0))
            .sum();
        self.building_type.base_production() + workers as u32
    }

    fn scale_for_level(&self, amount: u32) -> u32 {
        if self.level == BuildingLevel::Factory {
            amount * 3 / 2
        } else {
            amount
        }
    }

    /// Input goods the workers would consume next turn with unlimited stock.
    #[must_use]
    pub fn input_demand(&self, ctx: LocationContext) -> u32 {
        if self.building_type.input().is_some() {
            self.raw_output(ctx)
        } else {
            0
        }
    }

    /// Input consumed and output produced given the current stock.
    fn consumption_and_output(&self, ctx: LocationContext, stock: &GoodsLedger) -> (u32, u32) {
        let raw = self.raw_output(ctx);
        match self.building_type.input() {
            Some(input) => {
                let used = raw.min(stock.count(input));
                (used, self.scale_for_level(used))
            }
            None => (0, self.scale_for_level(raw)),
        }
    }
}

impl WorkSite for Building {
    fn can_accept(&self, unit: &Unit, _ctx: LocationContext) -> bool {
        if !self.is_built() || !unit.is_colonist() {
            return false;
        }
        if self.units.len() >= self.building_type.worker_capacity() {
            return false;
        }
        if self.building_type == BuildingType::Schoolhouse {
            let skill = u32::from(unit.unit_type.skill());
            return skill > 0 && skill <= self.level.as_u32();
        }
        true
    }

    fn production_of(&self, goods: GoodsType, ctx: LocationContext, stock: &GoodsLedger) -> u32 {
        if self.building_type.output() != Some(goods) {
            return 0;
        }
        self.consumption_and_output(ctx, stock).1
    }

    fn units(&self) -> &[Unit] {
        &self.units
    }

    fn add_unit(&mut self, unit: Unit, ctx: LocationContext) -> std::result::Result<(), Unit> {
        if !self.can_accept(&unit, ctx) {
            return Err(unit);
        }
        self.units.push(unit);
        Ok(())
    }

    fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let index = self.units.iter().position(|unit| unit.id == id)?;
        Some(self.units.remove(index))
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

        let Some(output) = self.building_type.output() else {
            return Ok(Vec::new());
        };
        let (used, produced) = self.consumption_and_output(ctx, ledger);
        if let Some(input) = self.building_type.input() {
            if used > 0 {
                ledger.remove(input, used)?;
            }
        }
        tracing::trace!(
            building = ?self.building_type,
            used,
            produced,
            "Building production"
        );
        if produced == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![(output, produced)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitType;

    fn ctx(bonus: i32) -> LocationContext {
        LocationContext {
            production_bonus: bonus,
            has_docks: false,
        }
    }

    fn colonist(id: u32, unit_type: UnitType) -> Unit {
        Unit::new(UnitId(id), unit_type)
    }

    #[test]
    fn test_unbuilt_building_accepts_nobody() {
        let building = Building::new(BuildingType::Armory, BuildingLevel::NotBuilt);
        assert!(!building.can_accept(&colonist(0, UnitType::FreeColonist), ctx(0)));
        assert_eq!(
            building.production_of(GoodsType::Muskets, ctx(0), &GoodsLedger::new()),
            0
        );
    }

    #[test]
    fn test_capacity_and_non_colonists() {
        let mut building = Building::new(BuildingType::Weaver, BuildingLevel::House);
        assert!(building
            .add_unit(colonist(9, UnitType::WagonTrain), ctx(0))
            .is_err());
        for id in 0..3 {
            building
                .add_unit(colonist(id, UnitType::FreeColonist), ctx(0))
                .unwrap();
        }
        assert!(!building.can_accept(&colonist(3, UnitType::FreeColonist), ctx(0)));
        assert_eq!(building.unit_count(), 3);
        assert!(building.remove_unit(UnitId(1)).is_some());
        assert!(building.remove_unit(UnitId(1)).is_none());
    }

    #[test]
    fn test_storage_buildings_hold_no_workers() {
        let building = Building::new(BuildingType::Warehouse, BuildingLevel::House);
        assert!(!building.can_accept(&colonist(0, UnitType::FreeColonist), ctx(0)));
    }

    #[test]
    fn test_schoolhouse_accepts_experts_by_level() {
        let mut school = Building::new(BuildingType::Schoolhouse, BuildingLevel::House);
        assert!(!school.can_accept(&colonist(0, UnitType::FreeColonist), ctx(0)));
        assert!(school.can_accept(&colonist(1, UnitType::ExpertFarmer), ctx(0)));
        assert!(!school.can_accept(&colonist(2, UnitType::ElderStatesman), ctx(0)));
        school.set_level(BuildingLevel::Factory);
        assert!(school.can_accept(&colonist(2, UnitType::ElderStatesman), ctx(0)));
    }

    #[test]
    fn test_production_limited_by_input() {
        let mut carpenter = Building::new(BuildingType::Carpenter, BuildingLevel::House);
        carpenter
            .add_unit(colonist(0, UnitType::FreeColonist), ctx(0))
            .unwrap();
        carpenter
            .add_unit(colonist(1, UnitType::MasterCarpenter), ctx(0))
            .unwrap();

        let mut ledger = GoodsLedger::new();
        ledger.add(GoodsType::Lumber, 5);
        assert_eq!(carpenter.input_demand(ctx(0)), 9);
        assert_eq!(carpenter.production_of(GoodsType::Hammers, ctx(0), &ledger), 5);

        ledger.add(GoodsType::Lumber, 20);
        assert_eq!(carpenter.production_of(GoodsType::Hammers, ctx(0), &ledger), 9);
        assert_eq!(carpenter.production_of(GoodsType::Hammers, ctx(1), &ledger), 11);
    }

    #[test]
    fn test_bonus_floors_each_worker_at_zero() {
        let mut distiller = Building::new(BuildingType::Distiller, BuildingLevel::House);
        distiller
            .add_unit(colonist(0, UnitType::PettyCriminal), ctx(0))
            .unwrap();
        distiller
            .add_unit(colonist(1, UnitType::FreeColonist), ctx(0))
            .unwrap();
        let mut ledger = GoodsLedger::new();
        ledger.add(GoodsType::Sugar, 50);
        assert_eq!(distiller.production_of(GoodsType::Rum, ctx(-2), &ledger), 1);
    }

    #[test]
    fn test_factory_bonus_output() {
        let mut armory = Building::new(BuildingType::Armory, BuildingLevel::Factory);
        armory
            .add_unit(colonist(0, UnitType::FreeColonist), ctx(0))
            .unwrap();
        armory
            .add_unit(colonist(1, UnitType::FreeColonist), ctx(0))
            .unwrap();
        let mut ledger = GoodsLedger::new();
        ledger.add(GoodsType::Tools, 100);
        assert_eq!(armory.production_of(GoodsType::Muskets, ctx(0), &ledger), 9);

        let produced = armory.new_turn(1, ctx(0), &mut ledger).unwrap();
        assert_eq!(produced, vec![(GoodsType::Muskets, 9)]);
        assert_eq!(ledger.count(GoodsType::Tools), 94);
    }

    #[test]
    fn test_town_hall_base_production() {
        let hall = Building::new(BuildingType::TownHall, BuildingLevel::House);
        assert_eq!(
            hall.production_of(GoodsType::Bells, ctx(0), &GoodsLedger::new()),
            1
        );
    }

    #[test]
    fn test_new_turn_is_idempotent_per_turn() {
        let mut smith = Building::new(BuildingType::Blacksmith, BuildingLevel::House);
        smith
            .add_unit(colonist(0, UnitType::FreeColonist), ctx(0))
            .unwrap();
        let mut ledger = GoodsLedger::new();
        ledger.add(GoodsType::Ore, 10);

        assert_eq!(
            smith.new_turn(4, ctx(0), &mut ledger).unwrap(),
            vec![(GoodsType::Tools, 3)]
        );
        assert!(smith.new_turn(4, ctx(0), &mut ledger).unwrap().is_empty());
        assert_eq!(ledger.count(GoodsType::Ore), 7);
        assert_eq!(smith.new_turn(5, ctx(0), &mut ledger).unwrap().len(), 1);
    }

    #[test]
    fn test_level_progression() {
        assert_eq!(BuildingLevel::NotBuilt.next(), Some(BuildingLevel::House));
        assert_eq!(BuildingLevel::Factory.next(), None);
        let mut building = Building::new(BuildingType::Docks, BuildingLevel::NotBuilt);
        building.upgrade();
        assert!(building.is_built());
        assert_eq!(building.level(), BuildingLevel::House);
    }
}
