//! Per-turn colony processing.
//!
//! [`Colony::new_turn`] runs a fixed sequence of steps. The order matters:
//! food settles before growth, the carpenter produces before the completion
//! gate, and the warehouse is clamped before loyalty is recomputed.
//!
//! 1. Snapshot the warehouse
//! 2. Tile production
//! 3. Food: starvation or famine warning, then abandonment when empty
//! 4. Horse breeding
//! 5. Growth from a food surplus
//! 6. Carpenter, then blacksmith
//! 7. Ship repairs
//! 8. Construction completion
//! 9. Remaining buildings
//! 10. Custom house exports
//! 11. Warehouse clamp and level reports
//! 12. Overflow forecast
//! 13. Bell decay, loyalty and production bonus

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::buildings::BuildingType;
use crate::colony::Colony;
use crate::construction::{CompletionCheck, ConstructionTarget};
use crate::data::Specification;
use crate::error::{ColonyError, Result};
use crate::goods::{GoodsType, WarehouseEvent};
use crate::messages::{emit, MessageKey, MessageType, NotificationSink, Subject};
use crate::morale::MoraleEvent;
use crate::owner::{MarketAccess, Owner};
use crate::population::{self, FoodOutcome, FOOD_FOR_NEW_COLONIST};
use crate::units::{Unit, UnitId, UnitIdAllocator, UnitType};
use crate::work_location::{WorkLocation, WorkSite};

/// Game turn counter.
pub type TurnNumber = u32;

/// Everything a colony needs from outside while processing a turn.
pub struct TurnContext<'a> {
    /// Turn being processed.
    pub turn: TurnNumber,
    /// Rule tables.
    pub spec: &'a Specification,
    /// The colony's owner.
    pub owner: &'a mut dyn Owner,
    /// Source of ids for units created this turn.
    pub units: &'a mut UnitIdAllocator,
    /// Receiver of advisory messages.
    pub sink: &'a mut dyn NotificationSink,
}

/// Why a colony was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The colony is only observed from outside.
    ForeignObserved,
    /// The colony is not on the map.
    NoTile,
}

/// What happened to a colony during one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Colonist lost to starvation.
    pub starved: Option<UnitId>,
    /// Colonist born from the food surplus.
    pub new_colonist: Option<UnitId>,
    /// Horses bred.
    pub horses_bred: u32,
    /// Ships that finished repairs.
    pub repaired: Vec<UnitId>,
    /// Construction target completed.
    pub completed: Option<ConstructionTarget>,
    /// Unit produced by the construction queue.
    pub built_unit: Option<UnitId>,
    /// Goods sold through the custom house.
    pub exported: Vec<(GoodsType, u32)>,
    /// Gold earned from exports.
    pub export_proceeds: u32,
    /// Goods thrown away by the warehouse.
    pub wasted: Vec<(GoodsType, u32)>,
    /// Loyalty percentage after the turn.
    pub sons_of_liberty: u32,
    /// Production bonus after the turn.
    pub production_bonus: i32,
}

/// Result of [`Colony::new_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The colony was not processed.
    Skipped(SkipReason),
    /// The colony completed the turn.
    Processed(TurnSummary),
    /// The last colonist starved and the colony was dissolved.
    Abandoned,
}

impl Colony {
    /// Process one turn.
    ///
    /// # Errors
    ///
    /// Fatal errors only: a completion that violates its preconditions
    /// ([`ColonyError::NotCompletable`]) or a ledger inconsistency. Game
    /// conditions such as starvation or missing tools become messages.
    pub fn new_turn(&mut self, ctx: &mut TurnContext<'_>) -> Result<TurnOutcome> {
        if self.observed_unit_count.is_some() {
            return Ok(TurnOutcome::Skipped(SkipReason::ForeignObserved));
        }
        if self.tile.is_none() {
            return Ok(TurnOutcome::Skipped(SkipReason::NoTile));
        }

        let mut summary = TurnSummary::default();
        self.goods.snapshot_for_warning();

        self.produce_tiles(ctx)?;

        summary.starved = self.update_food(ctx);
        if self.occupant_count() == 0 {
            self.dissolve();
            return Ok(TurnOutcome::Abandoned);
        }

        summary.horses_bred = self.update_horses()?;
        summary.new_colonist = self.check_for_new_colonist(ctx)?;

        self.produce_building(BuildingType::Carpenter, ctx)?;
        self.produce_building(BuildingType::Blacksmith, ctx)?;

        summary.repaired = self.repair_ships(ctx);

        if let Some((target, unit)) = self.check_building_complete(ctx)? {
            summary.completed = Some(target);
            summary.built_unit = unit;
        }

        for building_type in BuildingType::ALL {
            self.produce_building(building_type, ctx)?;
        }

        let (exported, proceeds) = self.export_goods(ctx)?;
        summary.exported = exported;
        summary.export_proceeds = proceeds;

        summary.wasted = self.clamp_warehouse(ctx);
        self.warn_soon_full(ctx);

        self.update_morale(ctx);
        summary.sons_of_liberty = self.morale.sons_of_liberty();
        summary.production_bonus = self.morale.production_bonus();

        debug!(
            colony = self.id.0,
            turn = ctx.turn,
            units = self.occupant_count(),
            sol = summary.sons_of_liberty,
            bonus = summary.production_bonus,
            "Colony turn processed"
        );
        Ok(TurnOutcome::Processed(summary))
    }

    // ========================================================================
    // Production
    // ========================================================================

    fn produce_tiles(&mut self, ctx: &mut TurnContext<'_>) -> Result<()> {
        let lctx = self.location_context();
        for i in 0..self.work_locations.len() {
            if !matches!(self.work_locations[i], WorkLocation::Tile(_)) {
                continue;
            }
            let produced = self.work_locations[i].new_turn(ctx.turn, lctx, &mut self.goods)?;
            self.route_outputs(produced, ctx);
        }
        Ok(())
    }

    fn produce_building(&mut self, building_type: BuildingType, ctx: &mut TurnContext<'_>) -> Result<()> {
        let Some(i) = self.building_location(building_type) else {
            return Ok(());
        };
        let lctx = self.location_context();
        let produced = self.work_locations[i].new_turn(ctx.turn, lctx, &mut self.goods)?;
        self.route_outputs(produced, ctx);
        Ok(())
    }

    /// Hammers feed construction, bells feed loyalty and crosses go to the
    /// owner. Everything else is stored.
    fn route_outputs(&mut self, produced: Vec<(GoodsType, u32)>, ctx: &mut TurnContext<'_>) {
        for (goods, amount) in produced {
            match goods {
                GoodsType::Hammers => self.add_hammers(amount, ctx.spec, ctx.sink),
                GoodsType::Bells => self.add_bells(amount as i32),
                GoodsType::Crosses => ctx.owner.add_crosses(amount),
                _ => self.goods.add(goods, amount),
            }
        }
    }

    // ========================================================================
    // Population
    // ========================================================================

    fn update_food(&mut self, ctx: &mut TurnContext<'_>) -> Option<UnitId> {
        let consumption = self.food_consumption();
        let production = self.food_production();
        let stock = self.goods.count(GoodsType::Food);

        match population::settle_food(stock, consumption, production) {
            FoodOutcome::Starved => {
                self.goods.remove_all(GoodsType::Food);
                let unit = self.take_first_occupant()?;
                self.update_population(&*ctx.owner);
                info!(colony = self.id.0, unit = unit.id.0, "Colonist starved");
                emit(
                    ctx.sink,
                    self.message(MessageType::UnitLost, MessageKey::ColonistStarved)
                        .with_param("unit", unit.unit_type.name())
                        .with_subject(Subject::Unit(unit.id)),
                );
                Some(unit.id)
            }
            FoodOutcome::Fed {
                remaining,
                famine_in,
            } => {
                self.goods.remove_all(GoodsType::Food);
                self.goods.add(GoodsType::Food, remaining);
                if let Some(turns) = famine_in {
                    emit(
                        ctx.sink,
                        self.message(MessageType::Warning, MessageKey::FamineFeared)
                            .with_param("number", turns)
                            .with_subject(Subject::Goods(GoodsType::Food)),
                    );
                }
                None
            }
        }
    }

    /// Each bred horse eats one food from the stock.
    fn update_horses(&mut self) -> Result<u32> {
        let bred = self.horse_production();
        if bred > 0 {
            self.goods.add(GoodsType::Horses, bred);
            let food = self.goods.count(GoodsType::Food);
            self.goods.remove(GoodsType::Food, bred.min(food))?;
        }
        Ok(bred)
    }

    fn check_for_new_colonist(&mut self, ctx: &mut TurnContext<'_>) -> Result<Option<UnitId>> {
        if self.goods.count(GoodsType::Food) < FOOD_FOR_NEW_COLONIST {
            return Ok(None);
        }
        self.goods.remove(GoodsType::Food, FOOD_FOR_NEW_COLONIST)?;
        let unit = Unit::new(ctx.units.allocate(), UnitType::FreeColonist);
        let id = unit.id;
        self.tile_units.push(unit);
        info!(colony = self.id.0, unit = id.0, "New colonist born");
        emit(
            ctx.sink,
            self.message(MessageType::UnitAdded, MessageKey::NewColonist)
                .with_subject(Subject::Unit(id)),
        );
        Ok(Some(id))
    }

    /// Remove every unit and location from a colony that lost its last
    /// colonist.
    fn dissolve(&mut self) {
        info!(colony = self.id.0, name = %self.name, "Colony abandoned");
        self.work_locations.clear();
        self.tile_units.clear();
        self.tile = None;
    }

    fn repair_ships(&mut self, ctx: &mut TurnContext<'_>) -> Vec<UnitId> {
        let mut repaired = Vec::new();
        for unit in &mut self.tile_units {
            if unit.is_naval() && unit.repair_step() {
                repaired.push(unit.id);
            }
        }
        for &id in &repaired {
            let name = self
                .tile_units
                .iter()
                .find(|unit| unit.id == id)
                .map_or("ship", |unit| unit.unit_type.name());
            emit(
                ctx.sink,
                self.message(MessageType::Default, MessageKey::ShipRepaired)
                    .with_param("unit", name)
                    .with_subject(Subject::Unit(id)),
            );
        }
        repaired
    }

    // ========================================================================
    // Construction
    // ========================================================================

    fn check_building_complete(
        &mut self,
        ctx: &mut TurnContext<'_>,
    ) -> Result<Option<(ConstructionTarget, Option<UnitId>)>> {
        let requirement = self.current_requirement(ctx.spec);
        let tools_on_hand = self.goods.count(GoodsType::Tools);
        let target = self.construction.target();

        match self
            .construction
            .check_complete(ctx.turn, requirement, tools_on_hand)
        {
            CompletionCheck::AlreadyChecked
            | CompletionCheck::Idle
            | CompletionCheck::Accumulating { .. } => Ok(None),
            CompletionCheck::MissingTools {
                required,
                available,
            } => {
                emit(
                    ctx.sink,
                    self.message(MessageType::MissingGoods, MessageKey::ItemNeedTools)
                        .with_param("item", self.target_name(target, ctx.spec))
                        .with_param("amount", required)
                        .with_param("have", available)
                        .with_subject(Subject::Goods(GoodsType::Tools)),
                );
                Ok(None)
            }
            CompletionCheck::Ready { target, tools } => match target {
                ConstructionTarget::None => Ok(None),
                ConstructionTarget::Building(building_type) => {
                    self.complete_building(building_type, tools, ctx)?;
                    Ok(Some((target, None)))
                }
                ConstructionTarget::Unit(unit_type) => {
                    let id = self.complete_unit(unit_type, tools, ctx)?;
                    Ok(Some((target, Some(id))))
                }
            },
        }
    }

    fn not_completable(&self, target: ConstructionTarget) -> ColonyError {
        ColonyError::NotCompletable {
            colony: self.name.clone(),
            target: target.to_string(),
        }
    }

    fn complete_building(
        &mut self,
        building_type: BuildingType,
        tools: u32,
        ctx: &mut TurnContext<'_>,
    ) -> Result<()> {
        let target = ConstructionTarget::Building(building_type);
        let data = ctx
            .spec
            .building(building_type)
            .ok_or_else(|| self.not_completable(target))?;
        let next_name = self
            .building(building_type)
            .filter(|building| building.can_build_next(data))
            .and_then(|building| building.next_level(data))
            .map(|level| level.name.clone())
            .ok_or_else(|| self.not_completable(target))?;

        if tools > 0 {
            self.goods.remove(GoodsType::Tools, tools)?;
        }
        self.construction.finish();

        let mut last_level = false;
        if let Some(building) = self.building_mut(building_type) {
            building.upgrade();
            last_level = !building.can_build_next(data);
        }
        if last_level {
            self.construction.set_target(ConstructionTarget::None);
        }

        info!(colony = self.id.0, building = %next_name, "Building completed");
        emit(
            ctx.sink,
            self.message(MessageType::BuildingCompleted, MessageKey::BuildingReady)
                .with_param("building", next_name)
                .with_subject(Subject::Colony(self.id)),
        );
        Ok(())
    }

    fn complete_unit(
        &mut self,
        unit_type: UnitType,
        tools: u32,
        ctx: &mut TurnContext<'_>,
    ) -> Result<UnitId> {
        if !self.can_build_unit(unit_type, ctx.spec, &*ctx.owner) {
            return Err(self.not_completable(ConstructionTarget::Unit(unit_type)));
        }
        if tools > 0 {
            self.goods.remove(GoodsType::Tools, tools)?;
        }
        self.construction.finish();

        let unit = Unit::new(ctx.units.allocate(), unit_type);
        let id = unit.id;
        self.tile_units.push(unit);

        info!(colony = self.id.0, unit = id.0, unit_type = unit_type.name(), "Unit built");
        emit(
            ctx.sink,
            self.message(MessageType::UnitAdded, MessageKey::UnitReady)
                .with_param("unit", unit_type.name())
                .with_subject(Subject::Unit(id)),
        );
        Ok(id)
    }

    // ========================================================================
    // Warehouse
    // ========================================================================

    fn sells_through_custom_house(&self, goods: GoodsType, owner: &dyn Owner) -> bool {
        self.warehouse.exports(goods) && owner.can_trade(goods, MarketAccess::CustomHouse)
    }

    fn export_goods(&mut self, ctx: &mut TurnContext<'_>) -> Result<(Vec<(GoodsType, u32)>, u32)> {
        let mut exported = Vec::new();
        let mut proceeds = 0;
        if !self.has_building(BuildingType::CustomHouse) {
            return Ok((exported, proceeds));
        }
        for goods in GoodsType::STORABLE {
            if !self.sells_through_custom_house(goods, &*ctx.owner) {
                continue;
            }
            let amount = self
                .goods
                .count(goods)
                .saturating_sub(self.warehouse.export_level(goods));
            if amount == 0 {
                continue;
            }
            self.goods.remove(goods, amount)?;
            proceeds += ctx.owner.sell(goods, amount, MarketAccess::CustomHouse);
            exported.push((goods, amount));
        }
        if !exported.is_empty() {
            debug!(colony = self.id.0, ?exported, proceeds, "Custom house exports");
        }
        Ok((exported, proceeds))
    }

    fn clamp_warehouse(&mut self, ctx: &mut TurnContext<'_>) -> Vec<(GoodsType, u32)> {
        let capacity = self.warehouse_capacity();
        let report = self.goods.clamp_to_capacity(capacity, &self.warehouse);

        for event in &report.events {
            let message = match *event {
                WarehouseEvent::Wasted { goods, amount } => self
                    .message(MessageType::WarehouseCapacity, MessageKey::WarehouseWaste)
                    .with_param("goods", goods)
                    .with_param("amount", amount)
                    .with_subject(Subject::Goods(goods)),
                WarehouseEvent::Full { goods } => self
                    .message(MessageType::WarehouseCapacity, MessageKey::WarehouseFull)
                    .with_param("goods", goods)
                    .with_param("level", capacity)
                    .with_subject(Subject::Goods(goods)),
                WarehouseEvent::AboveHighLevel {
                    goods,
                    level,
                    amount,
                } => self
                    .message(MessageType::WarehouseCapacity, MessageKey::WarehouseAboveHigh)
                    .with_param("goods", goods)
                    .with_param("level", level)
                    .with_param("amount", amount)
                    .with_subject(Subject::Goods(goods)),
                WarehouseEvent::BelowLowLevel {
                    goods,
                    level,
                    amount,
                } => self
                    .message(MessageType::WarehouseCapacity, MessageKey::WarehouseBelowLow)
                    .with_param("goods", goods)
                    .with_param("level", level)
                    .with_param("amount", amount)
                    .with_subject(Subject::Goods(goods)),
            };
            emit(ctx.sink, message);
        }
        report.discarded()
    }

    /// Warn about goods that next turn's net production will push over
    /// capacity. Food and goods the custom house sells are exempt.
    fn warn_soon_full(&self, ctx: &mut TurnContext<'_>) {
        let capacity = self.warehouse_capacity();
        for goods in GoodsType::STORABLE {
            if goods == GoodsType::Food || self.sells_through_custom_house(goods, &*ctx.owner) {
                continue;
            }
            let count = self.goods.count(goods);
            if count >= capacity {
                continue;
            }
            let waste = count as i32 + self.production_net_of(goods) - capacity as i32;
            if waste > 0 {
                emit(
                    ctx.sink,
                    self.message(MessageType::WarehouseCapacity, MessageKey::WarehouseSoonFull)
                        .with_param("goods", goods)
                        .with_param("amount", waste)
                        .with_subject(Subject::Goods(goods)),
                );
            }
        }
    }

    // ========================================================================
    // Morale
    // ========================================================================

    fn update_morale(&mut self, ctx: &mut TurnContext<'_>) {
        let occupants = self.occupant_count();
        self.morale.decay(occupants);
        self.morale.update_sol(occupants);

        let events = self
            .morale
            .recompute_bonus(ctx.owner.difficulty(), ctx.owner.is_ai());
        for event in events {
            let message = match event {
                MoraleEvent::SolIncrease { old, new } => self
                    .message(MessageType::SonsOfLiberty, MessageKey::SolIncrease)
                    .with_param("oldSoL", old)
                    .with_param("newSoL", new),
                MoraleEvent::SolDecrease { old, new } => self
                    .message(MessageType::SonsOfLiberty, MessageKey::SolDecrease)
                    .with_param("oldSoL", old)
                    .with_param("newSoL", new),
                MoraleEvent::Sol100 => {
                    self.message(MessageType::SonsOfLiberty, MessageKey::Sol100)
                }
                MoraleEvent::Sol50 => self.message(MessageType::SonsOfLiberty, MessageKey::Sol50),
                MoraleEvent::VeryBadGovernment => self
                    .message(MessageType::GovernmentEfficiency, MessageKey::VeryBadGovernment),
                MoraleEvent::BadGovernment => {
                    self.message(MessageType::GovernmentEfficiency, MessageKey::BadGovernment)
                }
                MoraleEvent::GovernmentImprovedStillBad => self.message(
                    MessageType::GovernmentEfficiency,
                    MessageKey::GovernmentImproved1,
                ),
                MoraleEvent::GovernmentImproved => self.message(
                    MessageType::GovernmentEfficiency,
                    MessageKey::GovernmentImproved2,
                ),
            };
            emit(ctx.sink, message.with_subject(Subject::Colony(self.id)));
        }
        self.morale.remember();
    }
}
