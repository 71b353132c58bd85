//! Advisory messages emitted during colony processing.
//!
//! The core never logs on the player's behalf. Recoverable game conditions
//! become [`ColonyMessage`] values pushed to a [`NotificationSink`]; the
//! caller decides how to present them.

use serde::{Deserialize, Serialize};

use crate::colony::ColonyId;
use crate::goods::GoodsType;
use crate::units::UnitId;

/// Severity / category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Plain information.
    Default,
    /// Something needs attention.
    Warning,
    /// A unit was created.
    UnitAdded,
    /// A unit was lost.
    UnitLost,
    /// A building level was completed.
    BuildingCompleted,
    /// Construction is blocked by missing goods.
    MissingGoods,
    /// Warehouse stock crossed a level or overflowed.
    WarehouseCapacity,
    /// Loyalty changed.
    SonsOfLiberty,
    /// Government efficiency changed.
    GovernmentEfficiency,
}

/// Message template key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKey {
    /// Hammers arrived with nothing to build.
    CannotBuild,
    /// The colony is too small for the selected building.
    BuildNeedPop,
    /// The selected building is at its last level.
    AlreadyBuilt,
    /// A unit was built.
    UnitReady,
    /// A building level was built.
    BuildingReady,
    /// Construction waits for tools.
    ItemNeedTools,
    /// A colonist starved.
    ColonistStarved,
    /// Famine is near.
    FamineFeared,
    /// Food surplus produced a colonist.
    NewColonist,
    /// Next turn's production will overflow the warehouse.
    WarehouseSoonFull,
    /// Goods above capacity were thrown away.
    WarehouseWaste,
    /// Stock reached capacity.
    WarehouseFull,
    /// Stock rose above the high level.
    WarehouseAboveHigh,
    /// Stock fell below the low level.
    WarehouseBelowLow,
    /// A ship finished its repairs.
    ShipRepaired,
    /// Loyalty rose into a new decile.
    SolIncrease,
    /// Loyalty fell into a new decile.
    SolDecrease,
    /// Loyalty reached 100%.
    Sol100,
    /// Loyalty reached 50%.
    Sol50,
    /// Government became very bad.
    VeryBadGovernment,
    /// Government became bad.
    BadGovernment,
    /// Government improved but is still bad.
    GovernmentImproved1,
    /// Government is no longer bad.
    GovernmentImproved2,
    /// A colonist found no vacant work location.
    NoWorkLocation,
    /// Something that is neither a unit nor goods was added.
    UnrecognizedItem,
}

impl MessageKey {
    /// Localization key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::CannotBuild => "model.colony.cannotBuild",
            Self::BuildNeedPop => "model.colony.buildNeedPop",
            Self::AlreadyBuilt => "model.colony.alreadyBuilt",
            Self::UnitReady => "model.colony.unitReady",
            Self::BuildingReady => "model.colony.buildingReady",
            Self::ItemNeedTools => "model.colony.itemNeedTools",
            Self::ColonistStarved => "model.colony.colonistStarved",
            Self::FamineFeared => "model.colony.famineFeared",
            Self::NewColonist => "model.colony.newColonist",
            Self::WarehouseSoonFull => "model.building.warehouseSoonFull",
            Self::WarehouseWaste => "model.building.warehouseWaste",
            Self::WarehouseFull => "model.building.warehouseFull",
            Self::WarehouseAboveHigh => "model.building.warehouseAboveHigh",
            Self::WarehouseBelowLow => "model.building.warehouseBelowLow",
            Self::ShipRepaired => "model.unit.shipRepaired",
            Self::SolIncrease => "model.colony.SoLIncrease",
            Self::SolDecrease => "model.colony.SoLDecrease",
            Self::Sol100 => "model.colony.SoL100",
            Self::Sol50 => "model.colony.SoL50",
            Self::VeryBadGovernment => "model.colony.veryBadGovernment",
            Self::BadGovernment => "model.colony.badGovernment",
            Self::GovernmentImproved1 => "model.colony.governmentImproved1",
            Self::GovernmentImproved2 => "model.colony.governmentImproved2",
            Self::NoWorkLocation => "model.colony.noWorkLocation",
            Self::UnrecognizedItem => "model.colony.unrecognizedItem",
        }
    }
}

/// What a message points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// The colony itself.
    Colony(ColonyId),
    /// A unit.
    Unit(UnitId),
    /// A goods type.
    Goods(GoodsType),
}

/// One advisory message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColonyMessage {
    /// Colony the message is about.
    pub colony: ColonyId,
    /// Category.
    pub message_type: MessageType,
    /// Template key.
    pub key: MessageKey,
    /// Template substitutions, in insertion order.
    pub params: Vec<(String, String)>,
    /// Optional subject.
    pub subject: Option<Subject>,
}

impl ColonyMessage {
    /// Create a message without parameters.
    #[must_use]
    pub fn new(colony: ColonyId, message_type: MessageType, key: MessageKey) -> Self {
        Self {
            colony,
            message_type,
            key,
            params: Vec::new(),
            subject: None,
        }
    }

    /// Builder: add a template parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Builder: set the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Value of a template parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Receiver of advisory messages. Delivery never fails.
pub trait NotificationSink {
    /// Accept a message.
    fn notify(&mut self, message: ColonyMessage);
}

impl NotificationSink for Vec<ColonyMessage> {
    fn notify(&mut self, message: ColonyMessage) {
        self.push(message);
    }
}

/// Log a message and hand it to the sink.
pub fn emit(sink: &mut dyn NotificationSink, message: ColonyMessage) {
    tracing::debug!(
        colony = message.colony.0,
        key = message.key.key(),
        params = ?message.params,
        "Colony message"
    );
    sink.notify(message);
}
