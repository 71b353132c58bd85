//! Unit types and the unit instances that live in and around a colony.
//!
//! Units are plain values. A colonist working in a building or on a tile is
//! owned by that work location; wagon trains, artillery and ships stay on
//! the colony tile and are owned by the colony's tile roster.

use serde::{Deserialize, Serialize};

use crate::goods::GoodsType;
use crate::map::TerrainType;

/// Unique identifier for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Hands out unit identifiers in increasing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitIdAllocator {
    next: u32,
}

impl UnitIdAllocator {
    /// Create an allocator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next identifier.
    pub fn allocate(&mut self) -> UnitId {
        let id = UnitId(self.next);
        self.next += 1;
        id
    }

    /// The identifier that will be handed out next.
    #[must_use]
    pub const fn peek(&self) -> UnitId {
        UnitId(self.next)
    }

    /// Whether `id` was handed out by this allocator.
    #[must_use]
    pub const fn has_issued(&self, id: UnitId) -> bool {
        id.0 < self.next
    }
}

/// Every unit type the colony can host or build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Unskilled colonist.
    FreeColonist,
    /// Works buildings at reduced output.
    IndenturedServant,
    /// Works buildings at minimal output.
    PettyCriminal,
    /// Food expert on land.
    ExpertFarmer,
    /// Food expert on water.
    ExpertFisherman,
    /// Fur expert.
    ExpertFurTrapper,
    /// Lumber expert.
    ExpertLumberjack,
    /// Ore expert.
    ExpertOreMiner,
    /// Hammer expert.
    MasterCarpenter,
    /// Tool expert.
    MasterBlacksmith,
    /// Bell expert.
    ElderStatesman,
    /// Cross expert.
    FirebrandPreacher,
    /// Musket expert.
    VeteranSoldier,
    /// Land transport.
    WagonTrain,
    /// Siege unit.
    Artillery,
    /// Small ship.
    Caravel,
    /// Cargo ship.
    Merchantman,
    /// Large cargo ship.
    Galleon,
    /// Raiding ship.
    Privateer,
    /// Warship.
    Frigate,
    /// Heavy warship, only available after independence.
    ManOWar,
}

impl UnitType {
    /// All unit types in declaration order.
    pub const ALL: [Self; 21] = [
        Self::FreeColonist,
        Self::IndenturedServant,
        Self::PettyCriminal,
        Self::ExpertFarmer,
        Self::ExpertFisherman,
        Self::ExpertFurTrapper,
        Self::ExpertLumberjack,
        Self::ExpertOreMiner,
        Self::MasterCarpenter,
        Self::MasterBlacksmith,
        Self::ElderStatesman,
        Self::FirebrandPreacher,
        Self::VeteranSoldier,
        Self::WagonTrain,
        Self::Artillery,
        Self::Caravel,
        Self::Merchantman,
        Self::Galleon,
        Self::Privateer,
        Self::Frigate,
        Self::ManOWar,
    ];

    /// Position of this type in [`UnitType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look a type up by its index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FreeColonist => "Free Colonist",
            Self::IndenturedServant => "Indentured Servant",
            Self::PettyCriminal => "Petty Criminal",
            Self::ExpertFarmer => "Expert Farmer",
            Self::ExpertFisherman => "Expert Fisherman",
            Self::ExpertFurTrapper => "Expert Fur Trapper",
            Self::ExpertLumberjack => "Expert Lumberjack",
            Self::ExpertOreMiner => "Expert Ore Miner",
            Self::MasterCarpenter => "Master Carpenter",
            Self::MasterBlacksmith => "Master Blacksmith",
            Self::ElderStatesman => "Elder Statesman",
            Self::FirebrandPreacher => "Firebrand Preacher",
            Self::VeteranSoldier => "Veteran Soldier",
            Self::WagonTrain => "Wagon Train",
            Self::Artillery => "Artillery",
            Self::Caravel => "Caravel",
            Self::Merchantman => "Merchantman",
            Self::Galleon => "Galleon",
            Self::Privateer => "Privateer",
            Self::Frigate => "Frigate",
            Self::ManOWar => "Man-o-War",
        }
    }

    /// Whether this unit can work in a colony.
    #[must_use]
    pub const fn is_colonist(self) -> bool {
        (self as usize) <= (Self::VeteranSoldier as usize)
    }

    /// Whether this unit is a ship.
    #[must_use]
    pub const fn is_naval(self) -> bool {
        matches!(
            self,
            Self::Caravel
                | Self::Merchantman
                | Self::Galleon
                | Self::Privateer
                | Self::Frigate
                | Self::ManOWar
        )
    }

    /// Goods this unit is an expert at producing.
    #[must_use]
    pub const fn expertise(self) -> Option<GoodsType> {
        match self {
            Self::ExpertFarmer | Self::ExpertFisherman => Some(GoodsType::Food),
            Self::ExpertFurTrapper => Some(GoodsType::Furs),
            Self::ExpertLumberjack => Some(GoodsType::Lumber),
            Self::ExpertOreMiner => Some(GoodsType::Ore),
            Self::MasterCarpenter => Some(GoodsType::Hammers),
            Self::MasterBlacksmith => Some(GoodsType::Tools),
            Self::ElderStatesman => Some(GoodsType::Bells),
            Self::FirebrandPreacher => Some(GoodsType::Crosses),
            Self::VeteranSoldier => Some(GoodsType::Muskets),
            _ => None,
        }
    }

    /// Teaching skill; 0 for units that cannot teach.
    #[must_use]
    pub const fn skill(self) -> u8 {
        match self {
            Self::ExpertFarmer
            | Self::ExpertFisherman
            | Self::ExpertFurTrapper
            | Self::ExpertLumberjack
            | Self::ExpertOreMiner => 1,
            Self::MasterCarpenter | Self::MasterBlacksmith | Self::VeteranSoldier => 2,
            Self::ElderStatesman | Self::FirebrandPreacher => 3,
            _ => 0,
        }
    }

    /// Base output per turn when working in a building producing `output`.
    #[must_use]
    pub fn building_productivity(self, output: GoodsType) -> i32 {
        if !self.is_colonist() {
            return 0;
        }
        if self.expertise() == Some(output) {
            return 6;
        }
        match self {
            Self::PettyCriminal => 1,
            Self::IndenturedServant => 2,
            _ => 3,
        }
    }

    /// Base output per turn when farming `goods` on `terrain`.
    ///
    /// Experts double the terrain potential. The fisherman only counts as an
    /// expert on water and the farmer only on land.
    #[must_use]
    pub fn tile_productivity(self, goods: GoodsType, terrain: TerrainType) -> u32 {
        if !self.is_colonist() {
            return 0;
        }
        let base = terrain.potential(goods);
        let expert = match self {
            Self::ExpertFisherman => goods == GoodsType::Food && terrain.is_water(),
            Self::ExpertFarmer => goods == GoodsType::Food && !terrain.is_water(),
            other => other.expertise() == Some(goods),
        };
        if expert {
            base * 2
        } else {
            base
        }
    }

    /// Hitpoints of an undamaged unit.
    #[must_use]
    pub const fn initial_hitpoints(self) -> u32 {
        match self {
            Self::Caravel => 6,
            Self::Merchantman | Self::Privateer => 8,
            Self::Galleon => 10,
            Self::Frigate => 12,
            Self::ManOWar => 16,
            _ => 1,
        }
    }
}

/// A unit instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Type of the unit.
    pub unit_type: UnitType,
    /// Current hitpoints.
    pub hitpoints: u32,
    /// Whether a damaged ship is waiting in port for repairs.
    pub under_repair: bool,
}

impl Unit {
    /// Create an undamaged unit.
    #[must_use]
    pub const fn new(id: UnitId, unit_type: UnitType) -> Self {
        Self {
            id,
            unit_type,
            hitpoints: unit_type.initial_hitpoints(),
            under_repair: false,
        }
    }

    /// Create a damaged ship waiting for repairs.
    #[must_use]
    pub fn damaged(id: UnitId, unit_type: UnitType, hitpoints: u32) -> Self {
        Self {
            id,
            unit_type,
            hitpoints: hitpoints.min(unit_type.initial_hitpoints()),
            under_repair: hitpoints < unit_type.initial_hitpoints(),
        }
    }

    /// Whether this unit can work in a colony.
    #[must_use]
    pub const fn is_colonist(&self) -> bool {
        self.unit_type.is_colonist()
    }

    /// Whether this unit is a ship.
    #[must_use]
    pub const fn is_naval(&self) -> bool {
        self.unit_type.is_naval()
    }

    /// Repair one hitpoint. Returns `true` when this step finished the repair.
    pub fn repair_step(&mut self) -> bool {
        if !self.under_repair {
            return false;
        }
        self.hitpoints += 1;
        if self.hitpoints >= self.unit_type.initial_hitpoints() {
            self.hitpoints = self.unit_type.initial_hitpoints();
            self.under_repair = false;
            return true;
        }
        false
    }
}
