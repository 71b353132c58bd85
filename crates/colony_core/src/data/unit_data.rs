//! Unit build costs and prerequisites.

use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingLevel, BuildingType};
use crate::units::UnitType;

/// A building level a colony needs before it can build a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRequirement {
    /// Required building.
    pub building: BuildingType,
    /// Minimum level of that building.
    pub level: BuildingLevel,
}

/// Construction data for one buildable unit type.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     unit_type: Galleon,
///     hammers: 320,
///     tools: 100,
///     requires: Some(UnitRequirement(building: Docks, level: Factory)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitData {
    /// Unit type built.
    pub unit_type: UnitType,

    /// Hammers needed.
    pub hammers: u32,

    /// Tools consumed on completion.
    #[serde(default)]
    pub tools: u32,

    /// Building prerequisite.
    #[serde(default)]
    pub requires: Option<UnitRequirement>,

    /// Only buildable once the owner has declared independence.
    #[serde(default)]
    pub requires_independence: bool,
}
