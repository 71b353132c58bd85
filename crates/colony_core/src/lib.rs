//! # Colony Core
//!
//! Deterministic per-turn simulation of colonies in a turn-based colonial
//! strategy game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//!
//! This separation enables:
//! - Headless simulation from scenario files
//! - Save games that restore bit-for-bit
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`game`] - Game state and the turn loop
//! - [`colony`] - The colony aggregate
//! - [`turn`] - The per-colony turn pipeline
//! - [`work_location`] - Buildings and tiles colonists work in
//! - [`goods`] - Goods types, the warehouse and its thresholds
//! - [`construction`] - The construction queue
//! - [`morale`] - Bells, Sons of Liberty and the production bonus
//! - [`data`] - Rule tables loaded from RON

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buildings;
pub mod colony;
pub mod construction;
pub mod data;
pub mod error;
pub mod game;
pub mod goods;
pub mod map;
pub mod messages;
pub mod morale;
pub mod owner;
pub mod population;
pub mod turn;
pub mod units;
pub mod work_location;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buildings::{Building, BuildingLevel, BuildingType};
    pub use crate::colony::{Colony, ColonyId, Locatable, Placement};
    pub use crate::construction::{ConstructionState, ConstructionTarget};
    pub use crate::data::{GameOptions, Specification};
    pub use crate::error::{ColonyError, Result};
    pub use crate::game::{Game, TurnReport};
    pub use crate::goods::{GoodsLedger, GoodsType};
    pub use crate::map::{GameMap, GridMap, TerrainType, TileClaim, TileId};
    pub use crate::messages::{ColonyMessage, MessageKey, MessageType, NotificationSink};
    pub use crate::owner::{FoundingFather, NationId, Owner, Player, PlayerId, RebellionState};
    pub use crate::turn::{SkipReason, TurnContext, TurnNumber, TurnOutcome, TurnSummary};
    pub use crate::units::{Unit, UnitId, UnitType};
    pub use crate::work_location::{WorkLocation, WorkLocationId, WorkSite};
}
