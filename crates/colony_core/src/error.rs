//! Error types for the colony simulation.
//!
//! Game conditions that the player can react to (missing tools, famine,
//! a full warehouse) are never errors: they are reported as
//! [`ColonyMessage`](crate::messages::ColonyMessage)s. The variants here are
//! either caller mistakes or broken invariants that abort the operation.

use thiserror::Error;

use crate::goods::GoodsType;

/// Result type alias using [`ColonyError`].
pub type Result<T> = std::result::Result<T, ColonyError>;

/// Top-level error type for all colony simulation errors.
#[derive(Debug, Error)]
pub enum ColonyError {
    /// Tried to remove more goods than are stored.
    #[error("Insufficient goods: need {requested} {goods}, have {available}")]
    InsufficientGoods {
        /// Goods type.
        goods: GoodsType,
        /// Amount requested.
        requested: u32,
        /// Amount in stock.
        available: u32,
    },

    /// The owner cannot pay for the requested purchase.
    #[error("Not enough gold: need {required}, have {available}")]
    InsufficientGold {
        /// Price of the purchase.
        required: u32,
        /// Gold held by the owner.
        available: u32,
    },

    /// A defender was requested from a colony without occupants.
    #[error("Colony {colony} contains no units")]
    NoUnits {
        /// Colony name.
        colony: String,
    },

    /// The completion gate passed but the target cannot actually be built.
    #[error("Cannot build {target} in colony {colony}")]
    NotCompletable {
        /// Colony name.
        colony: String,
        /// Display name of the construction target.
        target: String,
    },

    /// Unknown tile identifier.
    #[error("Tile not found: {0}")]
    TileNotFound(u32),

    /// Unknown colony identifier.
    #[error("Colony not found: {0}")]
    ColonyNotFound(u32),

    /// Unknown player identifier.
    #[error("Player not found: {0}")]
    PlayerNotFound(u32),

    /// A persisted cross reference does not resolve within the save.
    #[error("Unresolved reference in save: {0}")]
    UnresolvedReference(String),

    /// An integer code does not name a construction target.
    #[error("Invalid construction target code: {0}")]
    InvalidTargetCode(i32),

    /// Specification data parsing error.
    #[error("Failed to parse specification: {0}")]
    DataParseError(String),

    /// Specification data is inconsistent.
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),

    /// Invalid game state (serialization, corrupted saves).
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl ColonyError {
    /// Whether this error signals a corrupted state or a violated
    /// precondition rather than a bad request.
    ///
    /// Fatal errors abort the current turn and should be surfaced as an
    /// unrecoverable condition, never as an in-game message.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientGold { .. }
                | Self::NoUnits { .. }
                | Self::NotCompletable { .. }
                | Self::UnresolvedReference(_)
                | Self::InvalidState(_)
        )
    }
}
