//! Goods types, goods-keyed tables and the colony warehouse ledger.
//!
//! The ledger stores integer amounts per goods type. At the end of each
//! turn it is clamped to the warehouse capacity, reporting everything it
//! discards and every low/high level crossing relative to the snapshot
//! taken at the start of the turn.
//!
//! All calculations use integer math for deterministic simulation.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{ColonyError, Result};

/// Every kind of goods known to the simulation.
///
/// The first sixteen variants are storable and live in the warehouse.
/// Hammers, bells and crosses are produced by buildings but never stored:
/// they feed the construction queue, the morale tracker and the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoodsType {
    /// Eaten by colonists, breeds horses and new colonists.
    Food,
    /// Raw sugar.
    Sugar,
    /// Raw tobacco.
    Tobacco,
    /// Raw cotton.
    Cotton,
    /// Raw furs.
    Furs,
    /// Lumber, turned into hammers by the carpenter.
    Lumber,
    /// Ore, turned into tools by the blacksmith.
    Ore,
    /// Silver.
    Silver,
    /// Horses, bred from food surplus.
    Horses,
    /// Rum.
    Rum,
    /// Cigars.
    Cigars,
    /// Cloth.
    Cloth,
    /// Coats.
    Coats,
    /// Trade goods.
    TradeGoods,
    /// Tools, consumed by construction and the armory.
    Tools,
    /// Muskets.
    Muskets,
    /// Construction progress.
    Hammers,
    /// Liberty bells.
    Bells,
    /// Religious crosses.
    Crosses,
}

impl GoodsType {
    /// Number of goods types.
    pub const COUNT: usize = 19;

    /// All goods types in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Food,
        Self::Sugar,
        Self::Tobacco,
        Self::Cotton,
        Self::Furs,
        Self::Lumber,
        Self::Ore,
        Self::Silver,
        Self::Horses,
        Self::Rum,
        Self::Cigars,
        Self::Cloth,
        Self::Coats,
        Self::TradeGoods,
        Self::Tools,
        Self::Muskets,
        Self::Hammers,
        Self::Bells,
        Self::Crosses,
    ];

    /// Goods types that are kept in the warehouse.
    pub const STORABLE: [Self; 16] = [
        Self::Food,
        Self::Sugar,
        Self::Tobacco,
        Self::Cotton,
        Self::Furs,
        Self::Lumber,
        Self::Ore,
        Self::Silver,
        Self::Horses,
        Self::Rum,
        Self::Cigars,
        Self::Cloth,
        Self::Coats,
        Self::TradeGoods,
        Self::Tools,
        Self::Muskets,
    ];

    /// Position of this goods type in [`GoodsType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the warehouse stores this goods type.
    #[must_use]
    pub const fn is_storable(self) -> bool {
        !matches!(self, Self::Hammers | Self::Bells | Self::Crosses)
    }

    /// Lower-case display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Sugar => "sugar",
            Self::Tobacco => "tobacco",
            Self::Cotton => "cotton",
            Self::Furs => "furs",
            Self::Lumber => "lumber",
            Self::Ore => "ore",
            Self::Silver => "silver",
            Self::Horses => "horses",
            Self::Rum => "rum",
            Self::Cigars => "cigars",
            Self::Cloth => "cloth",
            Self::Coats => "coats",
            Self::TradeGoods => "trade goods",
            Self::Tools => "tools",
            Self::Muskets => "muskets",
            Self::Hammers => "hammers",
            Self::Bells => "bells",
            Self::Crosses => "crosses",
        }
    }
}

impl fmt::Display for GoodsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Goods-keyed table
// ============================================================================

/// Fixed-size table with one entry per [`GoodsType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoodsTable<T>([T; GoodsType::COUNT]);

impl<T> GoodsTable<T> {
    /// Build a table by evaluating `f` for every goods type.
    pub fn from_fn(mut f: impl FnMut(GoodsType) -> T) -> Self {
        Self(std::array::from_fn(|i| f(GoodsType::ALL[i])))
    }

    /// Iterate over `(goods, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (GoodsType, &T)> {
        GoodsType::ALL.iter().copied().zip(self.0.iter())
    }
}

impl<T: Copy> GoodsTable<T> {
    /// Table with every entry set to `value`.
    #[must_use]
    pub const fn filled(value: T) -> Self {
        Self([value; GoodsType::COUNT])
    }
}

impl<T: Default> Default for GoodsTable<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<GoodsType> for GoodsTable<T> {
    type Output = T;

    fn index(&self, goods: GoodsType) -> &T {
        &self.0[goods.index()]
    }
}

impl<T> IndexMut<GoodsType> for GoodsTable<T> {
    fn index_mut(&mut self, goods: GoodsType) -> &mut T {
        &mut self.0[goods.index()]
    }
}

// ============================================================================
// Warehouse settings
// ============================================================================

/// Warning thresholds and export settings for one goods type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehouseLevels {
    /// Warn when the stock drops below this amount.
    pub low: u32,
    /// Warn when the stock rises above this amount.
    pub high: u32,
    /// The custom house keeps this much and exports the rest.
    pub export_level: u32,
    /// Whether the custom house exports this goods type.
    pub export: bool,
}

impl Default for WarehouseLevels {
    fn default() -> Self {
        Self {
            low: 10,
            high: 90,
            export_level: 50,
            export: false,
        }
    }
}

/// Per-goods warehouse warning thresholds and custom house settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WarehouseSettings(GoodsTable<WarehouseLevels>);

impl WarehouseSettings {
    /// Settings with the documented defaults (low 10, high 90, export 50,
    /// exports disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All levels for a goods type.
    #[must_use]
    pub fn levels(&self, goods: GoodsType) -> &WarehouseLevels {
        &self.0[goods]
    }

    /// Mutable levels for a goods type.
    pub fn levels_mut(&mut self, goods: GoodsType) -> &mut WarehouseLevels {
        &mut self.0[goods]
    }

    /// Whether the custom house exports a goods type.
    #[must_use]
    pub fn exports(&self, goods: GoodsType) -> bool {
        self.0[goods].export
    }

    /// Enable or disable exports of a goods type.
    pub fn set_exports(&mut self, goods: GoodsType, value: bool) {
        self.0[goods].export = value;
    }

    /// Amount the custom house keeps in stock.
    #[must_use]
    pub fn export_level(&self, goods: GoodsType) -> u32 {
        self.0[goods].export_level
    }

    /// Set the amount the custom house keeps in stock.
    pub fn set_export_level(&mut self, goods: GoodsType, level: u32) {
        self.0[goods].export_level = level;
    }

    /// Low warning level.
    #[must_use]
    pub fn low_level(&self, goods: GoodsType) -> u32 {
        self.0[goods].low
    }

    /// Set the low warning level.
    pub fn set_low_level(&mut self, goods: GoodsType, level: u32) {
        self.0[goods].low = level;
    }

    /// High warning level.
    #[must_use]
    pub fn high_level(&self, goods: GoodsType) -> u32 {
        self.0[goods].high
    }

    /// Set the high warning level.
    pub fn set_high_level(&mut self, goods: GoodsType, level: u32) {
        self.0[goods].high = level;
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Something the end-of-turn clamp noticed about one goods type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseEvent {
    /// Stock above capacity was thrown away.
    Wasted {
        /// Goods type.
        goods: GoodsType,
        /// Amount discarded.
        amount: u32,
    },
    /// Stock reached capacity exactly this turn.
    Full {
        /// Goods type.
        goods: GoodsType,
    },
    /// Stock rose above the high warning level this turn.
    AboveHighLevel {
        /// Goods type.
        goods: GoodsType,
        /// Configured high level.
        level: u32,
        /// Current stock.
        amount: u32,
    },
    /// Stock fell below the low warning level this turn.
    BelowLowLevel {
        /// Goods type.
        goods: GoodsType,
        /// Configured low level.
        level: u32,
        /// Current stock.
        amount: u32,
    },
}

/// Result of [`GoodsLedger::clamp_to_capacity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseReport {
    /// Events in goods declaration order.
    pub events: Vec<WarehouseEvent>,
}

impl WarehouseReport {
    /// `(goods, amount discarded)` for every goods type that overflowed.
    #[must_use]
    pub fn discarded(&self) -> Vec<(GoodsType, u32)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                WarehouseEvent::Wasted { goods, amount } => Some((goods, amount)),
                _ => None,
            })
            .collect()
    }
}

/// Goods stored in a colony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoodsLedger {
    stored: GoodsTable<u32>,
    snapshot: GoodsTable<u32>,
}

impl GoodsLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount of a goods type in stock.
    #[must_use]
    pub fn count(&self, goods: GoodsType) -> u32 {
        self.stored[goods]
    }

    /// Amount of a goods type at the last snapshot.
    #[must_use]
    pub fn snapshot_count(&self, goods: GoodsType) -> u32 {
        self.snapshot[goods]
    }

    /// Add goods. Capacity is only enforced at turn end.
    pub fn add(&mut self, goods: GoodsType, amount: u32) {
        self.stored[goods] = self.stored[goods].saturating_add(amount);
    }

    /// Remove goods.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::InsufficientGoods`] if `amount` exceeds the
    /// stock; the ledger is left unchanged.
    pub fn remove(&mut self, goods: GoodsType, amount: u32) -> Result<()> {
        let available = self.stored[goods];
        if amount > available {
            return Err(ColonyError::InsufficientGoods {
                goods,
                requested: amount,
                available,
            });
        }
        self.stored[goods] = available - amount;
        Ok(())
    }

    /// Remove and return the whole stock of a goods type.
    pub fn remove_all(&mut self, goods: GoodsType) -> u32 {
        std::mem::take(&mut self.stored[goods])
    }

    /// Remember the current stock for end-of-turn comparisons.
    pub fn snapshot_for_warning(&mut self) {
        self.snapshot = self.stored.clone();
    }

    /// Storable goods with a non-zero stock, in declaration order.
    pub fn iter_stored(&self) -> impl Iterator<Item = (GoodsType, u32)> + '_ {
        GoodsType::STORABLE
            .iter()
            .map(|&goods| (goods, self.stored[goods]))
            .filter(|&(_, amount)| amount > 0)
    }

    /// Throw away everything above `capacity` and report level crossings.
    ///
    /// Food is exempt: it is governed by starvation instead.
    pub fn clamp_to_capacity(
        &mut self,
        capacity: u32,
        settings: &WarehouseSettings,
    ) -> WarehouseReport {
        let mut report = WarehouseReport::default();

        for goods in GoodsType::STORABLE {
            if goods == GoodsType::Food {
                continue;
            }
            let amount = self.stored[goods];
            let old = self.snapshot[goods];
            let high = settings.high_level(goods);
            let low = settings.low_level(goods);

            if amount > capacity {
                self.stored[goods] = capacity;
                report.events.push(WarehouseEvent::Wasted {
                    goods,
                    amount: amount - capacity,
                });
            } else if amount == capacity && old < capacity {
                report.events.push(WarehouseEvent::Full { goods });
            } else if amount > high && old <= high {
                report.events.push(WarehouseEvent::AboveHighLevel {
                    goods,
                    level: high,
                    amount,
                });
            } else if amount < low && old >= low {
                report.events.push(WarehouseEvent::BelowLowLevel {
                    goods,
                    level: low,
                    amount,
                });
            }
        }

        report
    }
}
