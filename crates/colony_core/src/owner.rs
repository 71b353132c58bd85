//! Owner collaborator: gold, market access, founding fathers and difficulty.
//!
//! Colonies never hold a reference to their owner. The turn pipeline and the
//! payment commands receive a `&mut dyn Owner` for the duration of the call.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ColonyError, Result};
use crate::goods::{GoodsTable, GoodsType};

/// Unique identifier for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Identifier of a nation, European or native.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NationId(pub u32);

/// Founding fathers whose effects reach into colony processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FoundingFather {
    /// Every colony with three or more colonists gets a free stockade.
    LaSalle,
    /// Native land can be used without paying for it.
    PeterMinuit,
}

/// Political relation of a player to its crown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RebellionState {
    /// Still a colony of the crown.
    #[default]
    Colonial,
    /// Independence declared, war ongoing.
    DeclaredIndependence,
    /// Independence won.
    Independent,
}

impl RebellionState {
    /// Whether independence has been declared.
    #[must_use]
    pub const fn has_declared(self) -> bool {
        !matches!(self, Self::Colonial)
    }
}

/// Channel through which goods are traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketAccess {
    /// A ship unloads in Europe.
    Europe,
    /// The colony's custom house.
    CustomHouse,
}

/// What a colony needs from its owner.
pub trait Owner {
    /// Player identifier.
    fn id(&self) -> PlayerId;

    /// Nation of the player.
    fn nation(&self) -> NationId;

    /// Game difficulty, 0 (easiest) to 4.
    fn difficulty(&self) -> i32;

    /// Whether the player is computer controlled.
    fn is_ai(&self) -> bool;

    /// Gold balance.
    fn gold(&self) -> u32;

    /// Debit gold.
    ///
    /// # Errors
    ///
    /// [`ColonyError::InsufficientGold`] if the balance is too small.
    fn spend_gold(&mut self, amount: u32) -> Result<()>;

    /// Credit gold.
    fn earn_gold(&mut self, amount: u32);

    /// Whether the player has elected the founding father.
    fn has_father(&self, father: FoundingFather) -> bool;

    /// Current rebellion state.
    fn rebellion_state(&self) -> RebellionState;

    /// Whether goods may be traded through the channel.
    fn can_trade(&self, goods: GoodsType, access: MarketAccess) -> bool;

    /// Price of buying `amount` goods.
    fn bid_price(&self, goods: GoodsType, amount: u32) -> u32;

    /// Buy goods, debiting their price. Returns the price paid.
    fn buy(&mut self, goods: GoodsType, amount: u32) -> Result<u32>;

    /// Sell goods, crediting the proceeds after tax. Returns the proceeds.
    fn sell(&mut self, goods: GoodsType, amount: u32, access: MarketAccess) -> u32;

    /// Add religious crosses to the player's immigration pool.
    fn add_crosses(&mut self, amount: u32);
}

/// Buy and sell price of one unit of goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MarketPrice {
    /// Price paid per unit when buying.
    pub buy: u32,
    /// Price received per unit when selling.
    pub sell: u32,
}

/// A player with a flat price table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Player name.
    pub name: String,
    /// Nation.
    pub nation: NationId,
    /// Difficulty, 0 to 4.
    pub difficulty: i32,
    /// Computer controlled.
    pub ai: bool,
    /// Gold balance.
    pub gold: u32,
    /// Tax rate in percent applied to sales.
    pub tax_rate: u32,
    /// Market prices.
    pub prices: GoodsTable<MarketPrice>,
    /// Goods under a crown boycott.
    pub boycotts: BTreeSet<GoodsType>,
    /// Elected founding fathers.
    pub fathers: BTreeSet<FoundingFather>,
    /// Accumulated crosses.
    pub crosses: u32,
    /// Rebellion state.
    pub rebellion: RebellionState,
}

impl Player {
    /// Create a human player with default prices and no gold.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, nation: NationId) -> Self {
        Self {
            id,
            name: name.into(),
            nation,
            difficulty: 2,
            ai: false,
            gold: 0,
            tax_rate: 0,
            prices: default_prices(),
            boycotts: BTreeSet::new(),
            fathers: BTreeSet::new(),
            crosses: 0,
            rebellion: RebellionState::Colonial,
        }
    }

    /// Builder: set the starting gold.
    #[must_use]
    pub fn with_gold(mut self, gold: u32) -> Self {
        self.gold = gold;
        self
    }

    /// Builder: set the difficulty.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: i32) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Builder: mark the player as computer controlled.
    #[must_use]
    pub fn with_ai(mut self, ai: bool) -> Self {
        self.ai = ai;
        self
    }

    /// Builder: elect a founding father.
    #[must_use]
    pub fn with_father(mut self, father: FoundingFather) -> Self {
        self.fathers.insert(father);
        self
    }

    /// Builder: set the tax rate.
    #[must_use]
    pub fn with_tax_rate(mut self, tax_rate: u32) -> Self {
        self.tax_rate = tax_rate;
        self
    }
}

fn default_prices() -> GoodsTable<MarketPrice> {
    GoodsTable::from_fn(|goods| {
        let (buy, sell) = match goods {
            GoodsType::Food => (8, 1),
            GoodsType::Sugar | GoodsType::Tobacco | GoodsType::Cotton => (5, 3),
            GoodsType::Furs => (5, 3),
            GoodsType::Lumber => (2, 1),
            GoodsType::Ore => (6, 4),
            GoodsType::Silver => (20, 19),
            GoodsType::Horses => (2, 1),
            GoodsType::Rum | GoodsType::Cigars | GoodsType::Cloth | GoodsType::Coats => (12, 10),
            GoodsType::TradeGoods => (2, 1),
            GoodsType::Tools => (2, 1),
            GoodsType::Muskets => (3, 2),
            GoodsType::Hammers | GoodsType::Bells | GoodsType::Crosses => (0, 0),
        };
        MarketPrice { buy, sell }
    })
}

impl Owner for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn nation(&self) -> NationId {
        self.nation
    }

    fn difficulty(&self) -> i32 {
        self.difficulty
    }

    fn is_ai(&self) -> bool {
        self.ai
    }

    fn gold(&self) -> u32 {
        self.gold
    }

    fn spend_gold(&mut self, amount: u32) -> Result<()> {
        if amount > self.gold {
            return Err(ColonyError::InsufficientGold {
                required: amount,
                available: self.gold,
            });
        }
        self.gold -= amount;
        Ok(())
    }

    fn earn_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    fn has_father(&self, father: FoundingFather) -> bool {
        self.fathers.contains(&father)
    }

    fn rebellion_state(&self) -> RebellionState {
        self.rebellion
    }

    fn can_trade(&self, goods: GoodsType, access: MarketAccess) -> bool {
        if !goods.is_storable() {
            return false;
        }
        if !self.boycotts.contains(&goods) {
            return true;
        }
        access == MarketAccess::CustomHouse && self.rebellion.has_declared()
    }

    fn bid_price(&self, goods: GoodsType, amount: u32) -> u32 {
        self.prices[goods].buy.saturating_mul(amount)
    }

    fn buy(&mut self, goods: GoodsType, amount: u32) -> Result<u32> {
        let price = self.bid_price(goods, amount);
        self.spend_gold(price)?;
        Ok(price)
    }

    fn sell(&mut self, goods: GoodsType, amount: u32, access: MarketAccess) -> u32 {
        if !self.can_trade(goods, access) {
            return 0;
        }
        let gross = self.prices[goods].sell.saturating_mul(amount);
        let net = gross - gross * self.tax_rate.min(100) / 100;
        self.earn_gold(net);
        net
    }

    fn add_crosses(&mut self, amount: u32) {
        self.crosses = self.crosses.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_and_earn() {
        let mut player = Player::new(PlayerId(0), "Dutch", NationId(0)).with_gold(100);
        player.spend_gold(40).unwrap();
        assert_eq!(player.gold(), 60);

        let err = player.spend_gold(61).unwrap_err();
        assert!(matches!(
            err,
            ColonyError::InsufficientGold {
                required: 61,
                available: 60
            }
        ));
        assert_eq!(player.gold(), 60);

        player.earn_gold(5);
        assert_eq!(player.gold(), 65);
    }

    #[test]
    fn test_sell_applies_tax() {
        let mut player = Player::new(PlayerId(0), "Dutch", NationId(0)).with_tax_rate(10);
        let proceeds = player.sell(GoodsType::Cloth, 10, MarketAccess::CustomHouse);
        assert_eq!(proceeds, 90);
        assert_eq!(player.gold(), 90);
    }

    #[test]
    fn test_boycott_blocks_trade_until_independence() {
        let mut player = Player::new(PlayerId(0), "Dutch", NationId(0));
        player.boycotts.insert(GoodsType::Furs);
        assert!(!player.can_trade(GoodsType::Furs, MarketAccess::CustomHouse));
        assert_eq!(player.sell(GoodsType::Furs, 10, MarketAccess::Europe), 0);

        player.rebellion = RebellionState::DeclaredIndependence;
        assert!(player.can_trade(GoodsType::Furs, MarketAccess::CustomHouse));
        assert!(!player.can_trade(GoodsType::Furs, MarketAccess::Europe));
    }

    #[test]
    fn test_buy_requires_gold() {
        let mut player = Player::new(PlayerId(0), "Dutch", NationId(0)).with_gold(30);
        assert_eq!(player.bid_price(GoodsType::Tools, 20), 40);
        assert!(player.buy(GoodsType::Tools, 20).is_err());
        assert_eq!(player.buy(GoodsType::Tools, 10).unwrap(), 20);
        assert_eq!(player.gold(), 10);
    }
}
