//! The game: map, players and colonies advanced one turn at a time.
//!
//! [`Game`] owns every colony and player and is the single entry point for
//! turn processing. Colonies are processed in id order so that two games
//! with the same history always reach the same state.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::colony::{Colony, ColonyId, Placement};
use crate::construction::ConstructionTarget;
use crate::data::Specification;
use crate::error::{ColonyError, Result};
use crate::map::{GridMap, TileId};
use crate::messages::{ColonyMessage, NotificationSink};
use crate::owner::{Player, PlayerId};
use crate::turn::{TurnContext, TurnNumber, TurnOutcome};
use crate::units::{Unit, UnitId, UnitIdAllocator, UnitType};

/// Everything that happened during one call to [`Game::new_turn`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Turn that was processed.
    pub turn: TurnNumber,
    /// Messages in emission order.
    pub messages: Vec<ColonyMessage>,
    /// Outcome per colony.
    pub outcomes: BTreeMap<ColonyId, TurnOutcome>,
    /// Colonies removed after losing their last colonist.
    pub abandoned: Vec<ColonyId>,
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Game {
    turn: TurnNumber,
    spec: Specification,
    map: GridMap,
    players: BTreeMap<PlayerId, Player>,
    colonies: BTreeMap<ColonyId, Colony>,
    units: UnitIdAllocator,
    next_colony_id: u32,
}

impl Game {
    /// Create a game at turn 0 with no players.
    #[must_use]
    pub fn new(spec: Specification, map: GridMap) -> Self {
        Self {
            turn: 0,
            spec,
            map,
            players: BTreeMap::new(),
            colonies: BTreeMap::new(),
            units: UnitIdAllocator::new(),
            next_colony_id: 0,
        }
    }

    /// Last processed turn.
    #[must_use]
    pub const fn turn(&self) -> TurnNumber {
        self.turn
    }

    /// Rule tables.
    #[must_use]
    pub const fn spec(&self) -> &Specification {
        &self.spec
    }

    /// The map.
    #[must_use]
    pub const fn map(&self) -> &GridMap {
        &self.map
    }

    /// Mutable map.
    pub fn map_mut(&mut self) -> &mut GridMap {
        &mut self.map
    }

    /// All players.
    #[must_use]
    pub const fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    /// A player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Mutable player.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// All colonies, in id order.
    #[must_use]
    pub const fn colonies(&self) -> &BTreeMap<ColonyId, Colony> {
        &self.colonies
    }

    /// A colony by id.
    #[must_use]
    pub fn colony(&self, id: ColonyId) -> Option<&Colony> {
        self.colonies.get(&id)
    }

    /// Mutable colony.
    pub fn colony_mut(&mut self, id: ColonyId) -> Option<&mut Colony> {
        self.colonies.get_mut(&id)
    }

    /// Add or replace a player.
    pub fn add_player(&mut self, player: Player) -> PlayerId {
        let id = player.id;
        self.players.insert(id, player);
        id
    }

    /// Create a unit with a fresh id. The unit is not placed anywhere.
    pub fn create_unit(&mut self, unit_type: UnitType) -> Unit {
        Unit::new(self.units.allocate(), unit_type)
    }

    /// Found a colony for `owner` on `tile`.
    ///
    /// # Errors
    ///
    /// [`ColonyError::PlayerNotFound`] for an unknown owner,
    /// [`ColonyError::TileNotFound`] for a tile off the map, and
    /// [`ColonyError::InvalidState`] when the tile already holds a colony.
    pub fn found_colony(&mut self, owner: PlayerId, name: &str, tile: TileId) -> Result<ColonyId> {
        if self.colonies.values().any(|colony| colony.tile() == Some(tile)) {
            return Err(ColonyError::InvalidState(format!(
                "Tile {} already holds a colony",
                tile.0
            )));
        }
        let player = self
            .players
            .get(&owner)
            .ok_or(ColonyError::PlayerNotFound(owner.0))?;
        let id = ColonyId(self.next_colony_id);
        let colony = Colony::found(id, name, player, tile, &mut self.map, &self.spec)?;
        self.next_colony_id += 1;
        self.colonies.insert(id, colony);
        Ok(id)
    }

    fn colony_and_owner(&mut self, id: ColonyId) -> Result<(&mut Colony, &mut Player)> {
        let colony = self
            .colonies
            .get_mut(&id)
            .ok_or(ColonyError::ColonyNotFound(id.0))?;
        let owner = colony.owner();
        let player = self
            .players
            .get_mut(&owner)
            .ok_or(ColonyError::PlayerNotFound(owner.0))?;
        Ok((colony, player))
    }

    /// Create a unit and add it to a colony.
    ///
    /// # Errors
    ///
    /// [`ColonyError::ColonyNotFound`] or [`ColonyError::PlayerNotFound`].
    pub fn add_unit(
        &mut self,
        colony: ColonyId,
        unit_type: UnitType,
        sink: &mut dyn NotificationSink,
    ) -> Result<(UnitId, Placement)> {
        let unit = Unit::new(self.units.allocate(), unit_type);
        let id = unit.id;
        let (colony, owner) = self.colony_and_owner(colony)?;
        Ok((id, colony.add_unit(unit, owner, sink)))
    }

    /// Select a colony's construction target.
    ///
    /// # Errors
    ///
    /// [`ColonyError::ColonyNotFound`] or [`ColonyError::PlayerNotFound`].
    pub fn set_currently_building(
        &mut self,
        colony: ColonyId,
        target: ConstructionTarget,
        sink: &mut dyn NotificationSink,
    ) -> Result<bool> {
        let colony_ref = self
            .colonies
            .get_mut(&colony)
            .ok_or(ColonyError::ColonyNotFound(colony.0))?;
        let owner = self
            .players
            .get(&colony_ref.owner())
            .ok_or(ColonyError::PlayerNotFound(colony_ref.owner().0))?;
        Ok(colony_ref.set_currently_building(target, &self.spec, owner, sink))
    }

    /// Gold needed to finish a colony's construction right now.
    ///
    /// # Errors
    ///
    /// [`ColonyError::ColonyNotFound`] or [`ColonyError::PlayerNotFound`].
    pub fn price_for_building(&self, colony: ColonyId) -> Result<u32> {
        let colony = self
            .colonies
            .get(&colony)
            .ok_or(ColonyError::ColonyNotFound(colony.0))?;
        let owner = self
            .players
            .get(&colony.owner())
            .ok_or(ColonyError::PlayerNotFound(colony.owner().0))?;
        Ok(colony.price_for_building(&self.spec, owner))
    }

    /// Buy the missing hammers and tools for a colony's construction.
    ///
    /// # Errors
    ///
    /// Lookup errors, or [`ColonyError::InsufficientGold`].
    pub fn pay_for_building(&mut self, colony: ColonyId) -> Result<()> {
        let colony_ref = self
            .colonies
            .get_mut(&colony)
            .ok_or(ColonyError::ColonyNotFound(colony.0))?;
        let owner = colony_ref.owner();
        let player = self
            .players
            .get_mut(&owner)
            .ok_or(ColonyError::PlayerNotFound(owner.0))?;
        colony_ref.pay_for_building(&self.spec, player)
    }

    /// Advance the game by one turn.
    ///
    /// The turn counter is incremented first, then every colony is
    /// processed in id order. Abandoned colonies are removed.
    ///
    /// # Errors
    ///
    /// The first fatal error any colony reports. The game should be
    /// considered corrupted in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use colony_core::prelude::*;
    ///
    /// let map = GridMap::new(8, 8, TerrainType::Plains);
    /// let mut game = Game::new(Specification::classic(), map);
    /// let report = game.new_turn().unwrap();
    /// assert_eq!(report.turn, 1);
    /// assert_eq!(game.turn(), 1);
    /// ```
    pub fn new_turn(&mut self) -> Result<TurnReport> {
        self.turn += 1;
        let mut report = TurnReport {
            turn: self.turn,
            ..TurnReport::default()
        };

        for (&id, colony) in &mut self.colonies {
            let owner_id = colony.owner();
            let owner = self
                .players
                .get_mut(&owner_id)
                .ok_or(ColonyError::PlayerNotFound(owner_id.0))?;
            let mut ctx = TurnContext {
                turn: self.turn,
                spec: &self.spec,
                owner,
                units: &mut self.units,
                sink: &mut report.messages,
            };
            let outcome = colony.new_turn(&mut ctx)?;
            if outcome == TurnOutcome::Abandoned {
                report.abandoned.push(id);
            }
            report.outcomes.insert(id, outcome);
        }
        for id in &report.abandoned {
            self.colonies.remove(id);
        }

        info!(
            turn = self.turn,
            colonies = self.colonies.len(),
            messages = report.messages.len(),
            abandoned = report.abandoned.len(),
            "Turn processed"
        );

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(turn = self.turn, state_hash = hash, "Game state hash");
        }

        #[cfg(feature = "debug-validation")]
        self.validate_references()?;

        Ok(report)
    }

    /// Check that every id in the state resolves.
    ///
    /// # Errors
    ///
    /// [`ColonyError::UnresolvedReference`] naming the first dangling or
    /// duplicated reference.
    pub fn validate_references(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (id, colony) in &self.colonies {
            if *id != colony.id() {
                return Err(ColonyError::UnresolvedReference(format!(
                    "{id} is stored as {}",
                    colony.id()
                )));
            }
            if id.0 >= self.next_colony_id {
                return Err(ColonyError::UnresolvedReference(format!("{id} was never issued")));
            }
            if !self.players.contains_key(&colony.owner()) {
                return Err(ColonyError::UnresolvedReference(format!(
                    "{id} belongs to unknown player {}",
                    colony.owner().0
                )));
            }
            if let Some(tile) = colony.tile() {
                if !self.map.contains(tile) {
                    return Err(ColonyError::UnresolvedReference(format!(
                        "{id} stands on unknown tile {}",
                        tile.0
                    )));
                }
            }
            for unit in colony.units().chain(colony.tile_units()) {
                if !self.units.has_issued(unit.id) {
                    return Err(ColonyError::UnresolvedReference(format!(
                        "unit {} in {id} was never issued",
                        unit.id.0
                    )));
                }
                if !seen.insert(unit.id) {
                    return Err(ColonyError::UnresolvedReference(format!(
                        "unit {} appears twice",
                        unit.id.0
                    )));
                }
            }
        }
        Ok(())
    }

    /// Hash of the complete game state.
    ///
    /// Two games with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.turn.hash(&mut hasher);
        self.units.hash(&mut hasher);
        self.next_colony_id.hash(&mut hasher);

        // Maps iterate in key order
        self.players.len().hash(&mut hasher);
        for player in self.players.values() {
            player.hash(&mut hasher);
        }
        self.colonies.len().hash(&mut hasher);
        for colony in self.colonies.values() {
            colony.hash(&mut hasher);
        }

        self.map.hash(&mut hasher);
        self.spec.hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the game for saving.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ColonyError::InvalidState(format!("Failed to serialize game: {e}")))
    }

    /// Restore a saved game and check its references.
    ///
    /// # Errors
    ///
    /// [`ColonyError::InvalidState`] for undecodable data and
    /// [`ColonyError::UnresolvedReference`] for dangling ids.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let game: Self = bincode::deserialize(data)
            .map_err(|e| ColonyError::InvalidState(format!("Failed to deserialize game: {e}")))?;
        game.validate_references()?;
        Ok(game)
    }
}
