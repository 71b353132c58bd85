//! Headless turn runner.
//!
//! Advances a [`Game`] for a number of turns and condenses the result into
//! a [`SimulationSummary`] that can be printed or written as JSON.

use std::collections::BTreeMap;

use colony_core::colony::{Colony, ColonyId};
use colony_core::error::Result;
use colony_core::game::{Game, TurnReport};
use colony_core::goods::GoodsType;
use colony_core::messages::MessageKey;
use serde::Serialize;
use tracing::info;

/// End-of-run view of one colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColonySnapshot {
    /// Colony name.
    pub name: String,
    /// Colonists working in the colony.
    pub population: u32,
    /// Units waiting on the colony tile.
    pub units_on_tile: usize,
    /// Stock of every non-empty storable goods type.
    pub goods: BTreeMap<GoodsType, u32>,
    /// Construction target name.
    pub building: String,
    /// Hammers towards the target.
    pub hammers: u32,
    /// Sons of Liberty percentage.
    pub sons_of_liberty: u32,
    /// Production bonus.
    pub production_bonus: i32,
}

impl ColonySnapshot {
    fn capture(colony: &Colony, game: &Game) -> Self {
        let goods = GoodsType::STORABLE
            .iter()
            .map(|&goods| (goods, colony.goods_count(goods)))
            .filter(|&(_, amount)| amount > 0)
            .collect();
        Self {
            name: colony.name().to_string(),
            population: colony.unit_count(),
            units_on_tile: colony.tile_units().len(),
            goods,
            building: colony.target_name(colony.currently_building(), game.spec()),
            hammers: colony.hammers(),
            sons_of_liberty: colony.sons_of_liberty(),
            production_bonus: colony.production_bonus(),
        }
    }
}

/// Result of a headless run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    /// Scenario name.
    pub scenario: String,
    /// Turns processed.
    pub turns: u32,
    /// State hash after the last turn.
    pub final_hash: u64,
    /// Count of every message key seen during the run.
    pub message_counts: BTreeMap<String, usize>,
    /// Colonies abandoned during the run.
    pub abandoned: Vec<ColonyId>,
    /// Surviving colonies.
    pub colonies: BTreeMap<ColonyId, ColonySnapshot>,
    /// Per-turn reports, in order.
    pub reports: Vec<TurnReport>,
}

impl SimulationSummary {
    /// How often a message key was raised.
    #[must_use]
    pub fn count(&self, key: MessageKey) -> usize {
        self.message_counts.get(key.key()).copied().unwrap_or(0)
    }
}

/// Run `turns` turns of `game`.
///
/// # Errors
///
/// The first fatal error raised by turn processing.
pub fn run(game: &mut Game, scenario: &str, turns: u32) -> Result<SimulationSummary> {
    let mut reports = Vec::with_capacity(turns as usize);
    let mut message_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut abandoned = Vec::new();

    for _ in 0..turns {
        let report = game.new_turn()?;
        for message in &report.messages {
            *message_counts.entry(message.key.key().to_string()).or_default() += 1;
        }
        abandoned.extend(report.abandoned.iter().copied());
        reports.push(report);
    }

    let colonies = game
        .colonies()
        .iter()
        .map(|(&id, colony)| (id, ColonySnapshot::capture(colony, game)))
        .collect();

    let summary = SimulationSummary {
        scenario: scenario.to_string(),
        turns,
        final_hash: game.state_hash(),
        message_counts,
        abandoned,
        colonies,
        reports,
    };
    info!(
        scenario,
        turns,
        final_hash = summary.final_hash,
        "Simulation finished"
    );
    Ok(summary)
}
