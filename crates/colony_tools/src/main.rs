//! Colony simulation development tools.
//!
//! # Usage
//!
//! ```bash
//! # Check the specification files
//! cargo run -p colony_tools -- validate assets/data
//!
//! # Run a scenario for 50 turns and print JSON to stdout
//! cargo run -p colony_tools -- simulate --scenario assets/scenarios/single_colony.ron --turns 50 --json
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colony_core::data::Specification;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colony_tools::{scenario::Scenario, simulate, validate};

#[derive(Parser)]
#[command(name = "colony-tools")]
#[command(about = "Development tools for the colony simulation")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },

    /// Run a scenario headless
    Simulate {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Turns to run (defaults to the scenario's own count)
        #[arg(short, long)]
        turns: Option<u32>,

        /// Specification file (defaults to the built-in classic rules)
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Print the full summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the final game state to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Simulate {
            scenario,
            turns,
            spec,
            json,
            save,
        } => cmd_simulate(&scenario, turns, spec.as_deref(), json, save.as_deref()),
    }
}

fn cmd_validate(path: &Path) {
    tracing::info!("Validating data files in: {}", path.display());
    match validate::validate_data_directory(path) {
        Ok(count) => tracing::info!("Validation passed ({count} files)"),
        Err(e) => {
            tracing::error!("Validation failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_simulate(scenario_path: &Path, turns: Option<u32>, spec: Option<&Path>, json: bool, save: Option<&Path>) {
    let scenario = match Scenario::load(scenario_path) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    };

    let spec = match spec {
        Some(path) => match validate::load_specification(path) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!("Failed to load specification: {e}");
                std::process::exit(1);
            }
        },
        None => Specification::classic(),
    };

    let (mut game, setup_messages) = match scenario.build(spec) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    };
    for message in &setup_messages {
        tracing::warn!(colony = %message.colony, key = message.key.key(), "Setup message");
    }

    let turns = turns.unwrap_or(scenario.turns);
    let summary = match simulate::run(&mut game, &scenario.name, turns) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(turn = game.turn(), "Turn failed: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = save {
        let written = game
            .serialize()
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()));
        if let Err(e) = written {
            tracing::error!("Failed to save game: {e}");
            std::process::exit(1);
        }
        tracing::info!("Game saved to: {}", path.display());
    }

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Failed to encode summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{} - {} turns", summary.scenario, summary.turns);
    println!("State hash: {:016x}", summary.final_hash);
    for (id, colony) in &summary.colonies {
        println!(
            "\n{} ({id}): {} colonists, {} on tile, SoL {}%, bonus {:+}",
            colony.name,
            colony.population,
            colony.units_on_tile,
            colony.sons_of_liberty,
            colony.production_bonus
        );
        println!("  Building: {} ({} hammers)", colony.building, colony.hammers);
        for (goods, amount) in &colony.goods {
            println!("  {goods:?}: {amount}");
        }
    }
    if !summary.abandoned.is_empty() {
        println!("\nAbandoned: {:?}", summary.abandoned);
    }
    if !summary.message_counts.is_empty() {
        println!("\nMessages:");
        for (key, count) in &summary.message_counts {
            println!("  {key}: {count}");
        }
    }
}
