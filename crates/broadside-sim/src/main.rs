//! # Broadside Sim
//!
//! Headless scenario runner. Loads a scenario (the built-in destroyer duel or
//! a JSON file), feeds its scripted orders to the ships at their scheduled
//! game times, runs a fixed number of ticks and prints the event log, the
//! final ship status and the bearing and range between surviving ships as
//! JSON on stdout. Logs go to stderr.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use broadside_core::physics::METERS_PER_NAUTICAL_MILE;
use broadside_core::{
    EventRecord, RawCommand, ScenarioConfig, ShipStatus, WorldSimulation,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/destroyer_duel.json");

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "broadside-sim", version, about = "Run a Broadside scenario headless")]
struct Cli {
    /// Scenario file. The built-in destroyer duel is used when omitted.
    scenario: Option<PathBuf>,

    /// Override the scenario's tick count.
    #[arg(long)]
    ticks: Option<usize>,

    /// Override the world seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Log more: -v info, -vv debug, -vvv trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// =============================================================================
// Scenario Script
// =============================================================================

/// A scenario plus the script that drives it.
#[derive(Debug, Deserialize)]
struct Script {
    #[serde(flatten)]
    scenario: ScenarioConfig,
    /// Bring every engine room online before the first tick.
    #[serde(default = "default_start_engines")]
    start_engines: bool,
    #[serde(default = "default_ticks")]
    ticks: usize,
    #[serde(default = "default_tick_hours")]
    tick_hours: f64,
    #[serde(default)]
    orders: Vec<Order>,
}

/// An order handed to a ship once game time reaches `at_hours`.
#[derive(Debug, Clone, Deserialize)]
struct Order {
    at_hours: f64,
    ship: String,
    command: RawCommand,
}

const fn default_start_engines() -> bool {
    true
}

const fn default_ticks() -> usize {
    30
}

const fn default_tick_hours() -> f64 {
    0.1
}

#[derive(Debug, Serialize)]
struct Report {
    game_time: f64,
    events: Vec<EventRecord>,
    ships: Vec<ShipStatus>,
    contacts: Vec<Contact>,
}

/// Where one surviving ship sees another at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Contact {
    observer: String,
    target: String,
    bearing_deg: f64,
    range_nm: f64,
}

/// Bearing and range from every live ship to every other live ship.
fn contacts(ships: &[ShipStatus]) -> Vec<Contact> {
    let alive: Vec<&ShipStatus> = ships.iter().filter(|ship| ship.alive).collect();
    let mut contacts = Vec::new();
    for observer in &alive {
        for target in alive.iter().filter(|target| target.id != observer.id) {
            contacts.push(Contact {
                observer: observer.name.clone(),
                target: target.name.clone(),
                bearing_deg: observer.location.bearing_to(target.location),
                range_nm: observer.location.distance_m(target.location) / METERS_PER_NAUTICAL_MILE,
            });
        }
    }
    contacts
}

fn load_script(path: Option<&Path>) -> Result<Script> {
    let json = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?,
        None => DEFAULT_SCENARIO.to_string(),
    };
    let script: Script = serde_json::from_str(&json).context("parsing scenario")?;
    if !(script.tick_hours.is_finite() && script.tick_hours > 0.0) {
        bail!("tick_hours must be positive, got {}", script.tick_hours);
    }
    Ok(script)
}

// =============================================================================
// Run
// =============================================================================

fn run(mut script: Script) -> Result<Report> {
    let mut world =
        WorldSimulation::from_scenario(&script.scenario).context("invalid scenario")?;

    for order in &script.orders {
        if world.ship_by_name(&order.ship).is_none() {
            bail!("order for unknown ship `{}`", order.ship);
        }
    }
    script.orders.sort_by(|a, b| a.at_hours.total_cmp(&b.at_hours));

    if script.start_engines {
        let ids: Vec<_> = world.ships().iter().map(|ship| ship.id()).collect();
        for id in ids {
            if let Some(ship) = world.ship_mut(id) {
                if let Err(err) = ship.engine_room_mut().module.start_operations() {
                    warn!(ship = %ship.name(), error = %err, "engines did not start");
                }
            }
        }
    }

    info!(
        ships = world.ships().len(),
        ticks = script.ticks,
        tick_hours = script.tick_hours,
        seed = world.seed(),
        "running scenario"
    );

    let mut pending = script.orders.into_iter().peekable();
    let mut events = Vec::new();
    for _ in 0..script.ticks {
        let now = world.game_time();
        while let Some(order) = pending.next_if(|order| order.at_hours <= now + 1e-9) {
            let id = world.ship_by_name(&order.ship).map(|ship| ship.id());
            if let Some(ship) = id.and_then(|id| world.ship_mut(id)) {
                ship.submit_raw(order.command);
            }
        }
        world.tick(script.tick_hours);
        events.extend(world.take_events());
    }

    for order in pending {
        warn!(ship = %order.ship, at_hours = order.at_hours, "order scheduled after the run ended");
    }

    let ships = world.statuses();
    Ok(Report {
        game_time: world.game_time(),
        events,
        contacts: contacts(&ships),
        ships,
    })
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut script = load_script(cli.scenario.as_deref())?;
    if let Some(ticks) = cli.ticks {
        script.ticks = ticks;
    }
    if let Some(seed) = cli.seed {
        script.scenario.world.seed = seed;
    }

    let report = run(script)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
