//! Headless runner for sector-world
//!
//! Usage:
//!   sector-world --map assets/maps/demo.map --defs assets/defs.ron
//!   sector-world --map level.ron --defs defs.ron --config sim.ron --ticks 600
//!
//! Loads a map, definitions and optional config, runs the simulation with
//! idle hero input and logs every event the world emits.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use sector_world::config::SimConfig;
use sector_world::game::{DefTable, World};
use sector_world::world::load_map;

#[derive(Parser)]
#[command(name = "sector-world")]
#[command(about = "Run a sector world simulation headless", version)]
struct Cli {
    /// Map file (`.ron`, or the line-oriented text format)
    #[arg(long)]
    map: PathBuf,
    /// Entity definition table (RON)
    #[arg(long)]
    defs: PathBuf,
    /// Simulation config (RON); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of ticks to run
    #[arg(long, default_value_t = 300)]
    ticks: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let data = load_map(&cli.map).with_context(|| format!("Failed to load map {}", cli.map.display()))?;
    let defs = DefTable::load(&cli.defs).with_context(|| format!("Failed to load definitions {}", cli.defs.display()))?;
    let config = match &cli.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SimConfig::default(),
    };

    let mut world = World::new(data, defs, config).context("Failed to build world")?;
    if let Some(music) = world.music() {
        info!(music, "ambient track");
    }

    let mut totals = Totals::default();
    for _ in 0..cli.ticks {
        world.update();
        totals.drain(&mut world);
    }

    let alive = world.things_in_order().filter(|(_, t)| !t.is_dead()).count();
    let hero = world.hero().and_then(|id| world.thing(id));
    println!("ticks:    {}", world.tick());
    println!("things:   {} ({} alive)", world.things_in_order().count(), alive);
    if let Some(hero) = hero {
        println!(
            "hero:     health {} armor {} at ({:.2}, {:.2}, {:.2})",
            hero.health, hero.armor, hero.position.x, hero.position.y, hero.position.z
        );
    }
    println!(
        "events:   {} sounds, {} hits, {} deaths, {} spawns, {} triggers",
        totals.sounds, totals.hits, totals.deaths, totals.spawns, totals.triggers
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Running event counts for the final summary
#[derive(Default)]
struct Totals {
    sounds: usize,
    hits: usize,
    deaths: usize,
    spawns: usize,
    triggers: usize,
}

impl Totals {
    fn drain(&mut self, world: &mut World) {
        let tick = world.tick();
        let events = world.events_mut();
        for sound in events.sound.drain() {
            debug!(tick, name = %sound.name, "sound");
            self.sounds += 1;
        }
        for hit in events.damage.drain() {
            info!(tick, target = ?hit.target, source = ?hit.source, amount = hit.amount, "damage");
            self.hits += 1;
        }
        for death in events.death.drain() {
            info!(tick, thing = ?death.thing, killer = ?death.killer, "death");
            self.deaths += 1;
        }
        for spawn in events.spawn.drain() {
            debug!(tick, def = %spawn.def, "spawn");
            self.spawns += 1;
        }
        for trigger in events.trigger.drain() {
            info!(tick, name = %trigger.name, params = ?trigger.params, "trigger");
            self.triggers += 1;
        }
    }
}
