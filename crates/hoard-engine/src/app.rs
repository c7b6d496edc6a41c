//! Headless run loop.
//!
//! Builds the simulation from config, seeds the initial population, drives
//! virtual time from a [`TickClock`] and logs periodic summaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use hoard_common::{GridSize, Position, WorldResult};
use hoard_gameplay::events::{EventHandler, GameEvent};
use hoard_gameplay::simulation::Simulation;

use crate::config::SimConfig;
use crate::timing::TickClock;

/// End-of-run totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Virtual time reached
    pub virtual_ms: u64,
    /// Jobs fired
    pub jobs: usize,
    /// Player balance
    pub player_points: u64,
    /// Points banked in cities
    pub city_points: u64,
    /// Points still lying on the board
    pub board_points: u64,
    /// Live entities
    pub entities: usize,
}

/// Counts events and echoes them at debug level.
#[derive(Debug, Default)]
struct EventTally {
    delivered: AtomicU64,
    stolen: AtomicU64,
    attacks: AtomicU64,
    drops: AtomicU64,
}

impl EventHandler for EventTally {
    fn handle(&self, event: &GameEvent) {
        debug!("{:?}", event);
        let counter = match event {
            GameEvent::PointsDelivered { .. } => &self.delivered,
            GameEvent::PointsStolen { amount, .. } => {
                self.stolen.fetch_add(u64::from(*amount), Ordering::Relaxed);
                return;
            },
            GameEvent::MinionAttacked { .. } => &self.attacks,
            GameEvent::PointDropped { .. } => &self.drops,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Run the simulation described by `config`.
pub fn run(config: &SimConfig) -> Result<RunSummary> {
    let settings = config.to_settings();
    info!("Seed: {}", settings.seed);
    let mut sim = Simulation::new(&settings);
    populate(&mut sim, config, settings.seed);

    let mut clock = TickClock::new(config.time_scale);
    if config.is_unbounded() && clock.is_unthrottled() {
        warn!("Unbounded run without a time scale; falling back to real time");
        clock = TickClock::new(1.0);
    }
    clock.reset();
    let end = (!config.is_unbounded()).then_some(config.duration_ms);
    let tally = EventTally::default();
    let mut next_summary = config.summary_interval_ms;
    let mut jobs = 0;

    info!("Running{}", end.map_or_else(String::new, |ms| format!(" for {ms}ms")));
    loop {
        let target = if clock.is_unthrottled() {
            next_summary
        } else {
            clock.advance()
        };
        let target = end.map_or(target, |end| target.min(end));
        jobs += sim.advance_to(target);
        sim.events().dispatch(&tally);

        if sim.now_ms() >= next_summary {
            log_summary(&sim, &tally);
            next_summary += config.summary_interval_ms;
        }
        if end.is_some_and(|end| sim.now_ms() >= end) {
            break;
        }
        clock.sleep_remainder();
    }

    if let Some(path) = &config.snapshot_path {
        write_snapshot(&sim, path)?;
    }
    Ok(summarize(&sim, jobs))
}

/// Places the configured cities, minions and stealers on random free squares.
fn populate(sim: &mut Simulation, config: &SimConfig, seed: u64) {
    let size = config.grid_size();
    let mut rng = fastrand::Rng::with_seed(seed.wrapping_add(1));

    let cities = place(config.initial_cities, size, &mut rng, |pos| sim.found_city(pos));
    let minions = place(config.initial_minions, size, &mut rng, |pos| sim.create_minion(pos));
    let stealers = place(config.initial_stealers, size, &mut rng, |pos| sim.create_stealer(pos));
    info!(
        "Seeded {} cities, {} minions, {} stealers",
        cities, minions, stealers
    );
}

/// Tries random positions until `count` placements succeed or attempts run out.
fn place<T>(
    count: u32,
    size: GridSize,
    rng: &mut fastrand::Rng,
    mut try_place: impl FnMut(Position) -> WorldResult<T>,
) -> u32 {
    let attempts = size.area().saturating_mul(4).max(16);
    let mut placed = 0;
    for _ in 0..attempts {
        if placed == count {
            break;
        }
        let pos = size.position_at(rng.usize(..size.area()));
        if try_place(pos).is_ok() {
            placed += 1;
        }
    }
    if placed < count {
        warn!("Placed only {} of {}", placed, count);
    }
    placed
}

fn summarize(sim: &Simulation, jobs: usize) -> RunSummary {
    let world = sim.world().read();
    RunSummary {
        virtual_ms: sim.now_ms(),
        jobs,
        player_points: world.player().points(),
        city_points: world.cities().map(|c| c.points()).sum(),
        board_points: world.board().total_points(),
        entities: world.entity_count(),
    }
}

fn log_summary(sim: &Simulation, tally: &EventTally) {
    let summary = summarize(sim, 0);
    let carried: u64 = sim
        .world()
        .read()
        .entities()
        .map(|e| u64::from(e.points()))
        .sum();
    info!(
        "t={}s player={} cities={} board={} carried={} | delivered={} stolen={} attacks={} drops={}",
        summary.virtual_ms / 1000,
        summary.player_points,
        summary.city_points,
        summary.board_points,
        carried,
        tally.delivered.load(Ordering::Relaxed),
        tally.stolen.load(Ordering::Relaxed),
        tally.attacks.load(Ordering::Relaxed),
        tally.drops.load(Ordering::Relaxed),
    );
}

fn write_snapshot(sim: &Simulation, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&sim.snapshot()).context("Failed to serialize snapshot")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote snapshot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_gameplay::world::WorldSnapshot;
    use tempfile::TempDir;

    fn quick_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.seed = Some(2024);
        config.duration_ms = 60_000;
        config.summary_interval_ms = 15_000;
        config.time_scale = 0.0;
        config
    }

    #[test]
    fn test_run_reaches_end() {
        let summary = run(&quick_config()).expect("run completes");
        assert_eq!(summary.virtual_ms, 60_000);
        assert!(summary.jobs > 0);
        assert_eq!(summary.entities, 4);
    }

    #[test]
    fn test_run_is_deterministic() {
        let a = run(&quick_config()).expect("run completes");
        let b = run(&quick_config()).expect("run completes");
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_written() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("out").join("final.json");
        let mut config = quick_config();
        config.snapshot_path = Some(path.clone());

        run(&config).expect("run completes");

        let json = fs::read_to_string(&path).expect("snapshot exists");
        let snapshot: WorldSnapshot = serde_json::from_str(&json).expect("valid snapshot");
        assert_eq!(snapshot.entities.len(), 4);
        assert_eq!(snapshot.cities.len(), 1);
    }

    #[test]
    fn test_place_gives_up_on_full_grid() {
        let size = GridSize::new(2, 1);
        let mut rng = fastrand::Rng::with_seed(1);
        let mut taken = Vec::new();
        let placed = place(5, size, &mut rng, |pos| {
            if taken.contains(&pos) {
                Err(hoard_common::WorldError::OutOfBounds(pos))
            } else {
                taken.push(pos);
                Ok(())
            }
        });
        assert_eq!(placed, 2);
    }
}
