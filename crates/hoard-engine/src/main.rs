//! # Hoard
//!
//! Headless runner for the Hoard idle game.
//!
//! This binary ties together:
//! - Config: grid, seed, tick bands, initial population
//! - Gameplay: board, cities, minions, stealers and their behavior engine
//! - Timing: wall clock to virtual time

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("hoard=info".parse()?))
        .init();

    info!("Hoard starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let first = args.next();
    if first.as_deref() == Some("--init") {
        let path = args.next().unwrap_or_else(|| CONFIG_FILE.to_string());
        SimConfig::default().save_to(&path)?;
        return Ok(());
    }

    let config_path = first.unwrap_or_else(|| CONFIG_FILE.to_string());
    let mut config = SimConfig::load_from(&config_path);
    config.validate();

    let summary = app::run(&config)?;
    info!(
        "Finished at t={}ms after {} jobs: player={} cities={} board={} entities={}",
        summary.virtual_ms,
        summary.jobs,
        summary.player_points,
        summary.city_points,
        summary.board_points,
        summary.entities
    );

    info!("Hoard shutdown complete");
    Ok(())
}
