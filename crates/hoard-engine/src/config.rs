//! Runner configuration.
//!
//! Grid, seed, tick bands, starting state and run length. Loaded from a TOML
//! file; anything missing takes its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use hoard_common::GridSize;
use hoard_gameplay::scheduler::{TickBand, TickBands};
use hoard_gameplay::simulation::WorldSettings;

/// Configuration file name.
pub const CONFIG_FILE: &str = "hoard.toml";

/// Largest supported grid side.
const MAX_GRID_SIDE: u32 = 512;

/// Runner configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === World Settings ===
    /// Grid columns
    pub grid_width: u32,
    /// Grid rows
    pub grid_height: u32,
    /// RNG seed (None = random)
    pub seed: Option<u64>,
    /// Points the player starts with
    pub starting_points: u64,

    // === Timing ===
    /// Virtual milliseconds to simulate (0 = run until interrupted)
    pub duration_ms: u64,
    /// Virtual milliseconds per real millisecond (0 = as fast as possible)
    pub time_scale: f64,
    /// Virtual milliseconds between summary log lines
    pub summary_interval_ms: u64,

    // === Initial Population ===
    /// Cities placed for free at start
    pub initial_cities: u32,
    /// Minions placed at start
    pub initial_minions: u32,
    /// Stealers placed at start
    pub initial_stealers: u32,

    // === Output ===
    /// Where to write the final snapshot as JSON
    pub snapshot_path: Option<PathBuf>,
    /// Event bus capacity
    pub event_capacity: usize,

    // === Tick Bands ===
    /// Tick delay bands
    pub tick_bands: TickBands,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // World
            grid_width: 10,
            grid_height: 10,
            seed: None,
            starting_points: 0,

            // Timing
            duration_ms: 120_000, // 2 minutes
            time_scale: 0.0,
            summary_interval_ms: 10_000,

            // Population
            initial_cities: 1,
            initial_minions: 3,
            initial_stealers: 1,

            // Output
            snapshot_path: None,
            event_capacity: 4096,

            tick_bands: TickBands::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // World
        self.grid_width = self.grid_width.clamp(1, MAX_GRID_SIDE);
        self.grid_height = self.grid_height.clamp(1, MAX_GRID_SIDE);

        // Timing
        let bands = &mut self.tick_bands;
        for band in [
            &mut bands.minion,
            &mut bands.stealer,
            &mut bands.point_drop_initial,
            &mut bands.point_drop,
        ] {
            *band = TickBand::new(band.min_ms.max(1), band.max_ms.max(1));
        }
        self.time_scale = if self.time_scale.is_finite() {
            self.time_scale.clamp(0.0, 10_000.0)
        } else {
            0.0
        };
        self.summary_interval_ms = self.summary_interval_ms.max(100);

        // Population: cities and entities each need their own square.
        let area = u32::try_from(self.grid_size().area()).unwrap_or(u32::MAX);
        self.initial_cities = self.initial_cities.min(area);
        self.initial_minions = self.initial_minions.min(area);
        self.initial_stealers = self.initial_stealers.min(area - self.initial_minions);

        // Output
        self.event_capacity = self.event_capacity.clamp(16, 1 << 20);
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn grid_size(&self) -> GridSize {
        GridSize::new(self.grid_width, self.grid_height)
    }

    /// Returns true if the run has no end time.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.duration_ms == 0
    }

    /// Library settings, drawing a random seed if none is configured.
    #[must_use]
    pub fn to_settings(&self) -> WorldSettings {
        WorldSettings {
            size: self.grid_size(),
            seed: self.seed.unwrap_or_else(|| fastrand::u64(..)),
            starting_points: self.starting_points,
            bands: self.tick_bands,
            event_capacity: self.event_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.grid_size(), GridSize::new(10, 10));
        assert_eq!(config.tick_bands.minion, TickBand::new(2500, 3500));
        assert!(!config.is_unbounded());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();

        // Set invalid values
        config.grid_width = 0;
        config.grid_height = 2;
        config.time_scale = f64::NAN;
        config.initial_minions = 10;
        config.initial_stealers = 10;
        config.tick_bands.minion = TickBand {
            min_ms: 900,
            max_ms: 100,
        };

        config.validate();

        // Should be clamped
        assert_eq!(config.grid_width, 1);
        assert!(config.time_scale.abs() < f64::EPSILON);
        assert_eq!(config.initial_minions, 2);
        assert_eq!(config.initial_stealers, 0);
        assert_eq!(config.tick_bands.minion, TickBand::new(100, 900));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = SimConfig::default();
        config.grid_width = 24;
        config.seed = Some(12345);
        config.tick_bands.stealer = TickBand::new(500, 700);
        config.snapshot_path = Some(PathBuf::from("out/final.json"));

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/hoard.toml");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SimConfig = toml::from_str(
            r"
            grid_width = 30
            [tick_bands.minion]
            min_ms = 10
            max_ms = 20
            ",
        )
        .expect("valid toml");
        assert_eq!(config.grid_width, 30);
        assert_eq!(config.grid_height, 10);
        assert_eq!(config.tick_bands.minion, TickBand::new(10, 20));
        assert_eq!(config.tick_bands.point_drop, TickBand::new(1000, 5000));
    }

    #[test]
    fn test_to_settings_uses_seed() {
        let mut config = SimConfig::default();
        config.seed = Some(77);
        let settings = config.to_settings();
        assert_eq!(settings.seed, 77);
        assert_eq!(settings.size, config.grid_size());
    }
}
