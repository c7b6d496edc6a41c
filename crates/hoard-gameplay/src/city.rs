//! Cities: player-founded drop-off points for minion deliveries.

use hoard_common::{CityKey, Position, Positioned};
use serde::{Deserialize, Serialize};

/// Health every new city starts with.
pub const CITY_START_HEALTH: u32 = 100;

const NAME_PREFIX: [&str; 7] = ["vala", "ohara", "yeekzi", "cola", "coko", "juno", "bran"];
const NAME_MIDFIX: [&str; 6] = ["we", "wo", "wonde", "ynsi", "onsu", "inci"];
const NAME_POSTFIX: [&str; 6] = ["down", "lore", "bloon", "dreek", "zolo", "traz"];

/// A city on the board.
///
/// A city's points are a pool separate from the square it stands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    key: CityKey,
    name: String,
    health: u32,
    points: u64,
    position: Position,
}

impl City {
    /// Creates a fresh city.
    #[must_use]
    pub fn new(key: CityKey, name: impl Into<String>, position: Position) -> Self {
        Self {
            key,
            name: name.into(),
            health: CITY_START_HEALTH,
            points: 0,
            position,
        }
    }

    /// City key.
    #[must_use]
    pub const fn key(&self) -> CityKey {
        self.key
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Points delivered so far.
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Position on the grid.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Credits delivered points.
    pub fn add_points(&mut self, amount: u64) {
        self.points = self.points.saturating_add(amount);
    }
}

impl Positioned for City {
    fn position(&self) -> Position {
        self.position
    }
}

/// Random `prefix'midfix'postfix` city name.
#[must_use]
pub fn random_city_name(rng: &mut fastrand::Rng) -> String {
    [
        NAME_PREFIX[rng.usize(..NAME_PREFIX.len())],
        NAME_MIDFIX[rng.usize(..NAME_MIDFIX.len())],
        NAME_POSTFIX[rng.usize(..NAME_POSTFIX.len())],
    ]
    .join("'")
}
