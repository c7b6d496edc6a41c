//! Player-point milestones.

use serde::{Deserialize, Serialize};

/// A milestone the player can attain once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Accolade {
    /// More than 100 points
    Points100,
    /// More than 1 000 points
    Points1K,
    /// More than 10 000 points
    Points10K,
    /// More than 100 000 points
    Points100K,
    /// More than 1 000 000 points
    Points1M,
}

impl Accolade {
    /// Every accolade, lowest threshold first.
    pub const ALL: [Self; 5] = [
        Self::Points100,
        Self::Points1K,
        Self::Points10K,
        Self::Points100K,
        Self::Points1M,
    ];

    /// The balance must be strictly above this.
    #[must_use]
    pub const fn threshold(self) -> u64 {
        match self {
            Self::Points100 => 100,
            Self::Points1K => 1_000,
            Self::Points10K => 10_000,
            Self::Points100K => 100_000,
            Self::Points1M => 1_000_000,
        }
    }

    /// Returns true if `points` meets the requirement.
    #[must_use]
    pub const fn is_met_by(self, points: u64) -> bool {
        points > self.threshold()
    }
}

/// Attained accolades, in attainment order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccoladeTracker {
    attained: Vec<Accolade>,
}

impl AccoladeTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accolades attained so far.
    #[must_use]
    pub fn attained(&self) -> &[Accolade] {
        &self.attained
    }

    /// Returns true if `accolade` was already attained.
    #[must_use]
    pub fn has(&self, accolade: Accolade) -> bool {
        self.attained.contains(&accolade)
    }

    /// Records every newly met accolade and returns them.
    pub fn check(&mut self, points: u64) -> Vec<Accolade> {
        let fresh: Vec<Accolade> = Accolade::ALL
            .into_iter()
            .filter(|a| a.is_met_by(points) && !self.has(*a))
            .collect();
        self.attained.extend_from_slice(&fresh);
        fresh
    }
}
