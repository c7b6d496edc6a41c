//! Autonomous entities: minions and stealers.

use hoard_common::{EntityKey, Position, Positioned};
use serde::{Deserialize, Serialize};

/// Carry capacity of a fresh minion.
pub const MINION_MAX_POINTS: u32 = 10;

/// Attack power of a fresh stealer.
pub const STEALER_ATTACK: u32 = 3;

const FIRST_NAMES: [&str; 25] = [
    "Alexa", "Bob", "Carly", "Dillon", "Erica", "Fred", "Georgia", "Harry", "Isabella", "Joe",
    "Kayla", "Leo", "Maxine", "Nick", "Olivia", "Peter", "Quinn", "Rick", "Sarah", "Travis", "Uma",
    "Victor", "Wonda", "Xavier", "Zoe",
];

const LAST_NAMES: [&str; 10] = [
    "Alexander", "Berry", "Crown", "Delight", "England", "Freed", "Gourse", "Hilde", "Indie",
    "Jackson",
];

/// Which variant an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Gathers points and delivers them to cities
    Minion,
    /// Raids points and harasses minions
    Stealer,
}

/// What a minion is currently committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinionFocus {
    /// Walking to the square at this position to harvest it
    GettingPoints(Position),
    /// Walking to (or unloading at) the city at this position
    BringingPointsToCity(Position),
}

/// What a stealer is currently committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StealerFocus {
    /// Jumping between point-bearing squares
    StealingPoints,
    /// Engaging the minion with this key
    AttackingMinion(EntityKey),
}

/// Variant-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Minion state
    Minion {
        /// Carry capacity
        max_points: u32,
        /// Current commitment
        focus: Option<MinionFocus>,
    },
    /// Stealer state
    Stealer {
        /// Attack power
        attack: u32,
        /// Current commitment
        focus: Option<StealerFocus>,
    },
}

/// A minion or stealer on the board.
///
/// Position changes go through the world so collision exclusion is enforced in
/// one place; everything else can be updated through `World::update_entity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    key: EntityKey,
    name: String,
    position: Position,
    points: u32,
    kind: EntityKind,
}

impl Entity {
    /// Creates an empty-handed minion with no focus.
    #[must_use]
    pub fn minion(key: EntityKey, name: impl Into<String>, position: Position) -> Self {
        Self {
            key,
            name: name.into(),
            position,
            points: 0,
            kind: EntityKind::Minion {
                max_points: MINION_MAX_POINTS,
                focus: None,
            },
        }
    }

    /// Creates an empty-handed stealer with no focus.
    #[must_use]
    pub fn stealer(key: EntityKey, name: impl Into<String>, position: Position) -> Self {
        Self {
            key,
            name: name.into(),
            position,
            points: 0,
            kind: EntityKind::Stealer {
                attack: STEALER_ATTACK,
                focus: None,
            },
        }
    }

    /// Entity key.
    #[must_use]
    pub const fn key(&self) -> EntityKey {
        self.key
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, pos: Position) {
        self.position = pos;
    }

    /// Points currently carried.
    #[must_use]
    pub const fn points(&self) -> u32 {
        self.points
    }

    /// Sets carried points, clamped to capacity.
    pub fn set_points(&mut self, points: u32) {
        debug_assert!(
            self.capacity().map_or(true, |cap| points <= cap),
            "{} would carry {points} points, over capacity",
            self.key
        );
        self.points = self.capacity().map_or(points, |cap| points.min(cap));
    }

    /// Variant-specific state.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Which variant this is.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self.kind {
            EntityKind::Minion { .. } => EntityType::Minion,
            EntityKind::Stealer { .. } => EntityType::Stealer,
        }
    }

    /// Returns true for minions.
    #[must_use]
    pub const fn is_minion(&self) -> bool {
        matches!(self.kind, EntityKind::Minion { .. })
    }

    /// Returns true for stealers.
    #[must_use]
    pub const fn is_stealer(&self) -> bool {
        matches!(self.kind, EntityKind::Stealer { .. })
    }

    /// Carry capacity; `None` means unbounded (stealers).
    #[must_use]
    pub const fn capacity(&self) -> Option<u32> {
        match self.kind {
            EntityKind::Minion { max_points, .. } => Some(max_points),
            EntityKind::Stealer { .. } => None,
        }
    }

    /// How many more points fit.
    #[must_use]
    pub fn capacity_remaining(&self) -> u32 {
        self.capacity()
            .map_or(u32::MAX - self.points, |cap| cap.saturating_sub(self.points))
    }

    /// Returns true once carried points meet or exceed capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.capacity().is_some_and(|cap| self.points >= cap)
    }

    /// Minion focus; `None` for stealers or unfocused minions.
    #[must_use]
    pub const fn minion_focus(&self) -> Option<MinionFocus> {
        match self.kind {
            EntityKind::Minion { focus, .. } => focus,
            EntityKind::Stealer { .. } => None,
        }
    }

    /// Stealer focus; `None` for minions or unfocused stealers.
    #[must_use]
    pub const fn stealer_focus(&self) -> Option<StealerFocus> {
        match self.kind {
            EntityKind::Stealer { focus, .. } => focus,
            EntityKind::Minion { .. } => None,
        }
    }

    /// Replaces a minion's focus. Returns false (and does nothing) on a stealer.
    pub fn set_minion_focus(&mut self, new_focus: Option<MinionFocus>) -> bool {
        match &mut self.kind {
            EntityKind::Minion { focus, .. } => {
                *focus = new_focus;
                true
            },
            EntityKind::Stealer { .. } => false,
        }
    }

    /// Replaces a stealer's focus. Returns false (and does nothing) on a minion.
    pub fn set_stealer_focus(&mut self, new_focus: Option<StealerFocus>) -> bool {
        match &mut self.kind {
            EntityKind::Stealer { focus, .. } => {
                *focus = new_focus;
                true
            },
            EntityKind::Minion { .. } => false,
        }
    }
}

impl Positioned for Entity {
    fn position(&self) -> Position {
        self.position
    }
}

/// Random "First Last" name for a new entity.
#[must_use]
pub fn random_person_name(rng: &mut fastrand::Rng) -> String {
    format!(
        "{} {}",
        FIRST_NAMES[rng.usize(..FIRST_NAMES.len())],
        LAST_NAMES[rng.usize(..LAST_NAMES.len())]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minion() -> Entity {
        Entity::minion(EntityKey::from_raw(1), "Bob Berry", Position::new(1, 1))
    }

    #[test]
    fn test_minion_defaults() {
        let m = minion();
        assert_eq!(m.entity_type(), EntityType::Minion);
        assert_eq!(m.capacity(), Some(MINION_MAX_POINTS));
        assert_eq!(m.capacity_remaining(), MINION_MAX_POINTS);
        assert!(!m.is_at_capacity());
        assert!(m.minion_focus().is_none());
    }

    #[test]
    fn test_stealer_is_unbounded() {
        let mut s = Entity::stealer(EntityKey::from_raw(2), "Zoe Crown", Position::ORIGIN);
        assert!(s.is_stealer());
        assert_eq!(s.capacity(), None);
        s.set_points(1_000);
        assert!(!s.is_at_capacity());
        assert_eq!(s.capacity_remaining(), u32::MAX - 1_000);
    }

    #[test]
    fn test_capacity_tracking() {
        let mut m = minion();
        m.set_points(MINION_MAX_POINTS - 1);
        assert_eq!(m.capacity_remaining(), 1);
        assert!(!m.is_at_capacity());

        m.set_points(MINION_MAX_POINTS);
        assert!(m.is_at_capacity());
        assert_eq!(m.capacity_remaining(), 0);
    }

    #[test]
    fn test_focus_is_variant_checked() {
        let mut m = minion();
        assert!(m.set_minion_focus(Some(MinionFocus::GettingPoints(Position::new(3, 3)))));
        assert!(!m.set_stealer_focus(Some(StealerFocus::StealingPoints)));
        assert_eq!(
            m.minion_focus().map(MinionFocus::target),
            Some(Position::new(3, 3))
        );
        assert!(m.stealer_focus().is_none());
    }

    #[test]
    fn test_random_person_name() {
        let mut rng = fastrand::Rng::with_seed(1);
        let name = random_person_name(&mut rng);
        let (first, last) = name.split_once(' ').expect("two words");
        assert!(FIRST_NAMES.contains(&first));
        assert!(LAST_NAMES.contains(&last));
    }
}
