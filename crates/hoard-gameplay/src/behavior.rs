//! Behavior engine: per-tick state machines for minions and stealers.
//!
//! A tick is split in two phases. [`decide`] reads the world and returns a
//! [`Decision`]; [`commit`] applies it through the movement resolver, which
//! re-validates against the live world. Between the two the world may change
//! (another entity moved, this entity was removed); commit either absorbs that
//! as a `PositionOccupied`/`NoMoves` outcome or fails with `EntityNotFound`,
//! never applying effects against stale state.
//!
//! The entity's focus lives in the world itself, so there is no side state to
//! keep in sync between ticks.

use hoard_common::{closest, closest_n, CityKey, EntityKey, Position, WorldError, WorldResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::entity::{Entity, MinionFocus, StealerFocus};
use crate::movement::{deliver_point, resolve_move, resolve_steal, MovementOutcome};
use crate::steering::choose_step;
use crate::world::World;

/// How many of the nearest point-bearing squares a minion samples from.
pub const MINION_TARGET_POOL: usize = 3;

/// How many of the nearest point-bearing squares a stealer samples from.
pub const STEALER_TARGET_POOL: usize = 5;

/// A stealer engages minions strictly closer than this.
pub const ATTACK_RANGE: u32 = 2;

/// Once engaged, a stealer keeps attacking minions strictly closer than this.
pub const ATTACK_RANGE_ENGAGED: u32 = 3;

/// What an entity intends to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Minion: adopt `focus` and step onto `destination` (if any)
    Step {
        /// Square to step onto; `None` when boxed in or nothing to do
        destination: Option<Position>,
        /// Focus to hold after this tick
        focus: Option<MinionFocus>,
    },
    /// Minion: commit to the city underfoot and unload one point into it
    Deliver {
        /// City square the minion stands on
        city: Position,
    },
    /// Stealer: jump onto `destination` and take its points
    Steal {
        /// Square to raid; `None` when the board is bare
        destination: Option<Position>,
    },
    /// Stealer: engage a minion
    Attack {
        /// Minion being attacked
        minion: EntityKey,
    },
}

/// What a committed tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickEffect {
    /// Minion step
    Stepped(MovementOutcome),
    /// Minion delivery; `None` when there was nothing to unload
    Delivered(Option<CityKey>),
    /// Stealer raid
    Stole(MovementOutcome),
    /// Stealer engaged a minion
    Attacked(EntityKey),
}

/// Result of one committed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Entity that ticked
    pub key: EntityKey,
    /// What happened
    pub effect: TickEffect,
}

/// Runs one full tick: decide, then commit.
pub fn tick(world: &mut World, key: EntityKey, rng: &mut fastrand::Rng) -> WorldResult<TickReport> {
    let decision = decide(world, key, rng)?;
    commit(world, key, decision)
}

/// Chooses the entity's next action from a read of the world.
pub fn decide(world: &World, key: EntityKey, rng: &mut fastrand::Rng) -> WorldResult<Decision> {
    let entity = world.entity(key)?;
    let decision = if entity.is_minion() {
        decide_minion(world, entity, rng)
    } else {
        decide_stealer(world, entity, rng)
    };
    trace!("{} decided {:?}", key, decision);
    Ok(decision)
}

/// Applies a decision as one atomic commit.
pub fn commit(world: &mut World, key: EntityKey, decision: Decision) -> WorldResult<TickReport> {
    let effect = match decision {
        Decision::Step { destination, focus } => {
            set_minion_focus(world, key, focus)?;
            TickEffect::Stepped(resolve_move(world, key, destination)?)
        },
        Decision::Deliver { city } => {
            set_minion_focus(world, key, Some(MinionFocus::BringingPointsToCity(city)))?;
            TickEffect::Delivered(deliver_point(world, key)?)
        },
        Decision::Steal { destination } => {
            set_stealer_focus(world, key, Some(StealerFocus::StealingPoints))?;
            TickEffect::Stole(resolve_steal(world, key, destination)?)
        },
        Decision::Attack { minion } => {
            set_stealer_focus(world, key, Some(StealerFocus::AttackingMinion(minion)))?;
            // TODO: combat resolution (damage, minion defeat, loot transfer) needs a
            // design decision; until then an attack only records the engagement.
            debug!("{} attacks {}", key, minion);
            TickEffect::Attacked(minion)
        },
    };
    Ok(TickReport { key, effect })
}

fn set_minion_focus(world: &mut World, key: EntityKey, focus: Option<MinionFocus>) -> WorldResult<()> {
    if world.update_entity(key, |e| e.set_minion_focus(focus))? {
        Ok(())
    } else {
        Err(WorldError::WrongKind(key))
    }
}

fn set_stealer_focus(world: &mut World, key: EntityKey, focus: Option<StealerFocus>) -> WorldResult<()> {
    if world.update_entity(key, |e| e.set_stealer_focus(focus))? {
        Ok(())
    } else {
        Err(WorldError::WrongKind(key))
    }
}

// === Minions ===

fn decide_minion(world: &World, minion: &Entity, rng: &mut fastrand::Rng) -> Decision {
    match minion.minion_focus() {
        Some(MinionFocus::BringingPointsToCity(city_pos)) if minion.points() > 0 => {
            return_to_city(world, minion, city_pos, rng)
        },
        focus => acquire_points(world, minion, focus, rng),
    }
}

/// Carrying points toward a committed city: unload on arrival, else keep walking.
fn return_to_city(world: &World, minion: &Entity, city_pos: Position, rng: &mut fastrand::Rng) -> Decision {
    if world.city_at(city_pos).is_none() {
        // The city is gone; head for whichever is nearest now.
        return head_for_nearest_city(world, minion, rng);
    }
    if minion.position() == city_pos {
        return Decision::Deliver { city: city_pos };
    }
    Decision::Step {
        destination: choose_step(world, minion.key(), minion.position(), city_pos, rng),
        focus: Some(MinionFocus::BringingPointsToCity(city_pos)),
    }
}

fn head_for_nearest_city(world: &World, minion: &Entity, rng: &mut fastrand::Rng) -> Decision {
    let Some(city) = closest(world.cities(), minion.position()) else {
        // Nowhere to deliver: hold position and keep whatever focus we had.
        return Decision::Step {
            destination: None,
            focus: minion.minion_focus(),
        };
    };
    let city_pos = city.position();
    if minion.position() == city_pos {
        return Decision::Deliver { city: city_pos };
    }
    Decision::Step {
        destination: choose_step(world, minion.key(), minion.position(), city_pos, rng),
        focus: Some(MinionFocus::BringingPointsToCity(city_pos)),
    }
}

fn acquire_points(
    world: &World,
    minion: &Entity,
    focus: Option<MinionFocus>,
    rng: &mut fastrand::Rng,
) -> Decision {
    if minion.is_at_capacity() {
        return head_for_nearest_city(world, minion, rng);
    }

    let sticky = match focus {
        Some(MinionFocus::GettingPoints(target)) if is_viable_target(world, minion.key(), target) => {
            Some(target)
        },
        _ => None,
    };
    let target = sticky.or_else(|| pick_point_target(world, minion, rng));

    match target {
        Some(target) => Decision::Step {
            destination: choose_step(world, minion.key(), minion.position(), target, rng),
            focus: Some(MinionFocus::GettingPoints(target)),
        },
        None => Decision::Step {
            destination: None,
            focus: None,
        },
    }
}

/// A committed target stays valid while it has points and nobody else stands on it.
fn is_viable_target(world: &World, key: EntityKey, target: Position) -> bool {
    world.board().points_at(target) > 0 && !world.is_occupied_by_other(target, key)
}

/// Random pick among the nearest point-bearing squares no other entity occupies.
fn pick_point_target(world: &World, minion: &Entity, rng: &mut fastrand::Rng) -> Option<Position> {
    let key = minion.key();
    let pool = closest_n(
        world
            .board()
            .squares_with_points()
            .filter(|s| !world.is_occupied_by_other(s.position, key)),
        minion.position(),
        MINION_TARGET_POOL,
    );
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.usize(..pool.len())].position)
}

// === Stealers ===

fn decide_stealer(world: &World, stealer: &Entity, rng: &mut fastrand::Rng) -> Decision {
    let nearest_minion = closest(world.minions(), stealer.position());
    match (stealer.stealer_focus(), nearest_minion) {
        (Some(focus), Some(minion)) => {
            let range = match focus {
                StealerFocus::AttackingMinion(_) => ATTACK_RANGE_ENGAGED,
                StealerFocus::StealingPoints => ATTACK_RANGE,
            };
            if stealer.position().distance(minion.position()) < range {
                Decision::Attack {
                    minion: minion.key(),
                }
            } else {
                steal(world, stealer, rng)
            }
        },
        _ => steal(world, stealer, rng),
    }
}

/// Random pick among the nearest point-bearing squares, occupied or not.
fn steal(world: &World, stealer: &Entity, rng: &mut fastrand::Rng) -> Decision {
    let pool = closest_n(
        world.board().squares_with_points(),
        stealer.position(),
        STEALER_TARGET_POOL,
    );
    let destination = if pool.is_empty() {
        None
    } else {
        Some(pool[rng.usize(..pool.len())].position)
    };
    Decision::Steal { destination }
}
