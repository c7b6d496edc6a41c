//! Movement resolver: legality check, point transfer and outcome reporting.
//!
//! Every function here is one atomic commit against the live world. Nothing is
//! decided from a stale read: occupancy and square points are re-read at the
//! moment the effect is applied, so a lost race reports `PositionOccupied`
//! and leaves the world untouched.

use hoard_common::{CityKey, EntityKey, Position, WorldError, WorldResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::world::World;

/// Primary result of a move attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStatus {
    /// The entity moved and collected what fit
    Moved,
    /// No destination was available; nothing changed
    NoMoves,
    /// Another entity stands on the destination; nothing changed
    PositionOccupied,
}

/// One reportable movement signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementSignal {
    /// See [`MoveStatus::Moved`]
    Moved,
    /// See [`MoveStatus::NoMoves`]
    NoMoves,
    /// See [`MoveStatus::PositionOccupied`]
    PositionOccupied,
    /// The entity was already full when the move was evaluated
    HoldingTooManyPoints,
}

/// Tagged outcome of a move attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementOutcome {
    /// What happened
    pub status: MoveStatus,
    /// Capacity signal, co-reported with any status
    pub holding_too_many_points: bool,
    /// Points moved from the square onto the entity
    pub transferred: u32,
}

impl MovementOutcome {
    const fn unmoved(status: MoveStatus, holding_too_many_points: bool) -> Self {
        Self {
            status,
            holding_too_many_points,
            transferred: 0,
        }
    }

    /// Returns true if the entity changed position or harvested.
    #[must_use]
    pub const fn moved(&self) -> bool {
        matches!(self.status, MoveStatus::Moved)
    }

    /// Every signal this outcome carries.
    #[must_use]
    pub fn signals(&self) -> Vec<MovementSignal> {
        let mut signals = Vec::with_capacity(2);
        if self.holding_too_many_points {
            signals.push(MovementSignal::HoldingTooManyPoints);
        }
        signals.push(match self.status {
            MoveStatus::Moved => MovementSignal::Moved,
            MoveStatus::NoMoves => MovementSignal::NoMoves,
            MoveStatus::PositionOccupied => MovementSignal::PositionOccupied,
        });
        signals
    }
}

/// Moves an entity onto `destination` and harvests what fits.
///
/// `None` or an off-grid destination reports `NoMoves`. The transfer is
/// `min(capacity remaining, square points)`; the square is never removed.
pub fn resolve_move(
    world: &mut World,
    key: EntityKey,
    destination: Option<Position>,
) -> WorldResult<MovementOutcome> {
    let entity = world.entity(key)?;
    let holding = entity.is_at_capacity();
    let capacity_remaining = entity.capacity_remaining();

    let Some(destination) = destination.filter(|d| world.size().contains(*d)) else {
        trace!("{} has no moves", key);
        return Ok(MovementOutcome::unmoved(MoveStatus::NoMoves, holding));
    };
    if world.is_occupied_by_other(destination, key) {
        trace!("{} blocked at {}", key, destination);
        return Ok(MovementOutcome::unmoved(MoveStatus::PositionOccupied, holding));
    }

    let available = world.board().points_at(destination);
    let transfer = capacity_remaining.min(available);
    world.relocate_entity(key, destination)?;
    let taken = world.board_mut().take_points(destination, transfer)?;
    debug_assert_eq!(taken, transfer, "square lost points between read and take");
    credit_entity(world, key, taken)?;

    Ok(MovementOutcome {
        status: MoveStatus::Moved,
        holding_too_many_points: holding,
        transferred: taken,
    })
}

/// Jumps a stealer straight onto `destination` and takes every point there.
///
/// Exclusivity is still enforced at commit: a stealer never lands on another
/// entity even though its target selection ignores occupancy.
pub fn resolve_steal(
    world: &mut World,
    key: EntityKey,
    destination: Option<Position>,
) -> WorldResult<MovementOutcome> {
    let entity = world.entity(key)?;
    if !entity.is_stealer() {
        return Err(WorldError::WrongKind(key));
    }

    let Some(destination) = destination.filter(|d| world.size().contains(*d)) else {
        return Ok(MovementOutcome::unmoved(MoveStatus::NoMoves, false));
    };
    if world.is_occupied_by_other(destination, key) {
        trace!("{} steal blocked at {}", key, destination);
        return Ok(MovementOutcome::unmoved(MoveStatus::PositionOccupied, false));
    }

    world.relocate_entity(key, destination)?;
    let stolen = world.board_mut().take_all_points(destination)?;
    credit_entity(world, key, stolen)?;
    if stolen > 0 {
        debug!("{} stole {} points at {}", key, stolen, destination);
    }

    Ok(MovementOutcome {
        status: MoveStatus::Moved,
        holding_too_many_points: false,
        transferred: stolen,
    })
}

/// Unloads one point from a minion into the city it stands on.
///
/// Returns the receiving city, or `None` when the minion is empty or not on a
/// city (a no-op tick).
pub fn deliver_point(world: &mut World, key: EntityKey) -> WorldResult<Option<CityKey>> {
    let entity = world.entity(key)?;
    if !entity.is_minion() {
        return Err(WorldError::WrongKind(key));
    }
    if entity.points() == 0 {
        return Ok(None);
    }
    let Some(city_key) = world.city_at(entity.position()).map(|c| c.key()) else {
        debug!("{} tried to deliver away from a city", key);
        return Ok(None);
    };

    world.update_city(city_key, |city| city.add_points(1))?;
    world.update_entity(key, |e| {
        debug_assert!(e.points() > 0, "delivery from an empty minion");
        e.set_points(e.points().saturating_sub(1));
    })?;
    trace!("{} delivered 1 point to {}", key, city_key);
    Ok(Some(city_key))
}

fn credit_entity(world: &mut World, key: EntityKey, amount: u32) -> WorldResult<()> {
    world.update_entity(key, |e| e.set_points(e.points().saturating_add(amount)))
}
