//! The player token and the random point drops that feed the board.
//!
//! The player is not driven by the behavior engine; it moves only on direct
//! input, but it harvests from the same squares the entities compete for.

use hoard_common::{Direction, Position, WorldResult};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::world::World;

/// Player state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    points: u64,
    position: Position,
}

impl Player {
    /// Creates a player with no points.
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self {
            points: 0,
            position,
        }
    }

    /// Points banked.
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn earn(&mut self, amount: u64) {
        self.points = self.points.saturating_add(amount);
    }

    /// Deducts `amount` if affordable.
    pub(crate) fn spend(&mut self, amount: u64) -> bool {
        if self.points < amount {
            return false;
        }
        self.points -= amount;
        true
    }
}

/// Where a random point landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointDrop {
    /// Straight into the player's balance
    Player,
    /// Onto the square at this position
    Square(Position),
}

/// Moves the player one cell, clamped to the grid, and harvests the square.
///
/// Returns the number of points collected.
pub fn move_player(world: &mut World, direction: Direction) -> WorldResult<u32> {
    let size = world.size();
    let destination = size.clamp(world.player().position() + direction.offset());
    let harvested = world.board_mut().take_all_points(destination)?;
    let player = world.player_mut();
    player.position = destination;
    player.earn(u64::from(harvested));
    trace!("Player moved {:?} to {}, +{}", direction, destination, harvested);
    Ok(harvested)
}

/// Drops one point on a uniformly random square.
///
/// When the player stands on the chosen square the point goes to the player.
pub fn drop_random_point(world: &mut World, rng: &mut fastrand::Rng) -> WorldResult<PointDrop> {
    let size = world.size();
    let target = size.position_at(rng.usize(..size.area().max(1)));
    if world.player().position() == target {
        world.player_mut().earn(1);
        return Ok(PointDrop::Player);
    }
    world.board_mut().add_points(target, 1)?;
    Ok(PointDrop::Square(target))
}
