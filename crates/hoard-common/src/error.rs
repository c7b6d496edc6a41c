//! Error types for Hoard.

use thiserror::Error;

use crate::coords::Position;
use crate::ids::{CityKey, EntityKey};

/// Top-level error type for Hoard operations.
#[derive(Debug, Error)]
pub enum HoardError {
    /// World store errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Purchase precondition failures
    #[error("Purchase error: {0}")]
    Purchase(#[from] PurchaseError),
}

/// World store errors.
///
/// `EntityNotFound` is also how a tick learns that its entity was removed
/// between decision and commit; callers drop the tick rather than retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// Entity not in the registry
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityKey),

    /// City not in the registry
    #[error("City not found: {0}")]
    CityNotFound(CityKey),

    /// Position is off the grid
    #[error("Position {0} is outside the grid")]
    OutOfBounds(Position),

    /// Another entity already stands on the position
    #[error("Position {0} is occupied by {1}")]
    Occupied(Position, EntityKey),

    /// A city already stands on the position
    #[error("A city already exists at {0}")]
    CityExists(Position),

    /// Operation needs a minion but got a stealer (or vice versa)
    #[error("Entity {0} is the wrong kind for this operation")]
    WrongKind(EntityKey),
}

/// Purchase precondition failures, surfaced to the caller and never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    /// Player cannot afford the price
    #[error("Not enough points: need {needed}, have {have}")]
    NotEnoughPoints {
        /// Price of the purchase
        needed: u64,
        /// Player balance
        have: u64,
    },

    /// A city already stands there
    #[error("Square {0} is already taken by a city")]
    Taken(Position),

    /// An entity already stands there
    #[error("Position {0} is already taken by an entity")]
    PositionTaken(Position),

    /// Position is off the grid
    #[error("Position {0} is outside the grid")]
    OutOfBounds(Position),
}

/// Result type alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Result type alias for purchases.
pub type PurchaseResult<T> = Result<T, PurchaseError>;

/// Result type alias for Hoard operations.
pub type HoardResult<T> = Result<T, HoardError>;
