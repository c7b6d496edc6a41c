//! # Hoard Common
//!
//! Common types, utilities, and shared abstractions for Hoard.
//!
//! This crate provides foundational types used across all Hoard crates:
//! - Grid geometry (positions, directions, grid size, Manhattan distance)
//! - Nearest-neighbour helpers
//! - Key types (EntityKey, CityKey)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod nearest;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::nearest::*;
}

pub use prelude::*;
