//! # Hoard Gameplay
//!
//! Gameplay systems for Hoard.
//!
//! This crate provides the world model and the autonomous behavior engine:
//! - Board of point-bearing squares, cities and the player
//! - Minions (gather and deliver) and stealers (raid and attack)
//! - World store with one-entity-per-square occupancy
//! - Movement resolver and direction-biased steering
//! - Per-entity behavior state machines (decide, then commit)
//! - Discrete-event tick scheduler on a virtual clock
//! - Purchases with escalating prices
//! - Accolades and the event bus
//! - `Simulation`, which drives all of the above

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod accolades;
pub mod behavior;
pub mod board;
pub mod city;
pub mod entity;
pub mod events;
pub mod movement;
pub mod player;
pub mod pricing;
pub mod purchase;
pub mod scheduler;
pub mod simulation;
pub mod steering;
pub mod world;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::accolades::*;
    pub use crate::behavior::*;
    pub use crate::board::*;
    pub use crate::city::*;
    pub use crate::entity::*;
    pub use crate::events::*;
    pub use crate::movement::*;
    pub use crate::player::*;
    pub use crate::pricing::*;
    pub use crate::purchase::*;
    pub use crate::scheduler::*;
    pub use crate::simulation::*;
    pub use crate::steering::*;
    pub use crate::world::*;
}

pub use prelude::*;
