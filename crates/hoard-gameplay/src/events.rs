//! Event bus for the rendering and logging layers.

use crossbeam_channel::{bounded, Receiver, Sender};
use hoard_common::{CityKey, EntityKey, Position};
use serde::{Deserialize, Serialize};

use crate::accolades::Accolade;
use crate::entity::EntityType;

/// Something that happened in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Entity created
    EntitySpawned {
        /// Entity key
        key: EntityKey,
        /// Minion or stealer
        entity_type: EntityType,
        /// Where it appeared
        position: Position,
    },
    /// Entity removed from the registry
    EntityRemoved {
        /// Entity key
        key: EntityKey,
    },
    /// Entity changed position or harvested in place
    EntityMoved {
        /// Entity key
        key: EntityKey,
        /// Where it ended up
        position: Position,
        /// Points picked up
        harvested: u32,
    },
    /// Minion unloaded a point into a city
    PointsDelivered {
        /// Minion key
        minion: EntityKey,
        /// Receiving city
        city: CityKey,
    },
    /// Stealer emptied a square
    PointsStolen {
        /// Stealer key
        stealer: EntityKey,
        /// Square raided
        position: Position,
        /// Points taken
        amount: u32,
    },
    /// Stealer engaged a minion
    MinionAttacked {
        /// Stealer key
        stealer: EntityKey,
        /// Minion key
        minion: EntityKey,
    },
    /// City placed
    CityFounded {
        /// City key
        key: CityKey,
        /// Where it stands
        position: Position,
    },
    /// A random point landed
    PointDropped {
        /// Square it landed on; `None` when it went straight to the player
        position: Option<Position>,
    },
    /// Player crossed a milestone
    AccoladeAttained {
        /// The milestone
        accolade: Accolade,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event. Dropped if the bus is full.
    pub fn publish(&self, event: GameEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Drains pending events into a handler.
    pub fn dispatch(&self, handler: &dyn EventHandler) -> usize {
        let mut handled = 0;
        for event in self.receiver.try_iter() {
            handler.handle(&event);
            handled += 1;
        }
        handled
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}

/// Typed event handler trait.
pub trait EventHandler: Send + Sync {
    /// Handles an event.
    fn handle(&self, event: &GameEvent);
}
