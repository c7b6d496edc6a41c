//! The world store: single source of truth for board, player, cities and entities.
//!
//! Every mutation goes through a method on [`World`] so that invariants
//! (one entity per position, one city per position, non-negative points) are
//! checked where the write happens. [`WorldHandle`] wraps the world in a lock
//! for callers that read snapshots from another thread.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use hoard_common::{
    CityKey, EntityKey, GridSize, Position, WorldError, WorldResult,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Board, BoardSquare};
use crate::city::City;
use crate::entity::Entity;
use crate::player::Player;

/// The whole mutable game state.
#[derive(Debug, Clone)]
pub struct World {
    board: Board,
    player: Player,
    /// Keyed by creation order, which is also tie-break order for "nearest city"
    cities: BTreeMap<CityKey, City>,
    entities: BTreeMap<EntityKey, Entity>,
    /// Position index kept in lockstep with `entities`
    occupancy: AHashMap<Position, EntityKey>,
    next_entity_key: u64,
    next_city_key: u64,
}

impl World {
    /// Creates an empty world with the player at the origin.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        info!("Creating {}x{} world", size.width, size.height);
        Self {
            board: Board::new(size),
            player: Player::new(Position::ORIGIN),
            cities: BTreeMap::new(),
            entities: BTreeMap::new(),
            occupancy: AHashMap::new(),
            next_entity_key: 1,
            next_city_key: 1,
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.board.size()
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    // === Cities ===

    /// Cities in creation order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Number of cities.
    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// City by key.
    pub fn city(&self, key: CityKey) -> WorldResult<&City> {
        self.cities.get(&key).ok_or(WorldError::CityNotFound(key))
    }

    /// City standing at a position.
    #[must_use]
    pub fn city_at(&self, pos: Position) -> Option<&City> {
        self.cities.values().find(|c| c.position() == pos)
    }

    /// Places a new city. Fails off-grid or where a city already stands.
    pub fn found_city(&mut self, position: Position, name: impl Into<String>) -> WorldResult<CityKey> {
        if !self.size().contains(position) {
            return Err(WorldError::OutOfBounds(position));
        }
        if self.city_at(position).is_some() {
            return Err(WorldError::CityExists(position));
        }
        let key = CityKey::from_raw(self.next_city_key);
        self.next_city_key += 1;
        let city = City::new(key, name, position);
        info!("Founded city {} '{}' at {}", key, city.name(), position);
        self.cities.insert(key, city);
        Ok(key)
    }

    /// Atomic read-modify-write on a city.
    pub fn update_city<R>(&mut self, key: CityKey, f: impl FnOnce(&mut City) -> R) -> WorldResult<R> {
        let city = self.cities.get_mut(&key).ok_or(WorldError::CityNotFound(key))?;
        Ok(f(city))
    }

    // === Entities ===

    /// Entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Minions in creation order.
    pub fn minions(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_minion())
    }

    /// Keys of every registered entity.
    pub fn entity_keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entities.keys().copied()
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entity by key.
    pub fn entity(&self, key: EntityKey) -> WorldResult<&Entity> {
        self.entities.get(&key).ok_or(WorldError::EntityNotFound(key))
    }

    /// Returns true if the entity is registered.
    #[must_use]
    pub fn contains_entity(&self, key: EntityKey) -> bool {
        self.entities.contains_key(&key)
    }

    /// Entity standing at a position.
    #[must_use]
    pub fn occupant_at(&self, pos: Position) -> Option<EntityKey> {
        self.occupancy.get(&pos).copied()
    }

    /// Returns true if some entity other than `key` stands at `pos`.
    #[must_use]
    pub fn is_occupied_by_other(&self, pos: Position, key: EntityKey) -> bool {
        self.occupant_at(pos).is_some_and(|occupant| occupant != key)
    }

    /// Registers a minion. Fails off-grid or on an occupied position.
    pub fn create_minion(&mut self, position: Position, name: impl Into<String>) -> WorldResult<EntityKey> {
        self.insert_entity(position, |key| Entity::minion(key, name, position))
    }

    /// Registers a stealer. Fails off-grid or on an occupied position.
    pub fn create_stealer(&mut self, position: Position, name: impl Into<String>) -> WorldResult<EntityKey> {
        self.insert_entity(position, |key| Entity::stealer(key, name, position))
    }

    fn insert_entity(
        &mut self,
        position: Position,
        build: impl FnOnce(EntityKey) -> Entity,
    ) -> WorldResult<EntityKey> {
        if !self.size().contains(position) {
            return Err(WorldError::OutOfBounds(position));
        }
        if let Some(occupant) = self.occupant_at(position) {
            return Err(WorldError::Occupied(position, occupant));
        }
        let key = EntityKey::from_raw(self.next_entity_key);
        self.next_entity_key += 1;
        let entity = build(key);
        info!(
            "Spawned {:?} {} '{}' at {}",
            entity.entity_type(),
            key,
            entity.name(),
            position
        );
        self.occupancy.insert(position, key);
        self.entities.insert(key, entity);
        Ok(key)
    }

    /// Removes an entity from the registry and returns it.
    pub fn remove_entity(&mut self, key: EntityKey) -> WorldResult<Entity> {
        let entity = self.entities.remove(&key).ok_or(WorldError::EntityNotFound(key))?;
        self.occupancy.remove(&entity.position());
        info!("Removed {} '{}'", key, entity.name());
        Ok(entity)
    }

    /// Atomic read-modify-write on an entity.
    ///
    /// Position is not writable through this path; use the movement resolver.
    pub fn update_entity<R>(&mut self, key: EntityKey, f: impl FnOnce(&mut Entity) -> R) -> WorldResult<R> {
        let entity = self.entities.get_mut(&key).ok_or(WorldError::EntityNotFound(key))?;
        Ok(f(entity))
    }

    /// Moves an entity, re-validating exclusivity against the live world.
    pub(crate) fn relocate_entity(&mut self, key: EntityKey, destination: Position) -> WorldResult<()> {
        if !self.size().contains(destination) {
            return Err(WorldError::OutOfBounds(destination));
        }
        if let Some(occupant) = self.occupant_at(destination) {
            if occupant != key {
                return Err(WorldError::Occupied(destination, occupant));
            }
        }
        let entity = self.entities.get_mut(&key).ok_or(WorldError::EntityNotFound(key))?;
        let from = entity.position();
        entity.set_position(destination);
        self.occupancy.remove(&from);
        self.occupancy.insert(destination, key);
        debug!("{} moved {} -> {}", key, from, destination);
        Ok(())
    }

    // === Snapshots ===

    /// Read-only copy of the state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            size: self.size(),
            squares: self.board.squares().to_vec(),
            player: self.player.clone(),
            cities: self.cities.values().cloned().collect(),
            entities: self.entities.values().cloned().collect(),
        }
    }

    /// Points held anywhere: board, player, cities and entities.
    ///
    /// Movement and delivery conserve this; only point drops add to it and
    /// purchases remove from it.
    #[must_use]
    pub fn total_points(&self) -> u64 {
        self.board.total_points()
            + self.player.points()
            + self.cities.values().map(City::points).sum::<u64>()
            + self.entities.values().map(|e| u64::from(e.points())).sum::<u64>()
    }
}

/// Serializable read-only view of the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Grid dimensions
    pub size: GridSize,
    /// Every square, row-major
    pub squares: Vec<BoardSquare>,
    /// Player state
    pub player: Player,
    /// Cities in creation order
    pub cities: Vec<City>,
    /// Entities in creation order
    pub entities: Vec<Entity>,
}

/// Shared, lock-guarded world.
///
/// Readers take a consistent snapshot; every tick commits under one write
/// lock, which serializes all mutations.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    inner: Arc<RwLock<World>>,
}

impl WorldHandle {
    /// Wraps a world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, World> {
        self.inner.read()
    }

    /// Exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, World> {
        self.inner.write()
    }

    /// Runs `f` as one atomic commit.
    pub fn transact<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        let mut world = self.inner.write();
        f(&mut world)
    }

    /// Read-only copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.inner.read().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(GridSize::new(10, 10))
    }

    #[test]
    fn test_new_world() {
        let w = world();
        assert_eq!(w.board().squares().len(), 100);
        assert_eq!(w.player().position(), Position::ORIGIN);
        assert_eq!(w.entity_count(), 0);
        assert_eq!(w.city_count(), 0);
    }

    #[test]
    fn test_create_entities_enforces_exclusion() {
        let mut w = world();
        let a = w.create_minion(Position::new(2, 2), "a").expect("free square");
        let result = w.create_stealer(Position::new(2, 2), "b");
        assert_eq!(result, Err(WorldError::Occupied(Position::new(2, 2), a)));
        assert_eq!(w.occupant_at(Position::new(2, 2)), Some(a));

        let off = w.create_minion(Position::new(10, 0), "c");
        assert_eq!(off, Err(WorldError::OutOfBounds(Position::new(10, 0))));
    }

    #[test]
    fn test_keys_never_reused() {
        let mut w = world();
        let a = w.create_minion(Position::new(0, 1), "a").expect("free square");
        w.remove_entity(a).expect("registered");
        let b = w.create_minion(Position::new(0, 1), "b").expect("free square again");
        assert_ne!(a, b);
        assert!(!w.contains_entity(a));
    }

    #[test]
    fn test_remove_frees_position() {
        let mut w = world();
        let a = w.create_minion(Position::new(4, 4), "a").expect("free square");
        let removed = w.remove_entity(a).expect("registered");
        assert_eq!(removed.key(), a);
        assert_eq!(w.occupant_at(Position::new(4, 4)), None);
        assert_eq!(w.remove_entity(a), Err(WorldError::EntityNotFound(a)));
    }

    #[test]
    fn test_found_city_once_per_position() {
        let mut w = world();
        let key = w.found_city(Position::new(5, 5), "juno'we'down").expect("free square");
        assert_eq!(w.city(key).map(City::position), Ok(Position::new(5, 5)));
        assert_eq!(
            w.found_city(Position::new(5, 5), "other"),
            Err(WorldError::CityExists(Position::new(5, 5)))
        );
    }

    #[test]
    fn test_relocate_revalidates() {
        let mut w = world();
        let a = w.create_minion(Position::new(1, 1), "a").expect("free square");
        let b = w.create_minion(Position::new(3, 3), "b").expect("free square");

        assert_eq!(
            w.relocate_entity(a, Position::new(3, 3)),
            Err(WorldError::Occupied(Position::new(3, 3), b))
        );
        w.relocate_entity(a, Position::new(2, 2)).expect("free square");
        assert_eq!(w.occupant_at(Position::new(2, 2)), Some(a));
        assert_eq!(w.occupant_at(Position::new(1, 1)), None);

        // Staying put is always allowed.
        w.relocate_entity(a, Position::new(2, 2)).expect("own square");
    }

    #[test]
    fn test_update_entity_missing() {
        let mut w = world();
        let missing = EntityKey::from_raw(42);
        assert_eq!(
            w.update_entity(missing, |e| e.points()),
            Err(WorldError::EntityNotFound(missing))
        );
    }

    #[test]
    fn test_snapshot_and_handle() {
        let mut w = world();
        w.create_minion(Position::new(1, 0), "a").expect("free square");
        w.board_mut().add_points(Position::new(2, 0), 3).expect("on grid");

        let handle = WorldHandle::new(w);
        let snap = handle.snapshot();
        assert_eq!(snap.entities.len(), 1);
        assert_eq!(snap.squares.iter().map(|s| s.points).sum::<u32>(), 3);

        handle.transact(|w| w.found_city(Position::new(9, 9), "c")).expect("free square");
        assert_eq!(handle.read().city_count(), 1);
        assert_eq!(handle.read().total_points(), 3);
    }
}
