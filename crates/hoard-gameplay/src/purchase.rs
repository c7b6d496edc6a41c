//! Player purchases of cities and minions.
//!
//! Preconditions are checked in a fixed order (grid, occupancy, balance) and
//! surfaced as [`PurchaseError`]; nothing is deducted unless the item is
//! actually placed.

use hoard_common::{CityKey, EntityKey, Position, PurchaseError, PurchaseResult, WorldError};
use tracing::info;

use crate::city::random_city_name;
use crate::entity::random_person_name;
use crate::pricing::{next_city_price, next_minion_price};
use crate::world::World;

/// What a purchase produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt<K> {
    /// Key of the new item
    pub key: K,
    /// Points deducted
    pub price: u64,
}

/// Buys a city at `position`.
pub fn purchase_city(
    world: &mut World,
    position: Position,
    rng: &mut fastrand::Rng,
) -> PurchaseResult<Receipt<CityKey>> {
    if !world.size().contains(position) {
        return Err(PurchaseError::OutOfBounds(position));
    }
    if world.city_at(position).is_some() {
        return Err(PurchaseError::Taken(position));
    }
    let price = next_city_price(world.cities());
    charge(world, price)?;

    let key = world
        .found_city(position, random_city_name(rng))
        .map_err(|err| refund_on(world, price, position, err))?;
    info!("Player bought {} at {} for {}", key, position, price);
    Ok(Receipt { key, price })
}

/// Buys a minion at `position`.
pub fn purchase_minion(
    world: &mut World,
    position: Position,
    rng: &mut fastrand::Rng,
) -> PurchaseResult<Receipt<EntityKey>> {
    if !world.size().contains(position) {
        return Err(PurchaseError::OutOfBounds(position));
    }
    if world.occupant_at(position).is_some() {
        return Err(PurchaseError::PositionTaken(position));
    }
    let price = next_minion_price(world.entities());
    charge(world, price)?;

    let key = world
        .create_minion(position, random_person_name(rng))
        .map_err(|err| refund_on(world, price, position, err))?;
    info!("Player bought minion {} at {} for {}", key, position, price);
    Ok(Receipt { key, price })
}

fn charge(world: &mut World, price: u64) -> PurchaseResult<()> {
    let have = world.player().points();
    if world.player_mut().spend(price) {
        Ok(())
    } else {
        Err(PurchaseError::NotEnoughPoints { needed: price, have })
    }
}

/// Puts the price back and maps the placement failure. Only reachable if the
/// prechecks and the registry disagree.
fn refund_on(world: &mut World, price: u64, position: Position, err: WorldError) -> PurchaseError {
    world.player_mut().earn(price);
    match err {
        WorldError::CityExists(_) => PurchaseError::Taken(position),
        WorldError::Occupied(..) => PurchaseError::PositionTaken(position),
        _ => PurchaseError::OutOfBounds(position),
    }
}
