//! Purchase prices. Always computed live from the registry, never cached.

use crate::city::City;
use crate::entity::Entity;

/// Price of the next item when `count` of its kind already exist: `(count + 1)²`.
#[must_use]
pub fn price_for_count(count: usize) -> u64 {
    let n = (count as u64).saturating_add(1);
    n.saturating_mul(n)
}

/// Price of the next minion.
pub fn next_minion_price<'a, I>(entities: I) -> u64
where
    I: IntoIterator<Item = &'a Entity>,
{
    price_for_count(entities.into_iter().filter(|e| e.is_minion()).count())
}

/// Price of the next city.
pub fn next_city_price<'a, I>(cities: I) -> u64
where
    I: IntoIterator<Item = &'a City>,
{
    price_for_count(cities.into_iter().count())
}
