//! Nearest-neighbour helpers over anything that sits on the grid.
//!
//! All "closest" queries use the Manhattan metric. Sorting is stable, so
//! items at equal distance keep the order the caller iterated them in.

use crate::coords::Position;

/// Anything with a grid position.
pub trait Positioned {
    /// Current position.
    fn position(&self) -> Position;
}

impl Positioned for Position {
    fn position(&self) -> Position {
        *self
    }
}

impl<P: Positioned + ?Sized> Positioned for &P {
    fn position(&self) -> Position {
        (**self).position()
    }
}

/// The first item at minimal distance from `origin`.
pub fn closest<I, P>(items: I, origin: Position) -> Option<P>
where
    I: IntoIterator<Item = P>,
    P: Positioned,
{
    let mut best: Option<(u32, P)> = None;
    for item in items {
        let d = item.position().distance(origin);
        let nearer = best.as_ref().map_or(true, |(best_d, _)| d < *best_d);
        if nearer {
            best = Some((d, item));
        }
    }
    best.map(|(_, item)| item)
}

/// All items ordered by distance from `origin`, nearest first.
pub fn sorted_by_distance<I, P>(items: I, origin: Position) -> Vec<P>
where
    I: IntoIterator<Item = P>,
    P: Positioned,
{
    let mut items: Vec<P> = items.into_iter().collect();
    items.sort_by_key(|item| item.position().distance(origin));
    items
}

/// The `n` items nearest to `origin`, nearest first.
pub fn closest_n<I, P>(items: I, origin: Position, n: usize) -> Vec<P>
where
    I: IntoIterator<Item = P>,
    P: Positioned,
{
    let mut sorted = sorted_by_distance(items, origin);
    sorted.truncate(n);
    sorted
}
