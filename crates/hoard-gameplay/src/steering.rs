//! Direction-biased stepping.
//!
//! An entity heading for a target considers the full step toward it plus two
//! partial alternatives, drops anything off-grid or occupied, and picks one at
//! random. The walk is not guaranteed shortest but it never deadlocks on a
//! single blocker.

use hoard_common::{EntityKey, Position};

use crate::world::World;

/// Unit direction from `from` toward `to`.
#[must_use]
pub const fn direction_toward(from: Position, to: Position) -> Position {
    from.signum_toward(to)
}

/// Candidate next positions, before filtering.
///
/// Diagonal direction: the diagonal step plus each axis alone. Axis-aligned
/// direction: the straight step plus the two forward diagonals. Already on the
/// target: stay put.
#[must_use]
pub fn candidate_steps(from: Position, to: Position) -> Vec<Position> {
    let dir = direction_toward(from, to);
    if dir.is_zero() {
        return vec![from];
    }
    let alternatives = if dir.x != 0 && dir.y != 0 {
        [Position::new(dir.x, 0), Position::new(0, dir.y)]
    } else if dir.x != 0 {
        [Position::new(dir.x, 1), Position::new(dir.x, -1)]
    } else {
        [Position::new(1, dir.y), Position::new(-1, dir.y)]
    };
    std::iter::once(dir)
        .chain(alternatives)
        .map(|offset| from + offset)
        .collect()
}

/// Candidates the entity could legally step onto right now.
#[must_use]
pub fn open_steps(world: &World, key: EntityKey, from: Position, to: Position) -> Vec<Position> {
    candidate_steps(from, to)
        .into_iter()
        .filter(|pos| world.size().contains(*pos) && !world.is_occupied_by_other(*pos, key))
        .collect()
}

/// Picks a random open step toward `to`, or `None` when boxed in.
pub fn choose_step(
    world: &World,
    key: EntityKey,
    from: Position,
    to: Position,
    rng: &mut fastrand::Rng,
) -> Option<Position> {
    let open = open_steps(world, key, from, to);
    if open.is_empty() {
        None
    } else {
        Some(open[rng.usize(..open.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_common::GridSize;

    #[test]
    fn test_diagonal_candidates() {
        let steps = candidate_steps(Position::new(5, 5), Position::new(8, 1));
        assert_eq!(
            steps,
            vec![Position::new(6, 4), Position::new(6, 5), Position::new(5, 4)]
        );
    }

    #[test]
    fn test_straight_candidates() {
        let steps = candidate_steps(Position::new(5, 5), Position::new(5, 9));
        assert_eq!(
            steps,
            vec![Position::new(5, 6), Position::new(6, 6), Position::new(4, 6)]
        );

        let steps = candidate_steps(Position::new(5, 5), Position::new(0, 5));
        assert_eq!(
            steps,
            vec![Position::new(4, 5), Position::new(4, 6), Position::new(4, 4)]
        );
    }

    #[test]
    fn test_on_target_stays() {
        let here = Position::new(2, 2);
        assert_eq!(candidate_steps(here, here), vec![here]);
    }

    #[test]
    fn test_every_candidate_is_adjacent() {
        let from = Position::new(4, 4);
        for x in 0..9 {
            for y in 0..9 {
                for step in candidate_steps(from, Position::new(x, y)) {
                    assert!((step.x - from.x).abs() <= 1 && (step.y - from.y).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn test_open_steps_filters_grid_and_blockers() {
        let mut world = World::new(GridSize::new(5, 5));
        let key = world.create_minion(Position::new(0, 2), "m").expect("free");
        world.create_minion(Position::new(1, 2), "blocker").expect("free");

        // Heading right from the left edge: straight is blocked, both diagonals open.
        let open = open_steps(&world, key, Position::new(0, 2), Position::new(4, 2));
        assert_eq!(open, vec![Position::new(1, 3), Position::new(1, 1)]);

        // In a corner heading up-left: everything is off-grid.
        let corner = world.create_minion(Position::ORIGIN, "c").expect("free");
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(choose_step(&world, corner, Position::ORIGIN, Position::new(-3, -3), &mut rng).is_none());
    }

    #[test]
    fn test_choose_step_is_among_open() {
        let world = World::new(GridSize::new(10, 10));
        let key = EntityKey::from_raw(1);
        let mut rng = fastrand::Rng::with_seed(11);
        let from = Position::new(5, 5);
        let to = Position::new(9, 9);
        let open = open_steps(&world, key, from, to);
        for _ in 0..20 {
            let step = choose_step(&world, key, from, to, &mut rng).expect("open board");
            assert!(open.contains(&step));
        }
    }
}
