//! Grid coordinates, directions and the Manhattan metric.

use serde::{Deserialize, Serialize};
use std::ops::Add;

/// A cell position on the game grid.
///
/// Also used as a unit offset (see [`Position::signum_toward`]), where each
/// component is in `-1..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Position {
    /// The origin cell.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Unit offset pointing from `self` toward `target`, one sign per axis.
    #[must_use]
    pub const fn signum_toward(self, target: Self) -> Self {
        Self {
            x: (target.x - self.x).signum(),
            y: (target.y - self.y).signum(),
        }
    }

    /// Returns true if both components are zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Manhattan distance, `|dx| + |dy|`.
#[must_use]
pub const fn distance(a: Position, b: Position) -> u32 {
    a.distance(b)
}

/// Component-wise sum of two positions.
#[must_use]
pub fn add(origin: Position, offset: Position) -> Position {
    origin + offset
}

/// One of the four player movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Negative x
    Left,
    /// Positive x
    Right,
    /// Negative y
    Up,
    /// Positive y
    Down,
}

impl Direction {
    /// Unit offset for this direction.
    #[must_use]
    pub const fn offset(self) -> Position {
        match self {
            Self::Left => Position::new(-1, 0),
            Self::Right => Position::new(1, 0),
            Self::Up => Position::new(0, -1),
            Self::Down => Position::new(0, 1),
        }
    }

    /// Parses a browser-style arrow key name (`"ArrowLeft"`, ...).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Dimensions of the grid in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns
    pub width: u32,
    /// Number of rows
    pub height: u32,
}

impl GridSize {
    /// Creates a new grid size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cells.
    #[must_use]
    pub const fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns true if the position lies on the grid.
    #[must_use]
    pub const fn contains(self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Clamps a position onto the grid.
    #[must_use]
    pub fn clamp(self, pos: Position) -> Position {
        let max_x = self.width.saturating_sub(1) as i32;
        let max_y = self.height.saturating_sub(1) as i32;
        Position::new(pos.x.clamp(0, max_x), pos.y.clamp(0, max_y))
    }

    /// Row-major index of a position, if it lies on the grid.
    #[must_use]
    pub const fn index_of(self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some((pos.y as usize) * (self.width as usize) + (pos.x as usize))
        } else {
            None
        }
    }

    /// Position at a row-major index.
    #[must_use]
    pub const fn position_at(self, index: usize) -> Position {
        let width = self.width as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    /// Iterates every position in row-major order.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        (0..self.area()).map(move |i| self.position_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(distance(Position::new(0, 0), Position::new(3, 4)), 7);
        assert_eq!(distance(Position::new(-2, 5), Position::new(1, 1)), 7);
        assert_eq!(distance(Position::new(2, 2), Position::new(2, 2)), 0);
    }

    #[test]
    fn test_signum_toward() {
        let from = Position::new(5, 5);
        assert_eq!(from.signum_toward(Position::new(9, 1)), Position::new(1, -1));
        assert_eq!(from.signum_toward(Position::new(5, 8)), Position::new(0, 1));
        assert!(from.signum_toward(from).is_zero());
    }

    #[test]
    fn test_add() {
        assert_eq!(add(Position::new(1, 2), Position::new(-1, 1)), Position::new(0, 3));
    }

    #[test]
    fn test_grid_clamp() {
        let grid = GridSize::new(10, 8);
        assert_eq!(grid.clamp(Position::new(-1, 3)), Position::new(0, 3));
        assert_eq!(grid.clamp(Position::new(10, 8)), Position::new(9, 7));
        assert_eq!(grid.clamp(Position::new(4, 4)), Position::new(4, 4));
    }

    #[test]
    fn test_grid_index_roundtrip() {
        let grid = GridSize::new(7, 3);
        for (i, pos) in grid.positions().enumerate() {
            assert_eq!(grid.index_of(pos), Some(i));
        }
        assert_eq!(grid.index_of(Position::new(7, 0)), None);
        assert_eq!(grid.index_of(Position::new(0, -1)), None);
    }

    #[test]
    fn test_direction_from_key() {
        assert_eq!(Direction::from_key("ArrowUp"), Some(Direction::Up));
        assert_eq!(Direction::from_key("Space"), None);
        for dir in [Direction::Left, Direction::Right, Direction::Up, Direction::Down] {
            assert_eq!(dir.offset().x.abs() + dir.offset().y.abs(), 1);
        }
    }
}
