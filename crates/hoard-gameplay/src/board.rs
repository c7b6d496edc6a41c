//! The point-bearing grid.

use hoard_common::{GridSize, Position, Positioned, WorldError, WorldResult};
use serde::{Deserialize, Serialize};

/// One grid cell's point pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSquare {
    /// Cell position
    pub position: Position,
    /// Points lying on the cell
    pub points: u32,
}

impl BoardSquare {
    /// Creates an empty square.
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self {
            position,
            points: 0,
        }
    }

    /// Returns true if there is anything to harvest.
    #[must_use]
    pub const fn has_points(&self) -> bool {
        self.points > 0
    }
}

impl Positioned for BoardSquare {
    fn position(&self) -> Position {
        self.position
    }
}

/// Row-major storage of every square on the grid.
///
/// Squares are created once and never removed; only their points change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    size: GridSize,
    squares: Vec<BoardSquare>,
}

impl Board {
    /// Creates a board with one empty square per cell.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            squares: size.positions().map(BoardSquare::new).collect(),
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// All squares, row-major.
    #[must_use]
    pub fn squares(&self) -> &[BoardSquare] {
        &self.squares
    }

    /// Square at a position.
    #[must_use]
    pub fn square(&self, pos: Position) -> Option<&BoardSquare> {
        self.size.index_of(pos).map(|i| &self.squares[i])
    }

    /// Squares that currently hold points.
    pub fn squares_with_points(&self) -> impl Iterator<Item = &BoardSquare> {
        self.squares.iter().filter(|s| s.has_points())
    }

    /// Sum of points lying on the board.
    #[must_use]
    pub fn total_points(&self) -> u64 {
        self.squares.iter().map(|s| u64::from(s.points)).sum()
    }

    /// Points at a position (0 when off the grid).
    #[must_use]
    pub fn points_at(&self, pos: Position) -> u32 {
        self.square(pos).map_or(0, |s| s.points)
    }

    fn square_mut(&mut self, pos: Position) -> WorldResult<&mut BoardSquare> {
        let index = self.size.index_of(pos).ok_or(WorldError::OutOfBounds(pos))?;
        Ok(&mut self.squares[index])
    }

    /// Adds points to a square.
    pub fn add_points(&mut self, pos: Position, amount: u32) -> WorldResult<u32> {
        let square = self.square_mut(pos)?;
        square.points = square.points.saturating_add(amount);
        Ok(square.points)
    }

    /// Removes up to `max` points from a square and returns how many were taken.
    pub fn take_points(&mut self, pos: Position, max: u32) -> WorldResult<u32> {
        let square = self.square_mut(pos)?;
        let taken = max.min(square.points);
        square.points -= taken;
        Ok(taken)
    }

    /// Removes every point from a square and returns them.
    pub fn take_all_points(&mut self, pos: Position) -> WorldResult<u32> {
        self.take_points(pos, u32::MAX)
    }
}
