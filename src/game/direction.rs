use serde::{Deserialize, Serialize};

/// Heading of an agent on the grid
///
/// `Down` is +y and `Up` is -y, matching row-major screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in neighbor order: east, west, south, north
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    /// Returns the delta (dx, dy) for moving in this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Direction of a single wrapped step between two adjacent cells.
    ///
    /// Adjacent cells across a seam read as `±(cols-1)` or `±(rows-1)`; any
    /// component larger than one is folded back to the opposite unit step.
    /// Returns `None` for a zero or diagonal delta.
    pub fn from_step(dx: i32, dy: i32) -> Option<Direction> {
        let fold = |d: i32| -> i32 {
            if d > 1 {
                -1
            } else if d < -1 {
                1
            } else {
                d
            }
        };

        match (fold(dx), fold(dy)) {
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Down),
            (0, -1) => Some(Direction::Up),
            _ => None,
        }
    }

    /// Greedy heading toward a target using plain (non-wrapped) deltas.
    ///
    /// The larger axis difference wins and ties favor the horizontal axis.
    pub fn toward(dx: i32, dy: i32) -> Direction {
        if dx.abs() >= dy.abs() {
            if dx < 0 {
                Direction::Left
            } else {
                Direction::Right
            }
        } else if dy < 0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}
