use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A cell on the toroidal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Plain Manhattan distance, ignoring the torus seams
    pub fn manhattan(&self, other: Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Fixed-size toroidal lattice
///
/// Every movement and neighbor computation goes through [`Grid::wrap`], so
/// walking off one edge re-enters on the opposite side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    cols: i32,
    rows: i32,
}

impl Grid {
    /// Smallest side length the duel supports
    pub const MIN_SIDE: usize = 4;

    /// Sides below [`Grid::MIN_SIDE`] are raised to it.
    pub fn new(cols: usize, rows: usize) -> Self {
        let side = |n: usize| n.clamp(Self::MIN_SIDE, i32::MAX as usize) as i32;
        Self {
            cols: side(cols),
            rows: side(rows),
        }
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cell_count(&self) -> usize {
        self.cols() * self.rows()
    }

    pub fn wrap(&self, x: i32, y: i32) -> Cell {
        Cell {
            x: ((x % self.cols) + self.cols) % self.cols,
            y: ((y % self.rows) + self.rows) % self.rows,
        }
    }

    /// Wrapped cell one step from `cell` in `direction`
    pub fn step(&self, cell: Cell, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        self.wrap(cell.x + dx, cell.y + dy)
    }

    /// The four wrapped neighbors in east, west, south, north order.
    ///
    /// Pathfinding tie-breaks depend on this order.
    pub fn neighbors(&self, cell: Cell) -> [Cell; 4] {
        Direction::ALL.map(|direction| self.step(cell, direction))
    }

    /// Check if a cell already lies inside the grid
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }

    /// Dense row-major index of an in-grid cell
    pub fn index(&self, cell: Cell) -> usize {
        (cell.y * self.cols + cell.x) as usize
    }

    /// Inverse of [`Grid::index`]
    pub fn cell_at(&self, index: usize) -> Cell {
        let index = index as i32;
        Cell::new(index % self.cols, index / self.cols)
    }

    /// True when `a` and `b` are one wrapped step apart
    pub fn adjacent(&self, a: Cell, b: Cell) -> bool {
        self.neighbors(a).contains(&b)
    }
}
