use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::direction::Direction;
use super::grid::{Cell, Grid};
use super::pathfinder::find_path;

/// Lower bound of the accuracy rating
pub const MIN_ACCURACY: f64 = 0.3;
/// Upper bound of the accuracy rating
pub const MAX_ACCURACY: f64 = 1.0;

/// Visual tag for the display; never read by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStyle {
    Filled,
    Outline,
}

/// One autonomous snake
///
/// Plain data: the move policy lives in [`advance`] so it can borrow the
/// opponent and the shared random source without the agent owning either.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Occupied cells, with head at index 0
    pub segments: Vec<Cell>,
    /// Current heading
    pub direction: Direction,
    /// Food eaten this round
    pub score: u32,
    /// Rating in [0.3, 1.0], adjusted by the engine between rounds
    pub accuracy: f64,
    pub style: AgentStyle,
}

impl Agent {
    /// Create a single-cell agent
    pub fn new(head: Cell, direction: Direction, accuracy: f64, style: AgentStyle) -> Self {
        Self {
            segments: vec![head],
            direction,
            score: 0,
            accuracy: clamp_accuracy(accuracy),
            style,
        }
    }

    /// Create an agent from an explicit body, head first.
    ///
    /// Returns `None` for an empty body.
    pub fn with_segments(
        segments: Vec<Cell>,
        direction: Direction,
        accuracy: f64,
        style: AgentStyle,
    ) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            segments,
            direction,
            score: 0,
            accuracy: clamp_accuracy(accuracy),
            style,
        })
    }

    /// Get the head position
    pub fn head(&self) -> Cell {
        self.segments[0]
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Cell {
        self.segments[self.segments.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the body has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if any segment, head included, sits on `cell`
    pub fn occupies(&self, cell: Cell) -> bool {
        self.segments.contains(&cell)
    }

    /// Shift accuracy by `delta`, clipped to [0.3, 1.0]
    pub fn adjust_accuracy(&mut self, delta: f64) {
        self.accuracy = clamp_accuracy(self.accuracy + delta);
    }
}

pub fn clamp_accuracy(value: f64) -> f64 {
    value.clamp(MIN_ACCURACY, MAX_ACCURACY)
}

/// Result of a single agent step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    AteFood,
    Dead,
}

/// Advance `agent` by exactly one cell.
///
/// The agent follows an A* path to `food` through everything currently
/// occupied (both bodies and all obstacles). When no path exists it falls back
/// to the greedy heading toward the food if that step is safe, otherwise to a
/// uniformly random safe step drawn from `rng`. With no safe step at all the
/// agent is `Dead` and its body is left untouched.
///
/// On `AteFood` the tail is kept, so the agent grows by one; otherwise the
/// tail is trimmed.
pub fn advance<R: Rng + ?Sized>(
    agent: &mut Agent,
    other: &Agent,
    obstacles: &HashSet<Cell>,
    food: Cell,
    grid: &Grid,
    rng: &mut R,
) -> MoveOutcome {
    let head = agent.head();

    let blocked: HashSet<Cell> = agent
        .segments
        .iter()
        .chain(other.segments.iter())
        .chain(obstacles.iter())
        .copied()
        .collect();

    let planned = find_path(grid, head, food, &blocked)
        .filter(|path| path.len() >= 2)
        .and_then(|path| Direction::from_step(path[1].x - head.x, path[1].y - head.y));

    let direction = match planned {
        Some(direction) => direction,
        None => match fallback_direction(agent, other, obstacles, food, grid, rng) {
            Some(direction) => direction,
            None => {
                trace!(?head, "no safe step left");
                return MoveOutcome::Dead;
            }
        },
    };

    let new_head = grid.step(head, direction);

    if is_blocked(new_head, agent, other, obstacles) {
        return MoveOutcome::Dead;
    }

    agent.direction = direction;
    agent.segments.insert(0, new_head);

    if new_head == food {
        agent.score += 1;
        MoveOutcome::AteFood
    } else {
        agent.segments.pop();
        MoveOutcome::Moved
    }
}

/// Greedy-then-random step used when the food is unreachable
fn fallback_direction<R: Rng + ?Sized>(
    agent: &Agent,
    other: &Agent,
    obstacles: &HashSet<Cell>,
    food: Cell,
    grid: &Grid,
    rng: &mut R,
) -> Option<Direction> {
    let head = agent.head();
    let greedy = Direction::toward(food.x - head.x, food.y - head.y);

    let safe: Vec<Direction> = std::iter::once(greedy)
        .chain(Direction::ALL)
        .filter(|&direction| !is_blocked(grid.step(head, direction), agent, other, obstacles))
        .collect();

    if safe.contains(&greedy) {
        return Some(greedy);
    }

    safe.choose(rng).copied()
}

fn is_blocked(cell: Cell, agent: &Agent, other: &Agent, obstacles: &HashSet<Cell>) -> bool {
    agent.occupies(cell) || other.occupies(cell) || obstacles.contains(&cell)
}
