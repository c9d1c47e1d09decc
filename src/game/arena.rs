use std::collections::HashSet;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use super::agent::{advance, Agent, AgentStyle, MoveOutcome};
use super::direction::Direction;
use super::events::{AgentView, TickSnapshot};
use super::grid::{Cell, Grid};

/// Random draws allowed per food or obstacle placement before giving up
pub const MAX_PLACEMENT_ATTEMPTS: usize = 100;

/// Why a tick ended the round, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    None,
    ADied,
    BDied,
    BothDied,
}

impl EndReason {
    fn from_alive(alive_a: bool, alive_b: bool) -> Self {
        match (alive_a, alive_b) {
            (true, true) => EndReason::None,
            (false, true) => EndReason::ADied,
            (true, false) => EndReason::BDied,
            (false, false) => EndReason::BothDied,
        }
    }

    pub fn ends_round(&self) -> bool {
        !matches!(self, EndReason::None)
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub alive_a: bool,
    pub alive_b: bool,
    pub ate_a: bool,
    pub ate_b: bool,
    pub end_reason: EndReason,
}

/// State of a single round: food, obstacles and both agents
#[derive(Debug, Clone)]
pub struct Arena {
    grid: Grid,
    pub food: Cell,
    pub obstacles: HashSet<Cell>,
    pub agent_a: Agent,
    pub agent_b: Agent,
    pub round_active: bool,
    /// Engine clock reading when the round began
    pub started_at: Duration,
}

impl Arena {
    /// Start a fresh round: random distinct heads, random headings, no
    /// obstacles and food on a free cell.
    pub fn new<R: Rng + ?Sized>(
        grid: Grid,
        accuracy_a: f64,
        accuracy_b: f64,
        started_at: Duration,
        rng: &mut R,
    ) -> Self {
        let mut free: Vec<Cell> = (0..grid.cell_count()).map(|i| grid.cell_at(i)).collect();
        free.shuffle(rng);

        // A 4x4 grid has 16 cells, so three distinct picks always exist
        let head_a = free[0];
        let head_b = free[1];
        let food = free[2];

        let agent_a = Agent::new(head_a, random_direction(rng), accuracy_a, AgentStyle::Filled);
        let agent_b = Agent::new(head_b, random_direction(rng), accuracy_b, AgentStyle::Outline);

        Self {
            grid,
            food,
            obstacles: HashSet::new(),
            agent_a,
            agent_b,
            round_active: true,
            started_at,
        }
    }

    /// Assemble a specific position, e.g. for scripted scenarios
    pub fn from_parts(
        grid: Grid,
        agent_a: Agent,
        agent_b: Agent,
        food: Cell,
        obstacles: impl IntoIterator<Item = Cell>,
    ) -> Self {
        Self {
            grid,
            food,
            obstacles: obstacles.into_iter().collect(),
            agent_a,
            agent_b,
            round_active: true,
            started_at: Duration::ZERO,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Run one simulation step.
    ///
    /// A moves first against B's pre-tick body, then B moves against A's
    /// updated body. If anyone ate, the food is respawned before exactly one
    /// new obstacle is placed.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        let outcome_a = advance(
            &mut self.agent_a,
            &self.agent_b,
            &self.obstacles,
            self.food,
            &self.grid,
            rng,
        );
        let outcome_b = advance(
            &mut self.agent_b,
            &self.agent_a,
            &self.obstacles,
            self.food,
            &self.grid,
            rng,
        );

        let ate_a = outcome_a == MoveOutcome::AteFood;
        let ate_b = outcome_b == MoveOutcome::AteFood;

        if ate_a || ate_b {
            self.respawn_food(rng);
            self.spawn_obstacle(rng);
        }

        let alive_a = outcome_a != MoveOutcome::Dead;
        let alive_b = outcome_b != MoveOutcome::Dead;

        TickOutcome {
            alive_a,
            alive_b,
            ate_a,
            ate_b,
            end_reason: EndReason::from_alive(alive_a, alive_b),
        }
    }

    /// Move food to a random free cell; keeps the old cell if none is found
    pub fn respawn_food<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let placed = self.random_free_cell(rng, |arena, cell| {
            !arena.obstacles.contains(&cell) && !arena.occupied_by_agents(cell)
        });

        match placed {
            Some(cell) => {
                self.food = cell;
                true
            }
            None => {
                warn!(food = ?self.food, "no free cell for food; keeping previous position");
                false
            }
        }
    }

    /// Add one obstacle on a free cell; skipped if none is found
    pub fn spawn_obstacle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let placed = self.random_free_cell(rng, |arena, cell| {
            cell != arena.food
                && !arena.obstacles.contains(&cell)
                && !arena.occupied_by_agents(cell)
        });

        match placed {
            Some(cell) => {
                self.obstacles.insert(cell);
                true
            }
            None => {
                warn!(obstacles = self.obstacles.len(), "no free cell for obstacle; skipping");
                false
            }
        }
    }

    fn random_free_cell<R, F>(&self, rng: &mut R, is_free: F) -> Option<Cell>
    where
        R: Rng + ?Sized,
        F: Fn(&Self, Cell) -> bool,
    {
        (0..MAX_PLACEMENT_ATTEMPTS)
            .map(|_| self.grid.cell_at(rng.gen_range(0..self.grid.cell_count())))
            .find(|&cell| is_free(self, cell))
    }

    /// Check if a cell is covered by either agent
    pub fn occupied_by_agents(&self, cell: Cell) -> bool {
        self.agent_a.occupies(cell) || self.agent_b.occupies(cell)
    }

    /// Owned copy of everything the display needs
    pub fn snapshot(&self) -> TickSnapshot {
        let mut obstacles: Vec<Cell> = self.obstacles.iter().copied().collect();
        obstacles.sort();

        TickSnapshot {
            agents: [
                AgentView::from(&self.agent_a),
                AgentView::from(&self.agent_b),
            ],
            food: self.food,
            obstacles,
            scores: [self.agent_a.score, self.agent_b.score],
        }
    }

    /// Verify the tick-boundary invariants
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.obstacles.contains(&self.food) {
            return Err(format!("food {:?} sits on an obstacle", self.food));
        }
        if self.occupied_by_agents(self.food) {
            return Err(format!("food {:?} sits on an agent", self.food));
        }

        for (name, agent) in [("A", &self.agent_a), ("B", &self.agent_b)] {
            if agent.is_empty() {
                return Err(format!("agent {} has no segments", name));
            }

            let unique: HashSet<Cell> = agent.segments.iter().copied().collect();
            if unique.len() != agent.len() {
                return Err(format!("agent {} overlaps itself", name));
            }

            if let Some(cell) = agent.segments.iter().find(|c| !self.grid.contains(**c)) {
                return Err(format!("agent {} has off-grid cell {:?}", name, cell));
            }

            if let Some(pair) = agent
                .segments
                .windows(2)
                .find(|pair| !self.grid.adjacent(pair[0], pair[1]))
            {
                return Err(format!(
                    "agent {} segments {:?} and {:?} are not adjacent",
                    name, pair[0], pair[1]
                ));
            }

            if let Some(cell) = agent.segments.iter().find(|c| self.obstacles.contains(*c)) {
                return Err(format!("agent {} overlaps obstacle {:?}", name, cell));
            }
        }

        Ok(())
    }
}

fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
}
