//! Payloads handed to engine listeners
//!
//! Every payload owns its data, so a listener can keep it across ticks
//! without observing later mutations.

use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentStyle};
use super::grid::Cell;

/// One of the two competitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

/// Result of a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    Tie,
}

impl Winner {
    /// The surviving side, if any
    pub fn side(&self) -> Option<Side> {
        match self {
            Winner::A => Some(Side::A),
            Winner::B => Some(Side::B),
            Winner::Tie => None,
        }
    }
}

/// How the round's bet was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetOutcome {
    Won,
    Lost,
    NoBet,
}

impl BetOutcome {
    /// Settle `bet` against `winner`; a tie loses any bet
    pub fn settle(bet: Option<Side>, winner: Winner) -> Self {
        match bet {
            None => BetOutcome::NoBet,
            Some(side) if winner.side() == Some(side) => BetOutcome::Won,
            Some(_) => BetOutcome::Lost,
        }
    }
}

/// Display-facing copy of an agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub segments: Vec<Cell>,
    pub style: AgentStyle,
    pub accuracy: f64,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            segments: agent.segments.clone(),
            style: agent.style,
            accuracy: agent.accuracy,
        }
    }
}

/// Emitted after every tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSnapshot {
    pub agents: [AgentView; 2],
    pub food: Cell,
    pub obstacles: Vec<Cell>,
    pub scores: [u32; 2],
}

/// Emitted once when a round ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundEnd {
    pub winner: Winner,
    pub duration_ms: u64,
    pub wins_a: u32,
    pub wins_b: u32,
    pub bet_outcome: BetOutcome,
    /// Side that was bet on, captured before the bet is cleared
    pub bet: Option<Side>,
    /// Accuracies after this round's adjustment
    pub accuracies: [f64; 2],
    pub scores: [u32; 2],
}
