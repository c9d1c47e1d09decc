//! Core duel simulation
//!
//! Pure game logic without any I/O or rendering dependencies: grid
//! arithmetic, pathfinding, the agent move policy, the per-tick arena rules
//! and the round controller. Time and randomness are supplied by the caller.

pub mod agent;
pub mod arena;
pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod pathfinder;

// Re-export commonly used types
pub use agent::{advance, Agent, AgentStyle, MoveOutcome};
pub use arena::{Arena, EndReason, TickOutcome};
pub use config::DuelConfig;
pub use direction::Direction;
pub use engine::Engine;
pub use error::DuelError;
pub use events::{AgentView, BetOutcome, RoundEnd, Side, TickSnapshot, Winner};
pub use grid::{Cell, Grid};
pub use pathfinder::find_path;
