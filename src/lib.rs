//! Snake Duel - two autonomous snakes compete on a wrapping grid
//!
//! This library provides:
//! - Core duel simulation (game module)
//! - Spectator tallies and bet streaks (metrics module)
//! - TUI rendering (render module)
//! - Keyboard mapping (input module)
//! - Execution modes (spectate, headless)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
