use serde::{Deserialize, Serialize};

use super::agent::{MAX_ACCURACY, MIN_ACCURACY};
use super::grid::Grid;

/// Configuration for a duel engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Width of the grid in cells
    pub cols: usize,
    /// Height of the grid in cells
    pub rows: usize,
    /// Wall-clock milliseconds between ticks
    pub tick_ms: u64,
    /// Pause between a round ending and the next one starting
    pub restart_delay_ms: u64,
    /// Accuracy both agents start with
    pub initial_accuracy: f64,
    /// Seed for the random source; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            cols: 20,
            rows: 20,
            tick_ms: 200,
            restart_delay_ms: 500,
            initial_accuracy: 0.8,
            seed: None,
        }
    }
}

impl DuelConfig {
    /// Create a new configuration with custom grid size
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Same configuration with a fixed seed
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that every field is in range.
    ///
    /// Returns `Err(String)` with a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.cols < Grid::MIN_SIDE || self.rows < Grid::MIN_SIDE {
            return Err(format!(
                "grid must be at least {min}x{min}, got {}x{}",
                self.cols,
                self.rows,
                min = Grid::MIN_SIDE
            ));
        }

        if self.cols > i32::MAX as usize / self.rows.max(1) {
            return Err(format!("grid {}x{} is too large", self.cols, self.rows));
        }

        if self.tick_ms == 0 {
            return Err("tick_ms must be positive".to_string());
        }

        if !(MIN_ACCURACY..=MAX_ACCURACY).contains(&self.initial_accuracy) {
            return Err(format!(
                "initial_accuracy must be in [{}, {}], got {}",
                MIN_ACCURACY, MAX_ACCURACY, self.initial_accuracy
            ));
        }

        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.cols, self.rows)
    }
}
