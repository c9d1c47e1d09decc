use std::time::{Duration, Instant};

use serde::Serialize;

use crate::game::{RoundEnd, Winner};

/// Spectator-side tallies across rounds
#[derive(Debug, Clone, Serialize)]
pub struct DuelMetrics {
    #[serde(skip)]
    pub start_time: Instant,
    #[serde(skip)]
    pub elapsed_time: Duration,
    pub rounds_played: u32,
    pub wins_a: u32,
    pub wins_b: u32,
    pub ties: u32,
    pub high_score: u32,
    pub longest_round_ms: u64,
    pub total_round_ms: u64,
}

impl DuelMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            rounds_played: 0,
            wins_a: 0,
            wins_b: 0,
            ties: 0,
            high_score: 0,
            longest_round_ms: 0,
            total_round_ms: 0,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_time = self.start_time.elapsed();
    }

    pub fn on_round_end(&mut self, end: &RoundEnd) {
        self.rounds_played += 1;
        self.wins_a = end.wins_a;
        self.wins_b = end.wins_b;
        if end.winner == Winner::Tie {
            self.ties += 1;
        }

        let best = end.scores[0].max(end.scores[1]);
        if best > self.high_score {
            self.high_score = best;
        }

        self.longest_round_ms = self.longest_round_ms.max(end.duration_ms);
        self.total_round_ms += end.duration_ms;
    }

    pub fn mean_round_ms(&self) -> u64 {
        if self.rounds_played == 0 {
            0
        } else {
            self.total_round_ms / u64::from(self.rounds_played)
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "rounds: {} | A: {} | B: {} | ties: {} | high score: {} | longest: {} ms | mean: {} ms",
            self.rounds_played,
            self.wins_a,
            self.wins_b,
            self.ties,
            self.high_score,
            self.longest_round_ms,
            self.mean_round_ms()
        )
    }
}

impl Default for DuelMetrics {
    fn default() -> Self {
        Self::new()
    }
}
