use crate::game::BetOutcome;

/// Consecutive correct bets, held on the spectator side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetStreak {
    current: u32,
    best: u32,
}

/// Reported when a lost bet ends a streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakBroken {
    pub final_streak: u32,
}

impl BetStreak {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Apply one round's bet outcome.
    ///
    /// A win extends the streak; a loss resets it and reports the value it
    /// reached. Rounds without a bet leave the streak untouched.
    pub fn record(&mut self, outcome: BetOutcome) -> Option<StreakBroken> {
        match outcome {
            BetOutcome::Won => {
                self.current += 1;
                self.best = self.best.max(self.current);
                None
            }
            BetOutcome::Lost => {
                let final_streak = self.current;
                self.current = 0;
                Some(StreakBroken { final_streak })
            }
            BetOutcome::NoBet => None,
        }
    }
}
