pub mod game_metrics;
pub mod streak;

pub use game_metrics::DuelMetrics;
pub use streak::{BetStreak, StreakBroken};
