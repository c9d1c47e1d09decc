use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{debug, info};

use crate::game::{DuelConfig, Engine, RoundEnd};
use crate::metrics::DuelMetrics;

/// Simulated frame length, matching a ~60 Hz display
pub const FRAME_MS: u64 = 16;

/// Runs rounds without a terminal, on a simulated clock
pub struct HeadlessMode {
    engine: Engine,
    round_ends: UnboundedReceiver<RoundEnd>,
    rounds: u32,
    clock: Duration,
    metrics: DuelMetrics,
}

impl HeadlessMode {
    pub fn new(config: DuelConfig, rounds: u32) -> Result<Self> {
        let mut engine = Engine::new(config).context("Failed to create duel engine")?;

        let (end_tx, round_ends) = unbounded_channel();
        engine.on_round_end(move |end| {
            let _ = end_tx.send(end.clone());
        });

        Ok(Self {
            engine,
            round_ends,
            rounds,
            clock: Duration::ZERO,
            metrics: DuelMetrics::new(),
        })
    }

    /// Play `rounds` rounds, writing each result to `out` as a JSON line
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<&DuelMetrics> {
        info!(rounds = self.rounds, "headless run started");
        self.engine.start(self.clock);

        let frame = Duration::from_millis(FRAME_MS);
        while self.metrics.rounds_played < self.rounds {
            self.clock += frame;
            self.engine.frame(self.clock);

            while let Ok(end) = self.round_ends.try_recv() {
                self.metrics.on_round_end(&end);
                serde_json::to_writer(&mut *out, &end)
                    .context("Failed to encode round result")?;
                writeln!(out).context("Failed to write round result")?;
                debug!(round = self.metrics.rounds_played, "round recorded");
            }
        }

        self.engine.stop();
        out.flush().context("Failed to flush output")?;
        self.metrics.elapsed_time = self.clock;

        info!(summary = %self.metrics.format_summary(), "headless run finished");
        Ok(&self.metrics)
    }

    /// Simulated time consumed so far
    pub fn clock(&self) -> Duration {
        self.clock
    }
}
