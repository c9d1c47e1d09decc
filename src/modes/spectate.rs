use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::interval;
use tracing::{debug, info};

use crate::game::{DuelConfig, Engine, RoundEnd, Side, TickSnapshot};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::{BetStreak, DuelMetrics};
use crate::render::{DuelStatus, Renderer};

/// Interactive terminal spectator: watch the duel and bet on rounds
pub struct SpectateMode {
    engine: Engine,
    epoch: Instant,
    board: TickSnapshot,
    ticks: UnboundedReceiver<TickSnapshot>,
    round_ends: UnboundedReceiver<RoundEnd>,
    last_round: Option<RoundEnd>,
    streak: BetStreak,
    metrics: DuelMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    notice: Option<String>,
    should_quit: bool,
}

impl SpectateMode {
    pub fn new(config: DuelConfig) -> Result<Self> {
        let mut engine = Engine::new(config).context("Failed to create duel engine")?;

        let (tick_tx, ticks) = unbounded_channel();
        engine.on_tick(move |snapshot| {
            let _ = tick_tx.send(snapshot.clone());
        });

        let (end_tx, round_ends) = unbounded_channel();
        engine.on_round_end(move |end| {
            let _ = end_tx.send(end.clone());
        });

        let board = engine.snapshot();

        Ok(Self {
            engine,
            epoch: Instant::now(),
            board,
            ticks,
            round_ends,
            last_round: None,
            streak: BetStreak::new(),
            metrics: DuelMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            notice: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run duel loop with cleanup
        let result = self.run_duel_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        info!(summary = %self.metrics.format_summary(), "spectator closed");
        result
    }

    async fn run_duel_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Animation frames at ~60 Hz; the engine paces ticks itself
        let mut frame_timer = interval(Duration::from_millis(16));

        // Render at 30 FPS (33ms per frame)
        let mut render_timer = interval(Duration::from_millis(33));

        self.epoch = Instant::now();
        self.engine.start(Duration::ZERO);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Engine frame
                _ = frame_timer.tick() => {
                    let now = self.now();
                    self.advance(now);
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    terminal.draw(|frame| {
                        let status = self.status();
                        self.renderer.render(frame, &self.board, &status);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        self.engine.stop();
        Ok(())
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            let now = self.now();
            self.apply_action(action, now);
        }
    }

    fn apply_action(&mut self, action: KeyAction, now: Duration) {
        match action {
            KeyAction::Bet(side) => self.place_bet(side),
            KeyAction::TogglePause => {
                if self.engine.is_running() {
                    self.engine.stop();
                } else {
                    self.engine.start(now);
                }
            }
            KeyAction::Restart => {
                self.engine.restart_round(now);
                self.board = self.engine.snapshot();
                self.last_round = None;
                self.notice = None;
            }
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::None => {}
        }
    }

    fn place_bet(&mut self, side: Side) {
        match self.engine.place_bet(side) {
            Ok(()) => {
                self.notice = Some(format!("Bet placed on {}", side.as_str()));
            }
            Err(err) => {
                debug!(%err, "bet rejected");
                self.notice = Some(err.to_string());
            }
        }
    }

    /// Drive the engine to `now` and absorb whatever it emitted
    fn advance(&mut self, now: Duration) {
        let generation = self.engine.generation();
        self.engine.frame(now);

        if self.engine.generation() != generation {
            // A delayed restart fired
            self.board = self.engine.snapshot();
            self.last_round = None;
            self.notice = None;
        }

        while let Ok(snapshot) = self.ticks.try_recv() {
            self.board = snapshot;
        }

        while let Ok(end) = self.round_ends.try_recv() {
            self.metrics.on_round_end(&end);
            if let Some(broken) = self.streak.record(end.bet_outcome) {
                info!(final_streak = broken.final_streak, "bet streak ended");
                self.notice = Some(format!("Streak ended at {}", broken.final_streak));
            }
            self.last_round = Some(end);
        }
    }

    fn status(&self) -> DuelStatus<'_> {
        let config = self.engine.config();
        DuelStatus {
            cols: config.cols,
            rows: config.rows,
            wins: self.engine.wins(),
            ties: self.engine.ties(),
            bet: self.engine.current_bet(),
            paused: !self.engine.is_running(),
            round_active: self.engine.round_active(),
            last_round: self.last_round.as_ref(),
            streak: &self.streak,
            metrics: &self.metrics,
            notice: self.notice.as_deref(),
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Winner;

    fn mode() -> SpectateMode {
        let config = DuelConfig {
            cols: 6,
            rows: 6,
            tick_ms: 100,
            restart_delay_ms: 300,
            seed: Some(11),
            ..DuelConfig::default()
        };
        let mut mode = SpectateMode::new(config).unwrap();
        mode.engine.start(Duration::ZERO);
        mode
    }

    /// Step the simulated clock in 100ms frames until a round finishes
    fn run_until_round_end(mode: &mut SpectateMode, mut now: Duration) -> Duration {
        for _ in 0..20_000 {
            now += Duration::from_millis(100);
            mode.advance(now);
            if mode.last_round.is_some() {
                return now;
            }
        }
        panic!("no round finished");
    }

    #[test]
    fn test_initialization() {
        let mode = mode();
        assert!(mode.engine.round_active());
        assert_eq!(mode.board.scores, [0, 0]);
        assert!(mode.last_round.is_none());
        assert_eq!(mode.metrics.rounds_played, 0);
    }

    #[test]
    fn test_bet_and_double_bet() {
        let mut mode = mode();

        mode.apply_action(KeyAction::Bet(Side::A), Duration::ZERO);
        assert_eq!(mode.engine.current_bet(), Some(Side::A));
        assert_eq!(mode.notice.as_deref(), Some("Bet placed on A"));

        mode.apply_action(KeyAction::Bet(Side::B), Duration::ZERO);
        assert_eq!(mode.engine.current_bet(), Some(Side::A));
        assert!(mode.notice.is_some());
    }

    #[test]
    fn test_pause_toggle() {
        let mut mode = mode();

        mode.apply_action(KeyAction::TogglePause, Duration::from_millis(50));
        assert!(!mode.engine.is_running());
        assert!(mode.status().paused);

        // Frames while paused do nothing
        let before = mode.board.clone();
        mode.advance(Duration::from_secs(5));
        assert_eq!(mode.board, before);

        mode.apply_action(KeyAction::TogglePause, Duration::from_secs(5));
        assert!(mode.engine.is_running());
    }

    #[test]
    fn test_ticks_update_board() {
        let mut mode = mode();
        let before = mode.board.agents[0].segments.clone();

        mode.advance(Duration::from_millis(100));

        assert_ne!(mode.board.agents[0].segments, before);
    }

    #[test]
    fn test_round_end_reaches_metrics() {
        let mut mode = mode();
        mode.apply_action(KeyAction::Bet(Side::B), Duration::ZERO);

        run_until_round_end(&mut mode, Duration::ZERO);

        assert_eq!(mode.metrics.rounds_played, 1);
        assert!(!mode.engine.round_active());
        let end = mode.last_round.as_ref().unwrap();
        assert_eq!(end.bet, Some(Side::B));
        let expected_streak = if end.winner == Winner::B { 1 } else { 0 };
        assert_eq!(mode.streak.current(), expected_streak);
    }

    #[test]
    fn test_delayed_restart_clears_banner() {
        let mut mode = mode();
        let ended_at = run_until_round_end(&mut mode, Duration::ZERO);
        let generation = mode.engine.generation();

        mode.advance(ended_at + Duration::from_millis(300));

        assert!(mode.engine.round_active());
        assert_eq!(mode.engine.generation(), generation + 1);
        assert!(mode.last_round.is_none());
        assert_eq!(mode.board.scores, [0, 0]);
    }

    #[test]
    fn test_forced_restart() {
        let mut mode = mode();
        mode.advance(Duration::from_millis(100));
        let generation = mode.engine.generation();

        mode.apply_action(KeyAction::Restart, Duration::from_millis(150));

        assert_eq!(mode.engine.generation(), generation + 1);
        assert!(mode.last_round.is_none());
        assert_eq!(mode.engine.current_bet(), None);
    }

    #[test]
    fn test_quit() {
        let mut mode = mode();
        mode.apply_action(KeyAction::Quit, Duration::ZERO);
        assert!(mode.should_quit);
    }
}
