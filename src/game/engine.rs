use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::arena::{Arena, EndReason, TickOutcome};
use super::config::DuelConfig;
use super::error::DuelError;
use super::events::{BetOutcome, RoundEnd, Side, TickSnapshot, Winner};
use super::grid::Grid;

/// Accuracy gained by a round's survivor and lost by its opponent
pub const ACCURACY_STEP: f64 = 0.1;
/// Accuracy lost by each agent when both die in the same tick
pub const TIE_ACCURACY_PENALTY: f64 = 0.05;

type TickListener = Box<dyn FnMut(&TickSnapshot)>;
type RoundEndListener = Box<dyn FnMut(&RoundEnd)>;

/// Delayed restart scheduled at round end
#[derive(Debug, Clone, Copy)]
struct PendingRestart {
    generation: u64,
    due: Duration,
}

/// Round controller that owns all duel state
///
/// The engine never reads a clock itself: callers pass the current time
/// (any monotonic offset) to [`Engine::start`] and [`Engine::frame`]. Each
/// frame runs at most one tick, and only once `tick_ms` has elapsed since the
/// previous tick, so a late frame never triggers catch-up ticks.
pub struct Engine<R: Rng = ChaCha8Rng> {
    config: DuelConfig,
    grid: Grid,
    rng: R,
    arena: Arena,
    running: bool,
    last_update: Duration,
    generation: u64,
    pending_restart: Option<PendingRestart>,
    round_ticks: u64,
    bet: Option<Side>,
    wins_a: u32,
    wins_b: u32,
    ties: u32,
    last_round_duration: Option<Duration>,
    last_bet_outcome: Option<BetOutcome>,
    tick_listeners: Vec<TickListener>,
    round_end_listeners: Vec<RoundEndListener>,
}

impl Engine<ChaCha8Rng> {
    /// Create an engine seeded from `config.seed`, or from OS entropy when unset
    pub fn new(config: DuelConfig) -> Result<Self, DuelError> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Engine<R> {
    /// Create an engine drawing all randomness from `rng`
    pub fn with_rng(config: DuelConfig, mut rng: R) -> Result<Self, DuelError> {
        config.validate().map_err(DuelError::ConfigInvalid)?;

        let grid = config.grid();
        let accuracy = config.initial_accuracy;
        let arena = Arena::new(grid, accuracy, accuracy, Duration::ZERO, &mut rng);

        debug!(cols = grid.cols(), rows = grid.rows(), "duel engine created");

        Ok(Self {
            config,
            grid,
            rng,
            arena,
            running: false,
            last_update: Duration::ZERO,
            generation: 0,
            pending_restart: None,
            round_ticks: 0,
            bet: None,
            wins_a: 0,
            wins_b: 0,
            ties: 0,
            last_round_duration: None,
            last_bet_outcome: None,
            tick_listeners: Vec::new(),
            round_end_listeners: Vec::new(),
        })
    }

    /// Begin the cadence loop; a no-op while already running.
    ///
    /// A round that has not ticked yet is timed from `now`.
    pub fn start(&mut self, now: Duration) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_update = now;
        if self.arena.round_active && self.round_ticks == 0 {
            self.arena.started_at = now;
        }
    }

    /// Halt the cadence loop; a no-op while stopped
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Animation-frame callback.
    ///
    /// Fires a due delayed restart, then runs exactly one tick if the round is
    /// active and at least `tick_ms` has passed since the last one.
    pub fn frame(&mut self, now: Duration) {
        if !self.running {
            return;
        }

        if let Some(pending) = self.pending_restart {
            if now >= pending.due {
                self.pending_restart = None;
                if pending.generation == self.generation {
                    self.begin_round(now);
                }
            }
        }

        if !self.arena.round_active {
            return;
        }

        if now.saturating_sub(self.last_update) < self.tick_interval() {
            return;
        }

        self.last_update = now;
        self.tick(now);
    }

    /// Force a fresh round, cancelling any scheduled restart. Aggregate wins
    /// are untouched.
    pub fn restart_round(&mut self, now: Duration) {
        self.begin_round(now);
    }

    /// Bet on a side for the current round
    pub fn place_bet(&mut self, side: Side) -> Result<(), DuelError> {
        if !self.arena.round_active {
            return Err(DuelError::IllegalBet("no round in progress".to_string()));
        }
        if let Some(existing) = self.bet {
            return Err(DuelError::IllegalBet(format!(
                "a bet on {} is already placed",
                existing.as_str()
            )));
        }

        debug!(side = side.as_str(), generation = self.generation, "bet placed");
        self.bet = Some(side);
        Ok(())
    }

    /// Subscribe to per-tick snapshots
    pub fn on_tick<F>(&mut self, listener: F)
    where
        F: FnMut(&TickSnapshot) + 'static,
    {
        self.tick_listeners.push(Box::new(listener));
    }

    /// Subscribe to round results
    pub fn on_round_end<F>(&mut self, listener: F)
    where
        F: FnMut(&RoundEnd) + 'static,
    {
        self.round_end_listeners.push(Box::new(listener));
    }

    /// Current board as an owned snapshot
    pub fn snapshot(&self) -> TickSnapshot {
        self.arena.snapshot()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }

    pub fn round_active(&self) -> bool {
        self.arena.round_active
    }

    pub fn current_bet(&self) -> Option<Side> {
        self.bet
    }

    /// Wins for A and B
    pub fn wins(&self) -> (u32, u32) {
        (self.wins_a, self.wins_b)
    }

    pub fn ties(&self) -> u32 {
        self.ties
    }

    pub fn rounds_completed(&self) -> u32 {
        self.wins_a + self.wins_b + self.ties
    }

    pub fn last_round_duration(&self) -> Option<Duration> {
        self.last_round_duration
    }

    pub fn last_bet_outcome(&self) -> Option<BetOutcome> {
        self.last_bet_outcome
    }

    /// Incremented on every round start; stale restarts compare against it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_ms)
    }

    fn tick(&mut self, now: Duration) {
        self.round_ticks += 1;
        let outcome = self.arena.tick(&mut self.rng);

        if outcome.ate_a || outcome.ate_b {
            debug!(
                ate_a = outcome.ate_a,
                ate_b = outcome.ate_b,
                obstacles = self.arena.obstacles.len(),
                "food eaten"
            );
        }

        // Aggregates settle before anyone is notified
        let round_end = outcome
            .end_reason
            .ends_round()
            .then(|| self.finish_round(&outcome, now));

        let snapshot = self.arena.snapshot();
        for listener in &mut self.tick_listeners {
            listener(&snapshot);
        }

        if let Some(round_end) = round_end {
            for listener in &mut self.round_end_listeners {
                listener(&round_end);
            }
        }
    }

    fn finish_round(&mut self, outcome: &TickOutcome, now: Duration) -> RoundEnd {
        let winner = match outcome.end_reason {
            EndReason::ADied => Winner::B,
            EndReason::BDied => Winner::A,
            EndReason::BothDied | EndReason::None => Winner::Tie,
        };

        match winner {
            Winner::A => {
                self.wins_a += 1;
                self.arena.agent_a.adjust_accuracy(ACCURACY_STEP);
                self.arena.agent_b.adjust_accuracy(-ACCURACY_STEP);
            }
            Winner::B => {
                self.wins_b += 1;
                self.arena.agent_b.adjust_accuracy(ACCURACY_STEP);
                self.arena.agent_a.adjust_accuracy(-ACCURACY_STEP);
            }
            Winner::Tie => {
                self.ties += 1;
                self.arena.agent_a.adjust_accuracy(-TIE_ACCURACY_PENALTY);
                self.arena.agent_b.adjust_accuracy(-TIE_ACCURACY_PENALTY);
            }
        }

        // Snapshot the bet before clearing it
        let bet = self.bet.take();
        let bet_outcome = BetOutcome::settle(bet, winner);

        let duration = now.saturating_sub(self.arena.started_at);
        self.arena.round_active = false;
        self.last_round_duration = Some(duration);
        self.last_bet_outcome = Some(bet_outcome);
        self.pending_restart = Some(PendingRestart {
            generation: self.generation,
            due: now + Duration::from_millis(self.config.restart_delay_ms),
        });

        info!(
            ?winner,
            duration_ms = duration.as_millis() as u64,
            wins_a = self.wins_a,
            wins_b = self.wins_b,
            ties = self.ties,
            ?bet_outcome,
            "round finished"
        );

        RoundEnd {
            winner,
            duration_ms: duration.as_millis() as u64,
            wins_a: self.wins_a,
            wins_b: self.wins_b,
            bet_outcome,
            bet,
            accuracies: [self.arena.agent_a.accuracy, self.arena.agent_b.accuracy],
            scores: [self.arena.agent_a.score, self.arena.agent_b.score],
        }
    }

    fn begin_round(&mut self, now: Duration) {
        self.generation += 1;
        self.pending_restart = None;
        self.round_ticks = 0;
        self.bet = None;

        let accuracy_a = self.arena.agent_a.accuracy;
        let accuracy_b = self.arena.agent_b.accuracy;
        self.arena = Arena::new(self.grid, accuracy_a, accuracy_b, now, &mut self.rng);
        self.last_update = now;

        info!(generation = self.generation, "round started");
    }

    #[cfg(test)]
    fn load_arena(&mut self, mut arena: Arena, now: Duration) {
        arena.started_at = now;
        self.arena = arena;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Agent, AgentStyle, Cell, Direction};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    fn agent(list: &[(i32, i32)], accuracy: f64, style: AgentStyle) -> Agent {
        Agent::with_segments(cells(list), Direction::Right, accuracy, style).unwrap()
    }

    /// B is framed by obstacles and A takes its only exit on the first tick
    fn a_wins_arena(grid: Grid) -> Arena {
        Arena::from_parts(
            grid,
            agent(&[(4, 5)], 0.8, AgentStyle::Filled),
            agent(&[(6, 5)], 0.8, AgentStyle::Outline),
            Cell::new(5, 4),
            cells(&[(7, 5), (6, 4), (6, 6)]),
        )
    }

    /// Both agents boxed in by each other and obstacles
    fn both_die_arena(grid: Grid, accuracy_a: f64, accuracy_b: f64) -> Arena {
        Arena::from_parts(
            grid,
            agent(&[(2, 2)], accuracy_a, AgentStyle::Filled),
            agent(&[(3, 2)], accuracy_b, AgentStyle::Outline),
            Cell::new(7, 7),
            cells(&[(1, 2), (2, 3), (2, 1), (4, 2), (3, 3), (3, 1)]),
        )
    }

    fn record_round_ends<R: Rng>(engine: &mut Engine<R>) -> Rc<RefCell<Vec<RoundEnd>>> {
        let ends = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ends);
        engine.on_round_end(move |end| sink.borrow_mut().push(end.clone()));
        ends
    }

    fn count_ticks<R: Rng>(engine: &mut Engine<R>) -> Rc<RefCell<usize>> {
        let ticks = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&ticks);
        engine.on_tick(move |_| *sink.borrow_mut() += 1);
        ticks
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Engine::new(DuelConfig::new(3, 8));
        assert!(matches!(result, Err(DuelError::ConfigInvalid(_))));

        let result = Engine::new(DuelConfig {
            tick_ms: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(DuelError::ConfigInvalid(_))));
    }

    #[test]
    fn test_smallest_grid_runs_first_tick() {
        let mut engine = Engine::new(DuelConfig::new(4, 4).seeded(1)).unwrap();
        let ticks = count_ticks(&mut engine);

        engine.start(ms(0));
        engine.frame(ms(200));

        assert_eq!(*ticks.borrow(), 1);
    }

    #[test]
    fn test_no_tick_before_interval() {
        let mut engine = Engine::new(DuelConfig::small().seeded(2)).unwrap();
        let ticks = count_ticks(&mut engine);

        engine.start(ms(0));
        engine.frame(ms(100));
        engine.frame(ms(199));

        assert_eq!(*ticks.borrow(), 0);
    }

    #[test]
    fn test_late_frame_runs_single_tick() {
        let mut engine = Engine::new(DuelConfig::default().seeded(3)).unwrap();
        let ticks = count_ticks(&mut engine);

        engine.start(ms(0));
        engine.frame(ms(1000));

        assert_eq!(*ticks.borrow(), 1);
    }

    #[test]
    fn test_cadence_over_one_second() {
        let mut engine = Engine::new(DuelConfig::default().seeded(4)).unwrap();
        let ticks = count_ticks(&mut engine);
        let mut tick_times = Vec::new();

        engine.start(ms(0));
        let mut now = 0;
        while now <= 1000 {
            let before = *ticks.borrow();
            engine.frame(ms(now));
            if *ticks.borrow() > before {
                tick_times.push(engine.last_update);
            }
            now += 16;
        }

        let count = *ticks.borrow();
        assert!((4..=6).contains(&count), "fired {} ticks", count);
        let mut unique = tick_times.clone();
        unique.dedup();
        assert_eq!(unique.len(), tick_times.len());
    }

    #[test]
    fn test_stop_and_start_are_idempotent() {
        let mut engine = Engine::new(DuelConfig::default().seeded(5)).unwrap();
        let ticks = count_ticks(&mut engine);

        engine.start(ms(0));
        engine.start(ms(150));
        engine.frame(ms(200));
        assert_eq!(*ticks.borrow(), 1);

        engine.stop();
        engine.stop();
        engine.frame(ms(600));
        assert_eq!(*ticks.borrow(), 1);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_survivor_gains_accuracy_and_win() {
        let mut engine = Engine::new(DuelConfig::small().seeded(6)).unwrap();
        let ends = record_round_ends(&mut engine);
        engine.load_arena(a_wins_arena(Grid::new(10, 10)), ms(0));

        engine.start(ms(0));
        engine.frame(ms(200));

        assert_eq!(engine.wins(), (1, 0));
        assert!(!engine.round_active());
        let ends = ends.borrow();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].winner, Winner::A);
        assert_eq!(ends[0].duration_ms, 200);
        assert_eq!(ends[0].bet_outcome, BetOutcome::NoBet);
        assert!((ends[0].accuracies[0] - 0.9).abs() < 1e-9);
        assert!((ends[0].accuracies[1] - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_first_round_timed_from_start() {
        let mut engine = Engine::new(DuelConfig::new(6, 6).seeded(14)).unwrap();
        let ends = record_round_ends(&mut engine);

        let started = ms(60_000);
        engine.start(started);
        let mut now = started;
        while ends.borrow().is_empty() && now < ms(10_000_000) {
            now += ms(200);
            engine.frame(now);
        }

        let ends = ends.borrow();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].duration_ms, (now - started).as_millis() as u64);
        assert_eq!(engine.last_round_duration(), Some(now - started));
    }

    #[test]
    fn test_round_without_ticks_timed_from_resume() {
        let mut engine = Engine::new(DuelConfig::small().seeded(16)).unwrap();
        let ends = record_round_ends(&mut engine);
        engine.load_arena(a_wins_arena(Grid::new(10, 10)), ms(0));

        engine.start(ms(0));
        engine.stop();
        engine.start(ms(5_000));
        engine.frame(ms(5_200));

        let ends = ends.borrow();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].duration_ms, 200);
    }

    #[test]
    fn test_both_died_is_tie() {
        let mut engine = Engine::new(DuelConfig::small().seeded(7)).unwrap();
        let ends = record_round_ends(&mut engine);
        engine.load_arena(both_die_arena(Grid::new(10, 10), 0.8, 0.32), ms(0));

        engine.start(ms(0));
        engine.frame(ms(200));

        assert_eq!(engine.wins(), (0, 0));
        assert_eq!(engine.ties(), 1);
        assert_eq!(engine.rounds_completed(), 1);
        let ends = ends.borrow();
        assert_eq!(ends[0].winner, Winner::Tie);
        assert!((ends[0].accuracies[0] - 0.75).abs() < 1e-9);
        assert_eq!(ends[0].accuracies[1], 0.3);
    }

    #[test]
    fn test_bets_resolve_across_rounds() {
        let grid = Grid::new(10, 10);
        let mut engine = Engine::new(DuelConfig::small().seeded(8)).unwrap();
        let ends = record_round_ends(&mut engine);

        engine.start(ms(0));
        engine.load_arena(a_wins_arena(grid), ms(0));
        engine.place_bet(Side::A).unwrap();
        engine.frame(ms(200));

        // Restart fires once the delay has passed
        engine.frame(ms(699));
        assert!(!engine.round_active());
        engine.frame(ms(700));
        assert!(engine.round_active());
        assert_eq!(engine.current_bet(), None);

        engine.load_arena(a_wins_arena(grid), ms(700));
        engine.place_bet(Side::B).unwrap();
        engine.frame(ms(900));

        let ends = ends.borrow();
        assert_eq!(ends.len(), 2);
        assert_eq!(ends[0].bet_outcome, BetOutcome::Won);
        assert_eq!(ends[0].bet, Some(Side::A));
        assert_eq!(ends[1].bet_outcome, BetOutcome::Lost);
        assert_eq!(ends[1].bet, Some(Side::B));
        assert_eq!(ends[1].wins_a, 2);
        assert_eq!(engine.last_bet_outcome(), Some(BetOutcome::Lost));
    }

    #[test]
    fn test_tie_loses_bet() {
        let mut engine = Engine::new(DuelConfig::small().seeded(9)).unwrap();
        let ends = record_round_ends(&mut engine);
        engine.load_arena(both_die_arena(Grid::new(10, 10), 0.8, 0.8), ms(0));
        engine.place_bet(Side::B).unwrap();

        engine.start(ms(0));
        engine.frame(ms(200));

        assert_eq!(ends.borrow()[0].bet_outcome, BetOutcome::Lost);
    }

    #[test]
    fn test_illegal_bets_rejected() {
        let mut engine = Engine::new(DuelConfig::small().seeded(10)).unwrap();
        engine.load_arena(a_wins_arena(Grid::new(10, 10)), ms(0));

        engine.place_bet(Side::A).unwrap();
        assert!(matches!(engine.place_bet(Side::B), Err(DuelError::IllegalBet(_))));

        engine.start(ms(0));
        engine.frame(ms(200));
        assert!(!engine.round_active());
        assert!(matches!(engine.place_bet(Side::A), Err(DuelError::IllegalBet(_))));
    }

    #[test]
    fn test_restart_is_idempotent() {
        let mut engine = Engine::new(DuelConfig::small().seeded(11)).unwrap();
        engine.load_arena(a_wins_arena(Grid::new(10, 10)), ms(0));
        engine.start(ms(0));
        engine.frame(ms(200));
        let wins = engine.wins();
        let accuracy_a = engine.arena().agent_a.accuracy;

        engine.restart_round(ms(250));
        engine.restart_round(ms(260));

        assert_eq!(engine.wins(), wins);
        assert!(engine.round_active());
        assert!(engine.arena().obstacles.is_empty());
        assert_eq!(engine.arena().agent_a.score, 0);
        assert_eq!(engine.arena().agent_a.accuracy, accuracy_a);
        assert!(engine.arena().check_invariants().is_ok());
        assert_eq!(engine.current_bet(), None);
    }

    #[test]
    fn test_forced_restart_cancels_pending_restart() {
        let mut engine = Engine::new(DuelConfig::small().seeded(12)).unwrap();
        engine.load_arena(a_wins_arena(Grid::new(10, 10)), ms(0));
        engine.start(ms(0));
        engine.frame(ms(200));

        engine.restart_round(ms(300));
        let generation = engine.generation();
        let arena_started = engine.arena().started_at;

        engine.frame(ms(700));

        assert_eq!(engine.generation(), generation);
        assert_eq!(engine.arena().started_at, arena_started);
    }

    #[test]
    fn test_new_round_inherits_only_accuracy() {
        let mut engine = Engine::new(DuelConfig::small().seeded(13)).unwrap();
        engine.load_arena(a_wins_arena(Grid::new(10, 10)), ms(0));
        engine.start(ms(0));
        engine.frame(ms(200));
        engine.frame(ms(700));

        let arena = engine.arena();
        assert!(arena.round_active);
        assert_eq!(arena.agent_a.len(), 1);
        assert_eq!(arena.agent_b.len(), 1);
        assert_eq!(arena.agent_a.score, 0);
        assert!((arena.agent_a.accuracy - 0.9).abs() < 1e-9);
        assert!((arena.agent_b.accuracy - 0.7).abs() < 1e-9);
        assert_eq!(arena.started_at, ms(700));
    }

    #[test]
    fn test_round_tally_stays_consistent() {
        let mut engine = Engine::new(DuelConfig::new(6, 6).seeded(14)).unwrap();
        let ends = record_round_ends(&mut engine);

        engine.start(ms(0));
        let mut now = 0;
        while ends.borrow().len() < 10 && now < 10_000_000 {
            now += 16;
            engine.frame(ms(now));
            let accuracy_a = engine.arena().agent_a.accuracy;
            let accuracy_b = engine.arena().agent_b.accuracy;
            assert!((0.3..=1.0).contains(&accuracy_a));
            assert!((0.3..=1.0).contains(&accuracy_b));
        }

        let (wins_a, wins_b) = engine.wins();
        assert_eq!(wins_a + wins_b + engine.ties(), ends.borrow().len() as u32);
        assert_eq!(engine.rounds_completed(), ends.borrow().len() as u32);
    }

    #[test]
    fn test_tick_snapshots_are_owned() {
        let mut engine = Engine::new(DuelConfig::small().seeded(15)).unwrap();
        let snapshots = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&snapshots);
        engine.on_tick(move |snapshot| sink.borrow_mut().push(snapshot.clone()));

        engine.start(ms(0));
        engine.frame(ms(200));
        engine.frame(ms(400));

        let snapshots = snapshots.borrow();
        assert_eq!(snapshots.len(), 2);
        assert_ne!(snapshots[0].agents[0].segments, snapshots[1].agents[0].segments);
    }
}
