//! The game loop controller
//!
//! `GameSession` owns everything a run needs: the board layout, the run
//! state, the engine with its problem bank, the tick clock and the high score
//! store. Front ends drive it through plain method calls and render whatever
//! `state()` returns afterwards.

use std::time::Duration;
use tracing::{info, warn};

use super::{
    action::Direction,
    board::Board,
    clock::TickClock,
    config::{GameConfig, Selection},
    engine::{GameEngine, StepOutcome},
    state::{GameOverCause, GameOverReport, GameState, Phase},
};
use crate::storage::HighScoreStore;

pub struct GameSession<C: TickClock, S: HighScoreStore> {
    engine: GameEngine,
    board: Board,
    state: GameState,
    high_score: u32,
    clock: C,
    store: S,
    /// Whether the game-over popup is showing
    popup_visible: bool,
}

impl<C: TickClock, S: HighScoreStore> GameSession<C, S> {
    /// Create an idle session; the high score is read from the store
    pub fn new(mut engine: GameEngine, board: Board, clock: C, store: S) -> Self {
        let state = engine.reset(&board);
        let high_score = store.load();

        Self {
            engine,
            board,
            state,
            high_score,
            clock,
            store,
            popup_visible: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access to the run state, for drivers that set up positions
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn popup_visible(&self) -> bool {
        self.popup_visible
    }

    /// Recompute the board for a viewport; the run is left as it is
    pub fn configure_board(&mut self, viewport_width: f64, viewport_height: f64) -> &Board {
        let board = Board::for_viewport(viewport_width, viewport_height);
        if board != self.board {
            info!(
                cols = board.cols,
                rows = board.rows,
                cell_size = board.cell_size,
                "Board layout changed"
            );
        }
        self.board = board;
        &self.board
    }

    /// Begin a fresh run, replacing any run in progress
    pub fn start_or_restart(&mut self) {
        self.clock.disarm();

        let mut state = self.engine.reset(&self.board);
        self.engine.serve_problem(&mut state, &self.board);
        state.phase = Phase::Running;
        self.state = state;
        self.popup_visible = false;

        let period = self.tick_period();
        self.clock.arm(period);
        info!(
            period_ms = period.as_millis() as u64,
            cols = self.board.cols,
            rows = self.board.rows,
            "Run started"
        );
    }

    /// Ask for a turn on the next tick; later requests replace earlier ones
    pub fn request_direction(&mut self, candidate: Direction) {
        self.state.pending_direction = Some(candidate);
    }

    /// Flip between running and paused; other phases are unaffected
    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            Phase::Running => Phase::Paused,
            Phase::Paused => Phase::Running,
            other => other,
        };
    }

    /// Advance the run by one step
    pub fn tick(&mut self) -> StepOutcome {
        let outcome = self.engine.step(&mut self.state, &self.board);
        match outcome {
            StepOutcome::GameOver(cause) => {
                self.on_game_over(cause);
            }
            StepOutcome::Answered => {
                info!(score = self.state.score, "Correct answer");
            }
            StepOutcome::Skipped | StepOutcome::Moved => {}
        }
        outcome
    }

    /// Stop the clock, record the result and show it
    pub fn on_game_over(&mut self, cause: GameOverCause) -> GameOverReport {
        self.clock.disarm();
        self.state.phase = Phase::GameOver;

        let score = self.state.score;
        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
            if let Err(e) = self.store.save(score) {
                warn!(error = %e, "Could not persist high score");
            }
        }

        let report = GameOverReport {
            score,
            high_score: self.high_score,
            new_high_score,
            cause,
        };
        self.state.game_over = Some(report);
        self.popup_visible = true;

        info!(
            score,
            high_score = self.high_score,
            new_high_score,
            cause = cause.describe(),
            "Game over"
        );
        report
    }

    /// Hide the game-over popup without starting a new run
    pub fn dismiss_game_over(&mut self) {
        self.popup_visible = false;
    }

    pub fn set_type_filter(&mut self, selection: Selection) {
        self.engine.config_mut().problem_type = selection;
    }

    pub fn set_difficulty_filter(&mut self, selection: Selection) {
        self.engine.config_mut().difficulty = selection;
    }

    /// Takes effect when the next run starts
    pub fn set_speed(&mut self, multiplier: u32) {
        self.engine.config_mut().speed = multiplier.max(1);
    }

    pub fn tick_period(&self) -> Duration {
        self.engine.config().tick_period()
    }
}
