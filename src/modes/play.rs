//! Interactive terminal mode
//!
//! One `tokio::select!` loop multiplexes terminal events, the tick deadline of
//! the session clock, a render timer and Ctrl+C. Every handler runs to
//! completion before the next one starts, so ticks never overlap.

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io::{stderr, Stderr};
use std::time::Duration;
use tokio::time::{interval, sleep_until, Instant};
use tracing::{error, info, warn};

use crate::game::board::{MEDIUM_MAX_WIDTH, NARROW_MAX_WIDTH};
use crate::game::{
    Board, DeadlineClock, GameConfig, GameEngine, GameSession, Phase, ProblemBank, ProblemError,
    Selection, StepOutcome, SPEED_LEVELS,
};
use crate::input::{InputHandler, KeyAction, SwipeTracker};
use crate::metrics::GameMetrics;
use crate::render::{board_fits, cell_width_for, Renderer, Scene, MIN_CELL_WIDTH};
use crate::storage::HighScoreStore;

/// Nominal size of a terminal character cell, in pixels
const CHAR_WIDTH_PX: f64 = 8.0;
const CHAR_HEIGHT_PX: f64 = 16.0;
/// Share of the screen the board may use
const USABLE_WIDTH: f64 = 0.95;
const USABLE_HEIGHT: f64 = 0.6;

type TerminalBackend = Terminal<CrosstermBackend<Stderr>>;

/// Pixel viewport equivalent to a terminal of `cols` x `rows` characters
pub fn viewport_for_terminal(cols: u16, rows: u16) -> (f64, f64) {
    (
        f64::from(cols) * CHAR_WIDTH_PX * USABLE_WIDTH,
        f64::from(rows) * CHAR_HEIGHT_PX * USABLE_HEIGHT,
    )
}

pub struct PlayMode<S: HighScoreStore> {
    session: Option<GameSession<DeadlineClock, S>>,
    load_error: Option<String>,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    swipe: SwipeTracker,
    type_options: Vec<Selection>,
    difficulty_options: Vec<Selection>,
    screen_locked: bool,
    /// Terminal columns per board cell, wide enough for every value in the bank
    cell_width: u16,
    /// No layout fits the terminal; the board is hidden
    too_small: bool,
    should_quit: bool,
}

impl<S: HighScoreStore> PlayMode<S> {
    /// Set up the mode; a failed problem load disables play for the whole session
    pub fn new(
        config: GameConfig,
        bank: Result<ProblemBank, ProblemError>,
        store: S,
        seed: Option<u64>,
    ) -> Self {
        let mut type_options = vec![Selection::Mixed];
        let mut difficulty_options = vec![Selection::Mixed];

        let (session, load_error) = match bank {
            Ok(bank) => {
                type_options.extend(bank.categories().into_iter().map(Selection::Only));
                difficulty_options.extend(bank.difficulties().into_iter().map(Selection::Only));
                info!(problems = bank.problem_count(), "Problem bank loaded");

                let engine = match seed {
                    Some(seed) => GameEngine::with_seed(config, bank, seed),
                    None => GameEngine::new(config, bank),
                };
                let session =
                    GameSession::new(engine, Board::default(), DeadlineClock::new(), store);
                (Some(session), None)
            }
            Err(e) => {
                error!(error = %e, "Could not load problems; play is disabled");
                (None, Some(e.to_string()))
            }
        };

        let cell_width = session
            .as_ref()
            .map(|s| cell_width_for(s.engine().widest_food_label()))
            .unwrap_or(MIN_CELL_WIDTH);

        Self {
            session,
            load_error,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            swipe: SwipeTracker::new(),
            type_options,
            difficulty_options,
            screen_locked: false,
            cell_width,
            too_small: false,
            should_quit: false,
        }
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

        let size = terminal.size().context("Failed to read terminal size")?;
        self.handle_resize(size.width, size.height);

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(&mut self, terminal: &mut TerminalBackend) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Refresh the clock display at 30 FPS (33ms per frame)
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            let deadline = self.next_tick_deadline();
            let tick = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, terminal)?;
                        self.draw(terminal)?;
                    }
                }

                // Game logic tick
                _ = tick => {
                    self.on_tick(Instant::now());
                    self.draw(terminal)?;
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.draw(terminal)?;
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

        Ok(())
    }

    fn next_tick_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(|s| s.clock().next_deadline())
    }

    fn on_tick(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.clock_mut().fire(now);
        if let StepOutcome::GameOver(_) = session.tick() {
            self.metrics.on_game_over(session.state().score);
        }
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.metrics.update();
        terminal
            .draw(|frame| match (&self.session, &self.load_error) {
                (Some(_), _) if self.too_small => self.renderer.render_too_small(frame),
                (Some(session), _) => {
                    let scene = Scene::from_session(
                        session,
                        &self.metrics,
                        self.screen_locked,
                        self.cell_width,
                    );
                    self.renderer.render(frame, &scene);
                }
                (None, message) => {
                    let message = message.as_deref().unwrap_or("unknown error");
                    self.renderer.render_load_error(frame, message);
                }
            })
            .context("Failed to draw frame")?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event, terminal: &mut TerminalBackend) -> Result<()> {
        match event {
            Event::Key(key) => {
                // Only process key press events, not release
                if key.kind != KeyEventKind::Press {
                    return Ok(());
                }

                let action = self.input_handler.handle_key_event(key);
                let was_locked = self.screen_locked;
                self.apply_action(action);
                if self.screen_locked != was_locked {
                    self.sync_mouse_capture(terminal)?;
                }
            }
            Event::Mouse(mouse) => {
                if let Some(direction) = self.swipe.handle_mouse_event(mouse) {
                    if let Some(session) = self.session.as_mut() {
                        session.request_direction(direction);
                    }
                }
            }
            Event::Resize(cols, rows) => {
                self.handle_resize(cols, rows);
            }
            _ => {}
        }

        Ok(())
    }

    fn apply_action(&mut self, action: KeyAction) {
        if action == KeyAction::Quit {
            self.should_quit = true;
            return;
        }

        let Some(session) = self.session.as_mut() else {
            // Nothing but quitting works without problems
            return;
        };

        match action {
            KeyAction::Turn(direction) => session.request_direction(direction),
            KeyAction::Start | KeyAction::Restart => {
                session.start_or_restart();
                self.metrics.on_game_start();
            }
            KeyAction::TogglePause => session.toggle_pause(),
            KeyAction::Dismiss => session.dismiss_game_over(),
            KeyAction::CycleType => {
                let next = next_option(&self.type_options, &session.config().problem_type);
                session.set_type_filter(next);
            }
            KeyAction::CycleDifficulty => {
                let next = next_option(&self.difficulty_options, &session.config().difficulty);
                session.set_difficulty_filter(next);
            }
            KeyAction::CycleSpeed => {
                let next = next_option(&SPEED_LEVELS, &session.config().speed);
                session.set_speed(next);
            }
            KeyAction::ToggleLock => {
                self.screen_locked = !self.screen_locked;
                self.swipe.cancel();
            }
            KeyAction::Quit | KeyAction::None => {}
        }
    }

    /// Lay the board out for a new terminal size.
    ///
    /// Narrower layouts are tried until the whole board fits. When none does,
    /// the board is hidden and a running game is paused.
    fn handle_resize(&mut self, cols: u16, rows: u16) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let (width, height) = viewport_for_terminal(cols, rows);
        let candidates = [
            width,
            width.min(MEDIUM_MAX_WIDTH - 1.0),
            width.min(NARROW_MAX_WIDTH - 1.0),
        ];
        let fitting = candidates.into_iter().find(|&candidate| {
            board_fits(
                &Board::for_viewport(candidate, height),
                self.cell_width,
                cols,
                rows,
            )
        });

        session.configure_board(fitting.unwrap_or(candidates[2]), height);
        self.too_small = fitting.is_none();

        if self.too_small {
            warn!(cols, rows, "Terminal too small for the board");
            if session.phase() == Phase::Running {
                session.toggle_pause();
            }
        }
    }

    fn sync_mouse_capture(&self, terminal: &mut TerminalBackend) -> Result<()> {
        if self.screen_locked {
            execute!(terminal.backend_mut(), EnableMouseCapture)
                .context("Failed to enable mouse capture")?;
        } else {
            execute!(terminal.backend_mut(), DisableMouseCapture)
                .context("Failed to disable mouse capture")?;
        }
        Ok(())
    }

    fn cleanup_terminal(&mut self, terminal: &mut TerminalBackend) -> Result<()> {
        if self.screen_locked {
            execute!(terminal.backend_mut(), DisableMouseCapture)
                .context("Failed to disable mouse capture")?;
        }
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }

    /// Phase of the session, `None` when play is disabled
    pub fn phase(&self) -> Option<Phase> {
        self.session.as_ref().map(|s| s.phase())
    }
}

/// The option after `current`, wrapping around; the first one if `current` is unknown
fn next_option<T: Clone + PartialEq>(options: &[T], current: &T) -> T {
    let next = match options.iter().position(|o| o == current) {
        Some(index) => (index + 1) % options.len(),
        None => 0,
    };
    options[next].clone()
}
