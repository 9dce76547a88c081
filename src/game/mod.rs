//! Core game logic module for the math snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! Front ends drive a [`GameSession`] and render its state.

pub mod action;
pub mod board;
pub mod clock;
pub mod config;
pub mod engine;
pub mod problems;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use board::Board;
pub use clock::{DeadlineClock, ManualClock, TickClock};
pub use config::{GameConfig, Selection, BASE_INTERVAL_MS, SPEED_LEVELS};
pub use engine::{GameEngine, StepOutcome, FOOD_PER_PROBLEM};
pub use problems::{Answer, Problem, ProblemBank, ProblemError};
pub use session::GameSession;
pub use state::{
    FoodColor, FoodItem, GameOverCause, GameOverReport, GameState, Phase, Position, Snake,
};
