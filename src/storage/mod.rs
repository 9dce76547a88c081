//! Durable storage for the high score

pub mod high_score;

pub use high_score::{
    FileHighScoreStore, HighScoreStore, MemoryHighScoreStore, StorageError, HIGH_SCORE_KEY,
};
