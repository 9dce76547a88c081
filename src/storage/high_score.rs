use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Fixed key the high score is stored under
pub const HIGH_SCORE_KEY: &str = "snakeMathHigh";

/// Failure to persist the high score
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write high score to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single persisted counter
pub trait HighScoreStore {
    /// Stored value, or 0 when nothing usable is stored
    fn load(&self) -> u32;
    fn save(&mut self, score: u32) -> Result<(), StorageError>;
}

/// Keeps the high score in memory only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHighScoreStore {
    value: Option<u32>,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: u32) -> Self {
        Self { value: Some(value) }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> u32 {
        self.value.unwrap_or(0)
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        self.value = Some(score);
        Ok(())
    }
}

/// Keeps the high score in a file named after [`HIGH_SCORE_KEY`]
#[derive(Debug, Clone)]
pub struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    /// Store inside `dir`; the directory is created on first save
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(HIGH_SCORE_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn load(&self) -> u32 {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read high score");
                return 0;
            }
        };

        match text.trim().parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                warn!(path = %self.path.display(), contents = %text.trim(), "Ignoring malformed high score");
                0
            }
        }
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        let write_error = |source| StorageError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&self.path, score.to_string()).map_err(write_error)
    }
}
