use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Name used by the selectors for "don't filter"
pub const MIXED: &str = "mixed";

/// Default tick period before the speed multiplier is applied
pub const BASE_INTERVAL_MS: u64 = 1400;

/// Speed multipliers offered by the speed selector
pub const SPEED_LEVELS: [u32; 4] = [5, 7, 10, 14];

/// A category or difficulty filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    /// Any value is acceptable
    #[default]
    Mixed,
    /// Only the named value is acceptable
    Only(String),
}

impl Selection {
    /// Returns true if `name` passes this filter
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Selection::Mixed => true,
            Selection::Only(wanted) => wanted == name,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Selection::Mixed)
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case(MIXED) {
            Selection::Mixed
        } else {
            Selection::Only(value)
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::from(value.to_string())
    }
}

impl From<Selection> for String {
    fn from(value: Selection) -> Self {
        match value {
            Selection::Mixed => MIXED.to_string(),
            Selection::Only(name) => name,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Mixed => f.write_str(MIXED),
            Selection::Only(name) => f.write_str(name),
        }
    }
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Category filter used when picking problems
    pub problem_type: Selection,
    /// Difficulty filter used when picking problems
    pub difficulty: Selection,
    /// Speed multiplier dividing the base interval
    pub speed: u32,
    /// Tick period at speed 1, in milliseconds
    pub base_interval_ms: u64,
    /// Length of the snake when a run starts
    pub initial_snake_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            problem_type: Selection::Mixed,
            difficulty: Selection::Mixed,
            speed: 7,
            base_interval_ms: BASE_INTERVAL_MS,
            initial_snake_length: 1,
        }
    }
}

impl GameConfig {
    /// Create a configuration with the given filters
    pub fn new(problem_type: Selection, difficulty: Selection) -> Self {
        Self {
            problem_type,
            difficulty,
            ..Default::default()
        }
    }

    /// Time between two ticks
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms / u64::from(self.speed.max(1)))
    }
}
