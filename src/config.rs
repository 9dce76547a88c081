//! Application configuration
//!
//! Settings come from an optional `config.toml` (looked up in the current
//! directory and then the data directory) and are overridden by command-line
//! flags in `main.rs`. Missing keys fall back to defaults.
//!
//! ```toml
//! [game]
//! problem_type = "multiplication"
//! difficulty = "mixed"
//! speed = 10
//!
//! [paths]
//! problems = "data/math-problems-20.json"
//! data_dir = "/home/me/.local/share/math_snake"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::game::GameConfig;

pub const CONFIG_FILE: &str = "config.toml";
pub const PROBLEMS_FILE: &str = "math-problems-20.json";
pub const LOG_FILE: &str = "math_snake.log";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Problem data file
    pub problems: Option<PathBuf>,
    /// Where the high score and the log live
    pub data_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, `config.toml` is
    /// searched for in the current directory and the default data directory;
    /// finding none yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = [
            PathBuf::from(CONFIG_FILE),
            default_data_dir().join(CONFIG_FILE),
        ];
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.paths.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.paths
            .log_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join(LOG_FILE))
    }

    /// Configured problem file, else the first bundled copy found
    pub fn problems_path(&self) -> PathBuf {
        if let Some(path) = &self.paths.problems {
            return path.clone();
        }

        let mut candidates = vec![PathBuf::from("data").join(PROBLEMS_FILE)];
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("data").join(PROBLEMS_FILE));
            }
        }
        candidates.push(self.data_dir().join(PROBLEMS_FILE));

        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .unwrap_or_else(|| candidates[0].clone())
    }
}

/// `$XDG_DATA_HOME/math_snake`, `~/.local/share/math_snake`, or the current directory
pub fn default_data_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("math_snake");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local/share/math_snake");
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Selection;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_game_section() {
        let config = AppConfig::from_toml(
            r#"
            [game]
            problem_type = "multiplication"
            speed = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.game.problem_type, Selection::from("multiplication"));
        assert_eq!(config.game.difficulty, Selection::Mixed);
        assert_eq!(config.game.speed, 10);
        assert_eq!(config.game.base_interval_ms, 1400);
    }

    #[test]
    fn test_paths_section() {
        let config = AppConfig::from_toml(
            r#"
            [paths]
            problems = "/srv/problems.json"
            data_dir = "/tmp/snake"
            "#,
        )
        .unwrap();

        assert_eq!(config.problems_path(), PathBuf::from("/srv/problems.json"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/snake"));
        assert_eq!(config.log_file(), PathBuf::from("/tmp/snake").join(LOG_FILE));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::from_toml("[game\nspeed = ").is_err());
        assert!(AppConfig::from_toml("[game]\nspeed = \"fast\"").is_err());
    }

    #[test]
    fn test_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[game]\ndifficulty = \"hard\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.game.difficulty, Selection::from("hard"));

        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
