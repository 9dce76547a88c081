use anyhow::{anyhow, Context, Result};
use clap::Parser;
use math_snake::config::AppConfig;
use math_snake::game::{ProblemBank, Selection};
use math_snake::modes::PlayMode;
use math_snake::storage::FileHighScoreStore;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "math_snake")]
#[command(version, about = "Snake game where the food is the answer to an arithmetic question")]
struct Cli {
    /// Problem data file (JSON)
    #[arg(long)]
    problems: Option<PathBuf>,

    /// Problem category, or "mixed"
    #[arg(long = "type")]
    problem_type: Option<String>,

    /// Problem difficulty, or "mixed"
    #[arg(long)]
    difficulty: Option<String>,

    /// Speed multiplier (tick period is 1400ms divided by this)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
    speed: Option<u32>,

    /// Directory holding the high score and the log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file (defaults to math_snake.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seed for reproducible problem and food placement
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    init_tracing(&config.log_file())?;

    let data_dir = config.data_dir();
    let problems_path = config.problems_path();
    info!(
        problems = %problems_path.display(),
        data_dir = %data_dir.display(),
        "Starting math snake"
    );

    let bank = ProblemBank::load(&problems_path);
    let store = FileHighScoreStore::in_dir(&data_dir);

    let mut play_mode = PlayMode::new(config.game, bank, store, cli.seed);
    play_mode.run().await?;

    Ok(())
}

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(path) = &cli.problems {
        config.paths.problems = Some(path.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.paths.data_dir = Some(dir.clone());
    }
    if let Some(path) = &cli.log_file {
        config.paths.log_file = Some(path.clone());
    }
    if let Some(problem_type) = &cli.problem_type {
        config.game.problem_type = Selection::from(problem_type.as_str());
    }
    if let Some(difficulty) = &cli.difficulty {
        config.game.difficulty = Selection::from(difficulty.as_str());
    }
    if let Some(speed) = cli.speed {
        config.game.speed = speed;
    }
}

/// Log to a file; the terminal belongs to the game
fn init_tracing(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(())
}
