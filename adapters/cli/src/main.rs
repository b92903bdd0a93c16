#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Grid Snake sessions.

mod autopilot;
mod scores;
mod script;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use grid_snake_core::{GameConfig, Phase};
use grid_snake_rendering_text::TextBackend;
use grid_snake_session::{Input, Session};
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use crate::scores::JsonFileStore;

const MAX_IDLE_STEPS: u32 = 100;

#[derive(Debug, Parser)]
#[command(name = "grid-snake", about = "Runs a headless Grid Snake session")]
struct CliArgs {
    /// Configuration document; `.toml` files are read as TOML, anything else as JSON.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// File keeping the per-level high scores.
    #[arg(long, value_name = "PATH", default_value = "grid-snake-scores.json")]
    scores: PathBuf,

    /// Overrides the placement seed of the configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate before stopping.
    #[arg(long, default_value_t = 200)]
    ticks: u32,

    /// Move script such as `RRDD.LU`; the autopilot steers when omitted.
    #[arg(long, value_name = "SCRIPT")]
    moves: Option<String>,

    /// Minimum level of log messages written to stderr.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LevelFilter,

    /// Paints the snake with ANSI colours.
    #[arg(long)]
    color: bool,

    /// Suppresses frame output.
    #[arg(long)]
    quiet: bool,
}

/// Entry point for the Grid Snake command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    TermLogger::init(
        args.log_level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("failed to install the terminal logger")?;

    let mut config = load_config(args.config.as_deref());
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    let moves = args
        .moves
        .as_deref()
        .map(script::parse)
        .transpose()
        .context("invalid move script")?;

    let store = JsonFileStore::new(&args.scores);
    info!("high scores are kept in {}", store.path().display());

    let sink: Box<dyn Write> = if args.quiet {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout().lock())
    };
    let backend = TextBackend::new(sink).with_color(args.color);
    let mut session = Session::new(config, store, backend);

    session.input(Input::Start)?;
    let mut ticks = 0;
    let mut idle_steps = 0;
    let mut steps = moves.unwrap_or_default().into_iter();
    while ticks < args.ticks {
        let snapshot = session.snapshot();
        if snapshot.phase == Phase::GameOver {
            break;
        }

        let steer = match args.moves {
            Some(_) => steps.next().flatten(),
            None => autopilot::choose(&snapshot),
        };
        if let Some(direction) = steer {
            session.input(Input::Steer(direction))?;
        }
        let fired = session.advance(snapshot.tick_interval)?;
        ticks += fired;
        idle_steps = if fired == 0 { idle_steps + 1 } else { 0 };
        if idle_steps > MAX_IDLE_STEPS {
            info!("no tick for {idle_steps} steps while {:?}; stopping", snapshot.phase);
            break;
        }
    }

    let snapshot = session.snapshot();
    println!(
        "Final score {} on level {} ({}), best {}, after {ticks} ticks",
        snapshot.score, snapshot.level.number, snapshot.level.name, snapshot.high_score
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> GameConfig {
    let Some(path) = path else {
        return GameConfig::default();
    };

    match read_config(path) {
        Ok(config) => config,
        Err(error) => {
            warn!("{error:#}; using built-in defaults");
            GameConfig::default()
        }
    }
}

fn read_config(path: &Path) -> Result<GameConfig> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let is_toml = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        GameConfig::from_toml_str(&source)
    } else {
        GameConfig::from_json_str(&source)
    };
    parsed.with_context(|| format!("failed to parse config {}", path.display()))
}
