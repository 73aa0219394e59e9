// Runtime settings. Everything has a default; a few can be overridden from the environment.
use std::{env, path::PathBuf, time::Duration};

use log::warn;

use crate::Grid;

pub const FRAME_INTERVAL_MS: u64 = 16; // ~60 fps, the pace the tick counter was tuned for
pub const LOCKSTEP_DELAY_MS: u64 = 100;

pub const DEFAULT_GRID: Grid = Grid { width: 40, height: 20 };
pub const DEFAULT_LOCKSTEP_GRID: Grid = Grid { width: 20, height: 10 };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Fixed frame rate, keys polled between frames.
    Realtime,
    /// Every key press advances the game by exactly one step.
    Lockstep,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub highscores_path: PathBuf,
    pub mode: Mode,
    pub difficulty_select: bool,
    pub grid: Grid,
    pub frame_interval: Duration,
    pub lockstep_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            highscores_path: PathBuf::from("highscores.json"),
            mode: Mode::Realtime,
            difficulty_select: true,
            grid: DEFAULT_GRID,
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
            lockstep_delay: Duration::from_millis(LOCKSTEP_DELAY_MS),
        }
    }
}

/// Where logs go. Read on its own so logging is up before the rest of the config is parsed.
pub fn log_path() -> PathBuf {
    env::var("SNAKE_LOG")
        .unwrap_or_else(|_| "snake.log".to_string())
        .into()
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(path) = lookup("SNAKE_HIGHSCORES") {
            config.highscores_path = path.into();
        }

        match lookup("SNAKE_MODE").as_deref() {
            None | Some("realtime") => {},
            Some("lockstep") => {
                config.mode = Mode::Lockstep;
                config.grid = DEFAULT_LOCKSTEP_GRID;
            },
            Some(other) => warn!("Unknown SNAKE_MODE {:?}, using realtime", other),
        }

        if let Some(flag) = lookup("SNAKE_CLASSIC") {
            config.difficulty_select = !matches!(flag.as_str(), "1" | "true" | "yes");
        }

        if let Some(spec) = lookup("SNAKE_GRID") {
            match parse_grid(&spec) {
                Some(grid) => config.grid = grid,
                None => warn!("Ignoring malformed SNAKE_GRID {:?}, expected WIDTHxHEIGHT", spec),
            }
        }

        config
    }
}

fn parse_grid(spec: &str) -> Option<Grid> {
    let (w, h) = spec.trim().split_once(|c: char| c == 'x' || c == 'X')?;
    let width: i32 = w.trim().parse().ok()?;
    let height: i32 = h.trim().parse().ok()?;

    if width > 0 && height > 0 {
        Some(Grid::new(width, height))
    } else {
        None
    }
}
