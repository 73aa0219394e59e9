mod config;
mod error;
mod food;
mod game;
mod highscores;
mod host;
mod snake;
mod term;

use std::{fs::File, ops::Add, path::Path};

use anyhow::Result;
use log::{error, info, warn};

use crate::config::{Config, Mode};
use crate::error::GameError;
use crate::game::{Game, Rules};
use crate::highscores::{HighScores, ScoreStore};
use crate::term::TermManager;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

/// Playing field size in cells. Valid positions are `[0, width) x [0, height)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub const fn new(width: i32, height: i32) -> Self {
        Grid { width, height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2, self.height / 2)
    }
}

fn init_logging(log_path: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    // The game owns the terminal, so logs go to a file unless it can't be opened.
    match File::create(log_path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        },
        Err(e) => eprintln!("Could not open log file {}: {}", log_path.display(), e),
    }

    builder.init();
}

/// Shrinks the board so it fits inside the border and score line.
fn fit_to_terminal(grid: Grid, term: &TermManager) -> Grid {
    let (cols, rows) = term.size();
    let max_w = cols as i32 - 2;
    let max_h = rows as i32 - 3;
    let fitted = Grid::new(grid.width.min(max_w).max(1), grid.height.min(max_h).max(1));

    if fitted != grid {
        warn!("Board {}x{} does not fit the terminal, using {}x{}",
              grid.width, grid.height, fitted.width, fitted.height);
    }
    fitted
}

fn main() -> Result<()> {
    init_logging(&config::log_path());
    let config = Config::from_env();
    info!("Starting with {:?}", config);

    let store = ScoreStore::new(config.highscores_path.clone());
    info!("High scores live in {}", store.path().display());
    let mut term = TermManager::new()?;
    let grid = fit_to_terminal(config.grid, &term);

    let rules = Rules {
        difficulty_select: config.difficulty_select,
        gated: config.mode == Mode::Realtime,
    };
    let mut game = Game::new(grid, rules, &store, rand::thread_rng());

    let outcome = term.setup().map_err(GameError::from).and_then(|()| match config.mode {
        Mode::Realtime => host::run_realtime(&mut game, &mut term, config.frame_interval),
        Mode::Lockstep => host::run_lockstep(&mut game, &mut term, config.lockstep_delay),
    });

    if let Err(e) = term.restore() {
        error!("Could not restore the terminal: {}", e);
    }

    finish(outcome, &store, game.high_scores())
}

/// Turns how the game loop ended into the process result. Quitting is a clean
/// exit and saves the table; anything else is an error and saves nothing.
fn finish(outcome: std::result::Result<(), GameError>, store: &ScoreStore, scores: &HighScores) -> Result<()> {
    match outcome {
        Err(e) if e.is_quit() => {
            store.save(scores);
            info!("Game exited with quit signal.");
            Ok(())
        },
        Err(e) => {
            error!("Game stopped: {}", e);
            Err(e.into())
        },
        Ok(()) => Ok(()),
    }
}
