use std::{fs::File, io::{BufReader, BufWriter, ErrorKind, Write}, path::{Path, PathBuf}};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

pub const MAX_HIGH_SCORES: usize = 10;

/// Best scores first, never more than `MAX_HIGH_SCORES` of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct HighScores(Vec<u32>);

impl HighScores {
    pub fn new() -> Self {
        HighScores(Vec::new())
    }

    pub fn record(&mut self, score: u32) {
        self.0.push(score);
        self.normalize();
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn best(&self) -> Option<u32> {
        self.0.first().copied()
    }

    fn normalize(&mut self) {
        self.0.sort_unstable_by(|a, b| b.cmp(a));
        self.0.truncate(MAX_HIGH_SCORES);
    }
}

impl From<Vec<u32>> for HighScores {
    fn from(scores: Vec<u32>) -> Self {
        let mut scores = HighScores(scores);
        scores.normalize();
        scores
    }
}

impl From<HighScores> for Vec<u32> {
    fn from(scores: HighScores) -> Self {
        scores.0
    }
}

/// The JSON file holding the high score table.
#[derive(Clone, Debug)]
pub struct ScoreStore {
    path: PathBuf,
}

impl ScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ScoreStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the table. A missing file is not an error; anything else that
    /// goes wrong is logged and an empty table is used.
    pub fn load(&self) -> HighScores {
        match self.try_load() {
            Ok(Some(scores)) => {
                info!("Loaded {} high scores from {}", scores.len(), self.path.display());
                scores
            },
            Ok(None) => {
                debug!("No high score file at {}, starting empty", self.path.display());
                HighScores::new()
            },
            Err(e) => {
                error!("Error loading high scores from {}: {}", self.path.display(), e);
                HighScores::new()
            },
        }
    }

    /// Overwrites the file with `scores`. Failures are logged, never fatal.
    pub fn save(&self, scores: &HighScores) {
        match self.try_save(scores) {
            Ok(()) => debug!("Saved {} high scores to {}", scores.len(), self.path.display()),
            Err(e) => error!("Error saving high scores to {}: {}", self.path.display(), e),
        }
    }

    pub fn try_load(&self) -> Result<Option<HighScores>, ScoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let scores: HighScores = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(scores))
    }

    pub fn try_save(&self, scores: &HighScores) -> Result<(), ScoreError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(&mut writer, scores)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
