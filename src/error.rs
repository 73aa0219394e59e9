use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// The player asked to leave. Not a failure: the entry point saves and exits cleanly.
    #[error("quit")]
    Quit,
    #[error("There was a problem talking to the terminal")]
    Terminal(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Could not access the high score file")]
    Io(#[from] std::io::Error),
    #[error("The high score file is malformed")]
    Malformed(#[from] serde_json::Error),
}

impl GameError {
    pub fn is_quit(&self) -> bool {
        matches!(self, GameError::Quit)
    }
}
