// Host loops. They own pacing and input collection; the game itself only sees
// one `step` and one `render` per frame.
use std::{io, thread::sleep, time::{Duration, Instant}};

use log::debug;

use crate::error::GameError;
use crate::game::{Canvas, Command, Frame, FrameInput};

/// Where key presses come from.
pub trait Input {
    /// Everything pressed since the last call, without waiting.
    fn pending(&mut self) -> io::Result<Vec<Command>>;
    /// Blocks for the next key press. `None` if the key means nothing to the game.
    fn wait(&mut self) -> io::Result<Option<Command>>;
}

/// Steps and renders at a fixed frame rate, handing the game whatever keys
/// arrived in between. Only returns on error, `GameError::Quit` included.
pub fn run_realtime<T: Canvas + Input>(
    frame: &mut dyn Frame,
    term: &mut T,
    interval: Duration,
) -> Result<(), GameError> {
    debug!("Running realtime at {:?} per frame", interval);

    loop {
        let started = Instant::now();

        let input = FrameInput { commands: term.pending()? };
        frame.step(&input)?;
        frame.render(term)?;

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            sleep(rest);
        }
    }
}

/// Advances one step per key press: step, render, wait for a key, pause.
pub fn run_lockstep<T: Canvas + Input>(
    frame: &mut dyn Frame,
    term: &mut T,
    delay: Duration,
) -> Result<(), GameError> {
    debug!("Running lockstep with {:?} delay", delay);
    let mut input = FrameInput::none();

    loop {
        frame.step(&input)?;
        frame.render(term)?;

        input = FrameInput { commands: term.wait()?.into_iter().collect() };
        sleep(delay);
    }
}
