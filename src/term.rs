use crate::Point;
use crate::game::{Canvas, Command, Difficulty};
use crate::host::Input;
use crate::snake::Direction;
use std::{io::{self, Stdout, Write, stdout}, time::Duration};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, read, poll};
use log::debug;

/// Owns the terminal while the game runs and draws frames into it.
///
/// Drawing goes to a back buffer; `present` only sends the cells that differ
/// from what the terminal already shows.
pub struct TermManager {
    width: u16,
    height: u16,
    stdout: Stdout,
    back: Vec<char>,
    front: Vec<char>,
    active: bool,
    needs_clear: bool,
}

impl TermManager {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(TermManager::with_size(width, height))
    }

    fn with_size(width: u16, height: u16) -> Self {
        let cells = width as usize * height as usize;
        TermManager {
            width,
            height,
            stdout: stdout(),
            back: vec![' '; cells],
            front: vec![' '; cells],
            active: false,
            needs_clear: false,
        }
    }

    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        // From here on `restore` has something to undo, even if the rest fails.
        self.active = true;

        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking, terminal::Clear(ClearType::All))?;
        self.front.iter_mut().for_each(|c| *c = ' ');
        debug!("Terminal ready, {}x{}", self.width, self.height);
        Ok(())
    }

    /// Undoes `setup`. Every step is attempted; the first error is returned.
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let raw = terminal::disable_raw_mode();
        let screen = execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen);
        raw.and(screen)
    }

    pub fn read_key_blocking(&mut self) -> io::Result<KeyEvent> {
        loop {
            match read()? {
                Event::Key(ev) if ev.kind != KeyEventKind::Release => return Ok(ev),
                Event::Resize(w, h) => self.resize(w, h),
                _ => {},
            }
        }
    }

    pub fn read_key_events_queue(&mut self) -> io::Result<Vec<KeyEvent>> {
        let mut events = vec![];

        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(ev) if ev.kind != KeyEventKind::Release => events.push(ev),
                Event::Resize(w, h) => self.resize(w, h),
                _ => {},
            }
        }

        Ok(events)
    }

    /// Rebuilds both buffers for the new size and wipes the screen on the next
    /// `present`. The board keeps its size; cells past the new edge are clipped.
    pub fn resize(&mut self, width: u16, height: u16) {
        debug!("Terminal resized to {}x{}", width, height);

        let cells = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.back = vec![' '; cells];
        self.front = vec![' '; cells];
        self.needs_clear = true;
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn index(&self, pos: Point) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return None;
        }
        Some(self.width as usize * pos.y as usize + pos.x as usize)
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Canvas for TermManager {
    fn clear(&mut self) {
        self.back.iter_mut().for_each(|c| *c = ' ');
    }

    fn put(&mut self, pos: Point, ch: char) {
        if let Some(i) = self.index(pos) {
            self.back[i] = ch;
        }
    }

    fn text(&mut self, pos: Point, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            self.put(Point::new(pos.x + i as i32, pos.y), ch);
        }
    }

    fn message(&mut self, lines: &[&str]) {
        let (top_left, width) = message_box(self.width, self.height, lines);
        let height = lines.len() as i32 + 2;

        // Blank top and bottom rows around the centered lines.
        for y in [top_left.y, top_left.y + height - 1] {
            for x in 0..width {
                self.put(Point::new(top_left.x + x, y), ' ');
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let padded = format!("{line: ^width$}", line = line, width = width as usize);
            self.text(Point::new(top_left.x, top_left.y + i as i32 + 1), &padded);
        }
    }

    fn present(&mut self) -> io::Result<()> {
        if self.needs_clear {
            queue!(self.stdout, terminal::Clear(ClearType::All))?;
            self.needs_clear = false;
        }

        for i in 0..self.back.len() {
            if self.back[i] == self.front[i] {
                continue;
            }
            let (x, y) = ((i % self.width as usize) as u16, (i / self.width as usize) as u16);
            queue!(self.stdout, cursor::MoveTo(x, y), style::Print(self.back[i]))?;
            self.front[i] = self.back[i];
        }

        self.stdout.flush()
    }
}

impl Input for TermManager {
    fn pending(&mut self) -> io::Result<Vec<Command>> {
        Ok(self.read_key_events_queue()?.iter().filter_map(command_for).collect())
    }

    fn wait(&mut self) -> io::Result<Option<Command>> {
        Ok(command_for(&self.read_key_blocking()?))
    }
}

/// Top-left corner and width of a message box centered on a `width` x `height` screen.
fn message_box(width: u16, height: u16, lines: &[&str]) -> (Point, i32) {
    let msg_height = lines.len() as i32 + 2;
    let msg_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32 + 2;
    let center = Point::new(width as i32 / 2, height as i32 / 2);

    (Point::new((center.x - msg_width / 2).max(0), (center.y - msg_height / 2).max(0)), msg_width)
}

/// Maps a key press to what it means to the game.
pub fn command_for(ev: &KeyEvent) -> Option<Command> {
    if is_ctrl_c(ev) {
        return Some(Command::Quit);
    }

    let cmd = match ev.code {
        KeyCode::Up | KeyCode::Char('k') => Command::Turn(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => Command::Turn(Direction::Down),
        KeyCode::Left | KeyCode::Char('h') => Command::Turn(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Command::Turn(Direction::Right),
        KeyCode::Char('s') | KeyCode::Char('S') => Command::Start,
        KeyCode::Char('v') | KeyCode::Char('V') => Command::ViewScores,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Restart,
        KeyCode::Char('p') | KeyCode::Char('P') => Command::Pause,
        KeyCode::Char('e') | KeyCode::Char('E') => Command::Quit,
        KeyCode::Char('1') => Command::Pick(Difficulty::Easy),
        KeyCode::Char('2') => Command::Pick(Difficulty::Medium),
        KeyCode::Char('3') => Command::Pick(Difficulty::Hard),
        KeyCode::Esc => Command::Back,
        _ => return None,
    };

    Some(cmd)
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL)
}
