use std::io;

use log::{debug, info};
use rand::Rng;

use crate::{Grid, Point};
use crate::error::GameError;
use crate::food::Food;
use crate::highscores::{HighScores, ScoreStore};
use crate::snake::{Direction::{self, *}, Snake, GROWTH_PER_FOOD};

/// Slowest the snake can get: one step every frame.
pub const MIN_SPEED: f64 = 1.0;

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';

// Left beats right beats up beats down when several turns arrive in one step.
const TURN_PRIORITY: [Direction; 4] = [Left, Right, Up, Down];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameState {
    Menu,
    SelectDifficulty,
    Playing,
    GameOver,
    Scoreboard,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Classic,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Frames between snake steps at the start of a game.
    pub fn initial_speed(self) -> f64 {
        match self {
            Difficulty::Classic => 10.0,
            Difficulty::Easy | Difficulty::Medium | Difficulty::Hard => 20.0,
        }
    }

    /// How many frames each piece of food knocks off the step interval.
    pub fn speed_step(self) -> f64 {
        match self {
            Difficulty::Classic => 0.5,
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 3.0,
            Difficulty::Hard => 5.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Classic => "Classic",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Start,
    ViewScores,
    Restart,
    Back,
    Pick(Difficulty),
    Pause,
    Quit,
}

/// Everything the player pressed since the previous frame, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub commands: Vec<Command>,
}

impl FrameInput {
    pub fn none() -> Self {
        FrameInput::default()
    }

    pub fn of(commands: &[Command]) -> Self {
        FrameInput { commands: commands.to_vec() }
    }
}

/// Where a frame gets drawn. Coordinates are screen cells, not board cells.
pub trait Canvas {
    fn clear(&mut self);
    fn put(&mut self, pos: Point, ch: char);
    fn text(&mut self, pos: Point, text: &str);
    /// A centered box drawn over whatever is already on the canvas.
    fn message(&mut self, lines: &[&str]);
    fn present(&mut self) -> io::Result<()>;
}

/// What a host loop drives once per frame.
pub trait Frame {
    fn step(&mut self, input: &FrameInput) -> Result<(), GameError>;
    fn render(&self, canvas: &mut dyn Canvas) -> Result<(), GameError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Ask for a difficulty before every game. When off, games start at Classic
    /// and Restart goes straight back into play.
    pub difficulty_select: bool,
    /// Only step the snake once enough frames have passed. Lockstep hosts turn
    /// this off so every frame is a step.
    pub gated: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Rules { difficulty_select: true, gated: true }
    }
}

pub struct Game<'a, R: Rng> {
    state: GameState,
    snake: Snake,
    food: Food,
    score: u32,
    update_counter: f64,
    speed: f64,
    difficulty: Difficulty,
    paused: bool,
    pending_turns: Vec<Direction>,
    high_scores: HighScores,
    grid: Grid,
    rules: Rules,
    store: &'a ScoreStore,
    rng: R,
}

impl<'a, R: Rng> Game<'a, R> {
    /// Starts at the menu with whatever high scores `store` holds.
    pub fn new(grid: Grid, rules: Rules, store: &'a ScoreStore, mut rng: R) -> Self {
        let food = Food::spawn(grid, &mut rng);
        let difficulty = Difficulty::Classic;

        Game {
            state: GameState::Menu,
            snake: Snake::spawn(grid),
            food,
            score: 0,
            update_counter: 0.0,
            speed: difficulty.initial_speed(),
            difficulty,
            paused: false,
            pending_turns: Vec::new(),
            high_scores: store.load(),
            grid,
            rules,
            store,
            rng,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> &Food {
        &self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    ///////////////////////////////////////////////////////////////////////////

    fn apply(&mut self, command: Command) {
        use Command::*;
        use GameState::*;

        match (self.state, command) {
            (Menu, Start) => {
                if self.rules.difficulty_select {
                    self.state = SelectDifficulty;
                } else {
                    self.new_game(Difficulty::Classic);
                }
            },
            (Menu, ViewScores) => self.state = Scoreboard,
            (SelectDifficulty, Pick(difficulty)) => self.new_game(difficulty),
            (SelectDifficulty, Back) | (Scoreboard, Back) | (GameOver, Back) => self.state = Menu,
            (Playing, Pause) => self.paused = !self.paused,
            (Playing, Turn(dir)) if !self.paused => {
                if !self.pending_turns.contains(&dir) {
                    self.pending_turns.push(dir);
                }
            },
            (GameOver, Restart) => {
                if self.rules.difficulty_select {
                    self.state = SelectDifficulty;
                } else {
                    self.new_game(self.difficulty);
                }
            },
            _ => {},
        }
    }

    fn new_game(&mut self, difficulty: Difficulty) {
        info!("New game on {}", difficulty.name());

        self.snake = Snake::spawn(self.grid);
        self.food = Food::spawn(self.grid, &mut self.rng);
        self.score = 0;
        self.difficulty = difficulty;
        self.speed = difficulty.initial_speed();
        self.update_counter = 0.0;
        self.paused = false;
        self.pending_turns.clear();
        self.state = GameState::Playing;
    }

    fn update_game(&mut self) {
        if self.rules.gated {
            self.update_counter += 1.0;
            if self.update_counter < self.speed {
                return;
            }
            self.update_counter = 0.0;
        }

        self.snake.move_step();
        self.apply_pending_turn();

        if self.snake.bites_itself() || !self.grid.contains(self.snake.head()) {
            self.game_over();
            return;
        }

        if self.snake.head() == self.food.position {
            self.score += 1;
            self.snake.grow(GROWTH_PER_FOOD);
            self.speed = (self.speed - self.difficulty.speed_step()).max(MIN_SPEED);
            self.food = Food::spawn(self.grid, &mut self.rng);
            debug!("Ate food, score {} speed {}", self.score, self.speed);
        }
    }

    fn apply_pending_turn(&mut self) {
        for dir in TURN_PRIORITY.iter() {
            if self.pending_turns.contains(dir) && self.snake.try_turn(*dir) {
                break;
            }
        }
        self.pending_turns.clear();
    }

    fn game_over(&mut self) {
        info!("Game over with score {}", self.score);

        self.state = GameState::GameOver;
        self.high_scores.record(self.score);
        self.store.save(&self.high_scores);
    }

    fn draw_board(&self, canvas: &mut dyn Canvas, dead: bool) {
        let (w, h) = (self.grid.width, self.grid.height);

        for x in 0..w + 2 {
            let ch = if x == 0 || x == w + 1 {'+'} else {'-'};
            canvas.put(Point::new(x, 0), ch);
            canvas.put(Point::new(x, h + 1), ch);
        }
        for y in 1..h + 1 {
            canvas.put(Point::new(0, y), '|');
            canvas.put(Point::new(w + 1, y), '|');
        }

        let to_screen = |p: Point| Point::new(p.x + 1, p.y + 1);

        if self.grid.contains(self.food.position) {
            canvas.put(to_screen(self.food.position), FOOD_CHAR);
        }

        // Tail first so the head wins when segments overlap.
        for (i, pos) in self.snake.body().iter().enumerate().rev() {
            if !self.grid.contains(*pos) {
                continue;
            }
            let ch = if dead {
                DEAD_SNAKE_CHAR
            } else if i == 0 {
                self.snake.head_char()
            } else {
                SNAKE_BODY_CHAR
            };
            canvas.put(to_screen(*pos), ch);
        }

        let status = match self.high_scores.best() {
            Some(best) => format!("Score: {}  Best: {}  [{}]", self.score, best, self.difficulty.name()),
            None => format!("Score: {}  [{}]", self.score, self.difficulty.name()),
        };
        canvas.text(Point::new(0, h + 2), &status);
    }

    fn scoreboard_lines(&self) -> Vec<String> {
        let mut lines = vec!["High Scores".to_string(), String::new()];

        if self.high_scores.is_empty() {
            lines.push("No scores yet".to_string());
        }
        for (i, score) in self.high_scores.as_slice().iter().enumerate() {
            lines.push(format!("{:>2}. {}", i + 1, score));
        }

        lines.push(String::new());
        lines.push("Esc to go back".to_string());
        lines
    }
}

impl<'a, R: Rng> Frame for Game<'a, R> {
    fn step(&mut self, input: &FrameInput) -> Result<(), GameError> {
        if input.commands.contains(&Command::Quit) {
            info!("Quit key pressed. Quitting the game.");
            return Err(GameError::Quit);
        }

        // A game started by this frame's input gets its first step next frame.
        let was_playing = self.state == GameState::Playing;

        for command in &input.commands {
            self.apply(*command);
        }

        if was_playing && self.state == GameState::Playing && !self.paused {
            self.update_game();
        }

        Ok(())
    }

    fn render(&self, canvas: &mut dyn Canvas) -> Result<(), GameError> {
        canvas.clear();

        match self.state {
            GameState::Menu => canvas.message(&[
                "SNAKE",
                "",
                "Press 'S' to Start",
                "Press 'V' to View High Scores",
                "Press 'E' to Exit",
            ]),
            GameState::SelectDifficulty => canvas.message(&[
                "Select difficulty",
                "",
                "Press '1' for Easy",
                "Press '2' for Medium",
                "Press '3' for Hard",
            ]),
            GameState::Playing => {
                self.draw_board(canvas, false);
                if self.paused {
                    canvas.message(&["Paused", "Press 'P' to resume", "or 'E' to quit"]);
                }
            },
            GameState::GameOver => {
                self.draw_board(canvas, true);
                let score = format!("Score: {}", self.score);
                canvas.message(&[
                    "Game Over!",
                    score.as_str(),
                    "",
                    "Press 'R' to restart,",
                    "Esc for the menu",
                    "or 'E' to Exit.",
                ]);
            },
            GameState::Scoreboard => {
                let lines = self.scoreboard_lines();
                let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
                canvas.message(&lines);
            },
        }

        canvas.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;

    use Command::*;

    #[derive(Default)]
    struct TestCanvas {
        cells: HashMap<Point, char>,
        texts: Vec<String>,
        messages: Vec<Vec<String>>,
        presented: usize,
    }

    impl Canvas for TestCanvas {
        fn clear(&mut self) {
            self.cells.clear();
            self.texts.clear();
            self.messages.clear();
        }

        fn put(&mut self, pos: Point, ch: char) {
            self.cells.insert(pos, ch);
        }

        fn text(&mut self, _pos: Point, text: &str) {
            self.texts.push(text.to_string());
        }

        fn message(&mut self, lines: &[&str]) {
            self.messages.push(lines.iter().map(|l| l.to_string()).collect());
        }

        fn present(&mut self) -> io::Result<()> {
            self.presented += 1;
            Ok(())
        }
    }

    fn store() -> (TempDir, ScoreStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ScoreStore::new(dir.path().join("highscores.json"));
        (dir, store)
    }

    fn game(store: &ScoreStore, rules: Rules) -> Game<'_, StdRng> {
        Game::new(Grid::new(20, 10), rules, store, StdRng::seed_from_u64(3))
    }

    fn lockstep() -> Rules {
        Rules { difficulty_select: true, gated: false }
    }

    fn step(game: &mut Game<'_, StdRng>, commands: &[Command]) {
        game.step(&FrameInput::of(commands)).unwrap();
    }

    fn playing(store: &ScoreStore, rules: Rules, difficulty: Difficulty) -> Game<'_, StdRng> {
        let mut game = game(store, rules);
        game.new_game(difficulty);
        // Keep food out of the way unless a test places it.
        game.food = Food::at(Point::new(0, 0));
        game
    }

    #[test]
    fn menu_leads_to_difficulty_then_play() {
        let (_dir, store) = store();
        let mut game = game(&store, Rules::default());
        assert_eq!(game.state(), GameState::Menu);

        step(&mut game, &[Start]);
        assert_eq!(game.state(), GameState::SelectDifficulty);

        step(&mut game, &[Pick(Difficulty::Medium)]);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.difficulty(), Difficulty::Medium);
        assert_eq!(game.speed(), 20.0);
        assert_eq!(game.score(), 0);
        assert_eq!(game.snake().head(), Point::new(10, 5));
    }

    #[test]
    fn classic_rules_skip_difficulty_select() {
        let (_dir, store) = store();
        let mut game = game(&store, Rules { difficulty_select: false, gated: true });

        step(&mut game, &[Start]);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.difficulty(), Difficulty::Classic);
        assert_eq!(game.speed(), 10.0);
    }

    #[test]
    fn scoreboard_and_back() {
        let (_dir, store) = store();
        let mut game = game(&store, Rules::default());

        step(&mut game, &[ViewScores]);
        assert_eq!(game.state(), GameState::Scoreboard);
        step(&mut game, &[Start]);
        assert_eq!(game.state(), GameState::Scoreboard);
        step(&mut game, &[Back]);
        assert_eq!(game.state(), GameState::Menu);
    }

    #[test]
    fn quit_works_from_every_state() {
        let (_dir, store) = store();
        let mut game = game(&store, Rules::default());

        for state in [GameState::Menu, GameState::SelectDifficulty, GameState::Playing,
                      GameState::GameOver, GameState::Scoreboard] {
            game.state = state;
            let res = game.step(&FrameInput::of(&[Turn(Up), Quit]));
            assert!(matches!(res, Err(GameError::Quit)));
        }
    }

    #[test]
    fn snake_only_steps_once_counter_reaches_speed() {
        let (_dir, store) = store();
        let mut game = playing(&store, Rules::default(), Difficulty::Classic);
        let start = game.snake().head();

        for _ in 0..9 {
            step(&mut game, &[]);
        }
        assert_eq!(game.snake().head(), start);

        step(&mut game, &[]);
        assert_eq!(game.snake().head(), start + Point::new(1, 0));
        assert_eq!(game.update_counter, 0.0);
    }

    #[test]
    fn freshly_started_game_waits_a_frame() {
        let (_dir, store) = store();
        let mut game = game(&store, lockstep());
        step(&mut game, &[Start]);
        step(&mut game, &[Pick(Difficulty::Easy)]);
        assert_eq!(game.snake().head(), Point::new(10, 5));

        step(&mut game, &[]);
        assert_eq!(game.snake().head(), Point::new(11, 5));
    }

    #[test]
    fn turn_takes_effect_after_the_move() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);

        step(&mut game, &[Turn(Up)]);
        assert_eq!(game.snake().head(), Point::new(11, 5));
        assert_eq!(game.snake().direction(), Up);

        step(&mut game, &[]);
        assert_eq!(game.snake().head(), Point::new(11, 4));
    }

    #[test]
    fn one_turn_per_step_in_priority_order() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);

        // Heading right: left and right are on the same axis, so up wins over down.
        step(&mut game, &[Turn(Down), Turn(Up), Turn(Left), Turn(Right)]);
        assert_eq!(game.snake().direction(), Up);
        assert!(game.pending_turns.is_empty());

        step(&mut game, &[Turn(Right), Turn(Left)]);
        assert_eq!(game.snake().direction(), Left);
    }

    #[test]
    fn turns_between_steps_are_remembered() {
        let (_dir, store) = store();
        let mut game = playing(&store, Rules::default(), Difficulty::Classic);

        step(&mut game, &[Turn(Down)]);
        for _ in 0..8 {
            step(&mut game, &[]);
        }
        assert_eq!(game.snake().direction(), Right);

        step(&mut game, &[]);
        assert_eq!(game.snake().direction(), Down);
    }

    #[test]
    fn hitting_the_edge_ends_the_game_and_saves() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);
        game.snake = Snake::with_body(vec![Point::new(0, 5)], Left, 0);
        game.score = 4;

        step(&mut game, &[]);

        assert_eq!(game.snake().head(), Point::new(-1, 5));
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.high_scores().as_slice(), &[4]);
        assert_eq!(store.load().as_slice(), &[4]);
    }

    #[test]
    fn biting_itself_ends_the_game() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);
        game.snake = Snake::with_body(
            vec![Point::new(5, 5), Point::new(5, 6), Point::new(4, 6), Point::new(4, 5), Point::new(3, 5)],
            Down, 0);

        step(&mut game, &[]);

        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn eating_scores_grows_and_speeds_up() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Medium);
        game.food = Food::at(Point::new(11, 5));

        step(&mut game, &[]);

        assert_eq!(game.score(), 1);
        assert_eq!(game.snake().grow_counter(), GROWTH_PER_FOOD);
        assert_eq!(game.speed(), 17.0);
        assert!(game.grid().contains(game.food().position));

        step(&mut game, &[]);
        step(&mut game, &[]);
        assert_eq!(game.snake().len(), 3);
    }

    #[test]
    fn speed_never_drops_below_minimum() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Hard);
        for _ in 0..6 {
            game.food = Food::at(game.snake().head() + Right.vector());
            step(&mut game, &[]);
        }
        assert_eq!(game.score(), 6);
        assert_eq!(game.speed(), MIN_SPEED);
    }

    #[test]
    fn restart_goes_through_difficulty_select() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Hard);
        game.state = GameState::GameOver;

        step(&mut game, &[Restart]);
        assert_eq!(game.state(), GameState::SelectDifficulty);
        step(&mut game, &[Back]);
        assert_eq!(game.state(), GameState::Menu);
    }

    #[test]
    fn classic_restart_starts_fresh_game() {
        let (_dir, store) = store();
        let rules = Rules { difficulty_select: false, gated: true };
        let mut game = playing(&store, rules, Difficulty::Classic);
        game.snake = Snake::with_body(vec![Point::new(1, 1), Point::new(1, 2)], Up, 1);
        game.score = 7;
        game.speed = 3.0;
        game.state = GameState::GameOver;

        step(&mut game, &[Restart]);

        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.speed(), 10.0);
        assert_eq!(game.snake().len(), 1);
        assert_eq!(game.snake().grow_counter(), 0);
    }

    #[test]
    fn pause_freezes_the_snake() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);

        step(&mut game, &[Pause]);
        assert!(game.is_paused());
        step(&mut game, &[Turn(Up)]);
        step(&mut game, &[]);
        assert_eq!(game.snake().head(), Point::new(10, 5));

        step(&mut game, &[Pause]);
        assert_eq!(game.snake().head(), Point::new(11, 5));
        assert_eq!(game.snake().direction(), Right);
    }

    #[test]
    fn loads_existing_scores_on_startup() {
        let (_dir, store) = store();
        store.save(&HighScores::from(vec![50, 30]));
        let mut game = playing(&store, lockstep(), Difficulty::Easy);
        game.snake = Snake::with_body(vec![Point::new(19, 0)], Right, 0);
        game.score = 40;

        step(&mut game, &[]);

        assert_eq!(game.high_scores().as_slice(), &[50, 40, 30]);
        assert_eq!(store.load().as_slice(), &[50, 40, 30]);
    }

    #[test]
    fn renders_board_with_border_offset() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);
        game.food = Food::at(Point::new(3, 2));
        let mut canvas = TestCanvas::default();

        game.render(&mut canvas).unwrap();

        assert_eq!(canvas.cells.get(&Point::new(11, 6)), Some(&'>'));
        assert_eq!(canvas.cells.get(&Point::new(4, 3)), Some(&FOOD_CHAR));
        assert_eq!(canvas.cells.get(&Point::new(0, 0)), Some(&'+'));
        assert_eq!(canvas.cells.get(&Point::new(21, 11)), Some(&'+'));
        assert_eq!(canvas.texts, vec!["Score: 0  [Easy]".to_string()]);
        assert!(canvas.messages.is_empty());
        assert_eq!(canvas.presented, 1);
    }

    #[test]
    fn renders_menus_as_messages() {
        let (_dir, store) = store();
        store.save(&HighScores::from(vec![9, 4]));
        let mut game = game(&store, Rules::default());
        let mut canvas = TestCanvas::default();

        game.render(&mut canvas).unwrap();
        assert!(canvas.messages[0].iter().any(|l| l.contains("Start")));

        step(&mut game, &[ViewScores]);
        game.render(&mut canvas).unwrap();
        let lines = &canvas.messages[0];
        assert!(lines.contains(&" 1. 9".to_string()));
        assert!(lines.contains(&" 2. 4".to_string()));
    }

    #[test]
    fn dead_snake_is_drawn_crossed_out() {
        let (_dir, store) = store();
        let mut game = playing(&store, lockstep(), Difficulty::Easy);
        game.snake = Snake::with_body(vec![Point::new(0, 5), Point::new(1, 5)], Left, 0);

        step(&mut game, &[]);
        let mut canvas = TestCanvas::default();
        game.render(&mut canvas).unwrap();

        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(canvas.cells.get(&Point::new(1, 6)), Some(&DEAD_SNAKE_CHAR));
        assert!(canvas.messages[0].contains(&"Game Over!".to_string()));
    }
}
