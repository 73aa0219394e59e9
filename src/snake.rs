use std::collections::VecDeque;

use crate::{Grid, Point};
use Direction::*;

/// Segments added over the following moves each time the snake eats.
pub const GROWTH_PER_FOOD: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn vector(self) -> Point {
        match self {
            Up => Point::new(0, -1),
            Down => Point::new(0, 1),
            Left => Point::new(-1, 0),
            Right => Point::new(1, 0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Point>, // head first
    direction: Direction,
    grow_counter: u32,
}

impl Snake {
    pub fn new(head: Point, direction: Direction) -> Self {
        Snake { body: VecDeque::from(vec![head]), direction, grow_counter: 0 }
    }

    /// Builds a snake from explicit segments, head first. Falls back to a single
    /// segment at the origin when `body` is empty so the snake is never headless.
    pub fn with_body(body: impl IntoIterator<Item = Point>, direction: Direction, grow_counter: u32) -> Self {
        let mut body: VecDeque<Point> = body.into_iter().collect();
        if body.is_empty() {
            body.push_back(Point::new(0, 0));
        }
        Snake { body, direction, grow_counter }
    }

    /// A fresh one-segment snake in the middle of the board, heading right.
    pub fn spawn(grid: Grid) -> Self {
        Snake::new(grid.center(), Right)
    }

    pub fn body(&self) -> &VecDeque<Point> {
        &self.body
    }

    pub fn head(&self) -> Point {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn grow_counter(&self) -> u32 {
        self.grow_counter
    }

    /// Advances one cell along the heading. Bounds are the caller's problem.
    pub fn move_step(&mut self) {
        let new_head = self.head() + self.direction.vector();
        self.body.push_front(new_head);

        if self.grow_counter > 0 {
            self.grow_counter -= 1;
        } else {
            self.body.pop_back();
        }
    }

    pub fn grow(&mut self, segments: u32) {
        self.grow_counter += segments;
    }

    /// Only turns onto the other axis are accepted, so the head can never
    /// reverse into the neck.
    pub fn try_turn(&mut self, new_direction: Direction) -> bool {
        let current = self.direction.vector();
        let wanted = new_direction.vector();

        let perpendicular = if wanted.x != 0 { current.x == 0 } else { current.y == 0 };
        if perpendicular {
            self.direction = new_direction;
        }
        perpendicular
    }

    pub fn bites_itself(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|segment| *segment == head)
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}
