use rand::Rng;

use crate::{Grid, Point};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Food {
    pub position: Point,
}

impl Food {
    pub fn at(position: Point) -> Self {
        Food { position }
    }

    /// Drops food anywhere on the board. The snake's body is not consulted, so
    /// the food may land underneath it.
    pub fn spawn<R: Rng + ?Sized>(grid: Grid, rng: &mut R) -> Self {
        let x = rng.gen_range(0..grid.width);
        let y = rng.gen_range(0..grid.height);
        Food { position: Point::new(x, y) }
    }
}
