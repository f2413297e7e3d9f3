//! Procedural maze maps.
//!
//! A perfect maze is carved over a lattice of cells with a randomised
//! depth-first backtracker. Each cell becomes a 3x3 block of map codes: walls
//! in the corners, the cell content in the centre, and floor on the edge
//! middles where a passage leads out.

use rand::{Rng, seq::SliceRandom};

use crate::{
    config::MazeConfig,
    direction::Direction,
    dungeon::{
        CODE_FLOOR, CODE_GOAL_DOOR, CODE_KEY, CODE_MONSTER, CODE_PLAYER, CODE_WALL, MapError,
        MapLayout,
    },
};

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    /// Open passages, indexed like `Direction::ALL`.
    open: [bool; 4],
    visited: bool,
    spawn: Option<u8>,
}

impl Cell {
    fn exits(&self) -> usize {
        self.open.iter().filter(|&&o| o).count()
    }
}

/// Generates a maze layout with one player, `monsters` monsters, a key and a
/// goal door.
pub fn generate<R: Rng + ?Sized>(config: &MazeConfig, rng: &mut R) -> Result<MapLayout, MapError> {
    let (width, height) = (config.width, config.height);
    let cells = width * height;
    let required = config.monsters + 3;
    if cells < required {
        return Err(MapError::MazeTooSmall { cells, required });
    }

    let mut maze = vec![Cell::default(); cells];
    let index = |col: usize, row: usize| row * width + col;

    let start = (rng.random_range(0..width), rng.random_range(0..height));
    maze[index(start.0, start.1)].visited = true;
    let mut stack = vec![start];

    while let Some(&(col, row)) = stack.last() {
        let mut dirs = Direction::ALL;
        dirs.shuffle(rng);
        let next = dirs.into_iter().find_map(|dir| {
            let (c, r) = dir.adjacent(col as isize, row as isize);
            let (c, r) = (usize::try_from(c).ok()?, usize::try_from(r).ok()?);
            (c < width && r < height && !maze[index(c, r)].visited).then_some((dir, c, r))
        });

        match next {
            Some((dir, c, r)) => {
                maze[index(col, row)].open[dir.index()] = true;
                let neighbour = &mut maze[index(c, r)];
                neighbour.open[dir.back().index()] = true;
                neighbour.visited = true;
                stack.push((c, r));
            }
            None => {
                stack.pop();
            }
        }
    }

    place_spawns(&mut maze, config.monsters, rng);
    expand(&maze, width, height)
}

/// The goal goes on a dead end so its door never splits the maze.
fn place_spawns<R: Rng + ?Sized>(maze: &mut [Cell], monsters: usize, rng: &mut R) {
    let mut order: Vec<usize> = (0..maze.len()).collect();
    order.shuffle(rng);

    let goal = order
        .iter()
        .position(|&i| maze[i].exits() <= 1)
        .unwrap_or_default();
    let goal = order.remove(goal);
    maze[goal].spawn = Some(CODE_GOAL_DOOR);

    let codes = [CODE_PLAYER, CODE_KEY]
        .into_iter()
        .chain(std::iter::repeat_n(CODE_MONSTER, monsters));
    for (code, cell) in codes.zip(order) {
        maze[cell].spawn = Some(code);
    }
}

fn expand(maze: &[Cell], width: usize, height: usize) -> Result<MapLayout, MapError> {
    let mut rows = vec![vec![CODE_WALL; width * 3]; height * 3];
    for row in 0..height {
        for col in 0..width {
            let cell = &maze[row * width + col];
            let (x, y) = (col * 3 + 1, row * 3 + 1);
            rows[y][x] = cell.spawn.unwrap_or(CODE_FLOOR);
            for dir in Direction::ALL {
                if cell.open[dir.index()] {
                    let (dx, dy) = dir.offset();
                    let ex = (x as isize + dx) as usize;
                    let ey = (y as isize + dy) as usize;
                    rows[ey][ex] = CODE_FLOOR;
                }
            }
        }
    }
    MapLayout::from_rows(rows)
}

/// Map source producing a fresh maze on every fetch.
#[derive(Debug)]
pub struct MazeGenerator<R> {
    config: MazeConfig,
    rng: R,
}

impl<R: Rng> MazeGenerator<R> {
    /// Creates a generator drawing from `rng`.
    pub fn new(config: MazeConfig, rng: R) -> Self {
        MazeGenerator { config, rng }
    }

    /// Generates the next maze.
    pub fn next_layout(&mut self) -> Result<MapLayout, MapError> {
        generate(&self.config, &mut self.rng)
    }
}
