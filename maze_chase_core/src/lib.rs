use serde::{Deserialize, Serialize};

pub mod collision;
pub mod config;
pub mod direction;
pub mod dungeon;
pub mod game;
pub mod map;
pub mod maze;
pub mod monster;
pub mod motion;
pub mod session;

/// Integer coordinates of one dungeon cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub col: usize,
    pub row: usize,
}

impl TileCoord {
    /// Creates a coordinate from column and row.
    pub const fn new(col: usize, row: usize) -> Self {
        TileCoord { col, row }
    }

    /// Signed form, used when stepping towards the map edge.
    pub fn signed(self) -> (isize, isize) {
        (self.col as isize, self.row as isize)
    }
}
