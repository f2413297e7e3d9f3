use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Cardinal directions, clockwise from north.
///
/// North is towards row 0, matching screen coordinates where `y` grows
/// downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in scan order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction at `index` in [`Direction::ALL`], wrapping modulo 4.
    pub fn from_index(index: usize) -> Direction {
        Self::ALL[index % 4]
    }

    /// Position in [`Direction::ALL`].
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Unit step `(dcol, drow)` for this direction.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Signed indices of the neighbouring cell. May be out of bounds.
    pub fn adjacent(self, col: isize, row: isize) -> (isize, isize) {
        let (dc, dr) = self.offset();
        (col.saturating_add(dc), row.saturating_add(dr))
    }

    /// Direction after a 90 degree counter-clockwise turn.
    pub fn left(self) -> Direction {
        Self::from_index(self.index() + 3)
    }

    /// Direction after a 90 degree clockwise turn.
    pub fn right(self) -> Direction {
        Self::from_index(self.index() + 1)
    }

    /// Opposite direction.
    pub fn back(self) -> Direction {
        Self::from_index(self.index() + 2)
    }

    /// Direction of the dominant axis of `v`, or `None` for the zero vector.
    ///
    /// Ties go to the horizontal axis.
    pub fn from_vector(v: DVec2) -> Option<Direction> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }
        if v.x.abs() >= v.y.abs() {
            Some(if v.x > 0.0 {
                Direction::East
            } else {
                Direction::West
            })
        } else {
            Some(if v.y > 0.0 {
                Direction::South
            } else {
                Direction::North
            })
        }
    }
}
