use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::TileCoord;

/// Errors raised when building a grid from flat cell data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Grid dimensions ({width}, {height}) do not match {cells} cells")]
    SizeMismatch {
        width: usize,
        height: usize,
        cells: usize,
    },
}

/// A generic 2D grid addressed by `(col, row)`.
///
/// Cells are stored in a flat vector in row-major order. Lookups with signed
/// indices are provided because sight scans and neighbour searches step off
/// the edge of the map; those lookups return `None` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid filled by a generator function.
    ///
    /// The generator function `f` takes a cell coordinate and returns the
    /// value for that cell. Cells are generated row by row.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(TileCoord) -> T,
    {
        let mut cells = Vec::with_capacity(width.saturating_mul(height));
        for row in 0..height {
            for col in 0..width {
                cells.push(f(TileCoord::new(col, row)));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Wraps an already flattened, row-major cell vector.
    pub fn from_cells(width: usize, height: usize, cells: Vec<T>) -> Result<Self, GridError> {
        if width.checked_mul(height) != Some(cells.len()) {
            return Err(GridError::SizeMismatch {
                width,
                height,
                cells: cells.len(),
            });
        }
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts a coordinate to a flat vector index.
    ///
    /// Returns `None` if the coordinate is out of bounds.
    #[inline]
    fn coords_to_index(&self, col: usize, row: usize) -> Option<usize> {
        if self.is_valid(col, row) {
            Some(row * self.width + col)
        } else {
            None
        }
    }

    #[inline]
    fn index_to_coord(width: usize, index: usize) -> TileCoord {
        TileCoord::new(index % width, index / width)
    }

    /// Checks if the given cell is within the grid boundaries.
    ///
    /// Both axes use a strict `<` against the dimension.
    #[inline]
    pub fn is_valid(&self, col: usize, row: usize) -> bool {
        col < self.width && row < self.height
    }

    /// Converts signed indices into a coordinate, rejecting negative and
    /// overflowing values.
    pub fn checked_coord(&self, col: isize, row: isize) -> Option<TileCoord> {
        let col = usize::try_from(col).ok()?;
        let row = usize::try_from(row).ok()?;
        self.is_valid(col, row).then_some(TileCoord::new(col, row))
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, col: usize, row: usize) -> Option<&T> {
        let index = self.coords_to_index(col, row)?;
        self.cells.get(index)
    }

    /// Same as [`Grid::get`] but accepts signed indices.
    pub fn get_signed(&self, col: isize, row: isize) -> Option<&T> {
        let coord = self.checked_coord(col, row)?;
        self.get(coord.col, coord.row)
    }

    /// Returns an iterator over the cells of the grid in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Returns an iterator that yields `(TileCoord, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (TileCoord, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Self::index_to_coord(width, index), cell))
    }
}

/// Indexing with a `TileCoord`.
///
/// Panics when the coordinate is out of bounds; use [`Grid::get`] for
/// fallible access.
impl<T> Index<TileCoord> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, coord: TileCoord) -> &Self::Output {
        match self.coords_to_index(coord.col, coord.row) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                coord.col, coord.row, self.width, self.height
            ),
        }
    }
}
