//! Board layout derived from the viewport size

use super::state::Position;

/// Viewports narrower than this use the narrow layout
pub const NARROW_MAX_WIDTH: f64 = 430.0;
/// Viewports narrower than this (and not narrow) use the medium layout
pub const MEDIUM_MAX_WIDTH: f64 = 768.0;

const NARROW_GRID: (usize, usize) = (12, 16);
const MEDIUM_GRID: (usize, usize) = (20, 18);
const WIDE_GRID: (usize, usize) = (30, 24);

/// The rectangular grid the snake moves on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub cols: usize,
    pub rows: usize,
    /// Side of one square cell, in pixels
    pub cell_size: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(WIDE_GRID.0, WIDE_GRID.1, 24)
    }
}

impl Board {
    pub fn new(cols: usize, rows: usize, cell_size: u32) -> Self {
        Self {
            cols,
            rows,
            cell_size,
        }
    }

    /// Pick the grid for a viewport and fit square cells into it
    pub fn for_viewport(width: f64, height: f64) -> Self {
        let (cols, rows) = if width < NARROW_MAX_WIDTH {
            NARROW_GRID
        } else if width < MEDIUM_MAX_WIDTH {
            MEDIUM_GRID
        } else {
            WIDE_GRID
        };

        let fit = (width / cols as f64).min(height / rows as f64).floor();
        let cell_size = if fit.is_finite() && fit > 0.0 {
            fit as u32
        } else {
            0
        };

        Self::new(cols, rows, cell_size)
    }

    /// Center cell, rounded toward the top-left
    pub fn center(&self) -> Position {
        Position::new((self.cols / 2) as i32, (self.rows / 2) as i32)
    }

    /// Check if a position is within the grid bounds
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.cols as i32 && pos.y >= 0 && pos.y < self.rows as i32
    }

    /// Every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |y| {
            (0..self.cols).map(move |x| Position::new(x as i32, y as i32))
        })
    }
}
