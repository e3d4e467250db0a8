//! Occupancy grid and the builder that rasterizes the tile window into it.

pub mod builder;

use serde::{Deserialize, Serialize};

use crate::constants::{CELL_BOUNDARY, CELL_EMPTY};

pub use builder::World;

/// Square grid of cell ids. 0 is passable, anything else blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldGrid {
    size: i32,
    cells: Vec<u32>,
}

impl WorldGrid {
    /// Empty grid of `size` x `size` cells with its outer ring stamped as boundary
    pub fn new(size: i32) -> Self {
        let size = size.max(3);
        let mut grid = Self {
            size,
            cells: vec![CELL_EMPTY; (size * size) as usize],
        };
        grid.reset();
        grid
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Clear every cell and stamp the outer boundary
    pub fn reset(&mut self) {
        self.cells.fill(CELL_EMPTY);
        let last = self.size - 1;
        for i in 0..self.size {
            self.set(i, 0, CELL_BOUNDARY);
            self.set(i, last, CELL_BOUNDARY);
            self.set(0, i, CELL_BOUNDARY);
            self.set(last, i, CELL_BOUNDARY);
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.size && y < self.size
    }

    /// Cell id; anything outside the grid reads as boundary
    pub fn get(&self, x: i32, y: i32) -> u32 {
        if self.in_bounds(x, y) {
            self.cells[(y * self.size + x) as usize]
        } else {
            CELL_BOUNDARY
        }
    }

    /// Write a cell; writes outside the grid are ignored
    pub fn set(&mut self, x: i32, y: i32, id: u32) {
        if self.in_bounds(x, y) {
            self.cells[(y * self.size + x) as usize] = id;
        }
    }

    /// Whether the cell under a continuous position can be occupied
    pub fn is_passable(&self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.get(x.floor() as i32, y.floor() as i32) == CELL_EMPTY
    }

    /// Row-major view of the raw cells
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}
