//! Arena grid for Blastarena.
//!
//! A [`Board`] is a fixed-size rectangular grid of [`Cell`]s. The border is
//! permanent wall, the interior carries permanent pillars on even/even
//! coordinates off the spawn ring, and everything else starts as open
//! path. The generator
//! ([`generate`]) converts part of the open interior into destructible walls
//! while proving (by flood fill) that all four spawn corners stay connected.
//!
//! Coordinates are `(x, y)` with `x` as the column and `y` as the row,
//! which is also how positions appear on the wire.

mod generator;

pub use generator::{GeneratorConfig, all_spawns_connected, generate};

use serde::{Deserialize, Serialize};

/// One grid cell.
///
/// Serialized as the single-letter codes the display client renders
/// (`"w"` wall, `"t"` destructible, `"p"` path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// Permanent wall. Blocks movement and blast rays; never changes.
    #[serde(rename = "w")]
    Wall,
    /// Destructible wall. Blocks movement; converts to [`Cell::Path`]
    /// when caught in a blast.
    #[serde(rename = "t")]
    Destructible,
    /// Open path. Walkable; carries bombs and power-ups.
    #[serde(rename = "p")]
    Path,
}

/// The playing field: `rows` × `cols` cells in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Builds the deterministic template: wall border, permanent pillars
    /// wherever both coordinates are even, open path elsewhere. The ring
    /// of cells next to the border never gets a pillar, so the spawn
    /// corners stay open whatever the grid parity. On an even dimension
    /// `cols - 2` / `rows - 2` land on even coordinates and would
    /// otherwise wall a spawn in.
    pub fn template(rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for y in 0..rows {
            for x in 0..cols {
                let border =
                    x == 0 || y == 0 || x == cols - 1 || y == rows - 1;
                let ring =
                    x == 1 || y == 1 || x == cols - 2 || y == rows - 2;
                let pillar = x % 2 == 0 && y % 2 == 0 && !ring;
                cells.push(if border || pillar {
                    Cell::Wall
                } else {
                    Cell::Path
                });
            }
        }
        Self { rows, cols, cells }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether `(x, y)` lies on the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }

    /// The cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if self.in_bounds(x, y) {
            Some(self.cells[y as usize * self.cols + x as usize])
        } else {
            None
        }
    }

    /// Overwrites the cell at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.cols + x as usize] = cell;
        }
    }

    /// Whether `(x, y)` is an open path cell.
    pub fn is_path(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(Cell::Path)
    }

    /// The four spawn cells, inset one cell from each corner, in the
    /// fixed seat order: top-left, top-right, bottom-left, bottom-right.
    pub fn spawn_cells(&self) -> [(i32, i32); 4] {
        let right = (self.cols - 2) as i32;
        let bottom = (self.rows - 2) as i32;
        [(1, 1), (right, 1), (1, bottom), (right, bottom)]
    }

    /// Whether `(x, y)` lies inside one of the four protected 3×3 spawn
    /// zones, which never receive destructible walls.
    pub fn in_protected_zone(&self, x: i32, y: i32) -> bool {
        let near = |v: i32, edge: usize| {
            (1..=3).contains(&v) || ((edge as i32 - 4)..=(edge as i32 - 2)).contains(&v)
        };
        near(x, self.cols) && near(y, self.rows)
    }
}
