//! Randomized board generation with a connectivity proof.
//!
//! Unguarded randomization can wall a spawn corner off from the rest of the
//! arena, which makes the match unplayable for that seat. Every attempt is
//! therefore checked with a breadth-first flood fill from the top-left
//! spawn; only boards where the fill reaches all four spawn cells are
//! accepted. After [`GeneratorConfig::max_attempts`] failures a single
//! reduced-probability pass runs without the check, which bounds worst-case
//! latency at the cost of a possibly degenerate maze.

use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, warn};

use crate::{Board, Cell};

/// Smallest grid that still has room for four protected spawn zones.
const MIN_DIMENSION: usize = 7;

/// Tuning knobs for [`generate`]. Defaults match the shipped arena.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Grid height.
    pub rows: usize,
    /// Grid width.
    pub cols: usize,
    /// Per-cell probability of converting open path to destructible wall.
    pub fill_probability: f64,
    /// Conversion probability for the unchecked fallback pass.
    pub fallback_probability: f64,
    /// Randomize-and-check attempts before falling back.
    pub max_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            cols: 30,
            fill_probability: 0.65,
            fallback_probability: 0.30,
            max_attempts: 10,
        }
    }
}

impl GeneratorConfig {
    /// Clamps out-of-range values so generation cannot fail.
    pub fn validated(mut self) -> Self {
        if self.rows < MIN_DIMENSION || self.cols < MIN_DIMENSION {
            warn!(
                rows = self.rows,
                cols = self.cols,
                min = MIN_DIMENSION,
                "board dimensions below minimum, clamping"
            );
            self.rows = self.rows.max(MIN_DIMENSION);
            self.cols = self.cols.max(MIN_DIMENSION);
        }
        self.fill_probability = self.fill_probability.clamp(0.0, 1.0);
        self.fallback_probability = self.fallback_probability.clamp(0.0, 1.0);
        if self.max_attempts == 0 {
            self.max_attempts = 1;
        }
        self
    }
}

/// Produces a playable board. Never fails: retries with connectivity
/// checks, then falls back to a sparse unchecked pass.
pub fn generate(config: &GeneratorConfig, rng: &mut impl Rng) -> Board {
    let config = config.clone().validated();

    for attempt in 0..config.max_attempts {
        let mut board = Board::template(config.rows, config.cols);
        scatter(&mut board, config.fill_probability, rng);
        if all_spawns_connected(&board) {
            debug!(attempt, "board accepted");
            return board;
        }
    }

    // Every attempt isolated a spawn. A sparser fill is very likely
    // connected, and an occasional degenerate maze beats not starting.
    warn!(
        attempts = config.max_attempts,
        "connectivity never satisfied, using fallback board"
    );
    let mut board = Board::template(config.rows, config.cols);
    scatter(&mut board, config.fallback_probability, rng);
    board
}

/// Independently converts each eligible interior path cell to destructible
/// wall with probability `p`. Protected spawn zones are skipped.
fn scatter(board: &mut Board, p: f64, rng: &mut impl Rng) {
    for y in 1..(board.rows() as i32 - 1) {
        for x in 1..(board.cols() as i32 - 1) {
            if board.is_path(x, y)
                && !board.in_protected_zone(x, y)
                && rng.random_bool(p)
            {
                board.set(x, y, Cell::Destructible);
            }
        }
    }
}

/// Breadth-first flood fill from the top-left spawn over path cells only.
/// Returns whether every spawn cell is a path cell reached by the fill.
pub fn all_spawns_connected(board: &Board) -> bool {
    let spawns = board.spawn_cells();
    let (sx, sy) = spawns[0];
    if !board.is_path(sx, sy) {
        return false;
    }

    let mut visited = vec![false; board.rows() * board.cols()];
    let idx = |x: i32, y: i32| y as usize * board.cols() + x as usize;
    let mut queue = VecDeque::from([(sx, sy)]);
    visited[idx(sx, sy)] = true;

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
            let (nx, ny) = (x + dx, y + dy);
            if board.is_path(nx, ny) && !visited[idx(nx, ny)] {
                visited[idx(nx, ny)] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    spawns
        .iter()
        .all(|&(x, y)| board.is_path(x, y) && visited[idx(x, y)])
}
