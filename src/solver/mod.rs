//! Expectimax solver for the 2048 engine.
//!
//! The solver wraps a depth-bounded expectimax search over the random
//! tile-spawn process (2 with weight 9, 4 with weight 1) with a bounded,
//! FIFO-windowed transposition cache. It never mutates the caller's board;
//! all simulation happens on private copies.
//!
//! Quick start
//! ```
//! use merge_2048::engine::Board;
//! use merge_2048::solver::Solver;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let board = Board::new(4, &mut rng);
//! // Depth 0 selects automatic depth from board complexity.
//! let mut solver = Solver::new(0);
//! let dir = solver.best_move(&board);
//! assert!(board.is_valid_move(dir));
//! ```

mod heuristic;
mod search;

pub use search::Solver;

/// When a cached search result may substitute for a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Reuse an entry computed at the required depth or deeper (default).
    /// Strictly more cache-efficient; affects search time, never legality.
    AtLeast,
    /// Reuse an entry only if it was computed at exactly the required depth,
    /// making repeated searches bit-for-bit reproducible.
    Exact,
}

/// Configurable knobs for the solver. Defaults preserve original behavior.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Search depth. Positive = fixed depth; zero or negative = automatic
    /// depth from board complexity plus `|depth|` bonus levels.
    pub depth: i32,
    /// Cache reuse rule, see [`CacheMode`].
    pub cache_mode: CacheMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            cache_mode: CacheMode::AtLeast,
        }
    }
}

/// Bench-only: expose the raw heuristic value for a board.
///
/// Enabled only with the `bench-internal` feature to keep the public API small.
#[cfg(feature = "bench-internal")]
#[inline]
pub fn heuristic_value(board: &crate::engine::Board) -> u64 {
    heuristic::evaluate(board)
}
