//! merge-2048: a deterministic tile-merging puzzle engine + expectimax solver
//!
//! This crate provides:
//! - A `Board` type over an N×N grid with ergonomic methods (`slide`,
//!   `is_valid_move`, `add_random_tile`, `score`, ...)
//! - A recorded move variant (`slide_recorded`) that produces a per-tile
//!   provenance trace for animation
//! - An expectimax `Solver` with an adaptive depth heuristic and a bounded
//!   transposition cache
//!
//! Randomness is always injected: pass any `rand::Rng` where a tile spawn can
//! happen, and seed it for reproducible games.
//!
//! Quick start:
//! ```
//! use merge_2048::engine::Board;
//! use merge_2048::solver::Solver;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board setup with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut board = Board::new(4, &mut rng);
//! assert_eq!(board.count_tiles(), 2);
//!
//! // Ask the solver for a move, apply it, then spawn
//! let mut solver = Solver::new(2);
//! let dir = solver.best_move(&board);
//! if board.is_valid_move(dir) {
//!     board.slide(dir);
//!     board.add_random_tile(&mut rng);
//! }
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use merge_2048::engine::Board;
//! use merge_2048::solver::Solver;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let mut board = Board::new(4, &mut rng);
//! let mut solver = Solver::new(1);
//! let mut moves = 0u32;
//!
//! // Keep doctests fast: a handful of moves is enough to demonstrate flow.
//! while !board.is_over() && moves < 4 {
//!     let dir = solver.best_move(&board);
//!     if !board.is_valid_move(dir) {
//!         break;
//!     }
//!     // Recorded variant populates the provenance trace for animation.
//!     board.slide_recorded(dir);
//!     board.add_random_tile(&mut rng);
//!     moves += 1;
//! }
//! assert!(moves > 0);
//! ```
pub mod engine;
pub mod solver;
