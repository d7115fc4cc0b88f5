//! Double-dummy solver engine.
//!
//! The algorithm is alpha-beta search driven by an MTD(f) loop of
//! null-window probes, backed by:
//! - a pattern-keyed transposition cache over relative-rank fingerprints
//! - a cutoff-card memo feeding move ordering
//! - equivalence collapsing and relevant-rank skipping in move generation
//! - fast/slow trick bounds pruning whole subtrees at trick starts
//!
//! The public API speaks `dds_core` types; the bit-packed engine state is
//! private to this crate.
//!
//! # Example
//!
//! ```
//! use dds_core::{Deal, Seat, Strain};
//! use dds_solver::{PartialTrick, Solver};
//!
//! dds_core::initialize();
//!
//! // a one-trick endgame: North's ace wins no matter what
//! let deal = Deal::from_notation("N:A... K... Q... J...").unwrap();
//! let solver = Solver::new();
//! let outcome = solver
//!     .solve_position(&deal, Strain::NoTrump, Seat::North, &PartialTrick::new(), None)
//!     .unwrap();
//! assert_eq!(outcome.tricks, 1);
//! ```

mod board;
mod cache;
mod cards;
mod moves;
mod pattern;
mod prune;
mod search;
mod solver;
mod trick;

pub use solver::{
    PartialTrick, PlayedCard, PositionError, SolveError, SolveOutcome, SolveStats, Solver,
    SolverConfig,
};
