//! Parallel batch front end for the double-dummy solver.
//!
//! Wraps [`dds_solver::Solver`] with a rayon-backed scheduler: hand it a
//! batch of independent positions (or one deal to expand into the full
//! 5x4 strain/leader table) and get results back in request order, with
//! per-request fault isolation.

mod schedule;
mod table;

pub use schedule::{
    CompletedSolve, OrderedSolveCollector, ScheduleConfig, Scheduler, SolveRequest,
};
pub use table::TrickTable;
