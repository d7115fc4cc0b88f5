//! Parallel solve scheduling with deterministic output ordering.
//!
//! A scheduler stamps each request with a serial number, fans the batch out
//! across a rayon pool, and returns results sorted back into request order.
//! A faulty request (revoked card, uneven hands, expired deadline) yields an
//! `Err` in its own slot without disturbing the rest of the batch.

use std::time::Duration;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use dds_core::{Deal, Seat, Strain};
use dds_solver::{PartialTrick, SolveError, SolveOutcome, Solver};

use crate::table::TrickTable;

/// One position to solve: a deal with the strain and opening leader fixed.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub deal: Deal,
    pub strain: Strain,
    pub leader: Seat,
    /// Per-request time budget. `None` solves to completion.
    pub deadline: Option<Duration>,
}

impl SolveRequest {
    pub fn new(deal: Deal, strain: Strain, leader: Seat) -> Self {
        Self {
            deal,
            strain,
            leader,
            deadline: None,
        }
    }
}

/// A finished request, tagged with its serial number for ordering.
pub struct CompletedSolve {
    pub serial_number: u64,
    pub request: SolveRequest,
    pub outcome: Result<SolveOutcome, SolveError>,
}

/// Configuration for parallel execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleConfig {
    /// Number of worker threads (0 = auto-detect)
    pub num_threads: usize,
}

impl ScheduleConfig {
    /// Get the actual number of threads to use.
    pub fn actual_threads(&self) -> usize {
        if self.num_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.num_threads
        }
    }
}

/// Dispatches solve requests to worker threads.
///
/// Each request gets its own caches, so workers never contend and the
/// answer for a given request does not depend on batch placement.
pub struct Scheduler {
    solver: Solver,
    next_serial: u64,
}

impl Scheduler {
    pub fn new(solver: Solver, config: ScheduleConfig) -> Self {
        if config.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .build_global()
                .ok(); // pool may already be initialized
        }

        Self {
            solver,
            next_serial: 0,
        }
    }

    /// Solve a batch of requests in parallel.
    ///
    /// Results come back sorted by serial number, so slot `i` of the output
    /// always answers request `i` of the input.
    pub fn solve_batch(&mut self, requests: Vec<SolveRequest>) -> Vec<CompletedSolve> {
        let solver = self.solver;
        let first_serial = self.next_serial;
        self.next_serial += requests.len() as u64;

        let mut results: Vec<CompletedSolve> = requests
            .into_par_iter()
            .enumerate()
            .map(|(offset, request)| {
                let outcome = solver.solve_position(
                    &request.deal,
                    request.strain,
                    request.leader,
                    &PartialTrick::new(),
                    request.deadline,
                );

                CompletedSolve {
                    serial_number: first_serial + offset as u64,
                    request,
                    outcome,
                }
            })
            .collect();

        results.sort_by_key(|w| w.serial_number);

        results
    }

    /// Solve all twenty strain/leader cells of one deal.
    ///
    /// The cells run as independent work units; the first failing cell in
    /// strain-major order aborts the table. A per-cell `deadline` applies
    /// to each cell separately, not to the table as a whole.
    pub fn solve_table(
        &mut self,
        deal: &Deal,
        deadline: Option<Duration>,
    ) -> Result<TrickTable, SolveError> {
        let requests = Strain::ALL
            .into_iter()
            .flat_map(|strain| {
                Seat::ALL.into_iter().map(move |leader| SolveRequest {
                    deal: *deal,
                    strain,
                    leader,
                    deadline,
                })
            })
            .collect();

        let mut table = TrickTable::new();
        for completed in self.solve_batch(requests) {
            let outcome = completed.outcome?;
            table.set(
                completed.request.strain,
                completed.request.leader,
                outcome.tricks,
            );
        }

        Ok(table)
    }

    /// Number of requests dispatched so far.
    pub fn dispatched_count(&self) -> u64 {
        self.next_serial
    }
}

/// Result collector that buffers out-of-order results and yields them in order.
///
/// Used for streaming output where results should be printed as soon as
/// possible while maintaining serial order.
pub struct OrderedSolveCollector {
    next_output_serial: u64,
    buffer: FxHashMap<u64, CompletedSolve>,
}

impl OrderedSolveCollector {
    pub fn new() -> Self {
        Self {
            next_output_serial: 0,
            buffer: FxHashMap::default(),
        }
    }

    /// Add a completed solve.
    ///
    /// Returns an iterator of results that can now be output in order.
    pub fn add(&mut self, work: CompletedSolve) -> impl Iterator<Item = CompletedSolve> + '_ {
        self.buffer.insert(work.serial_number, work);

        std::iter::from_fn(move || {
            if let Some(result) = self.buffer.remove(&self.next_output_serial) {
                self.next_output_serial += 1;
                Some(result)
            } else {
                None
            }
        })
    }

    /// Check if there are buffered results waiting.
    pub fn has_buffered(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Get the next expected serial number.
    pub fn next_expected(&self) -> u64 {
        self.next_output_serial
    }
}

impl Default for OrderedSolveCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDGAMES: &[&str] = &[
        "N:A93.K.. KT2.A.. Q64.9.. J85.J..",
        "N:AQ.84.. 92.AJ.. KJT.7.. 876.K..",
        "N:K2.9.A. T9.A.K. A8.K.Q. QJ.2.J.",
        "N:AK2... .432.. QJ3... ..432.",
    ];

    fn endgame(notation: &str) -> Deal {
        Deal::from_notation(notation).unwrap()
    }

    #[test]
    fn test_schedule_config_defaults() {
        let config = ScheduleConfig::default();
        assert!(config.actual_threads() >= 1);
        assert_eq!(
            ScheduleConfig { num_threads: 3 }.actual_threads(),
            3
        );
    }

    #[test]
    fn test_batch_results_align_with_requests() {
        dds_core::initialize();
        let requests: Vec<SolveRequest> = ENDGAMES
            .iter()
            .flat_map(|&n| {
                [
                    SolveRequest::new(endgame(n), Strain::NoTrump, Seat::North),
                    SolveRequest::new(endgame(n), Strain::Spades, Seat::East),
                ]
            })
            .collect();
        let expected: Vec<u8> = requests
            .iter()
            .map(|r| {
                Solver::new()
                    .solve_position(&r.deal, r.strain, r.leader, &PartialTrick::new(), None)
                    .unwrap()
                    .tricks
            })
            .collect();

        let mut scheduler =
            Scheduler::new(Solver::new(), ScheduleConfig { num_threads: 2 });
        let results = scheduler.solve_batch(requests);

        assert_eq!(results.len(), expected.len());
        for (i, completed) in results.iter().enumerate() {
            assert_eq!(completed.serial_number, i as u64);
            assert_eq!(completed.outcome.as_ref().unwrap().tricks, expected[i]);
        }
        assert_eq!(scheduler.dispatched_count(), expected.len() as u64);
    }

    #[test]
    fn test_serials_continue_across_batches() {
        dds_core::initialize();
        let mut scheduler = Scheduler::new(Solver::new(), ScheduleConfig::default());
        let batch = || vec![SolveRequest::new(endgame(ENDGAMES[3]), Strain::Spades, Seat::North)];

        let first = scheduler.solve_batch(batch());
        let second = scheduler.solve_batch(batch());
        assert_eq!(first[0].serial_number, 0);
        assert_eq!(second[0].serial_number, 1);
        assert_eq!(scheduler.dispatched_count(), 2);
    }

    #[test]
    fn test_faulty_request_is_isolated() {
        dds_core::initialize();
        // Middle request has uneven hand sizes; its neighbors must still solve.
        let mut lopsided = endgame(ENDGAMES[0]);
        let spare = lopsided.hand(Seat::North).cards().next().unwrap();
        lopsided.hand_mut(Seat::North).remove(spare);

        let requests = vec![
            SolveRequest::new(endgame(ENDGAMES[0]), Strain::NoTrump, Seat::North),
            SolveRequest::new(lopsided, Strain::NoTrump, Seat::North),
            SolveRequest::new(endgame(ENDGAMES[1]), Strain::NoTrump, Seat::North),
        ];

        let mut scheduler = Scheduler::new(Solver::new(), ScheduleConfig::default());
        let results = scheduler.solve_batch(requests);

        assert!(results[0].outcome.is_ok());
        assert!(matches!(
            results[1].outcome,
            Err(SolveError::Position(_))
        ));
        assert!(results[2].outcome.is_ok());
    }

    #[test]
    fn test_table_matches_single_cell_solves() {
        dds_core::initialize();
        let deal = endgame(ENDGAMES[2]);
        let mut scheduler =
            Scheduler::new(Solver::new(), ScheduleConfig { num_threads: 2 });
        let table = scheduler.solve_table(&deal, None).unwrap();

        let solver = Solver::new();
        for (strain, leader, tricks) in table.iter() {
            let single = solver
                .solve_position(&deal, strain, leader, &PartialTrick::new(), None)
                .unwrap();
            assert_eq!(tricks, single.tricks, "{}/{} cell", strain.to_char(), leader.to_char());
        }
    }

    #[test]
    fn test_table_propagates_cell_failure() {
        dds_core::initialize();
        let deal = endgame(ENDGAMES[2]);
        let mut scheduler = Scheduler::new(Solver::new(), ScheduleConfig::default());
        let result = scheduler.solve_table(&deal, Some(Duration::ZERO));
        assert!(matches!(result, Err(SolveError::Timeout)));
    }

    #[test]
    fn test_ordered_solve_collector() {
        let completed = |serial| CompletedSolve {
            serial_number: serial,
            request: SolveRequest::new(endgame(ENDGAMES[3]), Strain::NoTrump, Seat::North),
            outcome: Err(SolveError::Timeout),
        };
        let mut collector = OrderedSolveCollector::new();

        // Add serial 2 first - nothing should be yielded
        let yielded: Vec<_> = collector.add(completed(2)).collect();
        assert!(yielded.is_empty());
        assert!(collector.has_buffered());
        assert_eq!(collector.next_expected(), 0);

        // Add serial 0 - should yield just it
        let yielded: Vec<_> = collector.add(completed(0)).collect();
        assert_eq!(yielded.len(), 1);
        assert_eq!(yielded[0].serial_number, 0);

        // Add serial 1 - should yield 1 and 2
        let yielded: Vec<_> = collector.add(completed(1)).collect();
        assert_eq!(yielded.len(), 2);
        assert_eq!(yielded[0].serial_number, 1);
        assert_eq!(yielded[1].serial_number, 2);

        assert!(!collector.has_buffered());
        assert_eq!(collector.next_expected(), 3);
    }
}
