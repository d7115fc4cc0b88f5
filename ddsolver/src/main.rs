use clap::Parser;
use dds_batch::{ScheduleConfig, Scheduler, SolveRequest};
use dds_core::{Deal, Seat, Strain};
use dds_solver::{SolveError, SolveStats, Solver};
use std::io::{self, BufRead};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "ddsolver")]
#[command(about = "Double-dummy solver for bridge deals", long_about = None)]
struct Args {
    /// Trump strain (C, D, H, S, N); omit to solve all five
    #[arg(short = 't', long = "strain")]
    strain: Option<char>,

    /// Opening leader (N, E, S, W); omit to solve all four
    #[arg(short = 'l', long = "leader")]
    leader: Option<char>,

    /// Worker threads (0 = auto-detect)
    #[arg(short = 'j', long = "threads", default_value = "0")]
    threads: usize,

    /// Time budget per solve in milliseconds
    #[arg(long = "deadline-ms")]
    deadline_ms: Option<u64>,

    /// Print one optimal play sequence (needs --strain and --leader)
    #[arg(long = "line")]
    line: bool,

    /// Print search statistics to stderr
    #[arg(long = "stats")]
    stats: bool,

    /// Deals in hand notation; read from stdin when none are given
    deals: Vec<String>,
}

fn main() {
    let args = Args::parse();

    dds_core::initialize();

    let strain = args.strain.map(|c| match Strain::from_char(c) {
        Some(strain) => strain,
        None => {
            eprintln!("Invalid strain: {} (expected one of C D H S N)", c);
            std::process::exit(1);
        }
    });
    let leader = args.leader.map(|c| match Seat::from_char(c) {
        Some(seat) => seat,
        None => {
            eprintln!("Invalid leader: {} (expected one of N E S W)", c);
            std::process::exit(1);
        }
    });

    if args.line && (strain.is_none() || leader.is_none()) {
        eprintln!("--line needs both --strain and --leader");
        std::process::exit(1);
    }

    let lines: Vec<String> = if args.deals.is_empty() {
        match read_stdin_lines() {
            Ok(lines) => lines,
            Err(e) => {
                eprintln!("Failed to read deals from stdin: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        args.deals.clone()
    };

    let mut deals = Vec::with_capacity(lines.len());
    for line in &lines {
        match Deal::from_notation(line) {
            Ok(deal) => deals.push(deal),
            Err(e) => {
                eprintln!("Bad deal {:?}: {}", line, e);
                std::process::exit(1);
            }
        }
    }

    let deadline = args.deadline_ms.map(Duration::from_millis);
    let solver = Solver::new();
    let mut scheduler = Scheduler::new(
        solver,
        ScheduleConfig {
            num_threads: args.threads,
        },
    );

    let started = Instant::now();
    let mut stats = SolveStats::default();
    let mut solved = 0u64;
    let mut failed = false;

    if args.line {
        // --line is validated to carry both selectors above
        let (strain, leader) = (strain.unwrap(), leader.unwrap());
        for deal in &deals {
            match solver.best_line(deal, strain, leader, deadline) {
                Ok((outcome, plays)) => {
                    let line: Vec<String> = plays.iter().map(|p| p.to_string()).collect();
                    println!(
                        "{} {}/{} {} {}",
                        deal.to_notation(Seat::North),
                        strain.to_char(),
                        leader.to_char(),
                        outcome.tricks,
                        line.join(" ")
                    );
                    stats.merge(&outcome.stats);
                    solved += 1;
                }
                Err(e) => {
                    println!("{} {}", deal.to_notation(Seat::North), report_error(&e));
                    failed |= !matches!(e, SolveError::Timeout);
                }
            }
        }
    } else if strain.is_none() && leader.is_none() {
        for deal in &deals {
            match scheduler.solve_table(deal, deadline) {
                Ok(table) => {
                    println!("{}", deal.to_notation(Seat::North));
                    print!("{}", table);
                    solved += 20;
                }
                Err(e) => {
                    println!("{} {}", deal.to_notation(Seat::North), report_error(&e));
                    failed |= !matches!(e, SolveError::Timeout);
                }
            }
        }
    } else {
        let strains: Vec<Strain> = match strain {
            Some(s) => vec![s],
            None => Strain::ALL.to_vec(),
        };
        let leaders: Vec<Seat> = match leader {
            Some(l) => vec![l],
            None => Seat::ALL.to_vec(),
        };

        let mut requests = Vec::with_capacity(deals.len() * strains.len() * leaders.len());
        for deal in &deals {
            for &strain in &strains {
                for &leader in &leaders {
                    requests.push(SolveRequest {
                        deal: *deal,
                        strain,
                        leader,
                        deadline,
                    });
                }
            }
        }

        for completed in scheduler.solve_batch(requests) {
            let cell = cell_label(
                &completed.request.deal,
                completed.request.strain,
                completed.request.leader,
            );
            match completed.outcome {
                Ok(outcome) => {
                    println!("{} {}", cell, outcome.tricks);
                    stats.merge(&outcome.stats);
                    solved += 1;
                }
                Err(e) => {
                    println!("{} {}", cell, report_error(&e));
                    failed |= !matches!(e, SolveError::Timeout);
                }
            }
        }
    }

    if args.stats {
        let elapsed = started.elapsed();
        eprintln!("Solved {} cells in {:.3}s", solved, elapsed.as_secs_f64());
        eprintln!(
            "Nodes {} probes {} pattern hits {} cutoff hits {}",
            stats.nodes, stats.probes, stats.pattern_hits, stats.cutoff_hits
        );
    }

    if failed {
        std::process::exit(1);
    }
}

fn read_stdin_lines() -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

fn cell_label(deal: &Deal, strain: Strain, leader: Seat) -> String {
    format!(
        "{} {}/{}",
        deal.to_notation(Seat::North),
        strain.to_char(),
        leader.to_char()
    )
}

fn report_error(e: &SolveError) -> String {
    match e {
        SolveError::Timeout => "timeout".to_string(),
        other => format!("error: {}", other),
    }
}
