//! Public solve entry points.
//!
//! `Solver` validates a position at the boundary, runs the MTD(f) driver
//! over null-window probes, and reports tricks for the side on lead. The
//! engine works in North-South terms internally; the conversion happens
//! here and nowhere else.

use std::fmt;
use std::time::{Duration, Instant};

use dds_core::{Card, Deal, DealError, NotationError, Seat, Strain};

use crate::board::Hands;
use crate::cache::CutoffCache;
use crate::cards::{pack, suit_of, unpack};
use crate::moves::{order_follows, order_leads, OrderedPlays};
use crate::pattern::PatternCache;
use crate::search::{Search, SearchCounters};
use crate::trick::{playable_cards, wins_over};

/// Engine knobs. The three toggles are result-transparent; they exist for
/// debugging and for measuring what each layer buys.
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    /// Fast/slow trick bounds at trick starts
    pub pruning: bool,
    /// Pattern cache and cutoff-card memo
    pub transposition: bool,
    /// Skip sibling cards below every rank that mattered
    pub rank_skip: bool,
    /// log2 of the cutoff memo's initial slot count
    pub cutoff_cache_bits: u32,
    /// log2 of the pattern cache's slot count
    pub pattern_cache_bits: u32,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            pruning: true,
            transposition: true,
            rank_skip: true,
            cutoff_cache_bits: 16,
            pattern_cache_bits: 16,
        }
    }
}

/// A card played to the current trick, with the seat that played it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayedCard {
    pub seat: Seat,
    pub card: Card,
}

impl PlayedCard {
    pub fn new(seat: Seat, card: Card) -> PlayedCard {
        PlayedCard { seat, card }
    }
}

impl fmt::Display for PlayedCard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.seat.to_char(), self.card)
    }
}

/// Cards already played to the trick in progress, in play order.
#[derive(Clone, Debug, Default)]
pub struct PartialTrick {
    pub plays: Vec<PlayedCard>,
}

impl PartialTrick {
    pub fn new() -> PartialTrick {
        PartialTrick { plays: Vec::new() }
    }

    pub fn add(&mut self, seat: Seat, card: Card) -> &mut PartialTrick {
        self.plays.push(PlayedCard::new(seat, card));
        self
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn leader(&self) -> Option<Seat> {
        self.plays.first().map(|p| p.seat)
    }

    pub fn next_to_play(&self) -> Option<Seat> {
        self.plays.last().map(|p| p.seat.next())
    }
}

/// Position faults caught before any search runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// A partial trick may hold at most three cards
    TooManyCards(usize),
    /// A played card came from the wrong seat in the rotation
    OutOfTurn { expected: Seat, found: Seat },
    /// A played card is not in the player's hand
    NotHeld(PlayedCard),
    /// A player failed to follow the suit led while able to
    Revoke(PlayedCard),
    /// Hands must hold the same number of cards at a trick start
    UnevenHands { seat: Seat, count: u8, expected: u8 },
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PositionError::TooManyCards(n) => {
                write!(f, "partial trick holds {} cards, at most 3 allowed", n)
            }
            PositionError::OutOfTurn { expected, found } => {
                write!(
                    f,
                    "play out of turn: expected {}, got {}",
                    expected.to_char(),
                    found.to_char()
                )
            }
            PositionError::NotHeld(play) => write!(f, "played card {} is not held", play),
            PositionError::Revoke(play) => {
                write!(f, "play {} revokes: the led suit must be followed", play)
            }
            PositionError::UnevenHands {
                seat,
                count,
                expected,
            } => write!(
                f,
                "{} holds {} cards, expected {}",
                seat.to_char(),
                count,
                expected
            ),
        }
    }
}

impl std::error::Error for PositionError {}

/// Per-request failure. Every variant is detected at the boundary or at a
/// deadline poll; the search itself never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    Deal(DealError),
    Notation(NotationError),
    Position(PositionError),
    Timeout,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveError::Deal(e) => write!(f, "{}", e),
            SolveError::Notation(e) => write!(f, "{}", e),
            SolveError::Position(e) => write!(f, "{}", e),
            SolveError::Timeout => write!(f, "deadline exceeded"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Deal(e) => Some(e),
            SolveError::Notation(e) => Some(e),
            SolveError::Position(e) => Some(e),
            SolveError::Timeout => None,
        }
    }
}

impl From<DealError> for SolveError {
    fn from(e: DealError) -> SolveError {
        SolveError::Deal(e)
    }
}

impl From<NotationError> for SolveError {
    fn from(e: NotationError) -> SolveError {
        SolveError::Notation(e)
    }
}

impl From<PositionError> for SolveError {
    fn from(e: PositionError) -> SolveError {
        SolveError::Position(e)
    }
}

/// Work done during one solve.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolveStats {
    /// Positions where cards were branched over
    pub nodes: u64,
    /// Pattern-cache hits that settled a trick-start probe
    pub pattern_hits: u64,
    /// Cutoff-memo hits that promoted a remembered card
    pub cutoff_hits: u64,
    /// Null-window probes the MTD(f) loop issued
    pub probes: u32,
}

impl SolveStats {
    fn absorb(&mut self, counters: SearchCounters) {
        self.nodes += counters.nodes;
        self.pattern_hits += counters.pattern_hits;
        self.cutoff_hits += counters.cutoff_hits;
        self.probes += 1;
    }

    /// Accumulate another solve's statistics, for batch-level reporting.
    pub fn merge(&mut self, other: &SolveStats) {
        self.nodes += other.nodes;
        self.pattern_hits += other.pattern_hits;
        self.cutoff_hits += other.cutoff_hits;
        self.probes += other.probes;
    }
}

/// Result of one solve: tricks the side on lead can guarantee.
#[derive(Clone, Copy, Debug)]
pub struct SolveOutcome {
    pub tricks: u8,
    pub stats: SolveStats,
}

/// Double-dummy solver. Cheap to construct; every request gets fresh
/// caches, so a `Solver` is freely shared across threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new() -> Solver {
        Solver::default()
    }

    pub fn with_config(config: SolverConfig) -> Solver {
        Solver { config }
    }

    /// Solve a full 52-card deal with `leader` on lead.
    pub fn solve(&self, deal: &Deal, strain: Strain, leader: Seat) -> Result<SolveOutcome, SolveError> {
        deal.validate()?;
        self.solve_position(deal, strain, leader, &PartialTrick::new(), None)
    }

    /// Solve a position: a full deal or an endgame, optionally mid-trick.
    ///
    /// `deal` holds each hand as it was when the current trick began; the
    /// cards of `partial` are still in their players' hands and are removed
    /// here after validation. The reported trick count covers the tricks
    /// not yet completed, from the perspective of `leader`'s side.
    pub fn solve_position(
        &self,
        deal: &Deal,
        strain: Strain,
        leader: Seat,
        partial: &PartialTrick,
        deadline: Option<Duration>,
    ) -> Result<SolveOutcome, SolveError> {
        let (mut hands, packed_partial, num_tricks) =
            validate_position(deal, leader, partial)?;
        let trump = strain.trump_suit().map(|s| s.index());
        let deadline = deadline.map(|d| Instant::now() + d);

        let guess = guess_tricks(deal, trump, num_tricks);
        let mut cutoff_cache = CutoffCache::new(self.config.cutoff_cache_bits);
        let mut pattern_cache = PatternCache::new(self.config.pattern_cache_bits);

        let mut stats = SolveStats::default();
        let ns_tricks = self.mtdf(
            &mut hands,
            trump,
            leader,
            &packed_partial,
            num_tricks,
            guess,
            &mut cutoff_cache,
            &mut pattern_cache,
            deadline,
            &mut stats,
        )?;

        Ok(SolveOutcome {
            tricks: leading_side_tricks(ns_tricks, num_tricks, leader),
            stats,
        })
    }

    /// Solve a position and extract one optimal sequence of plays.
    ///
    /// Each play is confirmed by a null-window probe of the position it
    /// leaves behind; among equally good cards the move generator's first
    /// suggestion is kept.
    pub fn best_line(
        &self,
        deal: &Deal,
        strain: Strain,
        leader: Seat,
        deadline: Option<Duration>,
    ) -> Result<(SolveOutcome, Vec<PlayedCard>), SolveError> {
        let (mut hands, _, num_tricks) = validate_position(deal, leader, &PartialTrick::new())?;
        let trump = strain.trump_suit().map(|s| s.index());
        let deadline = deadline.map(|d| Instant::now() + d);

        let guess = guess_tricks(deal, trump, num_tricks);
        let mut cutoff_cache = CutoffCache::new(self.config.cutoff_cache_bits);
        let mut pattern_cache = PatternCache::new(self.config.pattern_cache_bits);

        let mut stats = SolveStats::default();
        let target = self.mtdf(
            &mut hands,
            trump,
            leader,
            &[],
            num_tricks,
            guess,
            &mut cutoff_cache,
            &mut pattern_cache,
            deadline,
            &mut stats,
        )?;

        let mut line = Vec::with_capacity(num_tricks * 4);
        let mut ns_banked: u8 = 0;
        let mut trick: Vec<(Seat, usize)> = Vec::with_capacity(4);
        let mut seat = leader;

        while !hands.hand(seat).is_empty() || !trick.is_empty() {
            let card = self.confirmed_play(
                &mut hands,
                trump,
                seat,
                &trick,
                target,
                ns_banked,
                &mut cutoff_cache,
                &mut pattern_cache,
                deadline,
                &mut stats,
            )?;

            line.push(PlayedCard::new(seat, unpack(card)));
            hands.hand_mut(seat).take(card);
            trick.push((seat, card));

            if trick.len() == 4 {
                let mut winner = trick[0];
                for &(s, c) in &trick[1..] {
                    if wins_over(c, winner.1, trump) {
                        winner = (s, c);
                    }
                }
                if winner.0.is_ns() {
                    ns_banked += 1;
                }
                seat = winner.0;
                trick.clear();
            } else {
                seat = seat.next();
            }
        }

        Ok((
            SolveOutcome {
                tricks: leading_side_tricks(target, num_tricks, leader),
                stats,
            },
            line,
        ))
    }

    /// Find the first generated card at `seat` that keeps the game value
    /// at `target` North-South tricks.
    #[allow(clippy::too_many_arguments)]
    fn confirmed_play(
        &self,
        hands: &mut Hands,
        trump: Option<usize>,
        seat: Seat,
        trick: &[(Seat, usize)],
        target: u8,
        ns_banked: u8,
        cutoff_cache: &mut CutoffCache,
        pattern_cache: &mut PatternCache,
        deadline: Option<Instant>,
        stats: &mut SolveStats,
    ) -> Result<usize, SolveError> {
        let lead_suit = trick.first().map(|&(_, c)| suit_of(c));
        let playable = playable_cards(hands, seat, lead_suit);

        let all_cards = {
            let mut all = hands.all_cards();
            for &(_, c) in trick {
                all.insert(c);
            }
            all
        };
        let candidates: OrderedPlays = match lead_suit {
            None => order_leads(playable, hands, seat, trump, all_cards),
            Some(suit) => {
                let mut winner = trick[0];
                for &(s, c) in &trick[1..] {
                    if wins_over(c, winner.1, trump) {
                        winner = (s, c);
                    }
                }
                order_follows(
                    playable, hands, seat, trump, suit, winner.0, winner.1, trick.len(),
                )
            }
        };

        // the still-needed tricks from the remaining play
        let rel_target = (target - ns_banked) as i8;

        for i in 0..candidates.len() {
            let card = candidates.card(i);
            hands.hand_mut(seat).take(card);

            let mut child_trick: Vec<(Seat, usize)> = trick.to_vec();
            child_trick.push((seat, card));

            let confirmed = if child_trick.len() == 4 {
                let mut winner = child_trick[0];
                for &(s, c) in &child_trick[1..] {
                    if wins_over(c, winner.1, trump) {
                        winner = (s, c);
                    }
                }
                let banked = rel_target - i8::from(winner.0.is_ns());
                self.probe(
                    hands,
                    trump,
                    winner.0,
                    &[],
                    banked,
                    seat.is_ns(),
                    cutoff_cache,
                    pattern_cache,
                    deadline,
                    stats,
                )?
            } else {
                self.probe(
                    hands,
                    trump,
                    child_trick[0].0,
                    &child_trick,
                    rel_target,
                    seat.is_ns(),
                    cutoff_cache,
                    pattern_cache,
                    deadline,
                    stats,
                )?
            };

            hands.hand_mut(seat).insert(card);
            if confirmed {
                return Ok(card);
            }
        }

        // the position value guarantees some card passes
        debug_assert!(false, "no play at {} preserves the solved value", seat.to_char());
        Ok(candidates.card(0))
    }

    /// Null-window check that the child position is still worth `rel_target`
    /// North-South tricks: at least that many when the mover was N-S, at
    /// most that many otherwise.
    #[allow(clippy::too_many_arguments)]
    fn probe(
        &self,
        hands: &mut Hands,
        trump: Option<usize>,
        leader: Seat,
        partial: &[(Seat, usize)],
        rel_target: i8,
        mover_is_ns: bool,
        cutoff_cache: &mut CutoffCache,
        pattern_cache: &mut PatternCache,
        deadline: Option<Instant>,
        stats: &mut SolveStats,
    ) -> Result<bool, SolveError> {
        if rel_target <= 0 && mover_is_ns {
            return Ok(true);
        }
        let beta = if mover_is_ns {
            rel_target
        } else {
            rel_target + 1
        };

        let mut search = Search::new(
            hands,
            trump,
            leader,
            partial,
            cutoff_cache,
            pattern_cache,
            self.config,
            deadline,
        );
        let ns = search.search(beta) as i8;
        let expired = search.deadline_expired();
        stats.absorb(search.counters);
        if expired {
            return Err(SolveError::Timeout);
        }

        Ok(if mover_is_ns { ns >= beta } else { ns < beta })
    }

    /// MTD(f): repeated null-window probes narrowing [lower, upper] until
    /// they meet. `beta` never repeats a settled probe, so the loop always
    /// terminates.
    #[allow(clippy::too_many_arguments)]
    fn mtdf(
        &self,
        hands: &mut Hands,
        trump: Option<usize>,
        leader: Seat,
        partial: &[(Seat, usize)],
        num_tricks: usize,
        guess: usize,
        cutoff_cache: &mut CutoffCache,
        pattern_cache: &mut PatternCache,
        deadline: Option<Instant>,
        stats: &mut SolveStats,
    ) -> Result<u8, SolveError> {
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return Err(SolveError::Timeout);
            }
        }

        let mut lower = 0i8;
        let mut upper = num_tricks as i8;
        let mut ns_tricks = guess as i8;

        while lower < upper {
            let beta = if ns_tricks == lower {
                ns_tricks + 1
            } else {
                ns_tricks
            };

            #[cfg(feature = "debug_mtdf")]
            eprintln!(
                "mtdf: lower={} upper={} beta={}",
                lower, upper, beta
            );

            let mut search = Search::new(
                hands,
                trump,
                leader,
                partial,
                cutoff_cache,
                pattern_cache,
                self.config,
                deadline,
            );
            ns_tricks = search.search(beta) as i8;
            let expired = search.deadline_expired();
            stats.absorb(search.counters);
            if expired {
                return Err(SolveError::Timeout);
            }

            if ns_tricks < beta {
                upper = ns_tricks;
            } else {
                lower = ns_tricks;
            }
        }

        Ok(lower as u8)
    }
}

/// Check the position invariants and split it into engine form: hands net
/// of the partial trick, the partial plays in packed encoding, and the
/// number of tricks still to be played.
fn validate_position(
    deal: &Deal,
    leader: Seat,
    partial: &PartialTrick,
) -> Result<(Hands, Vec<(Seat, usize)>, usize), SolveError> {
    deal.validate_disjoint()?;

    let expected = deal.hand(leader).len();
    for seat in Seat::ALL {
        let count = deal.hand(seat).len();
        if count != expected {
            return Err(PositionError::UnevenHands {
                seat,
                count,
                expected,
            }
            .into());
        }
        if count > 13 {
            return Err(DealError::HandSize { seat, count }.into());
        }
    }

    if partial.len() > 3 {
        return Err(PositionError::TooManyCards(partial.len()).into());
    }

    let mut hands = Hands::from_deal(deal);
    let mut packed_partial = Vec::with_capacity(partial.len());
    let mut expected_seat = leader;
    let mut lead_suit: Option<usize> = None;

    for play in &partial.plays {
        if play.seat != expected_seat {
            return Err(PositionError::OutOfTurn {
                expected: expected_seat,
                found: play.seat,
            }
            .into());
        }
        let card = pack(play.card);
        if !hands.hand(play.seat).has(card) {
            return Err(PositionError::NotHeld(*play).into());
        }
        if let Some(suit) = lead_suit {
            if suit_of(card) != suit && !hands.hand(play.seat).suit(suit).is_empty() {
                return Err(PositionError::Revoke(*play).into());
            }
        } else {
            lead_suit = Some(suit_of(card));
        }

        hands.hand_mut(play.seat).take(card);
        packed_partial.push((play.seat, card));
        expected_seat = expected_seat.next();
    }

    Ok((hands, packed_partial, expected as usize))
}

/// Tricks for the side on lead, from the engine's North-South count.
fn leading_side_tricks(ns_tricks: u8, num_tricks: usize, leader: Seat) -> u8 {
    if leader.is_ns() {
        ns_tricks
    } else {
        num_tricks as u8 - ns_tricks
    }
}

/// First MTD(f) probe target from high-card points and trump length.
/// A bad guess only costs extra probes.
fn guess_tricks(deal: &Deal, trump: Option<usize>, num_tricks: usize) -> usize {
    let ns_points = deal.hand(Seat::North).hcp() + deal.hand(Seat::South).hcp();
    let ew_points = deal.hand(Seat::East).hcp() + deal.hand(Seat::West).hcp();

    match trump {
        None => {
            if ns_points * 2 < ew_points {
                return 0;
            }
            if ns_points < ew_points {
                return (num_tricks / 2 + 1).min(num_tricks);
            }
        }
        Some(t) => {
            let suit = dds_core::Suit::from_index(t as u8).unwrap_or(dds_core::Suit::Clubs);
            let n = deal.hand(Seat::North).suit_length(suit);
            let s = deal.hand(Seat::South).suit_length(suit);
            let e = deal.hand(Seat::East).suit_length(suit);
            let w = deal.hand(Seat::West).suit_length(suit);

            let ns_longest = n.max(s);
            let ew_longest = e.max(w);
            if ns_points < ew_points
                && (ns_longest < ew_longest || (ns_longest == ew_longest && n + s < e + w))
            {
                return 0;
            }
        }
    }

    num_tricks
}
