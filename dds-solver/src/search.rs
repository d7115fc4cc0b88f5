//! Null-window alpha-beta over the play of the cards.
//!
//! The search runs in three layers. `search_with_cache` fires at every
//! depth, banks finished tricks, and consults the pattern cache at trick
//! boundaries. `search_at_trick_start` applies the fast/slow trick bounds
//! that can settle a position without playing a card. `evaluate_playable`
//! branches over the candidate cards, one representative per equivalence
//! class, cutoff card first.
//!
//! Trick counts are always from the North-South side; every probe asks
//! "do N-S take at least `beta` tricks from here".

use std::time::Instant;

use dds_core::Seat;

use crate::board::Hands;
use crate::cache::{cutoff_hash, CutoffCache};
use crate::cards::{depth_of, suit_of, CardSet, NUM_SUITS, TOTAL_CARDS, TOTAL_TRICKS};
use crate::moves::{is_equivalent, order_follows, order_leads, OrderedPlays};
use crate::pattern::{compute_pattern_hands, Bounds, Pattern, PatternCache, RelativeHands, Shape};
use crate::prune;
use crate::solver::SolverConfig;
use crate::trick::{playable_cards, wins_over};

const DEADLINE_STRIDE: u64 = 4096;

#[derive(Clone, Copy)]
pub(crate) struct SearchResult {
    pub ns_tricks: u8,
    pub rank_winners: CardSet,
}

#[derive(Clone, Copy)]
struct PlayState {
    seat_to_play: Seat,
    card_played: u8,
    winning_play: u8,
    ns_tricks_won: u8,
}

impl Default for PlayState {
    fn default() -> PlayState {
        PlayState {
            seat_to_play: Seat::North,
            card_played: 0,
            winning_play: 0,
            ns_tricks_won: 0,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct TrickState {
    lead_suit: u8,
    all_cards: CardSet,
    shape: Shape,
    relative_hands: RelativeHands,
}

/// Counters accumulated over one or more probes.
#[derive(Clone, Copy, Default)]
pub(crate) struct SearchCounters {
    pub nodes: u64,
    pub pattern_hits: u64,
    pub cutoff_hits: u64,
}

pub(crate) struct Search<'a> {
    hands: &'a mut Hands,
    trump: Option<usize>,
    num_tricks: usize,

    plays: [PlayState; TOTAL_CARDS],
    tricks: [TrickState; TOTAL_TRICKS],

    cutoff_cache: &'a mut CutoffCache,
    pattern_cache: &'a mut PatternCache,

    start_depth: usize,
    config: SolverConfig,

    deadline: Option<Instant>,
    deadline_ticks: u64,
    expired: bool,

    pub counters: SearchCounters,
}

impl<'a> Search<'a> {
    /// Set up a search over `hands`. `partial` holds the cards already on
    /// the table in the current trick, in play order starting with the
    /// leader; `hands` must not contain them. With an empty `partial`,
    /// `leader` is on lead to a fresh trick.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hands: &'a mut Hands,
        trump: Option<usize>,
        leader: Seat,
        partial: &[(Seat, usize)],
        cutoff_cache: &'a mut CutoffCache,
        pattern_cache: &'a mut PatternCache,
        config: SolverConfig,
        deadline: Option<Instant>,
    ) -> Search<'a> {
        let num_tricks = hands.tricks_remaining();

        let mut plays = [PlayState::default(); TOTAL_CARDS];
        let mut tricks = [TrickState::default(); TOTAL_TRICKS];

        let start_depth = if partial.is_empty() {
            plays[0].seat_to_play = leader;
            0
        } else {
            let lead_suit = suit_of(partial[0].1);
            tricks[0].lead_suit = lead_suit as u8;

            // the table cards still count as live for this trick
            let mut all_cards = hands.all_cards();
            let mut full_hands = *hands;
            for &(seat, card) in partial {
                all_cards.insert(card);
                full_hands.hand_mut(seat).insert(card);
            }
            tricks[0].all_cards = all_cards;
            tricks[0].shape = Shape::from_hands(&full_hands);
            tricks[0].relative_hands.compute(&full_hands, all_cards);

            let mut winning_play = 0usize;
            let mut winning_card = partial[0].1;
            for (i, &(seat, card)) in partial.iter().enumerate() {
                plays[i].seat_to_play = seat;
                plays[i].card_played = card as u8;
                if i > 0 && wins_over(card, winning_card, trump) {
                    winning_play = i;
                    winning_card = card;
                }
                plays[i].winning_play = winning_play as u8;
            }

            let next = partial.len();
            plays[next].seat_to_play = partial[next - 1].0.next();
            plays[next].winning_play = winning_play as u8;
            next
        };

        Search {
            hands,
            trump,
            num_tricks,
            plays,
            tricks,
            cutoff_cache,
            pattern_cache,
            start_depth,
            config,
            deadline,
            deadline_ticks: 0,
            expired: false,
            counters: SearchCounters::default(),
        }
    }

    /// Run a null-window probe: the returned trick count is `>= beta` or
    /// `< beta`, exact only on the side that settled the probe.
    pub fn search(&mut self, beta: i8) -> u8 {
        #[cfg(feature = "debug_search")]
        eprintln!(
            "search: beta={} num_tricks={} start_depth={}",
            beta, self.num_tricks, self.start_depth
        );
        self.search_with_cache(self.start_depth, beta).ns_tricks
    }

    /// True once the deadline passed; the current result is unusable.
    pub fn deadline_expired(&self) -> bool {
        self.expired
    }

    fn check_deadline(&mut self) -> bool {
        if self.expired {
            return true;
        }
        if let Some(deadline) = self.deadline {
            self.deadline_ticks += 1;
            if self.deadline_ticks % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
                self.expired = true;
            }
        }
        self.expired
    }

    fn search_with_cache(&mut self, depth: usize, beta: i8) -> SearchResult {
        let trick_idx = depth / 4;
        let cards_in_trick = depth & 3;

        if cards_in_trick != 0 {
            if depth > self.start_depth {
                self.plays[depth].ns_tricks_won = self.plays[depth - 1].ns_tricks_won;
                self.plays[depth].seat_to_play = self.plays[depth - 1].seat_to_play.next();
            }
            return self.evaluate_playable(depth, beta);
        }

        // bank the finished trick, its winner leads next
        if depth > 0 {
            let prev_winning_play = self.plays[depth - 1].winning_play as usize;
            let winner_seat = self.plays[prev_winning_play].seat_to_play;
            let ns_won = u8::from(winner_seat.is_ns());
            self.plays[depth].ns_tricks_won = self.plays[depth - 1].ns_tricks_won + ns_won;
            self.plays[depth].seat_to_play = winner_seat;
        }

        let ns_tricks_won = self.plays[depth].ns_tricks_won;
        let seat_to_play = self.plays[depth].seat_to_play;

        if self.check_deadline() {
            return SearchResult {
                ns_tricks: ns_tricks_won,
                rank_winners: CardSet::EMPTY,
            };
        }

        if ns_tricks_won as i8 >= beta {
            return SearchResult {
                ns_tricks: ns_tricks_won,
                rank_winners: CardSet::EMPTY,
            };
        }
        let remaining = self.num_tricks - trick_idx;
        if ((ns_tricks_won as usize) + remaining) < beta as usize {
            return SearchResult {
                ns_tricks: ns_tricks_won + remaining as u8,
                rank_winners: CardSet::EMPTY,
            };
        }

        if remaining == 1 {
            return self.collect_last_trick(depth);
        }

        let all_cards = self.hands.all_cards();
        self.tricks[trick_idx].all_cards = all_cards;

        if depth == 0 {
            self.tricks[trick_idx].shape = Shape::from_hands(self.hands);
            self.tricks[trick_idx]
                .relative_hands
                .compute(self.hands, all_cards);
        } else {
            let prev = trick_idx - 1;
            let prev_all_cards = self.tricks[prev].all_cards;

            let mut shape = self.tricks[prev].shape;
            let base = prev * 4;
            shape.play_trick(
                self.plays[base].seat_to_play,
                [
                    self.plays[base].card_played as usize,
                    self.plays[base + 1].card_played as usize,
                    self.plays[base + 2].card_played as usize,
                    self.plays[base + 3].card_played as usize,
                ],
            );
            self.tricks[trick_idx].shape = shape;

            self.tricks[trick_idx].relative_hands = self.tricks[prev].relative_hands;
            self.tricks[trick_idx]
                .relative_hands
                .update(self.hands, prev_all_cards, all_cards);
        }

        // pattern cache: bounds stored relative to the banked trick count
        let shape = self.tricks[trick_idx].shape;
        let rel_beta = beta - ns_tricks_won as i8;
        if self.config.transposition {
            if let Some(entry) = self.pattern_cache.lookup(shape, seat_to_play) {
                let probe = Pattern::new(
                    self.tricks[trick_idx].relative_hands.hands,
                    Bounds::new(0, remaining as i8),
                );
                if let Some((matched, bounds)) = entry.lookup(&probe, rel_beta) {
                    self.counters.pattern_hits += 1;
                    let rank_winners = matched.rank_winners(all_cards);
                    let ns_tricks = if bounds.lower >= rel_beta {
                        ns_tricks_won as i8 + bounds.lower
                    } else {
                        ns_tricks_won as i8 + bounds.upper
                    };
                    return SearchResult {
                        ns_tricks: ns_tricks as u8,
                        rank_winners,
                    };
                }
            }
        }

        let result = self.search_at_trick_start(depth, beta);

        if self.config.transposition && !self.expired {
            let relative_tricks = (result.ns_tricks - ns_tricks_won) as i8;
            let bounds = if (result.ns_tricks as i8) < beta {
                Bounds::new(0, relative_tricks)
            } else {
                Bounds::new(relative_tricks, remaining as i8)
            };

            let (pattern_hands, extended_rank_winners) = compute_pattern_hands(
                &self.tricks[trick_idx].relative_hands,
                all_cards,
                result.rank_winners,
            );

            let entry = self.pattern_cache.get_or_create(shape, seat_to_play);
            entry.pattern.update(Pattern::new(pattern_hands, bounds));

            return SearchResult {
                ns_tricks: result.ns_tricks,
                rank_winners: extended_rank_winners,
            };
        }

        result
    }

    fn search_at_trick_start(&mut self, depth: usize, beta: i8) -> SearchResult {
        let trick_idx = depth / 4;
        let ns_tricks_won = self.plays[depth].ns_tricks_won;
        let seat_to_play = self.plays[depth].seat_to_play;
        let remaining = self.num_tricks - trick_idx;

        if self.config.pruning {
            let (fast, fast_rank_winners) =
                prune::fast_tricks(self.hands, seat_to_play, self.trump, remaining);

            if seat_to_play.is_ns() && ns_tricks_won as usize + fast >= beta as usize {
                return SearchResult {
                    ns_tricks: (ns_tricks_won as usize + fast) as u8,
                    rank_winners: fast_rank_winners,
                };
            }
            if !seat_to_play.is_ns()
                && (ns_tricks_won as usize + remaining - fast) < beta as usize
            {
                return SearchResult {
                    ns_tricks: (ns_tricks_won as usize + remaining - fast) as u8,
                    rank_winners: fast_rank_winners,
                };
            }

            // tricks the defenders must come to: top trumps, then finesse
            // positions; at notrump (or with trumps gone) their certain
            // stoppers
            let all_cards = self.hands.all_cards();
            let live_trump = self
                .trump
                .filter(|&t| !all_cards.suit(t).is_empty());
            let (slow, slow_rank_winners) = match live_trump {
                Some(t) => {
                    let (top, top_rw) =
                        prune::opponent_top_trump_tricks(self.hands, seat_to_play, t);
                    if top > 0 {
                        (top, top_rw)
                    } else {
                        prune::opponent_slow_trump_tricks(self.hands, seat_to_play, t)
                    }
                }
                None => prune::opponent_slow_tricks(self.hands, seat_to_play),
            };

            if slow > 0 {
                if seat_to_play.is_ns() {
                    if (ns_tricks_won as usize + remaining - slow) < beta as usize {
                        return SearchResult {
                            ns_tricks: (ns_tricks_won as usize + remaining - slow) as u8,
                            rank_winners: slow_rank_winners,
                        };
                    }
                } else if ns_tricks_won as usize + slow >= beta as usize {
                    return SearchResult {
                        ns_tricks: (ns_tricks_won as usize + slow) as u8,
                        rank_winners: slow_rank_winners,
                    };
                }
            }
        }

        self.evaluate_playable(depth, beta)
    }

    fn evaluate_playable(&mut self, depth: usize, beta: i8) -> SearchResult {
        self.counters.nodes += 1;

        let trick_idx = depth / 4;
        let cards_in_trick = depth & 3;
        let ns_tricks_won = self.plays[depth].ns_tricks_won;
        let seat_to_play = self.plays[depth].seat_to_play;
        let maximizing = seat_to_play.is_ns();

        if self.expired {
            return SearchResult {
                ns_tricks: ns_tricks_won,
                rank_winners: CardSet::EMPTY,
            };
        }

        let lead_suit = if cards_in_trick == 0 {
            None
        } else {
            Some(self.tricks[trick_idx].lead_suit as usize)
        };
        let playable = playable_cards(self.hands, seat_to_play, lead_suit);
        if playable.is_empty() {
            return SearchResult {
                ns_tricks: ns_tricks_won,
                rank_winners: CardSet::EMPTY,
            };
        }

        let (winning_card, winning_seat) = if cards_in_trick > 0 {
            let idx = self.plays[depth - 1].winning_play as usize;
            (
                self.plays[idx].card_played as usize,
                self.plays[idx].seat_to_play,
            )
        } else {
            (0, seat_to_play)
        };

        let all_cards = self.tricks[trick_idx].all_cards;
        let hash = cutoff_hash(
            self.hands,
            seat_to_play,
            cards_in_trick,
            lead_suit.unwrap_or(0),
            winning_card,
            winning_seat,
            self.trump,
            all_cards,
        );
        let cutoff_card = if self.config.transposition {
            self.cutoff_cache.lookup(hash, seat_to_play)
        } else {
            None
        };

        // remembered cutoff card first, heuristic order behind it
        let mut ordered = OrderedPlays::new();
        let mut rest = playable;
        if let Some(cc) = cutoff_card {
            if playable.has(cc) {
                self.counters.cutoff_hits += 1;
                ordered.push(cc);
                rest.take(cc);
            }
        }
        self.order_remaining(&mut ordered, depth, rest, lead_suit, winning_card, winning_seat);

        let my_hand = self.hands.hand(seat_to_play);

        let mut best = if maximizing { 0 } else { self.num_tricks as u8 };
        let mut tried = CardSet::EMPTY;
        let mut rank_winners = CardSet::EMPTY;
        // deepest rank per suit still worth trying; -1 skips the whole suit
        let mut relevant_depth = [12i8; NUM_SUITS];

        for i in 0..ordered.len() {
            let card = ordered.card(i);
            let suit = suit_of(card);

            if self.config.rank_skip && depth_of(card) as i8 > relevant_depth[suit] {
                tried.insert(card);
                continue;
            }
            if is_equivalent(card, tried, my_hand, all_cards) {
                tried.insert(card);
                continue;
            }
            tried.insert(card);

            let branch = self.play_card_and_search(depth, card, beta);
            let score = branch.ns_tricks;

            if maximizing {
                best = best.max(score);
                if best as i8 >= beta {
                    if cutoff_card != Some(card) && self.config.transposition {
                        self.cutoff_cache.store(hash, seat_to_play, card);
                    }
                    return SearchResult {
                        ns_tricks: best,
                        rank_winners: branch.rank_winners,
                    };
                }
            } else {
                best = best.min(score);
                if (best as i8) < beta {
                    if cutoff_card != Some(card) && self.config.transposition {
                        self.cutoff_cache.store(hash, seat_to_play, card);
                    }
                    return SearchResult {
                        ns_tricks: best,
                        rank_winners: branch.rank_winners,
                    };
                }
            }

            rank_winners = rank_winners | branch.rank_winners;

            // when the branch never depended on a rank below its lowest
            // winner, deeper cards of the suit cannot change the outcome
            let suit_winners = branch.rank_winners.suit(suit);
            if suit_winners.is_empty() {
                relevant_depth[suit] = -1;
            } else {
                let bottom = depth_of(suit_winners.bottom()) as i8;
                if depth_of(card) as i8 > bottom {
                    relevant_depth[suit] = relevant_depth[suit].min(bottom);
                }
            }
        }

        SearchResult {
            ns_tricks: best,
            rank_winners,
        }
    }

    fn play_card_and_search(&mut self, depth: usize, card: usize, beta: i8) -> SearchResult {
        let trick_idx = depth / 4;
        let cards_in_trick = depth & 3;
        let seat_to_play = self.plays[depth].seat_to_play;

        self.plays[depth].card_played = card as u8;
        self.hands.hand_mut(seat_to_play).take(card);

        if cards_in_trick == 0 {
            self.tricks[trick_idx].lead_suit = suit_of(card) as u8;
            self.plays[depth].winning_play = depth as u8;
        } else {
            let winner_idx = self.plays[depth - 1].winning_play as usize;
            let winner_card = self.plays[winner_idx].card_played as usize;
            self.plays[depth].winning_play = if wins_over(card, winner_card, self.trump) {
                depth as u8
            } else {
                winner_idx as u8
            };
        }

        let mut result = self.search_with_cache(depth + 1, beta);

        // the trick winner's rank mattered only if it was contested in suit
        if cards_in_trick == 3 {
            let winner_idx = self.plays[depth].winning_play as usize;
            let winner_card = self.plays[winner_idx].card_played as usize;
            let winner_suit = suit_of(winner_card);
            let contested = (depth - 3..=depth)
                .filter(|&d| d != winner_idx)
                .any(|d| suit_of(self.plays[d].card_played as usize) == winner_suit);
            if contested {
                result.rank_winners.insert(winner_card);
            }
        }

        self.hands.hand_mut(seat_to_play).insert(card);
        result
    }

    /// With one card left in each live hand the trick plays itself.
    fn collect_last_trick(&self, depth: usize) -> SearchResult {
        let ns_tricks_won = self.plays[depth].ns_tricks_won;
        let seat_to_play = self.plays[depth].seat_to_play;

        let mut winning_card = self.hands.hand(seat_to_play).top();
        let mut winning_seat = seat_to_play;

        let mut seat = seat_to_play.next();
        for _ in 1..4 {
            let card = self.hands.hand(seat).top();
            if wins_over(card, winning_card, self.trump) {
                winning_card = card;
                winning_seat = seat;
            }
            seat = seat.next();
        }

        let ns_tricks = ns_tricks_won + u8::from(winning_seat.is_ns());

        let winner_suit = suit_of(winning_card);
        let mut contested = false;
        let mut seat = seat_to_play;
        for _ in 0..4 {
            let card = self.hands.hand(seat).top();
            if card != winning_card && suit_of(card) == winner_suit {
                contested = true;
                break;
            }
            seat = seat.next();
        }

        let mut rank_winners = CardSet::EMPTY;
        if contested {
            rank_winners.insert(winning_card);
        }

        SearchResult {
            ns_tricks,
            rank_winners,
        }
    }

    fn order_remaining(
        &self,
        ordered: &mut OrderedPlays,
        depth: usize,
        playable: CardSet,
        lead_suit: Option<usize>,
        winning_card: usize,
        winning_seat: Seat,
    ) {
        if playable.is_empty() {
            return;
        }
        let trick_idx = depth / 4;
        let cards_in_trick = depth & 3;
        let seat_to_play = self.plays[depth].seat_to_play;

        let from = match lead_suit {
            None => order_leads(
                playable,
                self.hands,
                seat_to_play,
                self.trump,
                self.tricks[trick_idx].all_cards,
            ),
            Some(suit) => order_follows(
                playable,
                self.hands,
                seat_to_play,
                self.trump,
                suit,
                winning_seat,
                winning_card,
                cards_in_trick,
            ),
        };
        for i in 0..from.len() {
            ordered.push(from.card(i));
        }
    }
}
