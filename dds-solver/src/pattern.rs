//! Shape-keyed transposition cache.
//!
//! Positions are cached by hand shape (the sixteen seat-by-suit lengths)
//! rather than by exact cards. Within a shape bucket, entries store hands in
//! relative ranks, reduced to the cards whose ranks actually decided the
//! result. Two different deals that reduce to the same relative pattern
//! share bounds, which is where most of the cache's power comes from.
//!
//! Patterns form a tree: a pattern that holds strictly more rank
//! constraints than another is stored beneath it, with bounds intersected
//! along the path.

use dds_core::Seat;

use crate::board::Hands;
use crate::cache::HASH_RAND;
use crate::cards::{suit_mask, suit_of, CardSet, NUM_RANKS, NUM_SUITS, TOTAL_TRICKS};

/// Compress the bits of `source` selected by `mask` down to the low end of
/// the mask's bit count, preserving order.
#[inline]
pub(crate) fn pack_bits(source: u64, mask: u64) -> u64 {
    #[cfg(target_feature = "bmi2")]
    {
        unsafe { core::arch::x86_64::_pext_u64(source, mask) }
    }
    #[cfg(not(target_feature = "bmi2"))]
    {
        if source == 0 {
            return 0;
        }
        let mut packed = 0u64;
        let mut bit = 1u64;
        let mut m = mask;
        while m != 0 {
            let lowest = m & m.wrapping_neg();
            if source & lowest != 0 {
                packed |= bit;
            }
            bit <<= 1;
            m &= m - 1;
        }
        packed
    }
}

/// Scatter the low bits of `source` to the positions selected by `mask`,
/// the inverse of [`pack_bits`].
#[inline]
pub(crate) fn unpack_bits(source: u64, mask: u64) -> u64 {
    #[cfg(target_feature = "bmi2")]
    {
        unsafe { core::arch::x86_64::_pdep_u64(source, mask) }
    }
    #[cfg(not(target_feature = "bmi2"))]
    {
        if source == 0 {
            return 0;
        }
        let mut unpacked = 0u64;
        let mut bit = 1u64;
        let mut src = source;
        let mut m = mask;
        while src != 0 && m != 0 {
            if src & bit != 0 {
                unpacked |= m & m.wrapping_neg();
                src &= !bit;
            }
            bit <<= 1;
            m &= m - 1;
        }
        unpacked
    }
}

/// The sixteen seat-by-suit lengths packed four bits each into a u64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Shape {
    value: u64,
}

impl Shape {
    pub fn from_hands(hands: &Hands) -> Shape {
        let mut value = 0u64;
        for seat in Seat::ALL {
            for suit in 0..NUM_SUITS {
                let len = hands.hand(seat).suit(suit).len() as u64;
                value |= len << Self::offset(seat, suit);
            }
        }
        Shape { value }
    }

    /// Decrement the four lengths a completed trick consumed. `leader` is
    /// the seat of `cards[0]`, the rest follow clockwise.
    pub fn play_trick(&mut self, leader: Seat, cards: [usize; 4]) {
        let mut seat = leader;
        for card in cards {
            self.value -= 1u64 << Self::offset(seat, suit_of(card));
            seat = seat.next();
        }
    }

    pub fn value(self) -> u64 {
        self.value
    }

    #[inline]
    fn offset(seat: Seat, suit: usize) -> u32 {
        ((seat.index() * NUM_SUITS + suit) * 4) as u32
    }
}

/// Proven trick interval for a position, relative to the tricks already
/// banked when it was recorded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Bounds {
    pub lower: i8,
    pub upper: i8,
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds {
            lower: 0,
            upper: TOTAL_TRICKS as i8,
        }
    }
}

impl Bounds {
    pub fn new(lower: i8, upper: i8) -> Bounds {
        Bounds { lower, upper }
    }

    pub fn is_empty(self) -> bool {
        self.upper < self.lower
    }

    pub fn intersect(self, other: Bounds) -> Bounds {
        Bounds {
            lower: self.lower.max(other.lower),
            upper: self.upper.min(other.upper),
        }
    }

    /// True when the interval settles a null-window probe at `beta`.
    pub fn cutoff(self, beta: i8) -> bool {
        self.lower >= beta || self.upper < beta
    }
}

/// A relative-card pattern with proven bounds. Children are strictly more
/// constrained patterns whose bounds refine this one's.
#[derive(Clone, Default)]
pub(crate) struct Pattern {
    pub hands: [CardSet; 4],
    pub bounds: Bounds,
    pub children: Vec<Pattern>,
}

impl Pattern {
    pub fn new(hands: [CardSet; 4], bounds: Bounds) -> Pattern {
        Pattern {
            hands,
            bounds,
            children: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.hands = [CardSet::EMPTY; 4];
        self.bounds = Bounds::default();
        self.children.clear();
    }

    /// Find a stored pattern that `probe` satisfies and whose bounds settle
    /// a null-window probe at `beta`. Descends for the tightest match.
    pub fn lookup(&self, probe: &Pattern, beta: i8) -> Option<&Pattern> {
        for child in &self.children {
            if !probe.is_subset_of(child) {
                continue;
            }
            if child.bounds.cutoff(beta) {
                return Some(child);
            }
            if let Some(detail) = child.lookup(probe, beta) {
                return Some(detail);
            }
        }
        None
    }

    /// Insert a freshly proven pattern, merging with equal patterns,
    /// nesting under more general ones and absorbing more specific ones.
    pub fn update(&mut self, mut fresh: Pattern) {
        for i in 0..self.children.len() {
            let child = &mut self.children[i];

            if fresh.hands == child.hands {
                child.update_bounds(fresh.bounds);
                return;
            } else if fresh.is_subset_of(child) {
                fresh.bounds = fresh.bounds.intersect(child.bounds);
                if !fresh.bounds.is_empty() && fresh.bounds != child.bounds {
                    child.update(fresh);
                }
                return;
            } else if child.is_subset_of(&fresh) {
                child.update_bounds(fresh.bounds);
                if child.bounds != fresh.bounds {
                    fresh.children.push(self.children.swap_remove(i));
                } else {
                    // child collapses into the new pattern, keep its subtree
                    let mut grandchildren = Vec::new();
                    std::mem::swap(&mut grandchildren, &mut self.children[i].children);
                    fresh.children.append(&mut grandchildren);
                    self.children.swap_remove(i);
                }
                // other siblings may also be specializations of the new one
                let mut j = i;
                while j < self.children.len() {
                    if self.children[j].is_subset_of(&fresh) {
                        self.children[j].update_bounds(fresh.bounds);
                        if self.children[j].bounds != fresh.bounds {
                            fresh.children.push(self.children.swap_remove(j));
                        } else {
                            let removed = self.children.swap_remove(j);
                            fresh.children.extend(removed.children);
                        }
                    } else {
                        j += 1;
                    }
                }
                self.children.push(fresh);
                return;
            }
        }
        self.children.push(fresh);
    }

    /// Tighten bounds and push the result down, flattening children whose
    /// bounds collapse to the parent's.
    fn update_bounds(&mut self, fresh: Bounds) {
        let old = self.bounds;
        self.bounds = self.bounds.intersect(fresh);
        if self.bounds.is_empty() || self.bounds == old {
            return;
        }
        let mut i = 0;
        while i < self.children.len() {
            self.children[i].update_bounds(self.bounds);
            if self.children[i].bounds != self.bounds {
                i += 1;
            } else {
                let removed = self.children.swap_remove(i);
                self.children.extend(removed.children);
            }
        }
    }

    /// A pattern constraining a superset of cards in every hand is the more
    /// specific of the two.
    fn is_subset_of(&self, other: &Pattern) -> bool {
        self.hands
            .iter()
            .zip(&other.hands)
            .all(|(mine, theirs)| mine.contains(*theirs))
    }

    /// Map the stored relative ranks back to the cards live in `all_cards`.
    pub fn rank_winners(&self, all_cards: CardSet) -> CardSet {
        let mut relative = CardSet::EMPTY;
        for hand in &self.hands {
            relative = relative | *hand;
        }
        let mut winners = CardSet::EMPTY;
        for suit in 0..NUM_SUITS {
            let rel_suit = relative.suit(suit);
            if rel_suit.is_empty() {
                continue;
            }
            let packed = rel_suit.bits() >> (suit * NUM_RANKS);
            let unpacked = unpack_bits(packed, all_cards.suit(suit).bits());
            winners = winners | CardSet::from_bits(unpacked);
        }
        winners
    }
}

/// One shape bucket: the pattern tree for all positions of that shape.
#[derive(Default)]
pub(crate) struct ShapeEntry {
    hash: u64,
    pub pattern: Pattern,
}

impl ShapeEntry {
    fn reset(&mut self, hash: u64) {
        self.hash = hash;
        self.pattern.reset();
    }

    pub fn lookup(&self, probe: &Pattern, beta: i8) -> Option<(&Pattern, Bounds)> {
        if self.pattern.bounds.cutoff(beta) && probe.is_subset_of(&self.pattern) {
            return Some((&self.pattern, self.pattern.bounds));
        }
        self.pattern
            .lookup(probe, beta)
            .map(|matched| (matched, matched.bounds))
    }
}

/// Direct-mapped table of shape buckets, keyed by shape and seat to play.
/// A colliding shape evicts the previous bucket wholesale.
pub struct PatternCache {
    entries: Box<[ShapeEntry]>,
    bits: u32,
    mask: usize,
}

impl PatternCache {
    pub fn new(bits: u32) -> PatternCache {
        let size = 1usize << bits;
        let mut entries = Vec::with_capacity(size);
        entries.resize_with(size, ShapeEntry::default);
        PatternCache {
            entries: entries.into_boxed_slice(),
            bits,
            mask: size - 1,
        }
    }

    fn hash(shape: u64, seat_to_play: Seat) -> u64 {
        shape
            .wrapping_add(HASH_RAND[0])
            .wrapping_mul((seat_to_play.index() as u64).wrapping_add(HASH_RAND[1]))
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash >> (64 - self.bits)) as usize & self.mask
    }

    pub(crate) fn lookup(&self, shape: Shape, seat_to_play: Seat) -> Option<&ShapeEntry> {
        let hash = Self::hash(shape.value(), seat_to_play);
        let entry = &self.entries[self.index(hash)];
        if entry.hash == hash {
            Some(entry)
        } else {
            None
        }
    }

    pub(crate) fn get_or_create(&mut self, shape: Shape, seat_to_play: Seat) -> &mut ShapeEntry {
        let hash = Self::hash(shape.value(), seat_to_play);
        let idx = self.index(hash);
        if self.entries[idx].hash != hash {
            self.entries[idx].reset(hash);
        }
        &mut self.entries[idx]
    }
}

/// Hands re-ranked against the cards still in play: in every suit the
/// highest live card becomes the relative ace, the next the relative king,
/// and so on. Positions that differ only in spot cards map to the same
/// relative hands.
#[derive(Clone, Copy, Default)]
pub(crate) struct RelativeHands {
    pub hands: [CardSet; 4],
}

impl RelativeHands {
    fn convert_suit(&mut self, hands: &Hands, suit: usize, all_suit: CardSet) {
        let all_bits = all_suit.bits();
        for seat in Seat::ALL {
            let packed = pack_bits(hands.hand(seat).suit(suit).bits(), all_bits);
            let cleared = self.hands[seat.index()].clear_suit(suit);
            self.hands[seat.index()] =
                cleared | CardSet::from_bits(packed << (suit * NUM_RANKS));
        }
    }

    pub fn compute(&mut self, hands: &Hands, all_cards: CardSet) {
        for suit in 0..NUM_SUITS {
            self.convert_suit(hands, suit, all_cards.suit(suit));
        }
    }

    /// Recompute only the suits a finished trick touched.
    pub fn update(&mut self, hands: &Hands, prev_all_cards: CardSet, all_cards: CardSet) {
        let mut changed = prev_all_cards.minus(all_cards);
        while !changed.is_empty() {
            let suit = suit_of(changed.top());
            changed = changed.clear_suit(suit);
            self.convert_suit(hands, suit, all_cards.suit(suit));
        }
    }

    pub fn all_cards(&self) -> CardSet {
        self.hands
            .iter()
            .fold(CardSet::EMPTY, |acc, hand| acc | *hand)
    }
}

/// Reduce relative hands to the cards at or above the deciding ranks.
///
/// For each suit with a recorded rank winner, the cut point starts at the
/// lowest winner, extends down through the holder's consecutive relative
/// cards, and when it reaches the suit's relative bottom retreats above the
/// holder's low run, since cards below the cut never influenced the result.
/// Returns the pattern hands plus the winner set widened to match, in
/// absolute cards.
pub(crate) fn compute_pattern_hands(
    relative_hands: &RelativeHands,
    all_cards: CardSet,
    rank_winners: CardSet,
) -> ([CardSet; 4], CardSet) {
    let mut relative_winners = CardSet::EMPTY;
    let mut extended_winners = CardSet::EMPTY;
    let relative_all = relative_hands.all_cards();

    for suit in 0..NUM_SUITS {
        let rw_suit = rank_winners.suit(suit);
        if rw_suit.is_empty() {
            continue;
        }
        let base = suit * NUM_RANKS;
        let all_suit = all_cards.suit(suit);

        // lowest-ranked winner, in relative terms
        let bottom_winner = rw_suit.bottom();
        let rel_bottom = base + all_suit.span(base, bottom_winner).len();
        let mut cut = rel_bottom;

        for seat in Seat::ALL {
            let rel_hand = relative_hands.hands[seat.index()].suit(suit);
            if !rel_hand.has(rel_bottom) {
                continue;
            }
            let suit_bits = rel_hand.bits() >> base;
            let shift = rel_bottom - base + 1;
            if shift < 64 {
                cut += (suit_bits >> shift).trailing_ones() as usize;
            }
            let all_rel_suit = relative_all.suit(suit);
            if cut == all_rel_suit.bottom() {
                let depth = cut - base;
                if depth > 0 {
                    let below = suit_bits & ((1u64 << depth) - 1);
                    cut -= (64 - below.leading_zeros()) as usize;
                }
            }
            break;
        }

        let rel_winners = CardSet::from_bits(suit_mask(suit)).span(0, cut + 1);
        relative_winners = relative_winners | rel_winners;

        let packed = rel_winners.bits() >> base;
        let unpacked = unpack_bits(packed, all_suit.bits());
        extended_winners = extended_winners | CardSet::from_bits(unpacked);
    }

    let mut pattern_hands = [CardSet::EMPTY; 4];
    for seat in Seat::ALL {
        pattern_hands[seat.index()] = relative_hands.hands[seat.index()] & relative_winners;
    }

    (pattern_hands, extended_winners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dds_core::Deal;

    fn hands(notation: &str) -> Hands {
        Hands::from_deal(&Deal::from_notation(notation).unwrap())
    }

    #[test]
    fn test_pack_bits_compresses() {
        assert_eq!(pack_bits(0b10100, 0b11100), 0b101);
        assert_eq!(pack_bits(0, 0b11100), 0);
        assert_eq!(pack_bits(0b11100, 0b11100), 0b111);
    }

    #[test]
    fn test_unpack_bits_inverts_pack() {
        let mask = 0b1011_0110u64;
        for source in 0u64..16 {
            let unpacked = unpack_bits(source, mask);
            assert_eq!(unpacked & !mask, 0);
            assert_eq!(pack_bits(unpacked, mask), source);
        }
    }

    #[test]
    fn test_shape_tracks_trick() {
        let h = hands("N:AK.2.. QJ.3.. T9.4.. 87.5..");
        let mut shape = Shape::from_hands(&h);
        let before = shape.value();

        // everyone follows with a spade
        let spades: Vec<usize> = [Seat::North, Seat::East, Seat::South, Seat::West]
            .iter()
            .map(|&s| h.hand(s).suit(3).top())
            .collect();
        shape.play_trick(Seat::North, [spades[0], spades[1], spades[2], spades[3]]);
        assert_ne!(shape.value(), before);

        // playing the remaining cards of each hand reaches the empty shape
        let h2 = hands("N:K.2.. J.3.. 9.4.. 7.5..");
        assert_eq!(shape, Shape::from_hands(&h2));
    }

    #[test]
    fn test_bounds_cutoff() {
        let b = Bounds::new(3, 5);
        assert!(b.cutoff(3)); // lower >= beta
        assert!(b.cutoff(6)); // upper < beta
        assert!(!b.cutoff(4));
        assert!(!b.cutoff(5));
        assert!(Bounds::new(4, 3).is_empty());
        assert_eq!(
            Bounds::new(1, 6).intersect(Bounds::new(3, 9)),
            Bounds::new(3, 6)
        );
    }

    #[test]
    fn test_pattern_tree_nests_specific_under_general() {
        let mut root = Pattern::default();

        let general = Pattern::new(
            [CardSet::from_bits(0b1), CardSet::EMPTY, CardSet::EMPTY, CardSet::EMPTY],
            Bounds::new(2, 13),
        );
        let specific = Pattern::new(
            [CardSet::from_bits(0b11), CardSet::EMPTY, CardSet::EMPTY, CardSet::EMPTY],
            Bounds::new(3, 13),
        );

        root.update(general.clone());
        root.update(specific.clone());

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].hands, general.hands);
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].hands, specific.hands);

        // the specific probe reaches the deeper, tighter bounds
        let found = root.lookup(&specific, 3).unwrap();
        assert_eq!(found.bounds.lower, 3);
        // the general probe only matches the outer pattern, which cannot
        // settle beta = 3
        assert!(root.lookup(&general, 3).is_none());
        assert!(root.lookup(&general, 2).is_some());
    }

    #[test]
    fn test_pattern_equal_hands_merge_bounds() {
        let mut root = Pattern::default();
        let hands = [CardSet::from_bits(0b101), CardSet::EMPTY, CardSet::EMPTY, CardSet::EMPTY];
        root.update(Pattern::new(hands, Bounds::new(2, 13)));
        root.update(Pattern::new(hands, Bounds::new(0, 7)));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].bounds, Bounds::new(2, 7));
    }

    #[test]
    fn test_pattern_general_absorbs_specific() {
        let mut root = Pattern::default();
        let specific = Pattern::new(
            [CardSet::from_bits(0b111), CardSet::EMPTY, CardSet::EMPTY, CardSet::EMPTY],
            Bounds::new(0, 9),
        );
        let general = Pattern::new(
            [CardSet::from_bits(0b1), CardSet::EMPTY, CardSet::EMPTY, CardSet::EMPTY],
            Bounds::new(4, 13),
        );
        root.update(specific.clone());
        root.update(general.clone());

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].hands, general.hands);
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].bounds, Bounds::new(4, 9));
    }

    #[test]
    fn test_cache_is_keyed_by_shape_and_seat() {
        let mut cache = PatternCache::new(8);
        let h = hands("N:AK.2.. QJ.3.. T9.4.. 87.5..");
        let shape = Shape::from_hands(&h);

        let entry = cache.get_or_create(shape, Seat::North);
        entry.pattern.bounds = Bounds::new(2, 2);

        assert!(cache.lookup(shape, Seat::North).is_some());
        assert!(cache.lookup(shape, Seat::East).is_none());
    }

    #[test]
    fn test_relative_hands_ignore_spot_gaps() {
        // AKQ against J98 reduces the same as AJ9 against 876
        let a = hands("N:AKQ... J98... ..432. ...432");
        let b = hands("N:AJ9... 876... ..432. ...432");

        let mut rel_a = RelativeHands::default();
        rel_a.compute(&a, a.all_cards());
        let mut rel_b = RelativeHands::default();
        rel_b.compute(&b, b.all_cards());

        assert_eq!(rel_a.hands[Seat::North.index()], rel_b.hands[Seat::North.index()]);
        assert_eq!(rel_a.hands[Seat::East.index()], rel_b.hands[Seat::East.index()]);
    }

    #[test]
    fn test_relative_update_matches_recompute() {
        let before = hands("N:AK.2.. QJ.3.. T9.4.. 87.5..");
        let after = hands("N:K.2.. J.3.. 9.4.. 7.5..");

        let mut incremental = RelativeHands::default();
        incremental.compute(&before, before.all_cards());
        incremental.update(&after, before.all_cards(), after.all_cards());

        let mut fresh = RelativeHands::default();
        fresh.compute(&after, after.all_cards());

        for seat in Seat::ALL {
            assert_eq!(
                incremental.hands[seat.index()],
                fresh.hands[seat.index()]
            );
        }
    }

    #[test]
    fn test_rank_winners_round_trip() {
        let h = hands("N:AQ2... KJ3... ..432. ...432");
        let all = h.all_cards();
        let mut rel = RelativeHands::default();
        rel.compute(&h, all);

        // the spade ace decided the position
        let ace = h.hand(Seat::North).suit(3).top();
        let (pattern_hands, extended) =
            compute_pattern_hands(&rel, all, CardSet::only(ace));

        assert!(extended.has(ace));
        let pattern = Pattern::new(pattern_hands, Bounds::new(1, 1));
        let winners = pattern.rank_winners(all);
        assert_eq!(winners, extended);
    }
}
