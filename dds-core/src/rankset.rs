use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use once_cell::sync::Lazy;

use crate::Rank;

const NUM_SETS: usize = 1 << 13;
const FULL_BITS: u16 = 0x1FFF;

/// Table-internal marker for "empty set has no highest rank". Never escapes
/// through the public API; `highest` translates it to `None`.
const NO_HIGHEST: u8 = 0xFF;

/// 1-based strength order of a rank within a RankSet: the highest member has
/// priority 1, the next highest 2, and so on. Lower numbers are stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    /// Convert from a 1-based order value (1-13)
    pub fn new(value: u8) -> Option<Priority> {
        if (1..=13).contains(&value) {
            Some(Priority(value))
        } else {
            None
        }
    }

    /// The 1-based order value
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Derived-query tables indexed by the 13-bit set value. The search layer
/// consults these millions of times per solve, so every query is one load.
struct Tables {
    count: Box<[u8]>,
    highest: Box<[u8]>,
    priority: Box<[u8]>,
    win_ranks: Box<[u16]>,
}

impl Tables {
    fn build() -> Tables {
        let mut count = vec![0u8; NUM_SETS];
        let mut highest = vec![NO_HIGHEST; NUM_SETS];
        let mut priority = vec![0u8; NUM_SETS * 13];
        let mut win_ranks = vec![0u16; NUM_SETS * 13];

        for set in 0..NUM_SETS {
            let mut order = 0u8;
            let mut top_mask = 0u16;
            for rank in Rank::ALL.iter().rev() {
                let bit = 1u16 << rank.index();
                if set as u16 & bit != 0 {
                    if order == 0 {
                        highest[set] = rank.value();
                    }
                    order += 1;
                    top_mask |= bit;
                    priority[set * 13 + rank.index()] = order;
                    win_ranks[set * 13 + (order as usize - 1)] = top_mask;
                }
            }
            count[set] = order;
            // rows past the member count hold the whole set
            for k in order as usize..13 {
                win_ranks[set * 13 + k] = top_mask;
            }
        }

        Tables {
            count: count.into_boxed_slice(),
            highest: highest.into_boxed_slice(),
            priority: priority.into_boxed_slice(),
            win_ranks: win_ranks.into_boxed_slice(),
        }
    }
}

static TABLES: Lazy<Tables> = Lazy::new(Tables::build);

/// Force construction of the RankSet lookup tables.
///
/// Call once at startup, before handing work to solver threads. Queries made
/// earlier still work (`Lazy` is thread-safe); this hook only moves the
/// build cost out of the first solve.
pub fn initialize() {
    Lazy::force(&TABLES);
}

/// A set of ranks within one suit, stored as a 13-bit mask (bit i set means
/// rank i+2 is present).
///
/// Two mutation families with different contracts: `add`/`remove` assert the
/// rank was absent/present beforehand (double-adding or double-removing a
/// card is a caller defect), while the bit operators (`|`, `&`, `^`, `!`)
/// are plain set algebra with no such precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RankSet {
    bits: u16,
}

impl RankSet {
    /// The empty set
    pub const fn empty() -> RankSet {
        RankSet { bits: 0 }
    }

    /// All thirteen ranks
    pub const fn full() -> RankSet {
        RankSet { bits: FULL_BITS }
    }

    /// A set holding a single rank
    pub fn single(rank: Rank) -> RankSet {
        RankSet {
            bits: 1 << rank.index(),
        }
    }

    /// Build a set from a slice of distinct ranks
    pub fn from_ranks(ranks: &[Rank]) -> RankSet {
        let mut set = RankSet::empty();
        for &rank in ranks {
            set.add(rank);
        }
        set
    }

    /// Validate a raw 13-bit mask
    pub fn from_bits(bits: u16) -> Option<RankSet> {
        if bits <= FULL_BITS {
            Some(RankSet { bits })
        } else {
            None
        }
    }

    /// The raw 13-bit mask
    pub fn bits(self) -> u16 {
        self.bits
    }

    /// Membership test
    pub fn test(self, rank: Rank) -> bool {
        self.bits & (1 << rank.index()) != 0
    }

    /// True when the set is empty
    pub fn none(self) -> bool {
        self.bits == 0
    }

    /// True when the set has any member
    pub fn any(self) -> bool {
        self.bits != 0
    }

    /// Number of members
    pub fn count(self) -> u8 {
        TABLES.count[self.bits as usize]
    }

    /// Highest member, or None for the empty set
    pub fn highest(self) -> Option<Rank> {
        let raw = TABLES.highest[self.bits as usize];
        if raw == NO_HIGHEST {
            debug_assert!(self.none());
            return None;
        }
        Rank::from_value(raw)
    }

    /// Lowest member, or None for the empty set
    pub fn lowest(self) -> Option<Rank> {
        if self.bits == 0 {
            return None;
        }
        Rank::from_index(self.bits.trailing_zeros() as u8)
    }

    /// Strength order of `rank` within this set, or None if absent
    pub fn priority(self, rank: Rank) -> Option<Priority> {
        let raw = TABLES.priority[self.bits as usize * 13 + rank.index()];
        Priority::new(raw)
    }

    /// The top `least_win` members as a set; the whole set if it has fewer.
    /// `least_win` 0 gives the empty set. Valid inputs are 0-13.
    pub fn win_ranks(self, least_win: u8) -> RankSet {
        if least_win == 0 {
            return RankSet::empty();
        }
        assert!(least_win <= 13);
        RankSet {
            bits: TABLES.win_ranks[self.bits as usize * 13 + (least_win as usize - 1)],
        }
    }

    /// Insert a rank that must not already be present
    pub fn add(&mut self, rank: Rank) {
        debug_assert!(!self.test(rank), "rank {} added twice", rank.to_char());
        self.bits |= 1 << rank.index();
    }

    /// Remove a rank that must be present
    pub fn remove(&mut self, rank: Rank) {
        debug_assert!(self.test(rank), "rank {} removed but absent", rank.to_char());
        self.bits &= !(1 << rank.index());
    }

    /// Iterate members from highest to lowest
    pub fn iter(self) -> RankSetIter {
        RankSetIter { bits: self.bits }
    }
}

impl BitOr for RankSet {
    type Output = RankSet;
    fn bitor(self, rhs: RankSet) -> RankSet {
        RankSet {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for RankSet {
    fn bitor_assign(&mut self, rhs: RankSet) {
        self.bits |= rhs.bits;
    }
}

impl BitAnd for RankSet {
    type Output = RankSet;
    fn bitand(self, rhs: RankSet) -> RankSet {
        RankSet {
            bits: self.bits & rhs.bits,
        }
    }
}

impl BitAndAssign for RankSet {
    fn bitand_assign(&mut self, rhs: RankSet) {
        self.bits &= rhs.bits;
    }
}

impl BitXor for RankSet {
    type Output = RankSet;
    fn bitxor(self, rhs: RankSet) -> RankSet {
        RankSet {
            bits: self.bits ^ rhs.bits,
        }
    }
}

impl BitXorAssign for RankSet {
    fn bitxor_assign(&mut self, rhs: RankSet) {
        self.bits ^= rhs.bits;
    }
}

impl Not for RankSet {
    type Output = RankSet;
    fn not(self) -> RankSet {
        RankSet {
            bits: !self.bits & FULL_BITS,
        }
    }
}

/// Iterator over members, highest first.
pub struct RankSetIter {
    bits: u16,
}

impl Iterator for RankSetIter {
    type Item = Rank;

    fn next(&mut self) -> Option<Rank> {
        if self.bits == 0 {
            return None;
        }
        let top = 15 - self.bits.leading_zeros() as u8;
        self.bits &= !(1 << top);
        Rank::from_index(top)
    }
}

impl fmt::Display for RankSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in self.iter() {
            write!(f, "{}", rank.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sets() -> impl Iterator<Item = RankSet> {
        (0..NUM_SETS as u16).map(|bits| RankSet::from_bits(bits).unwrap())
    }

    #[test]
    fn test_from_bits_rejects_out_of_range() {
        assert!(RankSet::from_bits(FULL_BITS).is_some());
        assert!(RankSet::from_bits(FULL_BITS + 1).is_none());
        assert!(RankSet::from_bits(u16::MAX).is_none());
    }

    #[test]
    fn test_add_grows_count_and_membership() {
        for set in all_sets() {
            for rank in Rank::ALL {
                if !set.test(rank) {
                    let mut grown = set;
                    grown.add(rank);
                    assert_eq!(grown.count(), set.count() + 1);
                    assert!(grown.test(rank));
                }
            }
        }
    }

    #[test]
    fn test_remove_shrinks_count() {
        for set in all_sets() {
            for rank in Rank::ALL {
                if set.test(rank) {
                    let mut shrunk = set;
                    shrunk.remove(rank);
                    assert_eq!(shrunk.count(), set.count() - 1);
                    assert!(!shrunk.test(rank));
                }
            }
        }
    }

    #[test]
    fn test_priority_is_permutation_increasing_downward() {
        for set in all_sets() {
            if set.none() {
                assert_eq!(set.highest(), None);
                continue;
            }
            let highest = set.highest().unwrap();
            assert_eq!(set.priority(highest), Priority::new(1));

            // walking members from the top, priorities must read 1, 2, 3, ...
            let mut expected = 0u8;
            for rank in set.iter() {
                expected += 1;
                assert_eq!(set.priority(rank), Priority::new(expected));
            }
            assert_eq!(expected, set.count());

            for rank in Rank::ALL {
                if !set.test(rank) {
                    assert_eq!(set.priority(rank), None);
                }
            }
        }
    }

    #[test]
    fn test_win_ranks_takes_top_members() {
        for set in all_sets() {
            assert!(set.win_ranks(0).none());
            for k in 1..=13u8 {
                let top = set.win_ranks(k);
                let expected = k.min(set.count());
                assert_eq!(top.count(), expected);
                // every member of the answer outranks everything left behind
                let rest = set & !top;
                match (top.lowest(), rest.highest()) {
                    (Some(low), Some(high)) => assert!(low > high),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_add_remove_round_trip_any_order() {
        let ranks = [Rank::Ace, Rank::Seven, Rank::Queen, Rank::Two, Rank::Ten];
        let reference = RankSet::from_ranks(&ranks);

        for rotation in 0..ranks.len() {
            let mut order = ranks.to_vec();
            order.rotate_left(rotation);

            let mut set = RankSet::empty();
            for &rank in &order {
                set.add(rank);
            }
            assert_eq!(set, reference);

            order.reverse();
            for &rank in &order {
                set.remove(rank);
            }
            assert_eq!(set, RankSet::empty());
        }
    }

    #[test]
    fn test_bit_algebra_masks_to_domain() {
        let set = RankSet::from_ranks(&[Rank::Ace, Rank::Two]);
        let complement = !set;
        assert_eq!(complement.count(), 11);
        assert!((set | complement) == RankSet::full());
        assert!((set & complement).none());
        assert_eq!(set ^ set, RankSet::empty());
    }

    #[test]
    fn test_iteration_is_high_to_low() {
        let set = RankSet::from_ranks(&[Rank::Three, Rank::King, Rank::Nine]);
        let collected: Vec<Rank> = set.iter().collect();
        assert_eq!(collected, vec![Rank::King, Rank::Nine, Rank::Three]);
        assert_eq!(set.to_string(), "K93");
        assert_eq!(set.lowest(), Some(Rank::Three));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        initialize();
        initialize();
        assert_eq!(RankSet::full().count(), 13);
    }
}
