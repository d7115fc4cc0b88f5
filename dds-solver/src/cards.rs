//! Packed 52-bit board representation.
//!
//! The search works on `CardSet`, a bitboard where each suit owns a 13-bit
//! block (clubs lowest) and, within a block, the *lower* bit is the *higher*
//! rank. That in-suit order makes "highest live card" a trailing-zeros count
//! and keeps rank comparisons to a single integer compare, which is what the
//! inner loops need. The public API never sees packed indices; conversion to
//! and from `dds_core` types happens at the solver boundary.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not};

use dds_core::{Card, Rank, Suit};

pub(crate) const NUM_RANKS: usize = 13;
pub(crate) const NUM_SUITS: usize = 4;
pub(crate) const TOTAL_CARDS: usize = 52;
pub(crate) const TOTAL_TRICKS: usize = 13;

/// Packed index of a card: `suit * 13 + depth`, where depth 0 is the ace
/// and depth 12 the deuce.
pub(crate) fn pack(card: Card) -> usize {
    card.suit.index() * NUM_RANKS + (Rank::Ace.value() - card.rank.value()) as usize
}

/// Inverse of `pack`.
pub(crate) fn unpack(packed: usize) -> Card {
    debug_assert!(packed < TOTAL_CARDS);
    let suit = Suit::from_index((packed / NUM_RANKS) as u8).expect("packed suit in range");
    let rank = Rank::from_value(Rank::Ace.value() - (packed % NUM_RANKS) as u8)
        .expect("packed rank in range");
    Card::new(suit, rank)
}

/// Suit block of a packed card (0-3, `Suit::index` order).
#[inline]
pub(crate) fn suit_of(packed: usize) -> usize {
    packed / NUM_RANKS
}

/// Depth of a packed card within its suit: 0 for the ace, 12 for the deuce.
#[inline]
pub(crate) fn depth_of(packed: usize) -> usize {
    packed % NUM_RANKS
}

/// True when `a` outranks `b`. Only meaningful within one suit.
#[inline]
pub(crate) fn outranks(a: usize, b: usize) -> bool {
    debug_assert_eq!(suit_of(a), suit_of(b));
    a < b
}

/// The 13-bit block mask for one suit.
#[inline]
pub(crate) fn suit_mask(suit: usize) -> u64 {
    0x1FFF << (suit * NUM_RANKS)
}

/// A set of cards over all four suits, packed into the low 52 bits of a u64.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CardSet {
    bits: u64,
}

impl CardSet {
    pub const EMPTY: CardSet = CardSet { bits: 0 };

    #[inline]
    pub const fn from_bits(bits: u64) -> CardSet {
        CardSet { bits }
    }

    #[inline]
    pub fn bits(self) -> u64 {
        self.bits
    }

    #[inline]
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub fn has(self, packed: usize) -> bool {
        self.bits & (1 << packed) != 0
    }

    #[inline]
    pub fn only(packed: usize) -> CardSet {
        CardSet { bits: 1 << packed }
    }

    /// The cards of one suit block.
    #[inline]
    pub fn suit(self, suit: usize) -> CardSet {
        CardSet {
            bits: self.bits & suit_mask(suit),
        }
    }

    /// Highest-ranked card of the lowest occupied suit block. Callers
    /// restrict the set to one suit first when rank order matters.
    #[inline]
    pub fn top(self) -> usize {
        debug_assert!(!self.is_empty());
        self.bits.trailing_zeros() as usize
    }

    /// Lowest-ranked card of the highest occupied suit block.
    #[inline]
    pub fn bottom(self) -> usize {
        debug_assert!(!self.is_empty());
        63 - self.bits.leading_zeros() as usize
    }

    /// Cards with packed index in `[begin, end)`. Within one suit this is
    /// "ranks strictly between two cards".
    #[inline]
    pub fn span(self, begin: usize, end: usize) -> CardSet {
        let mask = if end >= 64 {
            !0u64 << begin
        } else {
            (1u64 << end) - (1u64 << begin)
        };
        CardSet {
            bits: self.bits & mask,
        }
    }

    #[inline]
    pub fn contains(self, other: CardSet) -> bool {
        self.bits & other.bits == other.bits
    }

    #[inline]
    pub fn insert(&mut self, packed: usize) {
        self.bits |= 1 << packed;
    }

    #[inline]
    pub fn take(&mut self, packed: usize) {
        debug_assert!(self.has(packed));
        self.bits &= !(1 << packed);
    }

    /// Cards of self not in `other`.
    #[inline]
    pub fn minus(self, other: CardSet) -> CardSet {
        CardSet {
            bits: self.bits & !other.bits,
        }
    }

    #[inline]
    pub fn clear_suit(self, suit: usize) -> CardSet {
        CardSet {
            bits: self.bits & !suit_mask(suit),
        }
    }

    /// Iterate packed indices, highest rank first within each suit, clubs
    /// block first.
    #[inline]
    pub fn iter(self) -> CardSetIter {
        CardSetIter { bits: self.bits }
    }
}

impl BitOr for CardSet {
    type Output = CardSet;
    #[inline]
    fn bitor(self, rhs: CardSet) -> CardSet {
        CardSet {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for CardSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: CardSet) {
        self.bits |= rhs.bits;
    }
}

impl BitAnd for CardSet {
    type Output = CardSet;
    #[inline]
    fn bitand(self, rhs: CardSet) -> CardSet {
        CardSet {
            bits: self.bits & rhs.bits,
        }
    }
}

impl BitAndAssign for CardSet {
    #[inline]
    fn bitand_assign(&mut self, rhs: CardSet) {
        self.bits &= rhs.bits;
    }
}

impl BitXor for CardSet {
    type Output = CardSet;
    #[inline]
    fn bitxor(self, rhs: CardSet) -> CardSet {
        CardSet {
            bits: self.bits ^ rhs.bits,
        }
    }
}

impl Not for CardSet {
    type Output = CardSet;
    #[inline]
    fn not(self) -> CardSet {
        CardSet {
            bits: !self.bits & ((1u64 << TOTAL_CARDS) - 1),
        }
    }
}

pub(crate) struct CardSetIter {
    bits: u64,
}

impl Iterator for CardSetIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.bits == 0 {
            return None;
        }
        let packed = self.bits.trailing_zeros() as usize;
        self.bits &= self.bits - 1;
        Some(packed)
    }
}

impl fmt::Debug for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CardSet(")?;
        for suit in (0..NUM_SUITS).rev() {
            let block = self.suit(suit);
            if block.is_empty() {
                continue;
            }
            write!(
                f,
                "{}:",
                Suit::from_index(suit as u8).expect("suit in range").to_char()
            )?;
            for packed in block.iter() {
                write!(f, "{}", unpack(packed).rank.to_char())?;
            }
            write!(f, " ")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip() {
        for index in 0..52u8 {
            let card = Card::from_index(index).unwrap();
            assert_eq!(unpack(pack(card)), card);
        }
        assert_eq!(pack(Card::new(Suit::Clubs, Rank::Ace)), 0);
        assert_eq!(pack(Card::new(Suit::Clubs, Rank::Two)), 12);
        assert_eq!(pack(Card::new(Suit::Spades, Rank::Ace)), 39);
        assert_eq!(pack(Card::new(Suit::Spades, Rank::Two)), 51);
    }

    #[test]
    fn test_in_suit_order_is_rank_descending() {
        let ace = pack(Card::new(Suit::Hearts, Rank::Ace));
        let king = pack(Card::new(Suit::Hearts, Rank::King));
        let two = pack(Card::new(Suit::Hearts, Rank::Two));
        assert!(outranks(ace, king));
        assert!(outranks(king, two));
        assert_eq!(depth_of(ace), 0);
        assert_eq!(depth_of(two), 12);
    }

    #[test]
    fn test_top_bottom_within_suit() {
        let mut set = CardSet::EMPTY;
        set.insert(pack(Card::new(Suit::Spades, Rank::Queen)));
        set.insert(pack(Card::new(Suit::Spades, Rank::Seven)));
        set.insert(pack(Card::new(Suit::Spades, Rank::Three)));

        let spades = set.suit(Suit::Spades.index());
        assert_eq!(unpack(spades.top()).rank, Rank::Queen);
        assert_eq!(unpack(spades.bottom()).rank, Rank::Three);
    }

    #[test]
    fn test_span_is_between_ranks() {
        let mut set = CardSet::EMPTY;
        for rank in Rank::ALL {
            set.insert(pack(Card::new(Suit::Diamonds, rank)));
        }
        let king = pack(Card::new(Suit::Diamonds, Rank::King));
        let nine = pack(Card::new(Suit::Diamonds, Rank::Nine));
        // strictly between K and 9: Q J T
        let between = set.span(king + 1, nine);
        assert_eq!(between.len(), 3);
        assert!(between.has(pack(Card::new(Suit::Diamonds, Rank::Queen))));
        assert!(between.has(pack(Card::new(Suit::Diamonds, Rank::Ten))));
    }

    #[test]
    fn test_set_algebra() {
        let mut a = CardSet::EMPTY;
        a.insert(0);
        a.insert(5);
        let mut b = CardSet::EMPTY;
        b.insert(5);
        b.insert(40);

        assert_eq!((a | b).len(), 3);
        assert_eq!((a & b).len(), 1);
        assert_eq!(a.minus(b).len(), 1);
        assert!((!a).len() == 50);
        assert!(a.contains(CardSet::only(5)));
        assert!(!a.contains(b));
    }

    #[test]
    fn test_iteration_high_to_low_within_suit() {
        let mut set = CardSet::EMPTY;
        set.insert(pack(Card::new(Suit::Clubs, Rank::Four)));
        set.insert(pack(Card::new(Suit::Clubs, Rank::Jack)));
        set.insert(pack(Card::new(Suit::Clubs, Rank::Ace)));

        let ranks: Vec<Rank> = set.iter().map(|p| unpack(p).rank).collect();
        assert_eq!(ranks, vec![Rank::Ace, Rank::Jack, Rank::Four]);
    }

    #[test]
    fn test_take_requires_presence() {
        let mut set = CardSet::only(17);
        set.take(17);
        assert!(set.is_empty());
    }
}
