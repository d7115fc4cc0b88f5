use std::fmt;

use crate::{Card, Hand, RankSet, Seat, Suit};

/// Validation faults for a full 52-card deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealError {
    /// A hand holds the wrong number of cards (every hand must hold 13)
    HandSize { seat: Seat, count: u8 },
    /// The same card appears in two hands
    DuplicateCard(Card),
}

impl fmt::Display for DealError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DealError::HandSize { seat, count } => {
                write!(f, "{} holds {} cards, expected 13", seat.to_char(), count)
            }
            DealError::DuplicateCard(card) => {
                write!(f, "card {} dealt more than once", card)
            }
        }
    }
}

impl std::error::Error for DealError {}

/// A position: one hand per seat.
///
/// A deal handed to a solve request is never mutated; the search works on
/// its own copy. Construction does not validate on its own — callers that
/// require a legal 52-card deal run `validate` at the boundary, while
/// endgame positions (fewer cards, still one per seat per trick) skip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deal {
    hands: [Hand; 4],
}

impl Deal {
    /// Create a deal of four empty hands
    pub fn new() -> Self {
        Deal {
            hands: [Hand::new(); 4],
        }
    }

    /// Build from four hands in Seat::ALL order (N, E, S, W)
    pub fn from_hands(hands: [Hand; 4]) -> Self {
        Deal { hands }
    }

    /// The hand at one seat
    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.hands[seat.index()]
    }

    /// Mutable access to the hand at one seat
    pub fn hand_mut(&mut self, seat: Seat) -> &mut Hand {
        &mut self.hands[seat.index()]
    }

    /// Total cards across all four hands
    pub fn card_count(&self) -> u8 {
        self.hands.iter().map(|h| h.len()).sum()
    }

    /// Check the full-deal invariant: 13 cards per hand and the four hands
    /// partition the 52 cards. Duplicates are reported before omissions,
    /// which cannot occur once sizes and disjointness hold.
    pub fn validate(&self) -> Result<(), DealError> {
        for seat in Seat::ALL {
            let count = self.hand(seat).len();
            if count != 13 {
                return Err(DealError::HandSize { seat, count });
            }
        }
        self.validate_disjoint()
    }

    /// Check that no card appears in two hands (also required of endgame
    /// positions, which need not total 52 cards).
    pub fn validate_disjoint(&self) -> Result<(), DealError> {
        for suit in Suit::ALL {
            let mut seen = RankSet::empty();
            for seat in Seat::ALL {
                let held = self.hand(seat).suit(suit);
                let clash = seen & held;
                if let Some(rank) = clash.highest() {
                    return Err(DealError::DuplicateCard(Card::new(suit, rank)));
                }
                seen |= held;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rank;

    fn full_deal() -> Deal {
        // deal the deck around the table, one card per seat in rotation
        let mut deal = Deal::new();
        let mut seat = Seat::North;
        for index in 0..52u8 {
            deal.hand_mut(seat).add(Card::from_index(index).unwrap());
            seat = seat.next();
        }
        deal
    }

    #[test]
    fn test_round_robin_deal_is_valid() {
        let deal = full_deal();
        assert_eq!(deal.card_count(), 52);
        assert_eq!(deal.validate(), Ok(()));
    }

    #[test]
    fn test_wrong_hand_size_rejected() {
        let mut deal = full_deal();
        // move one card from West to North: 14 and 12
        let moved = Card::new(Suit::Spades, Rank::Ace);
        assert!(deal.hand(Seat::West).contains(moved));
        deal.hand_mut(Seat::West).remove(moved);
        deal.hand_mut(Seat::North).add(moved);

        assert_eq!(
            deal.validate(),
            Err(DealError::HandSize {
                seat: Seat::North,
                count: 14
            })
        );
    }

    #[test]
    fn test_duplicate_card_rejected() {
        let mut deal = full_deal();
        // swap one of East's cards for a copy of a North card
        let dup = Card::new(Suit::Clubs, Rank::Two);
        let discard = Card::new(Suit::Clubs, Rank::Three);
        assert!(deal.hand(Seat::North).contains(dup));
        assert!(deal.hand(Seat::East).contains(discard));
        deal.hand_mut(Seat::East).remove(discard);
        deal.hand_mut(Seat::East).add(dup); // now in two hands

        assert_eq!(deal.validate(), Err(DealError::DuplicateCard(dup)));
    }
}
