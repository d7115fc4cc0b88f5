//! Four-hand board state, the search's working copy of a deal.

use std::fmt;

use dds_core::{Card, Deal, Hand, Seat};

use crate::cards::{pack, unpack, CardSet};

/// One `CardSet` per seat. Copyable and allocation-free; the search mutates
/// its own `Hands` and restores it on unwind, the caller's `Deal` is never
/// touched.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Hands {
    hands: [CardSet; 4],
}

impl Hands {
    pub fn from_deal(deal: &Deal) -> Hands {
        let mut hands = Hands::default();
        for seat in Seat::ALL {
            for card in deal.hand(seat).cards() {
                hands.hands[seat.index()].insert(pack(card));
            }
        }
        hands
    }

    pub fn to_deal(&self) -> Deal {
        let mut deal = Deal::new();
        for seat in Seat::ALL {
            let cards: Vec<Card> = self.hand(seat).iter().map(unpack).collect();
            *deal.hand_mut(seat) = Hand::from_cards(&cards);
        }
        deal
    }

    #[inline]
    pub fn hand(&self, seat: Seat) -> CardSet {
        self.hands[seat.index()]
    }

    #[inline]
    pub fn hand_mut(&mut self, seat: Seat) -> &mut CardSet {
        &mut self.hands[seat.index()]
    }

    #[inline]
    pub fn all_cards(&self) -> CardSet {
        self.hands[0] | self.hands[1] | self.hands[2] | self.hands[3]
    }

    #[inline]
    pub fn partnership(&self, seat: Seat) -> CardSet {
        self.hand(seat) | self.hand(seat.partner())
    }

    /// Tricks remaining with all four hands level: the largest hand size
    /// (hands that already played to an open trick are one short).
    #[inline]
    pub fn tricks_remaining(&self) -> usize {
        self.hands.iter().map(|h| h.len()).max().unwrap_or(0)
    }
}

impl fmt::Debug for Hands {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for seat in Seat::ALL {
            writeln!(f, "{}: {:?}", seat.to_char(), self.hand(seat))?;
        }
        Ok(())
    }
}
