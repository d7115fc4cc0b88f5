use std::fmt;

use crate::{Rank, Suit};

/// A single playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    /// Create a new card
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Card { suit, rank }
    }

    /// Create a card from a deck index (0-51), suit-major with ranks ascending
    pub fn from_index(index: u8) -> Option<Self> {
        if index >= 52 {
            return None;
        }
        let suit = Suit::from_index(index / 13)?;
        let rank = Rank::from_index(index % 13)?;
        Some(Card::new(suit, rank))
    }

    /// Deck index (0-51): `suit * 13 + (rank - 2)`
    pub fn index(self) -> usize {
        self.suit.index() * 13 + self.rank.index()
    }

    /// High card points of this card
    pub fn hcp(self) -> u8 {
        self.rank.hcp()
    }

    /// Parse a two-character card like "SA" or "h7"
    pub fn from_chars(suit: char, rank: char) -> Option<Self> {
        Some(Card::new(Suit::from_char(suit)?, Rank::from_char(rank)?))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit.to_char(), self.rank.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for index in 0..52u8 {
            let card = Card::from_index(index).unwrap();
            assert_eq!(card.index(), index as usize);
        }
        assert_eq!(Card::from_index(52), None);
    }

    #[test]
    fn test_display_and_parse() {
        let card = Card::new(Suit::Spades, Rank::Ace);
        assert_eq!(card.to_string(), "SA");
        assert_eq!(Card::from_chars('S', 'A'), Some(card));
        assert_eq!(Card::from_chars('s', 'a'), Some(card));
        assert_eq!(Card::from_chars('X', 'A'), None);
        assert_eq!(Card::from_chars('S', '1'), None);
    }

    #[test]
    fn test_hcp() {
        assert_eq!(Card::new(Suit::Hearts, Rank::King).hcp(), 3);
        assert_eq!(Card::new(Suit::Clubs, Rank::Five).hcp(), 0);
    }
}
