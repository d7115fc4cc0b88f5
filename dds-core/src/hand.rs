use crate::{Card, RankSet, Suit};

/// One player's holding: a RankSet per suit.
///
/// During play a hand only ever shrinks, one card at a time; `remove` carries
/// the RankSet precondition that the card is actually held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hand {
    suits: [RankSet; 4],
}

impl Hand {
    /// Create an empty hand
    pub fn new() -> Self {
        Hand {
            suits: [RankSet::empty(); 4],
        }
    }

    /// Build a hand from a slice of distinct cards
    pub fn from_cards(cards: &[Card]) -> Self {
        let mut hand = Hand::new();
        for &card in cards {
            hand.add(card);
        }
        hand
    }

    /// The holding in one suit
    pub fn suit(&self, suit: Suit) -> RankSet {
        self.suits[suit.index()]
    }

    /// Replace the holding in one suit
    pub fn set_suit(&mut self, suit: Suit, ranks: RankSet) {
        self.suits[suit.index()] = ranks;
    }

    /// Add a card that must not already be held
    pub fn add(&mut self, card: Card) {
        self.suits[card.suit.index()].add(card.rank);
    }

    /// Remove a card that must be held
    pub fn remove(&mut self, card: Card) {
        self.suits[card.suit.index()].remove(card.rank);
    }

    /// Membership test
    pub fn contains(&self, card: Card) -> bool {
        self.suits[card.suit.index()].test(card.rank)
    }

    /// Total number of cards held
    pub fn len(&self) -> u8 {
        self.suits.iter().map(|s| s.count()).sum()
    }

    /// True when no cards remain
    pub fn is_empty(&self) -> bool {
        self.suits.iter().all(|s| s.none())
    }

    /// Number of cards held in one suit
    pub fn suit_length(&self, suit: Suit) -> u8 {
        self.suit(suit).count()
    }

    /// High card points of the whole hand
    pub fn hcp(&self) -> u8 {
        Suit::ALL
            .iter()
            .map(|&suit| self.suit(suit).iter().map(|r| r.hcp()).sum::<u8>())
            .sum()
    }

    /// Iterate held cards, spades first, high to low within each suit
    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        Suit::ALL.iter().rev().flat_map(move |&suit| {
            self.suit(suit).iter().map(move |rank| Card::new(suit, rank))
        })
    }
}
