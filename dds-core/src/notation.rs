use std::fmt;

use crate::{Card, Deal, Hand, Rank, Seat, Suit};

/// Error type for deal-notation parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationError {
    pub message: String,
}

impl NotationError {
    fn new(message: impl Into<String>) -> Self {
        NotationError {
            message: message.into(),
        }
    }
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "deal notation error: {}", self.message)
    }
}

impl std::error::Error for NotationError {}

impl Deal {
    /// Parse the standard hand layout, e.g.
    /// `N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72`.
    ///
    /// Hands run clockwise from the named seat; suits within a hand are
    /// dot-separated in spades-hearts-diamonds-clubs order, with a void as
    /// an empty field or `-`. Duplicate cards are rejected here; the
    /// 13-cards-per-hand rule is not (endgame positions are legal input for
    /// the solver), so full-deal callers follow up with `validate`.
    pub fn from_notation(input: &str) -> Result<Deal, NotationError> {
        let trimmed = input.trim();
        let (seat_str, hands_str) = trimmed
            .split_once(':')
            .ok_or_else(|| NotationError::new("expected <seat>: prefix"))?;

        let mut seat_chars = seat_str.trim().chars();
        let first_seat = seat_chars
            .next()
            .and_then(Seat::from_char)
            .filter(|_| seat_chars.next().is_none())
            .ok_or_else(|| NotationError::new(format!("invalid seat {:?}", seat_str.trim())))?;

        let hand_fields: Vec<&str> = hands_str.split_whitespace().collect();
        if hand_fields.len() != 4 {
            return Err(NotationError::new(format!(
                "expected 4 hands, got {}",
                hand_fields.len()
            )));
        }

        let mut deal = Deal::new();
        let mut seat = first_seat;
        for field in hand_fields {
            let hand = parse_hand(field)?;
            for card in hand.cards() {
                if deal_contains(&deal, card) {
                    return Err(NotationError::new(format!("card {} appears twice", card)));
                }
            }
            *deal.hand_mut(seat) = hand;
            seat = seat.next();
        }

        Ok(deal)
    }

    /// Format in the layout `from_notation` accepts, hands clockwise from
    /// `first_seat`, voids as empty fields.
    pub fn to_notation(&self, first_seat: Seat) -> String {
        let mut out = String::new();
        out.push(first_seat.to_char());
        out.push(':');
        let mut seat = first_seat;
        for i in 0..4 {
            if i > 0 {
                out.push(' ');
            }
            format_hand(self.hand(seat), &mut out);
            seat = seat.next();
        }
        out
    }
}

fn deal_contains(deal: &Deal, card: Card) -> bool {
    Seat::ALL.iter().any(|&seat| deal.hand(seat).contains(card))
}

/// Suits within one hand field, notation order (spades first)
const FIELD_SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

fn parse_hand(field: &str) -> Result<Hand, NotationError> {
    let groups: Vec<&str> = field.split('.').collect();
    if groups.len() != 4 {
        return Err(NotationError::new(format!(
            "expected 4 dot-separated suits in {:?}, got {}",
            field,
            groups.len()
        )));
    }

    let mut hand = Hand::new();
    for (&suit, group) in FIELD_SUITS.iter().zip(groups) {
        if group.is_empty() || group == "-" {
            continue;
        }
        for c in group.chars() {
            let rank = Rank::from_char(c)
                .ok_or_else(|| NotationError::new(format!("invalid rank character {:?}", c)))?;
            let card = Card::new(suit, rank);
            if hand.contains(card) {
                return Err(NotationError::new(format!("card {} appears twice", card)));
            }
            hand.add(card);
        }
    }
    Ok(hand)
}

fn format_hand(hand: &Hand, out: &mut String) {
    for (i, &suit) in FIELD_SUITS.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        for rank in hand.suit(suit).iter() {
            out.push(rank.to_char());
        }
    }
}
