//! Follow-suit rules and trick resolution.

use dds_core::Seat;

use crate::board::Hands;
use crate::cards::{outranks, suit_of, CardSet};

/// The legal plays for `seat`: cards of the led suit when any are held,
/// otherwise the whole hand (discarding and ruffing included).
#[inline]
pub(crate) fn playable_cards(hands: &Hands, seat: Seat, lead_suit: Option<usize>) -> CardSet {
    let hand = hands.hand(seat);
    if let Some(suit) = lead_suit {
        let followers = hand.suit(suit);
        if !followers.is_empty() {
            return followers;
        }
    }
    hand
}

/// True when playing `card` takes the trick from `winning`: higher rank in
/// the same suit, or a trump against a non-trump. A side-suit discard never
/// wins.
#[inline]
pub(crate) fn wins_over(card: usize, winning: usize, trump: Option<usize>) -> bool {
    let s1 = suit_of(card);
    let s2 = suit_of(winning);
    if s1 == s2 {
        return outranks(card, winning);
    }
    match trump {
        Some(t) => s1 == t,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::pack;
    use dds_core::{Card, Deal, Rank, Suit};

    fn packed(suit: Suit, rank: Rank) -> usize {
        pack(Card::new(suit, rank))
    }

    #[test]
    fn test_must_follow_when_holding_led_suit() {
        let deal = Deal::from_notation("N:AK2.4.. QJ3.5.. .AK2.. .QJ3..").unwrap();
        let hands = Hands::from_deal(&deal);

        let spades = Suit::Spades.index();
        let legal = playable_cards(&hands, Seat::North, Some(spades));
        assert_eq!(legal.len(), 3);
        assert_eq!(legal, hands.hand(Seat::North).suit(spades));
    }

    #[test]
    fn test_void_frees_whole_hand() {
        let deal = Deal::from_notation("N:AK2.4.. QJ3.5.. .AK2.. .QJ3..").unwrap();
        let hands = Hands::from_deal(&deal);

        let legal = playable_cards(&hands, Seat::South, Some(Suit::Spades.index()));
        assert_eq!(legal, hands.hand(Seat::South));
        assert_eq!(legal.len(), 3);
    }

    #[test]
    fn test_leader_may_play_anything() {
        let deal = Deal::from_notation("N:AK2.4.. QJ3.5.. .AK2.. .QJ3..").unwrap();
        let hands = Hands::from_deal(&deal);
        let legal = playable_cards(&hands, Seat::North, None);
        assert_eq!(legal, hands.hand(Seat::North));
    }

    #[test]
    fn test_wins_over_same_suit_by_rank() {
        let ace = packed(Suit::Hearts, Rank::Ace);
        let king = packed(Suit::Hearts, Rank::King);
        assert!(wins_over(ace, king, None));
        assert!(!wins_over(king, ace, None));
    }

    #[test]
    fn test_trump_beats_plain_suit() {
        let trump = Some(Suit::Clubs.index());
        let club_two = packed(Suit::Clubs, Rank::Two);
        let spade_ace = packed(Suit::Spades, Rank::Ace);
        assert!(wins_over(club_two, spade_ace, trump));
        assert!(!wins_over(spade_ace, club_two, trump));
    }

    #[test]
    fn test_discard_never_wins_at_no_trump() {
        let heart_ace = packed(Suit::Hearts, Rank::Ace);
        let spade_two = packed(Suit::Spades, Rank::Two);
        assert!(!wins_over(heart_ace, spade_two, None));
    }
}
