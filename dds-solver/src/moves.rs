//! Candidate-play generation: ordering heuristics and equivalence collapsing.
//!
//! The search only ever branches on one representative of each class of
//! interchangeable cards, and examines candidates in an order chosen to
//! produce cutoffs early. Ordering is a pure heuristic; any order yields the
//! same trick count, only different node counts.

use dds_core::Seat;

use crate::board::Hands;
use crate::cards::{outranks, suit_of, CardSet, NUM_SUITS, TOTAL_TRICKS};
use crate::trick::wins_over;

/// Fixed-capacity ordered list of candidate plays. At most 13 cards are ever
/// distinct candidates for one decision (one suit's worth).
pub(crate) struct OrderedPlays {
    cards: [u8; TOTAL_TRICKS],
    count: usize,
}

impl OrderedPlays {
    #[inline]
    pub fn new() -> OrderedPlays {
        OrderedPlays {
            cards: [0; TOTAL_TRICKS],
            count: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, packed: usize) {
        self.cards[self.count] = packed as u8;
        self.count += 1;
    }

    /// Append highest rank first.
    #[inline]
    fn push_high_first(&mut self, cards: CardSet) {
        for packed in cards.iter() {
            self.push(packed);
        }
    }

    /// Append lowest rank first.
    #[inline]
    fn push_low_first(&mut self, cards: CardSet) {
        let mut rest = cards;
        while !rest.is_empty() {
            let packed = rest.bottom();
            self.push(packed);
            rest.take(packed);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn card(&self, i: usize) -> usize {
        self.cards[i] as usize
    }
}

/// Two cards of one suit are interchangeable when no card of intervening
/// rank is live in any hand, or when every intervening live card sits in the
/// player's own hand. Given the cards already branched on (`tried_suit`),
/// `card` adds nothing new if it is equivalent to one of them.
pub(crate) fn is_equivalent(
    card: usize,
    tried_suit: CardSet,
    my_hand: CardSet,
    all_cards: CardSet,
) -> bool {
    let suit = suit_of(card);
    let tried = tried_suit.suit(suit);
    if tried.is_empty() {
        return false;
    }
    let all_suit = all_cards.suit(suit);
    let my_suit = my_hand.suit(suit);

    // nearest tried card above: equivalent if every live card between them
    // is ours to play anyway
    let above = tried.span(0, card);
    if !above.is_empty() {
        let closest = above.bottom();
        let live_between = all_suit.span(closest + 1, card);
        if live_between == my_suit.span(closest + 1, card) {
            return true;
        }
    }

    // nearest tried card below
    let below = tried.span(card + 1, (suit + 1) * 13);
    if !below.is_empty() {
        let closest = below.top();
        let live_between = all_suit.span(card + 1, closest);
        if live_between == my_suit.span(card + 1, closest) {
            return true;
        }
    }

    false
}

/// Order the candidates for a player on lead.
///
/// Classes, strongest first: leads that let partner ruff, finesse positions
/// through the left-hand opponent, contested top-honor suits, plain
/// top-or-bottom leads, leads into the right-hand opponent's tenace, and
/// trump leads last. Only the top and bottom of each suit enter the classed
/// groups; everything else trails in rank order for completeness.
pub(crate) fn order_leads(
    playable: CardSet,
    hands: &Hands,
    seat: Seat,
    trump: Option<usize>,
    all_cards: CardSet,
) -> OrderedPlays {
    let mut ordered = OrderedPlays::new();
    let mut rest = playable;

    let pd_hand = hands.hand(seat.partner());
    let lho_hand = hands.hand(seat.lho());
    let rho_hand = hands.hand(seat.rho());
    let our_cards = hands.partnership(seat);

    let mut ruff_leads = CardSet::EMPTY;
    let mut good_leads = CardSet::EMPTY;
    let mut high_leads = CardSet::EMPTY;
    let mut normal_leads = CardSet::EMPTY;
    let mut bad_leads = CardSet::EMPTY;
    let mut trump_leads = CardSet::EMPTY;

    for suit in 0..NUM_SUITS {
        let my_suit = playable.suit(suit);
        if my_suit.is_empty() {
            continue;
        }

        if trump == Some(suit) {
            trump_leads.insert(my_suit.top());
            if my_suit.len() > 1 {
                trump_leads.insert(my_suit.bottom());
            }
            continue;
        }

        // suits a defending opponent can ruff are not worth classing
        if let Some(t) = trump {
            if !lho_hand.suit(t).is_empty() && lho_hand.suit(suit).is_empty() {
                continue;
            }
            if !rho_hand.suit(t).is_empty() && rho_hand.suit(suit).is_empty() {
                continue;
            }
        }

        let pd_suit = pd_hand.suit(suit);
        let lho_suit = lho_hand.suit(suit);
        let rho_suit = rho_hand.suit(suit);
        let all_suit = all_cards.suit(suit);

        // top five live cards of the suit, by relative rank
        let a = all_suit.top();
        let mut live = all_suit;
        live.take(a);
        let k = if live.is_empty() { a } else { live.top() };
        if !live.is_empty() {
            live.take(k);
        }
        let q = if live.is_empty() { k } else { live.top() };
        if !live.is_empty() {
            live.take(q);
        }
        let j = if live.is_empty() { q } else { live.top() };
        if !live.is_empty() {
            live.take(j);
        }
        let t = if live.is_empty() { j } else { live.top() };

        let our_suit = my_suit | pd_suit;

        // finesse through LHO: partner's honor sits over LHO's higher one
        if pd_suit.len() >= 2 && lho_suit.len() >= 2 {
            let qj = CardSet::only(q) | CardSet::only(j);
            let jt = CardSet::only(j) | CardSet::only(t);
            if (pd_suit.has(k) && lho_suit.has(a))
                || (pd_suit.has(a) && lho_suit.has(k) && (pd_suit.has(q) || our_suit.contains(qj)))
                || (pd_suit.has(k) && lho_suit.has(q) && (pd_suit.has(j) || our_suit.contains(jt)))
            {
                good_leads.insert(my_suit.top());
                if my_suit.len() > 1 {
                    good_leads.insert(my_suit.bottom());
                }
                continue;
            }
        }

        // leading into RHO's higher honor costs a trick
        if my_suit.len() >= 2
            && rho_suit.len() >= 2
            && ((my_suit.has(a) && rho_suit.has(k))
                || (my_suit.has(k) && rho_suit.has(a) && !our_cards.has(q)))
        {
            if trump.is_some() {
                bad_leads.insert(my_suit.top());
                if my_suit.len() > 1 {
                    bad_leads.insert(my_suit.bottom());
                }
            }
            continue;
        }

        // contested suit where we hold most of the top honors
        let akq = CardSet::only(a) | CardSet::only(k) | CardSet::only(q);
        if !lho_suit.is_empty() && !rho_suit.is_empty() && (our_cards & akq).len() >= 2 {
            high_leads.insert(my_suit.top());
            if my_suit.len() > 1 {
                high_leads.insert(my_suit.bottom());
            }
            continue;
        }

        // partner is void and still has trumps to spare
        if let Some(t) = trump {
            if pd_suit.is_empty()
                && !lho_suit.is_empty()
                && !rho_suit.is_empty()
                && !pd_hand.suit(t).is_empty()
                && pd_hand.suit(t).len() <= playable.suit(t).len()
                && my_suit.bottom() != a
            {
                ruff_leads.insert(my_suit.bottom());
                continue;
            }
        }

        normal_leads.insert(my_suit.top());
        if my_suit.len() > 1 {
            normal_leads.insert(my_suit.bottom());
        }
    }

    if trump.is_some() {
        ordered.push_high_first(ruff_leads);
        rest = rest.minus(ruff_leads);
    }
    ordered.push_high_first(good_leads);
    rest = rest.minus(good_leads);
    ordered.push_high_first(high_leads);
    rest = rest.minus(high_leads);
    ordered.push_high_first(normal_leads);
    rest = rest.minus(normal_leads);
    if trump.is_some() {
        ordered.push_high_first(bad_leads);
        rest = rest.minus(bad_leads);
        ordered.push_high_first(trump_leads);
        rest = rest.minus(trump_leads);
    }
    ordered.push_high_first(rest);

    ordered
}

/// Order the candidates for a player following to a trick (second, third or
/// fourth to play).
pub(crate) fn order_follows(
    playable: CardSet,
    hands: &Hands,
    seat: Seat,
    trump: Option<usize>,
    lead_suit: usize,
    winning_seat: Seat,
    winning_card: usize,
    position_in_trick: usize,
) -> OrderedPlays {
    let mut ordered = OrderedPlays::new();

    let pd_suit = hands.hand(seat.partner()).suit(lead_suit);
    let lho_suit = hands.hand(seat.lho()).suit(lead_suit);

    let trick_ending = position_in_trick == 3;
    let second_to_play = position_in_trick == 1;

    let my_suit = playable.suit(lead_suit);
    if !my_suit.is_empty() {
        // cannot beat the current winner: concede from the bottom
        if !wins_over(my_suit.top(), winning_card, trump) {
            ordered.push_low_first(playable);
            return ordered;
        }

        // partner already holds the trick
        if winning_seat == seat.partner() {
            if trick_ending
                || lho_suit.is_empty()
                || outranks(winning_card, lho_suit.top())
                || lho_suit.span(0, winning_card) == lho_suit.span(0, my_suit.top())
            {
                ordered.push_low_first(playable);
                return ordered;
            }
        }

        // second to play: duck when partner's top covers whatever we could
        if second_to_play && !pd_suit.is_empty() && outranks(pd_suit.top(), winning_card) {
            let combined = pd_suit | my_suit;
            if !lho_suit.is_empty()
                && outranks(lho_suit.top(), combined.top())
                && lho_suit.span(0, pd_suit.top()) == lho_suit.span(0, my_suit.top())
            {
                ordered.push_low_first(playable);
                return ordered;
            }
            if lho_suit.is_empty() || outranks(pd_suit.top(), lho_suit.top()) {
                ordered.push_low_first(playable);
                return ordered;
            }
        }

        let covering = my_suit.span(0, winning_card);
        let conceding = my_suit.minus(covering);

        if trick_ending || lho_suit.is_empty() || outranks(covering.bottom(), lho_suit.top()) {
            // the cheapest covering card already holds
            ordered.push_low_first(covering);
        } else {
            ordered.push_high_first(covering);
        }
        ordered.push_low_first(conceding);
        return ordered;
    }

    // void in the led suit: ruff, overruff, or discard
    if let Some(t) = trump {
        let my_trumps = playable.suit(t);
        if !my_trumps.is_empty() {
            let lho_has_trumps = !hands.hand(seat.lho()).suit(t).is_empty();
            let partner_winning = winning_seat == seat.partner();

            if partner_winning
                && (trick_ending
                    || (!lho_suit.is_empty() && wins_over(winning_card, lho_suit.top(), trump)))
            {
                // partner keeps the trick without our trump
            } else if suit_of(winning_card) == t {
                if winning_seat != seat.partner() && wins_over(my_trumps.top(), winning_card, trump)
                {
                    let overruffs = my_trumps.span(my_trumps.top(), winning_card);
                    ordered.push_low_first(overruffs);
                    push_discards(&mut ordered, playable.minus(overruffs), trump);
                    return ordered;
                }
            } else if trick_ending || !lho_suit.is_empty() || !lho_has_trumps {
                // the cheapest trump is already good
                ordered.push(my_trumps.bottom());
                push_discards(&mut ordered, playable.minus(CardSet::only(my_trumps.bottom())), trump);
                return ordered;
            } else {
                ordered.push_low_first(my_trumps);
                push_discards(&mut ordered, playable.minus(my_trumps), trump);
                return ordered;
            }
        }
    }

    push_discards(&mut ordered, playable, trump);
    ordered
}

/// Discard ordering: the bottom card of each non-trump suit, longest suits
/// first, then whatever is left.
fn push_discards(ordered: &mut OrderedPlays, playable: CardSet, trump: Option<usize>) {
    let mut rest = playable;
    let mut discards: [(usize, usize); NUM_SUITS] = [(0, 0); NUM_SUITS];
    let mut count = 0;

    for suit in 0..NUM_SUITS {
        if trump == Some(suit) {
            continue;
        }
        let in_suit = rest.suit(suit);
        if !in_suit.is_empty() {
            discards[count] = (in_suit.bottom(), in_suit.len());
            count += 1;
            rest.take(in_suit.bottom());
        }
    }

    discards[..count].sort_by(|a, b| b.1.cmp(&a.1));
    for &(card, _) in &discards[..count] {
        ordered.push(card);
    }
    ordered.push_high_first(rest);
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
    fn test_touching_cards_are_equivalent() {
        // North holds KQ of spades, the jack is gone: K and Q interchangeable
        let deal = Deal::from_notation("N:KQ... A92... T3... 8765...").unwrap();
        let hands = Hands::from_deal(&deal);
        let all = hands.all_cards();
        let north = hands.hand(Seat::North);

        let king = packed(Suit::Spades, Rank::King);
        let queen = packed(Suit::Spades, Rank::Queen);

        let mut tried = CardSet::EMPTY;
        assert!(!is_equivalent(king, tried, north, all));
        tried.insert(king);
        assert!(is_equivalent(queen, tried, north, all));
    }

    #[test]
    fn test_live_gap_blocks_equivalence() {
        // North holds K and J; the live queen with East separates them
        let deal = Deal::from_notation("N:KJ... Q92... T3... 8765...").unwrap();
        let hands = Hands::from_deal(&deal);
        let all = hands.all_cards();
        let north = hands.hand(Seat::North);

        let king = packed(Suit::Spades, Rank::King);
        let jack = packed(Suit::Spades, Rank::Jack);

        let mut tried = CardSet::EMPTY;
        tried.insert(king);
        assert!(!is_equivalent(jack, tried, north, all));
    }

    #[test]
    fn test_own_cards_bridge_the_gap() {
        // North holds KQJ: after trying K, J is equivalent (Q is North's own)
        let deal = Deal::from_notation("N:KQJ... A92... T3... 876...").unwrap();
        let hands = Hands::from_deal(&deal);
        let all = hands.all_cards();
        let north = hands.hand(Seat::North);

        let king = packed(Suit::Spades, Rank::King);
        let jack = packed(Suit::Spades, Rank::Jack);

        let mut tried = CardSet::EMPTY;
        tried.insert(king);
        assert!(is_equivalent(jack, tried, north, all));
    }

    #[test]
    fn test_follow_low_when_beaten() {
        // winner is the ace; our QJ3 cannot beat it, lowest first
        let deal = Deal::from_notation("N:QJ3... AK2... 54... 9876...").unwrap();
        let hands = Hands::from_deal(&deal);
        let ace = packed(Suit::Spades, Rank::Ace);

        let playable = hands.hand(Seat::North).suit(Suit::Spades.index());
        let ordered = order_follows(
            playable,
            &hands,
            Seat::North,
            None,
            Suit::Spades.index(),
            Seat::East,
            ace,
            2,
        );
        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered.card(0), packed(Suit::Spades, Rank::Three));
    }

    #[test]
    fn test_ruff_with_cheapest_trump_when_it_holds() {
        // North void in spades, holds trumps; last to play over a spade lead
        let deal = Deal::from_notation("N:.K2.3. A3..4. 54.A.. 2.4.5.").unwrap();
        let hands = Hands::from_deal(&deal);
        let trump = Some(Suit::Hearts.index());
        let lead = packed(Suit::Spades, Rank::Ace);

        let playable = hands.hand(Seat::North);
        let ordered = order_follows(
            playable,
            &hands,
            Seat::North,
            trump,
            Suit::Spades.index(),
            Seat::East,
            lead,
            3,
        );
        // cheapest trump first
        assert_eq!(ordered.card(0), packed(Suit::Hearts, Rank::Two));
    }

    #[test]
    fn test_leads_cover_all_distinct_cards() {
        let deal = Deal::from_notation(
            "N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72",
        )
        .unwrap();
        let hands = Hands::from_deal(&deal);
        let all = hands.all_cards();
        let playable = hands.hand(Seat::North);

        let ordered = order_leads(playable, &hands, Seat::North, None, all);
        // every playable card appears exactly once
        let mut seen = CardSet::EMPTY;
        for i in 0..ordered.len() {
            let card = ordered.card(i);
            assert!(playable.has(card));
            assert!(!seen.has(card));
            seen.insert(card);
        }
        assert_eq!(seen, playable);
    }
}
