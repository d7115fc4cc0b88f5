//! Trick-start pruning bounds.
//!
//! Before branching at a trick boundary the search computes two cheap
//! bounds: tricks the side on lead can cash off the top ("fast" tricks),
//! and tricks the defending side is guaranteed to score eventually ("slow"
//! tricks). Either bound may prove the position without a single card being
//! played. Each estimate also reports the card ranks it relied on, so cached
//! results built from it stay keyed to the ranks that mattered.

use dds_core::Seat;

use crate::board::Hands;
use crate::cards::{outranks, CardSet, NUM_SUITS};

/// Fast tricks one suit contributes, accounting for entries and blockage
/// between the two hands of a partnership.
fn suit_fast_tricks(
    my_suit: CardSet,
    my_winners: usize,
    pd_suit: CardSet,
    pd_winners: usize,
    pd_entry: &mut bool,
) -> usize {
    // my top winner reaches over partner's bottom card, so partner gains
    // an entry in this suit
    if !pd_suit.is_empty() && my_winners > 0 && outranks(my_suit.top(), pd_suit.bottom()) {
        *pd_entry = true;
    }
    if pd_winners == 0 {
        return my_winners;
    }
    // partner's winners only cash if I can lead the suit at all
    if my_winners == 0 {
        return if !my_suit.is_empty() { pd_winners } else { 0 };
    }
    // blocked behind partner
    if !pd_suit.is_empty() && outranks(pd_suit.bottom(), my_suit.top()) {
        return pd_winners;
    }
    // blocked behind me
    if !pd_suit.is_empty() && outranks(my_suit.bottom(), pd_suit.top()) {
        return my_winners;
    }
    // partner with nothing but winners must spend one as a small card
    let pd_usable = if pd_winners == pd_suit.len() {
        pd_winners - 1
    } else {
        pd_winners
    };
    my_suit.len().min(my_winners + pd_usable)
}

/// Consecutive top trumps held by the `seat`/partner pair, capped by the
/// longer trump holding. When one hand owns every outstanding trump the
/// whole holding cashes and no ranks need recording.
fn top_trump_tricks(hands: &Hands, seat: Seat, trump: usize) -> (usize, CardSet) {
    let my_trumps = hands.hand(seat).suit(trump);
    let pd_trumps = hands.hand(seat.partner()).suit(trump);
    let all_trumps = hands.all_cards().suit(trump);

    if my_trumps == all_trumps {
        return (my_trumps.len(), CardSet::EMPTY);
    }
    if pd_trumps == all_trumps {
        return (pd_trumps.len(), CardSet::EMPTY);
    }

    let both = my_trumps | pd_trumps;
    let cap = my_trumps.len().max(pd_trumps.len());
    let mut sure = 0;
    let mut rank_winners = CardSet::EMPTY;

    for card in all_trumps.iter() {
        if both.has(card) && sure < cap {
            sure += 1;
            rank_winners.insert(card);
        } else {
            break;
        }
    }

    (sure, rank_winners)
}

/// Tricks `seat`'s side can cash before losing the lead: top trumps plus
/// running side suits, capped by the hand size and by how long the
/// opponents can follow before ruffing.
pub(crate) fn fast_tricks(
    hands: &Hands,
    seat: Seat,
    trump: Option<usize>,
    max_tricks: usize,
) -> (usize, CardSet) {
    let my_hand = hands.hand(seat);
    let pd_hand = hands.hand(seat.partner());
    let lho_hand = hands.hand(seat.lho());
    let rho_hand = hands.hand(seat.rho());
    let all_cards = hands.all_cards();

    let (trump_tricks, mut rank_winners) = match trump {
        Some(t) => top_trump_tricks(hands, seat, t),
        None => (0, CardSet::EMPTY),
    };

    let mut pd_rank_winners = CardSet::EMPTY;
    let mut my_tricks = 0;
    let mut pd_tricks = 0;
    let mut my_entry = false;
    let mut pd_entry = false;

    for suit in 0..NUM_SUITS {
        if trump == Some(suit) {
            continue;
        }

        let mut my_suit = my_hand.suit(suit);
        let mut pd_suit = pd_hand.suit(suit);
        if my_suit.is_empty() && pd_suit.is_empty() {
            continue;
        }
        let lho_suit = lho_hand.suit(suit);
        let rho_suit = rho_hand.suit(suit);
        let all_suit = all_cards.suit(suit);

        // a winner's rank only matters while some other hand can follow
        let my_rank_cap = pd_suit.len().max(lho_suit.len()).max(rho_suit.len());
        let pd_rank_cap = my_suit.len().max(lho_suit.len()).max(rho_suit.len());

        // in a trump contract a side suit runs only as long as both
        // trump-holding opponents still follow
        if let Some(t) = trump {
            let mut run_length = max_tricks;
            if !lho_hand.suit(t).is_empty() {
                run_length = lho_suit.len();
            }
            if !rho_hand.suit(t).is_empty() {
                run_length = run_length.min(rho_suit.len());
            }
            while my_suit.len() > run_length {
                my_suit.take(my_suit.bottom());
            }
            while pd_suit.len() > run_length {
                pd_suit.take(pd_suit.bottom());
            }
        }

        let mut my_winners = 0;
        let mut pd_winners = 0;
        for card in all_suit.iter() {
            if my_suit.has(card) {
                my_winners += 1;
                if my_winners <= my_rank_cap {
                    rank_winners.insert(card);
                }
            } else if pd_suit.has(card) {
                pd_winners += 1;
                if pd_winners <= pd_rank_cap {
                    pd_rank_winners.insert(card);
                }
            } else {
                break;
            }
        }

        my_tricks += suit_fast_tricks(my_suit, my_winners, pd_suit, pd_winners, &mut my_entry);
        pd_tricks += suit_fast_tricks(pd_suit, pd_winners, my_suit, my_winners, &mut pd_entry);
    }

    let side_suit_tricks = if pd_entry {
        rank_winners = rank_winners | pd_rank_winners;
        my_tricks.max(pd_tricks)
    } else {
        my_tricks
    };

    let total = (trump_tricks + side_suit_tricks).min(my_hand.len());
    (total.min(max_tricks), rank_winners)
}

/// Top trump tricks the opponents of `seat` are guaranteed.
pub(crate) fn opponent_top_trump_tricks(
    hands: &Hands,
    seat: Seat,
    trump: usize,
) -> (usize, CardSet) {
    top_trump_tricks(hands, seat.lho(), trump)
}

/// Slow trump tricks for the opponents of `seat`: finesse positions that
/// score no matter how the play goes. Kx sitting behind the bare-side ace,
/// or Qxx sitting behind ace-king when enough trumps are out.
pub(crate) fn opponent_slow_trump_tricks(
    hands: &Hands,
    seat: Seat,
    trump: usize,
) -> (usize, CardSet) {
    let all_trumps = hands.all_cards().suit(trump);
    if all_trumps.len() < 3 {
        return (0, CardSet::EMPTY);
    }

    // the opponents' two holdings, and our side's seen from theirs
    let opp_a = hands.hand(seat.lho()).suit(trump);
    let opp_b = hands.hand(seat.rho()).suit(trump);
    let our_a = hands.hand(seat.partner()).suit(trump);
    let our_b = hands.hand(seat).suit(trump);

    let a = all_trumps.top();
    let mut remaining = all_trumps;
    remaining.take(a);
    if remaining.is_empty() {
        return (0, CardSet::EMPTY);
    }
    let k = remaining.top();
    remaining.take(k);

    let mut ak = CardSet::only(a);
    ak.insert(k);

    // Kx behind the ace
    if (opp_b.has(k) && opp_b.len() > 1 && our_a.has(a))
        || (opp_a.has(k) && opp_a.len() > 1 && our_b.has(a))
    {
        return (1, ak);
    }

    // Qxx behind ace-king
    if !remaining.is_empty() && all_trumps.len() >= 5 {
        let q = remaining.top();
        let mut akq = ak;
        akq.insert(q);

        let our_a_has_ak = our_a.has(a) && our_a.has(k);
        let our_b_has_ak = our_b.has(a) && our_b.has(k);
        if (opp_b.has(q) && opp_b.len() >= 3 && our_a_has_ak)
            || (opp_a.has(q) && opp_a.len() >= 3 && our_b_has_ak)
        {
            return (1, akq);
        }
    }

    (0, CardSet::EMPTY)
}

/// Slow tricks the opponents of `seat` must eventually score at notrump
/// (or in a trump contract once no trump is left): top cards they hold in
/// every suit `seat` can lead. One such card is a certain trick; if one
/// opponent holds all of them, each is.
pub(crate) fn opponent_slow_tricks(hands: &Hands, seat: Seat) -> (usize, CardSet) {
    let my_hand = hands.hand(seat);
    let our_side = hands.partnership(seat);
    let all_cards = hands.all_cards();

    let mut rank_winners = CardSet::EMPTY;
    for suit in 0..NUM_SUITS {
        if my_hand.suit(suit).is_empty() {
            continue;
        }
        let top = all_cards.suit(suit).top();
        // an exit suit our side tops kills the squeeze on us
        if our_side.has(top) {
            return (0, CardSet::EMPTY);
        }
        rank_winners.insert(top);
    }

    if rank_winners.is_empty() {
        return (0, CardSet::EMPTY);
    }

    let lho_hand = hands.hand(seat.lho());
    let rho_hand = hands.hand(seat.rho());
    if lho_hand.contains(rank_winners) || rho_hand.contains(rank_winners) {
        (rank_winners.len(), rank_winners)
    } else {
        (1, rank_winners)
    }
}
