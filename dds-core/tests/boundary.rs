//! Boundary validation flow: text notation in, full-deal invariants checked
//! before anything downstream runs.

use dds_core::{Card, Deal, DealError, Rank, Seat, Suit};

#[test]
fn test_notation_then_validate_accepts_legal_deal() {
    let deal = Deal::from_notation(
        "N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72",
    )
    .unwrap();
    assert_eq!(deal.validate(), Ok(()));
    assert_eq!(deal.card_count(), 52);
}

#[test]
fn test_fourteen_twelve_split_is_rejected_before_search() {
    // North was dealt West's club deuce: 14 cards against 12
    let deal = Deal::from_notation(
        "N:AKQT3.J6.KJ42.952 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ7",
    )
    .unwrap();
    assert_eq!(
        deal.validate(),
        Err(DealError::HandSize {
            seat: Seat::North,
            count: 14
        })
    );
}

#[test]
fn test_duplicate_across_hands_is_rejected() {
    // the heart jack appears in both North and East
    let deal = Deal::from_notation(
        "N:AKQT3.J6.KJ42.95 652.AKJ2.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72",
    );
    match deal {
        Err(err) => assert!(err.message.contains("appears twice")),
        Ok(deal) => panic!("expected rejection, parsed {:?}", deal),
    }
}

#[test]
fn test_error_messages_name_the_offender() {
    let err = DealError::HandSize {
        seat: Seat::West,
        count: 12,
    };
    assert_eq!(err.to_string(), "W holds 12 cards, expected 13");

    let err = DealError::DuplicateCard(Card::new(Suit::Hearts, Rank::Jack));
    assert_eq!(err.to_string(), "card HJ dealt more than once");
}
