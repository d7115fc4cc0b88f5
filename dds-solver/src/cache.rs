//! Cutoff-card memo.
//!
//! Remembers, per hashed decision point and per seat, which card last
//! produced a beta cutoff there. On revisit that card is tried first,
//! before any ordering heuristics run. Storing a stale or wrong card only
//! costs nodes, so entries carry no bounds and are never invalidated.

use dds_core::Seat;

use crate::board::Hands;
use crate::cards::{CardSet, TOTAL_CARDS};

pub(crate) const HASH_RAND: [u64; 2] = [0x9b8b4567327b23c7, 0x643c986966334873];

const NO_CARD: u8 = 255;

#[derive(Clone)]
struct CutoffEntry {
    hash: u64,
    card: [u8; 4],
}

/// Open-addressed table with linear probing, growing at 75% load. Indexing
/// uses the top hash bits so a grown table keeps entries near their old
/// relative positions.
pub struct CutoffCache {
    entries: Box<[CutoffEntry]>,
    bits: u32,
    mask: usize,
    probe_distance: usize,
    load_count: usize,
}

impl CutoffCache {
    pub fn new(bits: u32) -> CutoffCache {
        let size = 1usize << bits;
        let empty = CutoffEntry {
            hash: 0,
            card: [NO_CARD; 4],
        };
        CutoffCache {
            entries: vec![empty; size].into_boxed_slice(),
            bits,
            mask: size - 1,
            probe_distance: 0,
            load_count: 0,
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash >> (64 - self.bits)) as usize
    }

    pub(crate) fn lookup(&self, hash: u64, seat: Seat) -> Option<usize> {
        let base = self.index(hash);
        for d in 0..self.probe_distance {
            let entry = &self.entries[(base + d) & self.mask];
            if entry.hash == hash {
                let card = entry.card[seat.index()];
                return if card != NO_CARD {
                    Some(card as usize)
                } else {
                    None
                };
            }
            if entry.hash == 0 {
                break;
            }
        }
        None
    }

    pub(crate) fn store(&mut self, hash: u64, seat: Seat, card: usize) {
        let size = self.mask + 1;
        if self.load_count >= size / 4 * 3 {
            self.grow();
        }

        let base = self.index(hash);
        for d in 0.. {
            let entry = &mut self.entries[(base + d) & self.mask];
            if entry.hash == hash {
                entry.card[seat.index()] = card as u8;
                return;
            }
            if entry.hash == 0 {
                self.probe_distance = self.probe_distance.max(d + 1);
                self.load_count += 1;
                entry.hash = hash;
                entry.card = [NO_CARD; 4];
                entry.card[seat.index()] = card as u8;
                return;
            }
        }
    }

    fn grow(&mut self) {
        let old = std::mem::take(&mut self.entries);
        let size = 1usize << (self.bits + 1);
        let empty = CutoffEntry {
            hash: 0,
            card: [NO_CARD; 4],
        };
        self.entries = vec![empty; size].into_boxed_slice();
        self.bits += 1;
        self.mask = size - 1;
        self.probe_distance = 0;
        self.load_count = 0;

        for entry in old.iter().filter(|e| e.hash != 0) {
            for seat in Seat::ALL {
                if entry.card[seat.index()] != NO_CARD {
                    self.store(entry.hash, seat, entry.card[seat.index()] as usize);
                }
            }
        }
    }
}

#[inline]
fn mix(key0: u64, key1: u64) -> u64 {
    key0.wrapping_add(HASH_RAND[0])
        .wrapping_mul(key1.wrapping_add(HASH_RAND[1]))
}

/// Hash of a decision point. The keys capture only what the cutoff card can
/// depend on: the follower's choices within the led suit, or the whole hand
/// when leading or discarding, plus the trick context.
#[allow(clippy::too_many_arguments)]
pub(crate) fn cutoff_hash(
    hands: &Hands,
    seat_to_play: Seat,
    cards_in_trick: usize,
    lead_suit: usize,
    winning_card: usize,
    winning_seat: Seat,
    trump: Option<usize>,
    all_cards: CardSet,
) -> u64 {
    let key0: u64;
    let mut key1: u64 = 0;

    if cards_in_trick == 0 {
        key0 = hands.hand(seat_to_play).bits();
    } else if !hands.hand(seat_to_play).suit(lead_suit).is_empty() {
        key0 = all_cards.suit(lead_suit).bits();
        key1 = 1u64 << winning_card;
    } else {
        key0 = hands.hand(seat_to_play).bits();
        key1 = match trump {
            None => 1u64 << winning_seat.index(),
            Some(_) => 1u64 << winning_card,
        };
    }

    key1 |= 1u64 << (TOTAL_CARDS + cards_in_trick);

    mix(key0, key1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_lookup() {
        let mut cache = CutoffCache::new(4);
        cache.store(0xdead_beef_0000_0001, Seat::North, 17);
        assert_eq!(cache.lookup(0xdead_beef_0000_0001, Seat::North), Some(17));
        // other seats of the same entry stay unset
        assert_eq!(cache.lookup(0xdead_beef_0000_0001, Seat::East), None);
        assert_eq!(cache.lookup(0xdead_beef_0000_0002, Seat::North), None);
    }

    #[test]
    fn test_overwrite_same_slot() {
        let mut cache = CutoffCache::new(4);
        cache.store(42 << 60, Seat::West, 3);
        cache.store(42 << 60, Seat::West, 9);
        assert_eq!(cache.lookup(42 << 60, Seat::West), Some(9));
    }

    #[test]
    fn test_growth_preserves_entries() {
        let mut cache = CutoffCache::new(2);
        // enough distinct hashes to force several doublings
        let hashes: Vec<u64> = (1u64..40).map(|i| i.wrapping_mul(0x9e3779b97f4a7c15)).collect();
        for (i, &h) in hashes.iter().enumerate() {
            cache.store(h, Seat::ALL[i % 4], i % 52);
        }
        for (i, &h) in hashes.iter().enumerate() {
            assert_eq!(cache.lookup(h, Seat::ALL[i % 4]), Some(i % 52));
        }
    }

    #[test]
    fn test_colliding_hashes_probe() {
        let mut cache = CutoffCache::new(6);
        // same top bits, different hashes
        let h1 = 0x8000_0000_0000_0001u64;
        let h2 = 0x8000_0000_0000_0002u64;
        cache.store(h1, Seat::South, 11);
        cache.store(h2, Seat::South, 22);
        assert_eq!(cache.lookup(h1, Seat::South), Some(11));
        assert_eq!(cache.lookup(h2, Seat::South), Some(22));
    }
}
